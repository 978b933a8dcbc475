use serde_json::{json, Map, Value};

use crate::cli::{utils::output_success, OutputFormat};
use crate::permissions::{get_manageable_roles, get_user_permissions, Role};

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let table: Map<String, Value> = Role::ALL
                .iter()
                .map(|role| {
                    let entry = json!({
                        "permissions": get_user_permissions(*role),
                        "manageable_roles": get_manageable_roles(*role),
                    });
                    (role.to_string(), entry)
                })
                .collect();
            output_success(output_format, "Role permission table", Some(Value::Object(table)))
        }
        OutputFormat::Text => {
            for role in Role::ALL {
                let permissions: Vec<&str> = get_user_permissions(role).iter().map(|p| p.as_str()).collect();
                println!("{} ({} permissions)", role, permissions.len());
                println!("  {}", permissions.join(", "));
                let manageable: Vec<&str> = get_manageable_roles(role).iter().map(|r| r.as_str()).collect();
                if !manageable.is_empty() {
                    println!("  manages: {}", manageable.join(", "));
                }
            }
            Ok(())
        }
    }
}
