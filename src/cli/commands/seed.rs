use serde_json::{json, Value};

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::models::*;
use crate::database::{AssetRepository, DatabaseManager, PgStore};
use crate::services::AssetService;

struct SeedAsset {
    code: &'static str,
    name: &'static str,
    asset_type: AssetType,
    parent: Option<&'static str>,
    config: Value,
    tag: Option<&'static str>,
}

fn sample_plant() -> Vec<SeedAsset> {
    vec![
        SeedAsset {
            code: "PLT001",
            name: "Solar Valley Plant",
            asset_type: AssetType::Plant,
            parent: None,
            config: json!({"capacity_mw": 100, "total_panels": 250000, "total_inverters": 1000}),
            tag: None,
        },
        SeedAsset {
            code: "SUB001",
            name: "North Block",
            asset_type: AssetType::SubPlant,
            parent: Some("PLT001"),
            config: json!({"capacity_mw": 25, "total_panels": 62500, "total_inverters": 250}),
            tag: None,
        },
        SeedAsset {
            code: "SUB002",
            name: "South Block",
            asset_type: AssetType::SubPlant,
            parent: Some("PLT001"),
            config: json!({"capacity_mw": 25, "total_panels": 62500, "total_inverters": 250}),
            tag: None,
        },
        SeedAsset {
            code: "INV001",
            name: "Inverter Array 1",
            asset_type: AssetType::Inverter,
            parent: Some("SUB001"),
            config: json!({"capacity_kw": 1000, "efficiency": 0.98, "max_voltage": 1000, "max_current": 100}),
            tag: Some("PLT001/SUB001/INV001"),
        },
        SeedAsset {
            code: "STR001",
            name: "String 1",
            asset_type: AssetType::String,
            parent: Some("INV001"),
            config: json!({"panel_count": 100, "max_voltage": 1000, "max_current": 10}),
            tag: Some("PLT001/SUB001/STR001"),
        },
        SeedAsset {
            code: "PAN001",
            name: "Panel Array 1",
            asset_type: AssetType::Panel,
            parent: Some("STR001"),
            config: json!({"wattage": 400, "efficiency": 0.21}),
            tag: Some("PLT001/SUB001/PAN001"),
        },
    ]
}

/// Idempotent: rows whose code already exists are left untouched
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let service = AssetService::new(PgStore::connect().await?);
    let store = service.repo();

    let location = match store.location_by_code("SV-CA").await? {
        Some(location) => location,
        None => {
            service
                .create_location(NewLocation {
                    name: "Solar Valley, CA".to_string(),
                    code: Some("SV-CA".to_string()),
                    description: Some("Sample plant site".to_string()),
                    parent_id: None,
                })
                .await?
        }
    };

    let mut created = Vec::new();
    for seed in sample_plant() {
        if store.asset_by_code(seed.code).await?.is_some() {
            tracing::info!("Asset {} already present, skipping", seed.code);
            continue;
        }
        let parent_id = match seed.parent {
            Some(code) => store.asset_by_code(code).await?.map(|parent| parent.id),
            None => None,
        };
        let asset = service
            .create_asset(
                NewAsset {
                    name: seed.name.to_string(),
                    code: Some(seed.code.to_string()),
                    asset_type: Some(seed.asset_type),
                    parent_id,
                    location_id: Some(location.id),
                    config: Some(seed.config),
                    realtime_data_tag: seed.tag.map(str::to_string),
                    ..Default::default()
                },
                None,
            )
            .await?;
        created.push(asset.code.unwrap_or_default());
    }

    if let Some(inverter) = store.asset_by_code("INV001").await? {
        let filter = SensorFilter {
            asset_id: Some(inverter.id),
            system_source: None,
        };
        if service.list_sensors(&filter, Default::default()).await?.is_empty() {
            service
                .create_sensor(
                    inverter.id,
                    NewSensor {
                        name: "Inverter 1 AC Power".to_string(),
                        sensor_path: "PLT001/SUB001/INV001/AC_POWER".to_string(),
                        system_source: "scada".to_string(),
                        config: Some(json!({"unit": "kW"})),
                    },
                )
                .await?;
        }
    }

    DatabaseManager::close().await;
    output_success(
        output_format,
        &format!("Seeded {} assets", created.len()),
        Some(json!({ "location_id": location.id, "created": created })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_parents_precede_children() {
        let plant = sample_plant();
        for (i, seed) in plant.iter().enumerate() {
            if let Some(parent) = seed.parent {
                assert!(plant[..i].iter().any(|p| p.code == parent), "{} before {}", parent, seed.code);
            }
        }
        assert_eq!(plant.iter().filter(|s| s.parent.is_none()).count(), 1);
    }
}
