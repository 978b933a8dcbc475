pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "solar-admin")]
#[command(about = "Solar Asset API administration - migrations, bootstrap accounts and sample data")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Create a super admin account")]
    CreateAdmin(commands::admin::CreateAdminArgs),

    #[command(about = "Insert a sample location and plant hierarchy")]
    SeedAssets,

    #[command(about = "Print the role to permission table")]
    Roles,
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateAdmin(args) => commands::admin::handle(args, output_format).await,
        Commands::SeedAssets => commands::seed::handle(output_format).await,
        Commands::Roles => commands::roles::handle(output_format),
    }
}
