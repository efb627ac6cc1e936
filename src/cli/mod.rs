pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "songbook")]
#[command(about = "Songbook operator CLI - schema, accounts and data maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create or update the database schema")]
    Migrate,

    #[command(about = "Grant or revoke admin rights")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Inspect user accounts")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },

    #[command(about = "Provision missing favorites and setlist documents")]
    Backfill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let manager = DatabaseManager::connect(&config.database).await?;
    let store = manager.store();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(&manager, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, &store, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &store, output_format).await,
        Commands::Backfill => commands::backfill::handle(&store, &store, output_format).await,
    };

    manager.close().await;
    result
}
