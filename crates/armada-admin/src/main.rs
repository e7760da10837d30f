//! Admin binary for the Armada master data.
//!
//! # Commands
//!
//! - `update-data` -- import the spreadsheet into the master-data document
//! - `push <category> <file>` -- write a record array back to its worksheet
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Parse the command line
//! 3. Load configuration from the environment (and `ARMADA_CONFIG`)
//! 4. Run the command

mod admin_log;
mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::Admin;
use crate::config::AdminConfig;

#[derive(Parser)]
#[command(name = "armada-admin", about = "Maintain the Armada master data.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import every configured worksheet and merge it into the master data.
    UpdateData,

    /// Diff a JSON array of records against a worksheet and apply the changes.
    Push {
        /// Category whose worksheet receives the records (e.g. `ships`).
        category: String,

        /// JSON file holding an array of flat records.
        file: PathBuf,

        /// Print the operations instead of applying them.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the command fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // 2. Parse the command line.
    let cli = Cli::parse();

    // 3. Load configuration.
    let config = AdminConfig::from_env()?;
    info!(
        spreadsheet_id = config.sheets.spreadsheet_id,
        master_data_path = %config.master_data_path.display(),
        admin_log_sheet = config.admin_log_sheet,
        "Configuration loaded"
    );
    let admin = Admin::from_config(&config);

    // 4. Run the command.
    match cli.command {
        Command::UpdateData => {
            let saved = admin.update_data().await?;
            info!(
                categories = saved.len(),
                created_at = ?saved.created_at_time(),
                "update_data finished"
            );
        }
        Command::Push {
            category,
            file,
            dry_run,
        } => {
            let operations = admin.push(&category, &file, dry_run).await?;
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&operations)?);
            }
            info!(category, operations = operations.len(), dry_run, "push finished");
        }
    }

    Ok(())
}
