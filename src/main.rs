//! Merchant console - operator CLI for the payments platform
//!
//! Drives the custody vault unseal ritual and an interactive detail sheet
//! session against the platform admin API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use merchant_console::cli::commands;
use merchant_console::config::Config;

/// Merchant console - payments platform operator tool
#[derive(Parser)]
#[command(name = "console")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "console.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Custody vault operations
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Interactive detail sheet session
    Sheets,

    /// Show current configuration (secrets masked)
    Config,

    /// Check session and vault endpoints
    Health,
}

#[derive(Subcommand)]
enum VaultAction {
    /// Show vault state and shard progress
    Status,

    /// Initiate the vault (first-time setup)
    Init {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Submit shards until the vault unseals
    Unseal,

    /// Cancel unsealing, or reseal an unsealed vault
    Cancel {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("merchant_console=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Vault { action } => match action {
            VaultAction::Status => commands::vault_status(&config).await,
            VaultAction::Init { force } => commands::vault_init(&config, force).await,
            VaultAction::Unseal => commands::vault_unseal(&config).await,
            VaultAction::Cancel { force } => commands::vault_cancel(&config, force).await,
        },
        Commands::Sheets => commands::sheets(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
