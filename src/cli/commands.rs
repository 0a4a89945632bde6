//! CLI command implementations

use std::sync::Arc;

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::auth::{AuthProbe, HttpAuthProbe};
use crate::config::Config;
use crate::error::Error;
use crate::overlay::{render, SheetOpen, SheetRegistry, TextPanels};
use crate::vault::{HttpVaultClient, SealState, UnsealStep, UnsealWorkflow, VaultApi, WorkflowView};

use super::session::{parse_line, SheetCommand, SESSION_HELP};

fn build_workflow(config: &Config) -> Result<UnsealWorkflow> {
    let client = HttpVaultClient::from_config(config)?;
    Ok(UnsealWorkflow::with_min_shard_length(
        Arc::new(client),
        config.vault.min_shard_length,
    ))
}

/// Print the vault panel for the current view
fn print_vault(view: &WorkflowView) {
    println!("\n=== CUSTODY VAULT ===\n");

    match &view.storage_state {
        Some(state) => {
            println!("Initiated: {}", if state.initiated { "yes" } else { "no" });
            println!("State: {}", state.state);
            println!("Quorum: {} of {} shards", state.split_min, state.split_max);
            if let Some(remaining) = view.remaining_shards() {
                println!("Received: {}", state.received_shares);
                println!("To finish: {}", remaining);
            }
        }
        None => println!("State: unknown"),
    }

    if let Some(message) = &view.last_error {
        println!("\nLast action failed: {}", message);
    }

    let mut actions = Vec::new();
    if view.can_initiate() {
        actions.push("console vault init");
    }
    if view.can_enter_shard() {
        actions.push("console vault unseal");
    }
    if view.can_cancel() {
        actions.push("console vault cancel");
    }
    if !actions.is_empty() {
        println!("\nAvailable: {}", actions.join(", "));
    }
}

/// Show vault status
pub async fn vault_status(config: &Config) -> Result<()> {
    let workflow = build_workflow(config)?;
    workflow.refresh().await?;
    print_vault(&workflow.view().await);
    Ok(())
}

/// Initiate the vault for the first time
pub async fn vault_init(config: &Config, force: bool) -> Result<()> {
    let workflow = build_workflow(config)?;
    let view = {
        workflow.refresh().await?;
        workflow.view().await
    };

    if !view.can_initiate() {
        println!("Vault is already initiated.");
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Initiate the custody vault? This generates a new split secret.")
            .default(false)
            .interact()?;
        if !confirmed {
            info!("Vault initiation cancelled by user");
            return Ok(());
        }
    }

    match workflow.initiate_storage().await {
        Ok(_) => {
            println!("\nVault initiated.");
            print_vault(&workflow.view().await);
            Ok(())
        }
        Err(e) => {
            error!("Vault initiation failed: {}", e);
            print_vault(&workflow.view().await);
            anyhow::bail!("Vault initiation failed: {}", e)
        }
    }
}

/// Interactive shard submission until quorum or the operator stops
pub async fn vault_unseal(config: &Config) -> Result<()> {
    let workflow = build_workflow(config)?;
    workflow.refresh().await?;

    loop {
        let view = workflow.view().await;
        print_vault(&view);

        match view.step {
            UnsealStep::Unsealed => {
                println!("\nVault is unsealed.");
                return Ok(());
            }
            UnsealStep::AwaitingInit => {
                println!("\nVault is not initiated. Run: console vault init");
                return Ok(());
            }
            _ if !view.can_enter_shard() => {
                anyhow::bail!("Vault does not accept shards right now");
            }
            _ => {}
        }

        workflow.begin_entry().await?;
        let shard = Password::new()
            .with_prompt("Shard (empty to stop)")
            .allow_empty_password(true)
            .interact()?;
        if shard.trim().is_empty() {
            info!("Shard entry stopped by operator");
            return Ok(());
        }

        match workflow.submit(&shard).await {
            Ok(state) => {
                if state.state == SealState::Waiting {
                    println!("Shard accepted.");
                }
            }
            Err(Error::Validation(message)) => println!("{}", message),
            Err(e) if e.is_remote_failure() => {
                warn!("Shard submission failed: {}", e);
                println!("Shard was not accepted: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Cancel an unseal in progress, or reseal the vault
pub async fn vault_cancel(config: &Config, force: bool) -> Result<()> {
    let workflow = build_workflow(config)?;
    workflow.refresh().await?;
    let view = workflow.view().await;

    if !view.can_cancel() {
        println!("Nothing to cancel: vault is {}.", describe(&view));
        return Ok(());
    }

    if !force {
        let prompt = match view.storage_state.as_ref().map(|s| s.state) {
            Some(SealState::Unsealed) => {
                "Reseal the vault? Shards will be needed to unseal again."
            }
            _ => "Cancel unsealing? Submitted shards will be discarded.",
        };
        let confirmed = Confirm::new().with_prompt(prompt).default(false).interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    workflow.cancel_unsealing().await?;
    print_vault(&workflow.view().await);
    Ok(())
}

fn describe(view: &WorkflowView) -> String {
    match &view.storage_state {
        Some(state) if !state.initiated => "not initiated".to_string(),
        Some(state) => state.state.to_string(),
        None => "unknown".to_string(),
    }
}

/// Interactive detail sheet session
pub async fn sheets(config: &Config) -> Result<()> {
    let registry = SheetRegistry::from_config(config)?;
    println!("{}", SESSION_HELP);

    loop {
        let line: String = Input::new()
            .with_prompt("sheets")
            .allow_empty(true)
            .interact_text()?;

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            SheetCommand::Open { kind, payload } => {
                if registry.open_sheet(kind, payload).await == SheetOpen::Dropped {
                    println!("Session expired; sheet not opened.");
                }
            }
            SheetCommand::Close(kind) => registry.close_sheet(kind),
            SheetCommand::CloseAll => registry.close_all_sheets(),
            SheetCommand::Prune => {
                let removed = registry.prune_closed();
                println!("Removed {} closed sheet(s).", removed);
            }
            SheetCommand::List => {}
            SheetCommand::Help => {
                println!("{}", SESSION_HELP);
                continue;
            }
            SheetCommand::Quit => return Ok(()),
        }

        let lines = render(&registry, &TextPanels);
        if lines.is_empty() {
            println!("No sheets.");
        }
        for line in lines {
            println!("  {}", line);
        }
    }
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check the session and vault endpoints
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;
    let api = ApiClient::new(&config.api)?;

    print!("Session... ");
    let probe = HttpAuthProbe::new(api.clone(), config.auth.check_path.clone());
    let started = std::time::Instant::now();
    match probe.check_auth().await {
        Ok(()) => println!("OK ({}ms)", started.elapsed().as_millis()),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Vault state... ");
    let vault = HttpVaultClient::new(api, config.vault.clone());
    let started = std::time::Instant::now();
    match vault.get_vault_state().await {
        Ok(state) => println!("OK ({}, {}ms)", state.state, started.elapsed().as_millis()),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    if all_healthy {
        println!("\nAll checks passed.");
        Ok(())
    } else {
        anyhow::bail!("Health check failed")
    }
}
