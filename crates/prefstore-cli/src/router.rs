//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use anyhow::{Context, Result};
use prefstore_core::{StorageConfig, StorageManager, StorageScope};
use serde_json::Value;

/// Resolve the scope and config from the command line
pub fn build_manager(cli: &Cli) -> Result<StorageManager> {
    let mut config = StorageConfig::default();
    config.apply_env_overrides();
    if let Some(dir) = &cli.dir {
        config = config.with_dir(dir.clone());
    }

    let scope = match &cli.cluster {
        Some(id) => StorageScope::cluster(id).context("Invalid --cluster")?,
        None => StorageScope::Global,
    };

    Ok(StorageManager::construct(config, scope))
}

/// Run one command against an initialized manager, returning the text to print
pub async fn execute(manager: &StorageManager, command: &Commands) -> Result<String> {
    match command {
        Commands::Get { key } => {
            let helper = manager.create_storage(key.as_str(), Value::Null);
            render(&helper.get())
        }
        Commands::Set { key, value } => {
            let value: Value = serde_json::from_str(value)
                .with_context(|| format!("Value for '{}' is not valid JSON", key))?;
            manager.create_storage(key.as_str(), Value::Null).set(value);
            manager.flush().await;
            tracing::info!(key = %key, path = %manager.path().display(), "Value stored");
            Ok(String::new())
        }
        Commands::Reset { key } => {
            manager.create_storage(key.as_str(), Value::Null).reset();
            manager.flush().await;
            tracing::info!(key = %key, path = %manager.path().display(), "Value removed");
            Ok(String::new())
        }
        Commands::Dump => render(&manager.document().snapshot()),
        Commands::Path => Ok(manager.path().display().to_string()),
    }
}

fn render(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render value")
}
