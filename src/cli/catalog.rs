//! Stat catalog and sequence listing commands

use anyhow::{Context, Result};

use renderlens::config::Config;
use renderlens::viewer::ViewController;

/// Print the configured stats
pub fn stats_command(config: &Config) -> Result<()> {
    let catalog = config.catalog();
    println!("Stats ({}):\n", catalog.len());
    for def in catalog.definitions() {
        if def.is_atomic() {
            println!("  {} [{}]", def.name, def.unit);
        } else {
            println!("  {} [{}]: {}", def.name, def.unit, def.components.join(", "));
        }
    }
    Ok(())
}

/// Print the sequences found on the share
pub async fn sequences_command(config: &Config) -> Result<()> {
    let controller = ViewController::from_config(config)?;
    let sequences = controller
        .list_sequences()
        .await
        .with_context(|| format!("Failed to list sequences under {}", config.share.root))?;

    if sequences.is_empty() {
        println!("No sequences found.");
        return Ok(());
    }
    for sequence in sequences {
        println!("  {}", sequence);
    }
    Ok(())
}
