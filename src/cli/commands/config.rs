//! Config command.

use std::path::Path;

use anyhow::anyhow;

use crate::config::Settings;

/// Run config command - display current configuration.
///
/// With `save_to`, the effective settings (file and environment layers
/// merged) are also written there as TOML.
pub fn run_config(config: &Settings, save_to: Option<&Path>) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("# state_dir = {}", config.state_dir().display());
    println!("{}", toml::to_string_pretty(config)?);

    if let Some(path) = save_to {
        config
            .save(path)
            .map_err(|e| anyhow!("Cannot save settings to {}: {e}", path.display()))?;
        println!("Configuration saved to: {}", path.display());
    }
    Ok(())
}
