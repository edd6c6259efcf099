use std::path::Path;

use anyhow::{bail, Result};

use stagehand_core::AppConfig;

pub fn run(config: &AppConfig, path: Option<&Path>, init: bool) -> Result<()> {
    let default_path = AppConfig::config_path();

    if init {
        if default_path.exists() {
            bail!("Configuration already exists at {}", default_path.display());
        }
        AppConfig::default().save()?;
        println!("Wrote default configuration to {}", default_path.display());
        return Ok(());
    }

    let source = path.unwrap_or(default_path.as_path());
    if source.exists() {
        println!("# Loaded from {}", source.display());
    } else {
        println!("# Defaults ({} not found)", source.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
