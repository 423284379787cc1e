//! Config command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use hud_core::HudConfig;

pub fn path(config_path: &Path) {
    println!("{}", config_path.display());
}

pub fn init(config_path: &Path) -> Result<()> {
    HudConfig::init(config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn generate() -> Result<()> {
    let toml = HudConfig::generate()?;
    print!("{toml}");
    Ok(())
}
