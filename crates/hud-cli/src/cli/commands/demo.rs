//! Interactive demo command.

use anyhow::Result;
use hud_core::HudConfig;
use tracing::info;

pub fn run(config: HudConfig) -> Result<()> {
    info!(backing = %config.backing, animation_ms = config.animation_ms, "starting demo");
    hud_tui::run_demo(config)
}
