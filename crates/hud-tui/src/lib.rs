//! Terminal host platform for overlay HUDs.
//!
//! Implements the surface and content contracts of `hud-core` on top of
//! ratatui: overlay layers blend over a host screen, content is laid out in
//! terminal cells, and clicks are hit-tested into cover and button taps.

pub mod content;
pub mod render;
pub mod runtime;
pub mod surface;
pub mod terminal;

use std::io::{IsTerminal, stdout};

use anyhow::Result;
use hud_core::HudConfig;
pub use runtime::{Demo, HudRuntime};

/// Runs the interactive demo until the user quits.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the terminal fails.
pub fn run_demo(config: HudConfig) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The demo requires a terminal.\n\
             Use `hud simulate` for a non-interactive run."
        );
    }
    HudRuntime::new(config)?.run()
}
