//! Terminal lifecycle.
//!
//! The demo owns the whole screen: raw mode, alternate screen, hidden cursor
//! and mouse capture (clicks are taps). All of it is undone on normal exit,
//! on error, and on panic.

use std::io::{self, Stdout};
use std::panic;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type HudTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Enters raw mode and the alternate screen and creates the terminal.
///
/// Call [`install_panic_hook`] first so a panic restores the screen.
///
/// # Errors
/// Returns an error if the terminal cannot be switched into raw mode or the
/// alternate screen.
pub fn setup_terminal() -> Result<HudTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Turns on mouse reporting so clicks reach the event loop.
///
/// # Errors
/// Returns an error if the escape sequence cannot be written.
pub fn enable_mouse() -> Result<()> {
    execute!(io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")
}

/// Restores the terminal. Idempotent.
///
/// # Errors
/// Returns an error if leaving the alternate screen or raw mode fails.
pub fn restore_terminal() -> Result<()> {
    // Mouse capture must be off before raw mode is left.
    let _ = execute!(io::stdout(), DisableMouseCapture, Show);
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Restores the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restores the terminal when dropped.
pub struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}
