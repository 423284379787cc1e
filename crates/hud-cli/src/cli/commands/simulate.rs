//! Headless scripted session.
//!
//! Drives a presentation manager with in-memory collaborators on a virtual
//! clock and prints every event it records, stamped with the virtual time.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use hud_core::recording::{RecordingFactory, RecordingSurfaces};
use hud_core::{ContentSpec, Element, HudConfig, HudEvent, PresentationManager};
use serde::Serialize;
use tracing::info;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Serialize)]
struct Stamped<'a> {
    at_ms: u128,
    #[serde(flatten)]
    event: &'a HudEvent,
}

struct Session<W: Write> {
    manager: PresentationManager<RecordingSurfaces, RecordingFactory>,
    start: Instant,
    now: Instant,
    out: W,
    json: bool,
}

impl<W: Write> Session<W> {
    fn new(config: HudConfig, out: W, json: bool) -> Self {
        let start = Instant::now();
        Self {
            manager: PresentationManager::new(
                RecordingSurfaces::default(),
                RecordingFactory::default(),
                config,
            ),
            start,
            now: start,
            out,
            json,
        }
    }

    /// Advances the virtual clock frame by frame.
    fn wait(&mut self, duration: Duration) -> Result<()> {
        let end = self.now + duration;
        while self.now < end {
            self.now = (self.now + FRAME).min(end);
            self.manager.tick(self.now);
            self.flush()?;
        }
        Ok(())
    }

    /// Waits until no animation runs.
    fn settle(&mut self) -> Result<()> {
        while self.manager.tick(self.now) {
            self.now += FRAME;
            self.flush()?;
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        let at_ms = self.now.duration_since(self.start).as_millis();
        for event in self.manager.drain_events() {
            if self.json {
                let line = serde_json::to_string(&Stamped {
                    at_ms,
                    event: &event,
                })
                .context("Failed to serialize event")?;
                writeln!(self.out, "{line}")?;
            } else {
                writeln!(self.out, "[{at_ms:>6}ms] {event}")?;
            }
        }
        Ok(())
    }

    fn script(&mut self) -> Result<()> {
        // A loader that ignores cover taps, then turns into a message.
        let loader = self.manager.show_loading();
        self.flush()?;
        self.settle()?;
        self.manager.tap(loader, Element::Cover);
        self.flush()?;
        self.wait(Duration::from_secs(3))?;
        self.manager.set_text(loader, "Dude", true);
        self.flush()?;
        self.settle()?;

        // Two messages wait behind it and are shown in order.
        let first = self.manager.show_message("first in line", Vec::new(), None);
        let second = self.manager.show_message("second in line", Vec::new(), None);
        self.flush()?;

        // The message the loader became dismisses on a cover tap.
        self.manager.tap(loader, Element::Cover);
        self.flush()?;
        self.settle()?;

        self.manager.tap(first, Element::Cover);
        self.flush()?;
        self.settle()?;
        self.manager.dismiss(second);
        self.manager.dismiss(second);
        self.flush()?;
        self.settle()?;

        // Ok is vetoed and swaps to a loader; the follow-up message closes
        // through its own button, which has no action.
        let confirm = self
            .manager
            .build(ContentSpec::message_with_buttons(
                "Delete this item?",
                ["Ok", "Cancel"],
            ))
            .action(|ctx| {
                if ctx.element() == Element::Button(0) {
                    ctx.set_loading(true);
                    return false;
                }
                true
            })
            .show();
        self.flush()?;
        self.settle()?;
        self.manager.tap(confirm, Element::Button(0));
        self.flush()?;
        self.settle()?;
        self.manager.set_message(confirm, "Deleted", vec!["Close".to_string()], None, true);
        self.flush()?;
        self.settle()?;
        self.manager.tap(confirm, Element::Button(1));
        self.manager.tap(confirm, Element::Button(0));
        self.flush()?;
        self.settle()?;

        // A queued HUD dismissed before it shows is withdrawn.
        let shown = self.manager.show_message("on screen", Vec::new(), None);
        let withdrawn = self.manager.show_message("never shown", Vec::new(), None);
        self.flush()?;
        self.manager.dismiss(withdrawn);
        self.manager.dismiss(shown);
        self.flush()?;
        self.settle()
    }

    fn summary(&mut self) -> Result<()> {
        let surfaces = self.manager.surfaces();
        let factory = self.manager.factory();
        info!(
            created = surfaces.created_count(),
            hidden = surfaces.hidden_count(),
            live = factory.live_count(),
            "simulation finished"
        );
        if !self.json {
            writeln!(
                self.out,
                "surfaces created: {}, hidden: {}; content released: {}, live: {}",
                surfaces.created_count(),
                surfaces.hidden_count(),
                factory.released().len(),
                factory.live_count()
            )?;
        }
        Ok(())
    }
}

pub fn run(config: HudConfig, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut session = Session::new(config, stdout.lock(), json);
    session.script()?;
    session.summary()?;
    session.out.flush()?;
    Ok(())
}
