//! Interactive demo runtime: owns the terminal and runs the event loop.
//!
//! [`Demo`] holds everything that does not need a TTY (the presentation
//! manager, scheduled follow-ups and the event log) so it can be driven from
//! tests; [`HudRuntime`] adds the terminal, input polling and drawing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use hud_core::{
    ContentKind, ContentSpec, Element, HudConfig, HudId, PresentationManager, SlideUp, TapPolicy,
};
use tracing::{debug, info};

use crate::content::TerminalContentFactory;
use crate::render::{self, HitMap, HostView, TerminalManager};
use crate::surface::TerminalSurfaces;
use crate::terminal::{self, HudTerminal, TerminalGuard};

/// Poll interval while something animates (about 60 fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when nothing moves.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Delay before a loading HUD turns into a message.
pub const LOADER_FOLLOW_UP: Duration = Duration::from_secs(3);

/// Delay before a confirmed action reports completion.
pub const ACTION_FOLLOW_UP: Duration = Duration::from_millis(1500);

const EVENT_LOG_LEN: usize = 12;

const HELP: [&str; 6] = [
    "l  loading HUD (turns into a message after 3s)",
    "m  message HUD",
    "b  message with Ok / Cancel buttons (Ok keeps the HUD and shows a loader)",
    "s  slide-up HUD, dismissed by tapping outside",
    "esc/space  tap the cover    1-9  tap a button    enter  first button",
    "click anywhere to tap       q  quit",
];

/// Input decoded from a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ShowLoading,
    ShowMessage,
    ShowButtons,
    ShowSlideUp,
    Tap(Element),
    Quit,
}

/// Maps a key press to a demo command.
pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    match key.code {
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char('l') => Some(Command::ShowLoading),
        KeyCode::Char('m') => Some(Command::ShowMessage),
        KeyCode::Char('b') => Some(Command::ShowButtons),
        KeyCode::Char('s') => Some(Command::ShowSlideUp),
        KeyCode::Esc | KeyCode::Char(' ') => Some(Command::Tap(Element::Cover)),
        KeyCode::Enter => Some(Command::Tap(Element::Button(0))),
        KeyCode::Char(digit @ '1'..='9') => digit
            .to_digit(10)
            .and_then(|d| usize::try_from(d).ok())
            .map(|d| Command::Tap(Element::Button(d - 1))),
        _ => None,
    }
}

/// Work scheduled for a later frame.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FollowUp {
    SetText { hud: HudId, text: String },
}

#[derive(Debug)]
struct Scheduled {
    at: Instant,
    follow_up: FollowUp,
}

/// Demo state driven by commands and the clock.
pub struct Demo {
    manager: TerminalManager,
    scheduled: Vec<Scheduled>,
    /// HUDs whose Ok button was confirmed, filled from inside action callbacks.
    confirmed: Rc<RefCell<Vec<HudId>>>,
    log: VecDeque<String>,
    should_quit: bool,
}

impl Demo {
    pub fn new(config: HudConfig) -> Self {
        Self {
            manager: PresentationManager::new(
                TerminalSurfaces::default(),
                TerminalContentFactory::default(),
                config,
            ),
            scheduled: Vec::new(),
            confirmed: Rc::new(RefCell::new(Vec::new())),
            log: VecDeque::new(),
            should_quit: false,
        }
    }

    pub fn manager(&self) -> &TerminalManager {
        &self.manager
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle(&mut self, command: Command, now: Instant) {
        debug!(?command, "command");
        match command {
            Command::Quit => self.should_quit = true,
            Command::ShowLoading => {
                let hud = self.manager.show_loading();
                self.schedule(
                    now + LOADER_FOLLOW_UP,
                    FollowUp::SetText {
                        hud,
                        text: "Dude".to_string(),
                    },
                );
            }
            Command::ShowMessage => {
                self.manager.show_message("dude", Vec::new(), None);
            }
            Command::ShowButtons => {
                let confirmed = Rc::clone(&self.confirmed);
                self.manager
                    .build(ContentSpec::message_with_buttons(
                        "Delete this item?",
                        ["Ok", "Cancel"],
                    ))
                    .action(move |ctx| {
                        if ctx.element() != Element::Button(0) {
                            return true;
                        }
                        ctx.set_loading(true);
                        confirmed.borrow_mut().push(ctx.hud());
                        false
                    })
                    .show();
            }
            Command::ShowSlideUp => {
                self.manager
                    .build(ContentSpec::Custom {
                        tag: 1,
                        payload: "Input\nTap outside to close".to_string(),
                    })
                    .animation(SlideUp)
                    .tap_policy(TapPolicy::Always)
                    .show();
            }
            Command::Tap(element) => {
                if let Some(hud) = self.manager.active_id() {
                    self.manager.tap(hud, element);
                }
            }
        }

        let confirmed: Vec<HudId> = self.confirmed.borrow_mut().drain(..).collect();
        for hud in confirmed {
            self.schedule(
                now + ACTION_FOLLOW_UP,
                FollowUp::SetText {
                    hud,
                    text: "Deleted".to_string(),
                },
            );
        }
        self.collect_events();
    }

    /// Taps whatever the click at (`column`, `row`) hit in the last frame.
    pub fn click(&mut self, hits: &HitMap, column: u16, row: u16, now: Instant) {
        if let Some((hud, element)) = hits.hit(column, row)
            && self.manager.is_active(hud)
        {
            self.handle(Command::Tap(element), now);
        }
    }

    fn schedule(&mut self, at: Instant, follow_up: FollowUp) {
        self.scheduled.push(Scheduled { at, follow_up });
    }

    /// Runs due follow-ups and advances animations.
    ///
    /// Returns whether the next frame should come at frame rate.
    pub fn tick(&mut self, now: Instant) -> bool {
        let (due, later): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|scheduled| scheduled.at <= now);
        self.scheduled = later;
        for scheduled in due {
            match scheduled.follow_up {
                FollowUp::SetText { hud, text } => {
                    if self.manager.hud(hud).is_some() {
                        self.manager.set_text(hud, text, true);
                    }
                }
            }
        }

        let animating = self.manager.tick(now);
        self.collect_events();
        animating
            || self
                .manager
                .active()
                .is_some_and(|hud| hud.content_kind() == Some(ContentKind::Loader))
    }

    fn collect_events(&mut self) {
        for event in self.manager.drain_events() {
            info!(%event, "hud event");
            if self.log.len() == EVENT_LOG_LEN {
                self.log.pop_front();
            }
            self.log.push_back(event.to_string());
        }
    }

    /// Help text followed by the most recent events.
    pub fn host_lines(&self) -> Vec<String> {
        HELP.iter()
            .map(ToString::to_string)
            .chain([String::new(), "events:".to_string()])
            .chain(self.log.iter().map(|line| format!("  {line}")))
            .collect()
    }
}

/// Full-screen demo runtime.
///
/// The terminal is restored on drop, on error and on panic.
pub struct HudRuntime {
    terminal: HudTerminal,
    demo: Demo,
    hits: HitMap,
    started: Instant,
    _guard: TerminalGuard,
}

impl HudRuntime {
    /// Takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(config: HudConfig) -> Result<Self> {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal()?;
        let guard = TerminalGuard;
        terminal::enable_mouse()?;

        Ok(Self {
            terminal,
            demo: Demo::new(config),
            hits: HitMap::default(),
            started: Instant::now(),
            _guard: guard,
        })
    }

    /// Runs until the user quits.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        info!("demo started");
        while !self.demo.should_quit() {
            let now = Instant::now();
            let busy = self.demo.tick(now);
            self.draw(now)?;

            let timeout = if busy {
                FRAME_DURATION
            } else {
                IDLE_POLL_DURATION
            };
            if event::poll(timeout)? {
                self.handle_event(event::read()?, Instant::now());
            }
        }
        info!("demo finished");
        Ok(())
    }

    fn draw(&mut self, now: Instant) -> Result<()> {
        let lines = self.demo.host_lines();
        let host = HostView {
            title: "hud demo",
            hint: "l m b s  q quit ",
            lines: &lines,
        };
        let elapsed = now.duration_since(self.started);
        let demo = &self.demo;
        let mut hits = HitMap::default();
        self.terminal.draw(|frame| {
            hits = render::render(frame, demo.manager(), &host, elapsed);
        })?;
        self.hits = hits;
        Ok(())
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => {
                if let Some(command) = map_key(key) {
                    self.demo.handle(command, now);
                }
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.demo.click(&self.hits, mouse.column, mouse.row, now);
            }
            _ => {}
        }
    }
}
