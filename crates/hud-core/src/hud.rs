//! Per-HUD content and animation state machine.
//!
//! ```text
//! Initial ──content──▶ Showing ◀──swap done── Transitioning
//!                         │   └──animated swap──▶ │
//!                         └──────exit──▶ Dismissing ──exit done──▶ Dismissed
//! ```
//!
//! At most one transition runs per HUD. A dismissal requested during the
//! entrance is deferred until the entrance completes.

use std::fmt;
use std::mem;
use std::time::{Duration, Instant};

use crate::animation::{AnimationStrategy, Transition, TransitionKind, Visuals};
use crate::content::{ContentKind, ContentSpec, ContentStyle, Element};
use crate::ids::{AnimationToken, HudId, TokenSeq};
use crate::policy::TapPolicy;
use crate::surface::SurfaceSpec;

/// Action callback: returns whether the interaction should dismiss the HUD.
pub type Action = Box<dyn FnMut(&mut ActionContext) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudPhase {
    Initial,
    Showing,
    Transitioning,
    Dismissing,
    Dismissed,
}

/// Content update requested from inside an action callback.
pub(crate) enum HudCommand {
    SetContent {
        spec: ContentSpec,
        animated: bool,
    },
    SetMessage {
        text: String,
        buttons: Vec<String>,
        action: Option<Action>,
        animated: bool,
    },
}

/// Passed to action callbacks.
///
/// Content updates requested here are applied by the manager once the
/// callback returns, before the dismissal decision is acted on.
pub struct ActionContext {
    hud: HudId,
    element: Element,
    commands: Vec<HudCommand>,
}

impl ActionContext {
    pub(crate) fn new(hud: HudId, element: Element) -> Self {
        Self {
            hud,
            element,
            commands: Vec::new(),
        }
    }

    pub fn hud(&self) -> HudId {
        self.hud
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn set_text(&mut self, text: impl Into<String>, animated: bool) {
        self.commands.push(HudCommand::SetContent {
            spec: ContentSpec::message(text),
            animated,
        });
    }

    pub fn set_message(
        &mut self,
        text: impl Into<String>,
        buttons: Vec<String>,
        action: Option<Action>,
        animated: bool,
    ) {
        self.commands.push(HudCommand::SetMessage {
            text: text.into(),
            buttons,
            action,
            animated,
        });
    }

    pub fn set_loading(&mut self, animated: bool) {
        self.commands.push(HudCommand::SetContent {
            spec: ContentSpec::Loader,
            animated,
        });
    }

    pub fn set_custom(&mut self, tag: u32, payload: impl Into<String>, animated: bool) {
        self.commands.push(HudCommand::SetContent {
            spec: ContentSpec::Custom {
                tag,
                payload: payload.into(),
            },
            animated,
        });
    }

    pub(crate) fn into_commands(self) -> Vec<HudCommand> {
        self.commands
    }
}

/// Result of asking a HUD to leave the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitRequest {
    Started,
    Deferred,
    Ignored,
}

/// A transition that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completed {
    pub token: AnimationToken,
    pub kind: TransitionKind,
}

/// Construction parameters snapshotted from the configuration.
pub(crate) struct HudSetup {
    pub style: ContentStyle,
    pub surface: SurfaceSpec,
    pub duration: Duration,
    pub strategy: Box<dyn AnimationStrategy>,
    pub tap_policy: TapPolicy,
}

pub struct Hud<C> {
    id: HudId,
    phase: HudPhase,
    spec: Option<ContentSpec>,
    current: Option<C>,
    previous: Option<C>,
    previous_kind: Option<ContentKind>,
    action: Option<Action>,
    cover_action: Option<Action>,
    tap_policy: TapPolicy,
    strategy: Box<dyn AnimationStrategy>,
    style: ContentStyle,
    surface: SurfaceSpec,
    duration: Duration,
    visuals: Visuals,
    transition: Option<Transition>,
    exit_pending: bool,
    entered: bool,
    visible: bool,
    released: Vec<C>,
}

impl<C> Hud<C> {
    pub(crate) fn new(id: HudId, setup: HudSetup) -> Self {
        Self {
            id,
            phase: HudPhase::Initial,
            spec: None,
            current: None,
            previous: None,
            previous_kind: None,
            action: None,
            cover_action: None,
            tap_policy: setup.tap_policy,
            strategy: setup.strategy,
            style: setup.style,
            surface: setup.surface,
            duration: setup.duration,
            visuals: Visuals::default(),
            transition: None,
            exit_pending: false,
            entered: false,
            visible: false,
            released: Vec::new(),
        }
    }

    pub fn id(&self) -> HudId {
        self.id
    }

    pub fn phase(&self) -> HudPhase {
        self.phase
    }

    pub fn content_kind(&self) -> Option<ContentKind> {
        self.spec.as_ref().map(ContentSpec::kind)
    }

    pub fn spec(&self) -> Option<&ContentSpec> {
        self.spec.as_ref()
    }

    pub fn content(&self) -> Option<&C> {
        self.current.as_ref()
    }

    /// Content being swapped out; only present during an animated swap.
    pub fn previous_content(&self) -> Option<&C> {
        self.previous.as_ref()
    }

    /// `(from, to)` while an animated content swap runs.
    pub fn transitioning(&self) -> Option<(ContentKind, ContentKind)> {
        match (self.phase, self.previous_kind, self.content_kind()) {
            (HudPhase::Transitioning, Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }

    pub fn visuals(&self) -> &Visuals {
        &self.visuals
    }

    pub fn style(&self) -> &ContentStyle {
        &self.style
    }

    pub fn surface_spec(&self) -> &SurfaceSpec {
        &self.surface
    }

    pub fn is_backed(&self) -> bool {
        self.surface.backing.is_backed()
    }

    pub fn tap_policy(&self) -> &TapPolicy {
        &self.tap_policy
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_dismissing(&self) -> bool {
        self.exit_pending || matches!(self.phase, HudPhase::Dismissing | HudPhase::Dismissed)
    }

    fn assert_alive(&self, operation: &str) {
        assert!(
            self.phase != HudPhase::Dismissed,
            "{operation} on {} after it was dismissed",
            self.id
        );
    }

    pub(crate) fn set_action(&mut self, action: Option<Action>) {
        self.assert_alive("set action");
        self.action = action;
    }

    pub(crate) fn set_cover_action(&mut self, action: Option<Action>) {
        self.assert_alive("set cover action");
        self.cover_action = action;
    }

    pub(crate) fn set_tap_policy(&mut self, policy: TapPolicy) {
        self.assert_alive("set tap policy");
        self.tap_policy = policy;
    }

    /// Installs new content.
    ///
    /// The swap is animated only when the HUD is on screen, already shows
    /// content and no other transition is running; otherwise the old content
    /// is released immediately. A swap still in flight is completed first.
    /// Returns the completion of an interrupted swap, if any.
    pub(crate) fn install_content(
        &mut self,
        spec: ContentSpec,
        content: C,
        animated: bool,
        tokens: &mut TokenSeq,
    ) -> Option<Completed> {
        self.assert_alive("set content");

        let interrupted = self.finish_swap();
        let old_kind = self.content_kind();
        let old = self.current.replace(content);
        self.spec = Some(spec);

        let can_animate = animated
            && old.is_some()
            && self.visible
            && self.transition.is_none()
            && self.phase == HudPhase::Showing;

        match old {
            Some(old) if can_animate => {
                self.previous = Some(old);
                self.previous_kind = old_kind;
                self.visuals.swap_progress = Some(0.0);
                self.transition = Some(Transition::new(
                    tokens.next_token(),
                    TransitionKind::ContentSwap,
                    self.duration,
                ));
                self.phase = HudPhase::Transitioning;
            }
            Some(old) => self.released.push(old),
            None => {}
        }

        if self.phase == HudPhase::Initial {
            self.phase = HudPhase::Showing;
        }
        interrupted
    }

    /// Completes an in-flight content swap immediately.
    fn finish_swap(&mut self) -> Option<Completed> {
        let transition = self
            .transition
            .take_if(|t| t.kind == TransitionKind::ContentSwap)?;
        if let Some(previous) = self.previous.take() {
            self.released.push(previous);
        }
        self.previous_kind = None;
        self.visuals.swap_progress = None;
        if self.phase == HudPhase::Transitioning {
            self.phase = HudPhase::Showing;
        }
        Some(Completed {
            token: transition.token,
            kind: transition.kind,
        })
    }

    /// Called once, when the surface becomes visible.
    pub(crate) fn start_entrance(&mut self, tokens: &mut TokenSeq) -> AnimationToken {
        assert!(
            self.current.is_some(),
            "{} displayed before any content was set",
            self.id
        );
        assert!(!self.visible, "{} entrance started twice", self.id);

        self.visible = true;
        let backed = self.is_backed();
        self.strategy.entrance(&mut self.visuals, 0.0, backed);
        let token = tokens.next_token();
        self.transition = Some(Transition::new(
            token,
            TransitionKind::Entrance,
            self.duration,
        ));
        token
    }

    pub(crate) fn request_exit(&mut self, tokens: &mut TokenSeq) -> (ExitRequest, Option<Completed>) {
        if self.is_dismissing() {
            return (ExitRequest::Ignored, None);
        }
        if self
            .transition
            .as_ref()
            .is_some_and(|t| t.kind == TransitionKind::Entrance)
        {
            self.exit_pending = true;
            return (ExitRequest::Deferred, None);
        }
        let interrupted = self.finish_swap();
        self.start_exit(tokens);
        (ExitRequest::Started, interrupted)
    }

    fn start_exit(&mut self, tokens: &mut TokenSeq) {
        self.exit_pending = false;
        self.phase = HudPhase::Dismissing;
        self.transition = Some(Transition::new(
            tokens.next_token(),
            TransitionKind::Exit,
            self.duration,
        ));
    }

    /// Advances the running transition and returns it once it completes.
    pub(crate) fn advance(&mut self, now: Instant, tokens: &mut TokenSeq) -> Option<Completed> {
        let transition = self.transition.as_mut()?;
        transition.anchor(now);
        let progress = transition.progress(now);
        let finished = transition.is_finished(now);
        let kind = transition.kind;
        let token = transition.token;

        let backed = self.is_backed();
        match kind {
            TransitionKind::Entrance => self.strategy.entrance(&mut self.visuals, progress, backed),
            TransitionKind::Exit => self.strategy.exit(&mut self.visuals, progress, backed),
            TransitionKind::ContentSwap => self.visuals.swap_progress = Some(progress),
        }

        if !finished {
            return None;
        }

        let completed = Completed { token, kind };
        match kind {
            TransitionKind::Entrance => {
                self.transition = None;
                self.entered = true;
                if self.exit_pending {
                    self.start_exit(tokens);
                }
            }
            TransitionKind::ContentSwap => {
                self.finish_swap();
            }
            TransitionKind::Exit => {
                self.transition = None;
                self.phase = HudPhase::Dismissed;
                self.visible = false;
            }
        }
        Some(completed)
    }

    /// Runs the callback for `element`; no callback means dismiss.
    pub(crate) fn run_action(&mut self, ctx: &mut ActionContext) -> bool {
        let slot = match ctx.element() {
            Element::Cover if self.cover_action.is_some() => &mut self.cover_action,
            _ => &mut self.action,
        };
        slot.as_mut().is_none_or(|action| action(ctx))
    }

    pub(crate) fn take_released(&mut self) -> Vec<C> {
        mem::take(&mut self.released)
    }

    /// Everything still held, for teardown.
    pub(crate) fn into_contents(self) -> Vec<C> {
        let mut contents = self.released;
        contents.extend(self.previous);
        contents.extend(self.current);
        contents
    }
}

impl<C> fmt::Debug for Hud<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hud")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("kind", &self.content_kind())
            .field("visible", &self.visible)
            .field("transition", &self.transition.as_ref().map(|t| t.kind))
            .field("exit_pending", &self.exit_pending)
            .finish_non_exhaustive()
    }
}
