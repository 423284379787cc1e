//! Presentation manager: the single source of truth for what is on screen.
//!
//! ## Ownership
//!
//! The manager owns every live [`Hud`] in an id-keyed table. The active slot
//! and the pending queue refer to HUDs by [`HudId`] only, and callers hold
//! plain ids, so there is no ownership cycle between a HUD and its manager.
//! A HUD leaves the table when its exit animation completes or when it is
//! withdrawn from the queue.
//!
//! ## Clock
//!
//! Animations advance only through [`PresentationManager::tick`]. The host
//! calls it every frame; completions are delivered from there, in the order
//! the transitions were started, exactly once each.

use std::collections::{HashMap, VecDeque};
use std::mem;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::animation::{AnimationStrategy, TransitionKind};
use crate::config::{Backing, HudConfig};
use crate::content::{ContentFactory, ContentSpec, Element};
use crate::events::HudEvent;
use crate::hud::{Action, ActionContext, Completed, ExitRequest, Hud, HudCommand, HudSetup};
use crate::ids::{HudId, HudSeq, TokenSeq};
use crate::policy::TapPolicy;
use crate::surface::SurfaceProvider;

struct ActiveHud<T> {
    id: HudId,
    surface: T,
}

pub struct PresentationManager<S: SurfaceProvider, F: ContentFactory> {
    surfaces: S,
    factory: F,
    config: HudConfig,
    huds: HashMap<HudId, Hud<F::Content>>,
    active: Option<ActiveHud<S::Surface>>,
    pending: VecDeque<HudId>,
    ids: HudSeq,
    tokens: TokenSeq,
    events: Vec<HudEvent>,
}

impl<S: SurfaceProvider, F: ContentFactory> PresentationManager<S, F> {
    pub fn new(surfaces: S, factory: F, config: HudConfig) -> Self {
        Self {
            surfaces,
            factory,
            config,
            huds: HashMap::new(),
            active: None,
            pending: VecDeque::new(),
            ids: HudSeq::default(),
            tokens: TokenSeq::default(),
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Factory entry points
    // ------------------------------------------------------------------

    /// Shows a loader HUD. Cover taps are ignored unless the policy is changed.
    pub fn show_loading(&mut self) -> HudId {
        self.build(ContentSpec::Loader).show()
    }

    /// Shows a message, optionally with a row of buttons.
    pub fn show_message(
        &mut self,
        text: impl Into<String>,
        buttons: Vec<String>,
        action: Option<Action>,
    ) -> HudId {
        let spec = ContentSpec::Message {
            text: text.into(),
            buttons,
        };
        let mut builder = self.build(spec);
        builder.parts.action = action;
        builder.show()
    }

    pub fn show_custom(&mut self, tag: u32, payload: impl Into<String>) -> HudId {
        self.build(ContentSpec::Custom {
            tag,
            payload: payload.into(),
        })
        .show()
    }

    /// Starts a HUD with per-instance overrides.
    pub fn build(&mut self, spec: ContentSpec) -> HudBuilder<'_, S, F> {
        HudBuilder {
            manager: self,
            parts: HudParts {
                spec,
                action: None,
                cover_action: None,
                tap_policy: TapPolicy::default(),
                strategy: None,
                backing: None,
            },
        }
    }

    fn construct(&mut self, parts: HudParts) -> HudId {
        let id = self.ids.next_id();
        let strategy = parts
            .strategy
            .unwrap_or_else(|| self.config.animation.strategy());
        let backing = if strategy.uses_backing() {
            parts
                .backing
                .unwrap_or_else(|| self.config.backing.clone())
        } else {
            Backing::None
        };

        let mut hud = Hud::new(
            id,
            HudSetup {
                style: self.config.content_style(),
                surface: self.config.surface_spec(id, backing),
                duration: self.config.animation_duration(),
                strategy,
                tap_policy: parts.tap_policy,
            },
        );
        hud.set_action(parts.action);
        hud.set_cover_action(parts.cover_action);

        let content = self.factory.build(&parts.spec, hud.style());
        hud.install_content(parts.spec, content, false, &mut self.tokens);
        debug!(hud = %id, kind = ?hud.content_kind(), "hud created");
        self.huds.insert(id, hud);
        id
    }

    // ------------------------------------------------------------------
    // Display / dismiss
    // ------------------------------------------------------------------

    /// Shows `id` now if nothing is on screen, otherwise queues it.
    ///
    /// HUDs already active or queued, and unknown ids, are ignored.
    pub fn display(&mut self, id: HudId) {
        if !self.huds.contains_key(&id) {
            debug!(hud = %id, "display ignored: unknown hud");
            return;
        }
        if self.is_active(id) || self.is_queued(id) {
            warn!(hud = %id, "display ignored: already registered");
            return;
        }

        if self.active.is_some() {
            self.pending.push_back(id);
            let position = self.pending.len();
            debug!(hud = %id, position, "hud queued");
            self.events.push(HudEvent::Queued { hud: id, position });
            return;
        }

        self.present(id);
    }

    fn present(&mut self, id: HudId) {
        let Some(hud) = self.huds.get_mut(&id) else {
            return;
        };
        let mut surface = self.surfaces.create_topmost_surface(hud.surface_spec());
        self.surfaces.show(&mut surface);
        hud.start_entrance(&mut self.tokens);
        let kind = hud.content_kind();
        self.active = Some(ActiveHud { id, surface });

        info!(hud = %id, ?kind, "hud displayed");
        if let Some(kind) = kind {
            self.events.push(HudEvent::Displayed { hud: id, kind });
        }
    }

    /// Dismisses `id`.
    ///
    /// The active HUD runs its exit animation and leaves the screen when it
    /// completes; a HUD that was never shown is withdrawn silently. Unknown
    /// and already dismissing ids are no-ops.
    pub fn dismiss(&mut self, id: HudId) {
        if self.is_active(id) {
            let Some(hud) = self.huds.get_mut(&id) else {
                return;
            };
            let (request, interrupted) = hud.request_exit(&mut self.tokens);
            if let Some(completed) = interrupted {
                self.record_completion(id, completed);
            }
            match request {
                ExitRequest::Started | ExitRequest::Deferred => {
                    let deferred = request == ExitRequest::Deferred;
                    info!(hud = %id, deferred, "dismiss requested");
                    self.events.push(HudEvent::DismissRequested { hud: id, deferred });
                }
                ExitRequest::Ignored => debug!(hud = %id, "dismiss ignored: already dismissing"),
            }
            self.release_pending_contents(id);
            return;
        }

        if let Some(position) = self.pending.iter().position(|queued| *queued == id) {
            self.pending.remove(position);
        }
        match self.huds.remove(&id) {
            Some(hud) => {
                for content in hud.into_contents() {
                    self.factory.release(content);
                }
                debug!(hud = %id, "hud withdrawn");
                self.events.push(HudEvent::Withdrawn { hud: id });
            }
            None => debug!(hud = %id, "dismiss ignored: unknown hud"),
        }
    }

    fn finish_dismissal(&mut self, id: HudId) {
        let Some(active) = self.active.take_if(|active| active.id == id) else {
            return;
        };
        self.surfaces.hide(active.surface);
        if let Some(hud) = self.huds.remove(&id) {
            for content in hud.into_contents() {
                self.factory.release(content);
            }
        }
        info!(hud = %id, queued = self.pending.len(), "hud dismissed");
        self.events.push(HudEvent::Dismissed { hud: id });

        if let Some(next) = self.pending.pop_front() {
            self.display(next);
        }
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Replaces the content of `id`, keeping its action.
    ///
    /// # Panics
    /// Panics if `id` was already dismissed.
    pub fn set_content(&mut self, id: HudId, spec: ContentSpec, animated: bool) {
        let Some(hud) = self.huds.get_mut(&id) else {
            self.misuse(id, "set content");
        };
        let kind = spec.kind();
        let content = self.factory.build(&spec, hud.style());
        let interrupted = hud.install_content(spec, content, animated, &mut self.tokens);
        let animated = hud.transitioning().is_some();

        if let Some(completed) = interrupted {
            self.record_completion(id, completed);
        }
        debug!(hud = %id, ?kind, animated, "content changed");
        self.events.push(HudEvent::ContentChanged {
            hud: id,
            kind,
            animated,
        });
        self.release_pending_contents(id);
    }

    /// Shows `text` without buttons.
    pub fn set_text(&mut self, id: HudId, text: impl Into<String>, animated: bool) {
        self.set_content(id, ContentSpec::message(text), animated);
    }

    /// Replaces text, buttons and action together.
    pub fn set_message(
        &mut self,
        id: HudId,
        text: impl Into<String>,
        buttons: Vec<String>,
        action: Option<Action>,
        animated: bool,
    ) {
        let Some(hud) = self.huds.get_mut(&id) else {
            self.misuse(id, "set message");
        };
        hud.set_action(action);
        self.set_content(
            id,
            ContentSpec::Message {
                text: text.into(),
                buttons,
            },
            animated,
        );
    }

    pub fn set_loading(&mut self, id: HudId, animated: bool) {
        self.set_content(id, ContentSpec::Loader, animated);
    }

    pub fn set_custom(&mut self, id: HudId, tag: u32, payload: impl Into<String>, animated: bool) {
        self.set_content(
            id,
            ContentSpec::Custom {
                tag,
                payload: payload.into(),
            },
            animated,
        );
    }

    /// Registers the callback consulted for cover taps.
    pub fn on_background_tap(
        &mut self,
        id: HudId,
        callback: impl FnMut(&mut ActionContext) -> bool + 'static,
    ) {
        let Some(hud) = self.huds.get_mut(&id) else {
            self.misuse(id, "set background tap callback");
        };
        hud.set_cover_action(Some(Box::new(callback)));
    }

    pub fn set_tap_policy(&mut self, id: HudId, policy: TapPolicy) {
        let Some(hud) = self.huds.get_mut(&id) else {
            self.misuse(id, "set tap policy");
        };
        hud.set_tap_policy(policy);
    }

    fn misuse(&self, id: HudId, operation: &str) -> ! {
        if self.ids.issued(id) {
            panic!("{operation} on {id} after it was dismissed");
        }
        panic!("{operation} on {id}, which was not issued by this manager");
    }

    fn apply(&mut self, id: HudId, command: HudCommand) {
        match command {
            HudCommand::SetContent { spec, animated } => self.set_content(id, spec, animated),
            HudCommand::SetMessage {
                text,
                buttons,
                action,
                animated,
            } => self.set_message(id, text, buttons, action, animated),
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Routes a tap on the active HUD.
    ///
    /// Cover taps must pass the tap policy. The element's action decides
    /// whether the HUD dismisses; without an action it does. Returns whether
    /// a dismissal was requested.
    pub fn tap(&mut self, id: HudId, element: Element) -> bool {
        let accepted = self.is_active(id)
            && self.huds.get(&id).is_some_and(|hud| {
                let in_range = match element {
                    Element::Cover => hud
                        .content_kind()
                        .is_some_and(|kind| hud.tap_policy().allows(kind)),
                    Element::Button(index) => {
                        index < hud.spec().map_or(0, ContentSpec::button_count)
                    }
                };
                in_range && hud.is_visible() && !hud.is_dismissing()
            });
        if !accepted {
            debug!(hud = %id, ?element, "tap ignored");
            if self.huds.contains_key(&id) {
                self.events.push(HudEvent::TapIgnored { hud: id, element });
            }
            return false;
        }

        let mut ctx = ActionContext::new(id, element);
        let proceed = self
            .huds
            .get_mut(&id)
            .is_some_and(|hud| hud.run_action(&mut ctx));
        for command in ctx.into_commands() {
            self.apply(id, command);
        }

        if proceed {
            self.dismiss(id);
        } else {
            debug!(hud = %id, ?element, "dismiss vetoed");
            self.events.push(HudEvent::DismissVetoed { hud: id, element });
        }
        proceed
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Advances the active HUD's animation to `now`.
    ///
    /// Returns whether an animation is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(id) = self.active.as_ref().map(|active| active.id) else {
            return false;
        };
        let completed = self
            .huds
            .get_mut(&id)
            .and_then(|hud| hud.advance(now, &mut self.tokens));
        if let Some(completed) = completed {
            self.record_completion(id, completed);
        }
        self.release_pending_contents(id);

        self.active
            .as_ref()
            .and_then(|active| self.huds.get(&active.id))
            .is_some_and(Hud::is_animating)
    }

    fn record_completion(&mut self, id: HudId, completed: Completed) {
        debug!(hud = %id, token = completed.token.0, kind = ?completed.kind, "transition completed");
        match completed.kind {
            TransitionKind::Entrance => self.events.push(HudEvent::EntranceFinished { hud: id }),
            TransitionKind::ContentSwap => self.events.push(HudEvent::SwapFinished { hud: id }),
            TransitionKind::Exit => self.finish_dismissal(id),
        }
    }

    fn release_pending_contents(&mut self, id: HudId) {
        if let Some(hud) = self.huds.get_mut(&id) {
            for content in hud.take_released() {
                self.factory.release(content);
            }
        }
    }

    // ------------------------------------------------------------------
    // Configuration & introspection
    // ------------------------------------------------------------------

    pub fn config(&self) -> &HudConfig {
        &self.config
    }

    /// Replaces the appearance for HUDs created from now on.
    pub fn set_config(&mut self, config: HudConfig) {
        self.config = config;
    }

    pub fn active_id(&self) -> Option<HudId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn active(&self) -> Option<&Hud<F::Content>> {
        self.active_id().and_then(|id| self.huds.get(&id))
    }

    pub fn active_surface(&self) -> Option<&S::Surface> {
        self.active.as_ref().map(|active| &active.surface)
    }

    pub fn hud(&self, id: HudId) -> Option<&Hud<F::Content>> {
        self.huds.get(&id)
    }

    pub fn pending(&self) -> impl Iterator<Item = HudId> + '_ {
        self.pending.iter().copied()
    }

    pub fn is_active(&self, id: HudId) -> bool {
        self.active_id() == Some(id)
    }

    pub fn is_queued(&self, id: HudId) -> bool {
        self.pending.contains(&id)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }

    /// Number of HUDs currently visible; never more than one.
    pub fn visible_count(&self) -> usize {
        self.huds.values().filter(|hud| hud.is_visible()).count()
    }

    pub fn drain_events(&mut self) -> Vec<HudEvent> {
        mem::take(&mut self.events)
    }

    pub fn surfaces(&self) -> &S {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut S {
        &mut self.surfaces
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }
}

/// Overrides collected by [`HudBuilder`].
struct HudParts {
    spec: ContentSpec,
    action: Option<Action>,
    cover_action: Option<Action>,
    tap_policy: TapPolicy,
    strategy: Option<Box<dyn AnimationStrategy>>,
    backing: Option<Backing>,
}

/// Builds a HUD with per-instance animation, tap policy and callbacks.
///
/// Content is set before the HUD is registered, so a HUD is never on screen
/// without content.
#[must_use = "a HUD is only created by `show` or `create`"]
pub struct HudBuilder<'m, S: SurfaceProvider, F: ContentFactory> {
    manager: &'m mut PresentationManager<S, F>,
    parts: HudParts,
}

impl<S: SurfaceProvider, F: ContentFactory> HudBuilder<'_, S, F> {
    pub fn action(mut self, action: impl FnMut(&mut ActionContext) -> bool + 'static) -> Self {
        self.parts.action = Some(Box::new(action));
        self
    }

    pub fn on_background_tap(
        mut self,
        callback: impl FnMut(&mut ActionContext) -> bool + 'static,
    ) -> Self {
        self.parts.cover_action = Some(Box::new(callback));
        self
    }

    pub fn tap_policy(mut self, policy: TapPolicy) -> Self {
        self.parts.tap_policy = policy;
        self
    }

    pub fn animation(mut self, strategy: impl AnimationStrategy + 'static) -> Self {
        self.parts.strategy = Some(Box::new(strategy));
        self
    }

    pub fn backing(mut self, backing: Backing) -> Self {
        self.parts.backing = Some(backing);
        self
    }

    /// Creates the HUD without registering it; see [`PresentationManager::display`].
    pub fn create(self) -> HudId {
        self.manager.construct(self.parts)
    }

    /// Creates the HUD and displays or queues it.
    pub fn show(self) -> HudId {
        let id = self.manager.construct(self.parts);
        self.manager.display(id);
        id
    }
}
