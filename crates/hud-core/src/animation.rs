//! Timed transitions and the strategies that turn their progress into visuals.
//!
//! A [`Transition`] is started without knowing the current time; it is
//! anchored to the clock by the first tick that observes it. This keeps every
//! state-changing operation of the manager free of a `now` parameter while the
//! host's frame loop stays the single source of time.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::ids::AnimationToken;

/// Reference duration for entrance, exit and content swap transitions.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

impl Easing {
    /// Maps linear time in `[0, 1]` onto eased progress in `[0, 1]`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Entrance,
    Exit,
    ContentSwap,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub token: AnimationToken,
    pub kind: TransitionKind,
    pub duration: Duration,
    pub easing: Easing,
    started_at: Option<Instant>,
}

impl Transition {
    pub fn new(token: AnimationToken, kind: TransitionKind, duration: Duration) -> Self {
        Self {
            token,
            kind,
            duration,
            easing: Easing::default(),
            started_at: None,
        }
    }

    /// Pins the transition to the clock. Later calls keep the first anchor.
    pub fn anchor(&mut self, now: Instant) {
        self.started_at.get_or_insert(now);
    }

    pub fn is_anchored(&self) -> bool {
        self.started_at.is_some()
    }

    fn linear_progress(&self, now: Instant) -> f32 {
        let Some(start) = self.started_at else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Eased progress at `now`; zero until anchored.
    pub fn progress(&self, now: Instant) -> f32 {
        self.easing.apply(self.linear_progress(now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.started_at
            .is_some_and(|start| now.saturating_duration_since(start) >= self.duration)
    }
}

/// Animated properties of the active HUD, read by renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visuals {
    /// Opacity of the whole surface.
    pub surface_alpha: f32,
    /// Opacity of the cover tint.
    pub cover_alpha: f32,
    /// Strength of the dim/blur backing (unused when the HUD is not backed).
    pub backing_alpha: f32,
    /// Opacity of the content, independent of the surface.
    pub content_alpha: f32,
    /// Downward displacement of the content, as a fraction of its height.
    pub content_offset: f32,
    /// Cross-fade position while a content swap runs: the previous content is
    /// drawn at `1 - p` and the current content at `p`.
    pub swap_progress: Option<f32>,
}

impl Default for Visuals {
    fn default() -> Self {
        Self {
            surface_alpha: 1.0,
            cover_alpha: 1.0,
            backing_alpha: 1.0,
            content_alpha: 1.0,
            content_offset: 0.0,
            swap_progress: None,
        }
    }
}

impl Visuals {
    /// Effective opacity of the current content.
    pub fn current_alpha(&self) -> f32 {
        self.surface_alpha * self.content_alpha * self.swap_progress.unwrap_or(1.0)
    }

    /// Effective opacity of the content being swapped out.
    pub fn previous_alpha(&self) -> f32 {
        self.swap_progress
            .map_or(0.0, |p| self.surface_alpha * self.content_alpha * (1.0 - p))
    }
}

/// Entrance/exit behaviour injected per HUD.
pub trait AnimationStrategy: fmt::Debug {
    /// Applies the entrance at eased `progress` (0 = hidden, 1 = settled).
    fn entrance(&self, visuals: &mut Visuals, progress: f32, backed: bool);

    /// Applies the exit at eased `progress` (0 = settled, 1 = gone).
    fn exit(&self, visuals: &mut Visuals, progress: f32, backed: bool) {
        self.entrance(visuals, 1.0 - progress, backed);
    }

    /// Whether the configured dim/blur backing applies to HUDs using this strategy.
    fn uses_backing(&self) -> bool {
        true
    }
}

/// Opacity fade of the surface, or of the backing and content when backed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fade;

impl AnimationStrategy for Fade {
    fn entrance(&self, visuals: &mut Visuals, progress: f32, backed: bool) {
        visuals.cover_alpha = 1.0;
        visuals.content_offset = 0.0;
        if backed {
            visuals.surface_alpha = 1.0;
            visuals.backing_alpha = progress;
            visuals.content_alpha = progress;
        } else {
            visuals.surface_alpha = progress;
            visuals.backing_alpha = 0.0;
            visuals.content_alpha = 1.0;
        }
    }
}

/// Cover tint fades in while the content slides up from below.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideUp;

impl AnimationStrategy for SlideUp {
    fn entrance(&self, visuals: &mut Visuals, progress: f32, _backed: bool) {
        visuals.surface_alpha = 1.0;
        visuals.backing_alpha = 0.0;
        visuals.content_alpha = 1.0;
        visuals.cover_alpha = progress;
        visuals.content_offset = 1.0 - progress;
    }

    fn uses_backing(&self) -> bool {
        false
    }
}

/// Configurable selector for the default strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationStyle {
    #[default]
    Fade,
    SlideUp,
}

impl AnimationStyle {
    pub fn strategy(self) -> Box<dyn AnimationStrategy> {
        match self {
            AnimationStyle::Fade => Box::new(Fade),
            AnimationStyle::SlideUp => Box::new(SlideUp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(duration_ms: u64) -> Transition {
        Transition::new(
            AnimationToken(0),
            TransitionKind::Entrance,
            Duration::from_millis(duration_ms),
        )
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInOut] {
            assert!(easing.apply(0.0).abs() < f32::EPSILON);
            assert!((easing.apply(1.0) - 1.0).abs() < f32::EPSILON);
            assert!((easing.apply(2.0) - 1.0).abs() < f32::EPSILON);
        }
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unanchored_transition_has_no_progress() {
        let t = transition(300);
        let now = Instant::now();
        assert!(t.progress(now).abs() < f32::EPSILON);
        assert!(!t.is_finished(now));
    }

    #[test]
    fn test_transition_finishes_after_duration() {
        let mut t = transition(300);
        let start = Instant::now();
        t.anchor(start);
        assert!(!t.is_finished(start + Duration::from_millis(299)));
        assert!(t.is_finished(start + Duration::from_millis(300)));
        assert!((t.progress(start + Duration::from_secs(5)) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_anchor_keeps_first_instant() {
        let mut t = transition(100);
        let start = Instant::now();
        t.anchor(start);
        t.anchor(start + Duration::from_millis(90));
        assert!(t.is_finished(start + Duration::from_millis(100)));
    }

    #[test]
    fn test_zero_duration_finishes_on_first_tick() {
        let mut t = transition(0);
        let now = Instant::now();
        t.anchor(now);
        assert!(t.is_finished(now));
        assert!((t.progress(now) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_plain_fade_animates_surface_only() {
        let mut v = Visuals::default();
        Fade.entrance(&mut v, 0.25, false);
        assert!((v.surface_alpha - 0.25).abs() < f32::EPSILON);
        assert!((v.content_alpha - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_backed_fade_keeps_surface_opaque() {
        let mut v = Visuals::default();
        Fade.entrance(&mut v, 0.25, true);
        assert!((v.surface_alpha - 1.0).abs() < f32::EPSILON);
        assert!((v.backing_alpha - 0.25).abs() < f32::EPSILON);
        assert!((v.content_alpha - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_exit_mirrors_entrance() {
        let mut v = Visuals::default();
        Fade.exit(&mut v, 1.0, false);
        assert!(v.surface_alpha.abs() < f32::EPSILON);
        SlideUp.exit(&mut v, 1.0, false);
        assert!(v.cover_alpha.abs() < f32::EPSILON);
        assert!((v.content_offset - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_crossfade_alphas_sum_to_one() {
        let v = Visuals {
            swap_progress: Some(0.3),
            ..Visuals::default()
        };
        assert!((v.current_alpha() + v.previous_alpha() - 1.0).abs() < 1e-6);
    }
}
