//! Overlay HUD presentation core.
//!
//! A HUD is a modal surface above all other content showing a loader, a
//! message, or a message with action buttons. [`PresentationManager`] keeps
//! at most one HUD on screen and queues the rest in arrival order; each
//! [`Hud`] owns its content and runs its entrance, exit and content swap
//! animations.
//!
//! The host platform plugs in through two traits: [`SurfaceProvider`] for the
//! topmost container and [`ContentFactory`] for rendering content. The host
//! drives time by calling [`PresentationManager::tick`] each frame and
//! reports taps through [`PresentationManager::tap`].

pub mod animation;
pub mod config;
pub mod content;
pub mod events;
pub mod hud;
pub mod ids;
pub mod logging;
pub mod manager;
pub mod policy;
pub mod recording;
pub mod surface;

pub use animation::{AnimationStrategy, AnimationStyle, Fade, SlideUp, Visuals};
pub use config::{Backing, Color, FontSpec, HudConfig, StatusBar};
pub use content::{COVER_TAG, ContentFactory, ContentKind, ContentSpec, ContentStyle, Element};
pub use events::HudEvent;
pub use hud::{Action, ActionContext, Hud, HudPhase};
pub use ids::HudId;
pub use manager::{HudBuilder, PresentationManager};
pub use policy::TapPolicy;
pub use surface::{SurfaceProvider, SurfaceSpec};
