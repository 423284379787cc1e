//! Surface provider contract.
//!
//! A surface is the platform container a HUD occupies above all other
//! content. The manager owns at most one at a time.

use crate::config::{Backing, Color, StatusBar};
use crate::ids::HudId;

/// What the provider needs to build the topmost surface for one HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub hud: HudId,
    pub cover_color: Option<Color>,
    pub backing: Backing,
    pub status_bar: StatusBar,
}

pub trait SurfaceProvider {
    type Surface;

    fn create_topmost_surface(&mut self, spec: &SurfaceSpec) -> Self::Surface;

    fn show(&mut self, surface: &mut Self::Surface);

    /// Hides and tears down the surface.
    fn hide(&mut self, surface: Self::Surface);
}
