//! Overlay layers painted above the host screen.

use hud_core::config::{Backing, Color, StatusBar};
use hud_core::{HudId, SurfaceProvider, SurfaceSpec};
use tracing::debug;

/// Cover tint used when the configuration leaves it unset.
pub const DEFAULT_COVER: Color = Color::rgba(0, 0, 0, 150);

/// One overlay layer. Its lifetime is owned by the presentation manager.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub hud: HudId,
    pub cover: Color,
    pub backing: Backing,
    pub status_bar: StatusBar,
    pub visible: bool,
}

/// Creates overlay layers and tracks which one the screen shows.
#[derive(Debug, Default)]
pub struct TerminalSurfaces {
    created: usize,
    hidden: usize,
    shown: Option<HudId>,
    status_bar: StatusBar,
}

impl TerminalSurfaces {
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden
    }

    pub fn shown(&self) -> Option<HudId> {
        self.shown
    }

    /// Status-line appearance requested by the shown layer.
    pub fn status_bar(&self) -> StatusBar {
        self.status_bar
    }
}

impl SurfaceProvider for TerminalSurfaces {
    type Surface = OverlayLayer;

    fn create_topmost_surface(&mut self, spec: &SurfaceSpec) -> OverlayLayer {
        self.created += 1;
        OverlayLayer {
            hud: spec.hud,
            cover: spec.cover_color.unwrap_or(DEFAULT_COVER),
            backing: spec.backing.clone(),
            status_bar: spec.status_bar,
            visible: false,
        }
    }

    fn show(&mut self, layer: &mut OverlayLayer) {
        layer.visible = true;
        if let Some(previous) = self.shown.replace(layer.hud) {
            debug!(%previous, hud = %layer.hud, "layer replaced while shown");
        }
        self.status_bar = layer.status_bar;
    }

    fn hide(&mut self, layer: OverlayLayer) {
        self.hidden += 1;
        if self.shown == Some(layer.hud) {
            self.shown = None;
            self.status_bar = StatusBar::Default;
        }
    }
}
