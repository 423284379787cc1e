//! In-memory collaborators that record every call.
//!
//! Used by headless runs (`hud simulate`) and tests in place of a real
//! platform.

use std::collections::BTreeSet;

use crate::content::{ContentFactory, ContentStyle};
use crate::ids::HudId;
use crate::surface::{SurfaceProvider, SurfaceSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Created(HudId),
    Shown(HudId),
    Hidden(HudId),
}

#[derive(Debug)]
pub struct RecordedSurface {
    pub hud: HudId,
    pub spec: SurfaceSpec,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct RecordingSurfaces {
    calls: Vec<SurfaceCall>,
    shown: Vec<HudId>,
}

impl RecordingSurfaces {
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// HUDs whose surface is currently shown.
    pub fn shown(&self) -> &[HudId] {
        &self.shown
    }

    pub fn created_count(&self) -> usize {
        self.count(|call| matches!(call, SurfaceCall::Created(_)))
    }

    pub fn hidden_count(&self) -> usize {
        self.count(|call| matches!(call, SurfaceCall::Hidden(_)))
    }

    fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }
}

impl SurfaceProvider for RecordingSurfaces {
    type Surface = RecordedSurface;

    fn create_topmost_surface(&mut self, spec: &SurfaceSpec) -> RecordedSurface {
        self.calls.push(SurfaceCall::Created(spec.hud));
        RecordedSurface {
            hud: spec.hud,
            spec: spec.clone(),
            visible: false,
        }
    }

    fn show(&mut self, surface: &mut RecordedSurface) {
        surface.visible = true;
        self.calls.push(SurfaceCall::Shown(surface.hud));
        self.shown.push(surface.hud);
    }

    fn hide(&mut self, surface: RecordedSurface) {
        self.calls.push(SurfaceCall::Hidden(surface.hud));
        self.shown.retain(|hud| *hud != surface.hud);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedContent {
    pub serial: u64,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct RecordingFactory {
    next: u64,
    live: BTreeSet<u64>,
    released: Vec<u64>,
}

impl RecordingFactory {
    fn make(&mut self, label: String) -> RecordedContent {
        let serial = self.next;
        self.next += 1;
        self.live.insert(serial);
        RecordedContent { serial, label }
    }

    /// Handles produced and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn released(&self) -> &[u64] {
        &self.released
    }
}

impl ContentFactory for RecordingFactory {
    type Content = RecordedContent;

    fn loader(&mut self, _style: &ContentStyle) -> RecordedContent {
        self.make("loader".to_string())
    }

    fn message(&mut self, text: &str, buttons: &[String], _style: &ContentStyle) -> RecordedContent {
        if buttons.is_empty() {
            self.make(text.to_string())
        } else {
            self.make(format!("{text} [{}]", buttons.join("|")))
        }
    }

    fn custom(&mut self, tag: u32, payload: &str, _style: &ContentStyle) -> RecordedContent {
        self.make(format!("custom:{tag}:{payload}"))
    }

    fn release(&mut self, content: RecordedContent) {
        assert!(
            self.live.remove(&content.serial),
            "content {} released twice",
            content.serial
        );
        self.released.push(content.serial);
    }
}
