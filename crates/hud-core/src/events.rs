//! Observable transitions recorded by the presentation manager.

use std::fmt;

use serde::Serialize;

use crate::content::{ContentKind, Element};
use crate::ids::HudId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum HudEvent {
    /// Another HUD is showing; this one waits at `position` (1-based).
    Queued { hud: HudId, position: usize },
    /// The surface was created and shown; the entrance started.
    Displayed { hud: HudId, kind: ContentKind },
    EntranceFinished { hud: HudId },
    ContentChanged {
        hud: HudId,
        kind: ContentKind,
        animated: bool,
    },
    SwapFinished { hud: HudId },
    /// Dismissal accepted; `deferred` when it waits for the entrance.
    DismissRequested { hud: HudId, deferred: bool },
    DismissVetoed { hud: HudId, element: Element },
    TapIgnored { hud: HudId, element: Element },
    /// Exit finished and the surface was torn down.
    Dismissed { hud: HudId },
    /// Removed before it was ever shown.
    Withdrawn { hud: HudId },
}

impl HudEvent {
    pub fn hud(&self) -> HudId {
        match self {
            HudEvent::Queued { hud, .. }
            | HudEvent::Displayed { hud, .. }
            | HudEvent::EntranceFinished { hud }
            | HudEvent::ContentChanged { hud, .. }
            | HudEvent::SwapFinished { hud }
            | HudEvent::DismissRequested { hud, .. }
            | HudEvent::DismissVetoed { hud, .. }
            | HudEvent::TapIgnored { hud, .. }
            | HudEvent::Dismissed { hud }
            | HudEvent::Withdrawn { hud } => *hud,
        }
    }
}

impl fmt::Display for HudEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HudEvent::Queued { hud, position } => write!(f, "{hud} queued at {position}"),
            HudEvent::Displayed { hud, kind } => write!(f, "{hud} displayed ({kind:?})"),
            HudEvent::EntranceFinished { hud } => write!(f, "{hud} entrance finished"),
            HudEvent::ContentChanged {
                hud,
                kind,
                animated,
            } => {
                let how = if *animated { "animated" } else { "immediate" };
                write!(f, "{hud} content -> {kind:?} ({how})")
            }
            HudEvent::SwapFinished { hud } => write!(f, "{hud} content swap finished"),
            HudEvent::DismissRequested { hud, deferred } => {
                if *deferred {
                    write!(f, "{hud} dismiss requested (after entrance)")
                } else {
                    write!(f, "{hud} dismiss requested")
                }
            }
            HudEvent::DismissVetoed { hud, element } => {
                write!(f, "{hud} dismiss vetoed by {element:?} action")
            }
            HudEvent::TapIgnored { hud, element } => write!(f, "{hud} ignored tap on {element:?}"),
            HudEvent::Dismissed { hud } => write!(f, "{hud} dismissed"),
            HudEvent::Withdrawn { hud } => write!(f, "{hud} withdrawn from queue"),
        }
    }
}
