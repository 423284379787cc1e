//! Opaque handles issued by the presentation manager.

use std::fmt;

use serde::Serialize;

/// Handle to one HUD presentation request.
///
/// Returned by every factory entry point and accepted by every instance
/// operation of [`PresentationManager`](crate::PresentationManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HudId(pub u64);

impl fmt::Display for HudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hud#{}", self.0)
    }
}

/// Identity of one started transition; completes exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnimationToken(pub u64);

#[derive(Debug, Default)]
pub struct HudSeq {
    next: u64,
}

impl HudSeq {
    pub fn next_id(&mut self) -> HudId {
        let id = HudId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Whether `id` was handed out by this sequence.
    pub fn issued(&self, id: HudId) -> bool {
        id.0 < self.next
    }
}

#[derive(Debug, Default)]
pub struct TokenSeq {
    next: u64,
}

impl TokenSeq {
    pub fn next_token(&mut self) -> AnimationToken {
        let token = AnimationToken(self.next);
        self.next = self.next.wrapping_add(1);
        token
    }
}
