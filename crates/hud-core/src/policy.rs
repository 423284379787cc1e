//! Background tap policy.

use std::fmt;
use std::rc::Rc;

use crate::content::ContentKind;

/// Decides whether a tap on the cover is recognised for the current content.
///
/// A recognised tap still goes through the action callback, which may veto
/// the dismissal.
#[derive(Clone, Default)]
pub enum TapPolicy {
    /// Only message content is dismissable by a cover tap.
    #[default]
    ContentDefault,
    Always,
    Never,
    Custom(Rc<dyn Fn(ContentKind) -> bool>),
}

impl TapPolicy {
    pub fn custom(f: impl Fn(ContentKind) -> bool + 'static) -> Self {
        TapPolicy::Custom(Rc::new(f))
    }

    pub fn allows(&self, kind: ContentKind) -> bool {
        match self {
            TapPolicy::ContentDefault => kind.is_cover_dismissable(),
            TapPolicy::Always => true,
            TapPolicy::Never => false,
            TapPolicy::Custom(f) => f(kind),
        }
    }
}

impl fmt::Debug for TapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapPolicy::ContentDefault => f.write_str("ContentDefault"),
            TapPolicy::Always => f.write_str("Always"),
            TapPolicy::Never => f.write_str("Never"),
            TapPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
