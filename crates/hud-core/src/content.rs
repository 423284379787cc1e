//! Content kinds and the factory contract that renders them.

use serde::Serialize;

use crate::config::{Color, FontSpec};

/// Sentinel tag carried by the cover, distinct from every button index.
pub const COVER_TAG: isize = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Loader,
    Message,
    MessageWithActions,
    Custom(u32),
}

impl ContentKind {
    /// Whether the default tap policy lets a cover tap dismiss this content.
    pub fn is_cover_dismissable(self) -> bool {
        matches!(self, ContentKind::Message | ContentKind::MessageWithActions)
    }
}

/// What to show: content kind plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    Loader,
    Message { text: String, buttons: Vec<String> },
    Custom { tag: u32, payload: String },
}

impl ContentSpec {
    pub fn message(text: impl Into<String>) -> Self {
        ContentSpec::Message {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn message_with_buttons<I, S>(text: impl Into<String>, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentSpec::Message {
            text: text.into(),
            buttons: buttons.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentSpec::Loader => ContentKind::Loader,
            ContentSpec::Message { buttons, .. } if buttons.is_empty() => ContentKind::Message,
            ContentSpec::Message { .. } => ContentKind::MessageWithActions,
            ContentSpec::Custom { tag, .. } => ContentKind::Custom(*tag),
        }
    }

    /// Number of tappable buttons the content carries.
    pub fn button_count(&self) -> usize {
        match self {
            ContentSpec::Message { buttons, .. } => buttons.len(),
            _ => 0,
        }
    }
}

/// Per-HUD snapshot of the appearance content is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStyle {
    pub tint: Option<Color>,
    pub font: Option<FontSpec>,
    pub button_font: Option<FontSpec>,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
}

/// The interacted element reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Element {
    Cover,
    Button(usize),
}

impl Element {
    /// Ordinal tag: the button index, or [`COVER_TAG`] for the cover.
    pub fn tag(self) -> isize {
        match self {
            Element::Cover => COVER_TAG,
            Element::Button(index) => index as isize,
        }
    }

    pub fn from_tag(tag: isize) -> Self {
        usize::try_from(tag).map_or(Element::Cover, Element::Button)
    }
}

/// Produces renderable handles for each content kind.
///
/// The manager calls [`release`](ContentFactory::release) exactly once for
/// every handle it obtained, when that content is destroyed.
pub trait ContentFactory {
    type Content;

    fn loader(&mut self, style: &ContentStyle) -> Self::Content;

    fn message(&mut self, text: &str, buttons: &[String], style: &ContentStyle) -> Self::Content;

    fn custom(&mut self, tag: u32, payload: &str, style: &ContentStyle) -> Self::Content;

    fn release(&mut self, content: Self::Content) {
        drop(content);
    }

    /// Builds the handle for `spec`.
    fn build(&mut self, spec: &ContentSpec, style: &ContentStyle) -> Self::Content {
        match spec {
            ContentSpec::Loader => self.loader(style),
            ContentSpec::Message { text, buttons } => self.message(text, buttons, style),
            ContentSpec::Custom { tag, payload } => self.custom(*tag, payload, style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_depends_on_buttons() {
        assert_eq!(ContentSpec::message("hi").kind(), ContentKind::Message);
        assert_eq!(
            ContentSpec::message_with_buttons("hi", ["Ok"]).kind(),
            ContentKind::MessageWithActions
        );
        assert_eq!(
            ContentSpec::Custom {
                tag: 3,
                payload: String::new()
            }
            .kind(),
            ContentKind::Custom(3)
        );
    }

    #[test]
    fn test_element_tags() {
        assert_eq!(Element::Cover.tag(), COVER_TAG);
        assert_eq!(Element::Button(2).tag(), 2);
        assert_eq!(Element::from_tag(-1), Element::Cover);
        assert_eq!(Element::from_tag(-7), Element::Cover);
        assert_eq!(Element::from_tag(0), Element::Button(0));
    }

    #[test]
    fn test_only_messages_are_cover_dismissable() {
        assert!(ContentKind::Message.is_cover_dismissable());
        assert!(ContentKind::MessageWithActions.is_cover_dismissable());
        assert!(!ContentKind::Loader.is_cover_dismissable());
        assert!(!ContentKind::Custom(0).is_cover_dismissable());
    }
}
