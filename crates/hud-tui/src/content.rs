//! Terminal content: spinner, wrapped message with a button row, and
//! titled custom content, laid out in terminal cells.

use std::mem;
use std::ops::Range;
use std::time::Duration;

use hud_core::config::Color;
use hud_core::{ContentFactory, ContentStyle};
use tracing::trace;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Braille spinner, one frame per [`SPINNER_INTERVAL`].
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// Configured spacings are in points; one terminal cell is this many points.
const POINTS_PER_CELL: f32 = 10.0;
const DEFAULT_TINT: Color = Color::WHITE;

/// Box border plus one column of padding on each side.
const H_CHROME: u16 = 4;
/// Box border top and bottom.
const V_CHROME: u16 = 2;

pub fn spinner_frame(elapsed: Duration) -> &'static str {
    let step = elapsed.as_millis() / SPINNER_INTERVAL.as_millis();
    let index = usize::try_from(step % SPINNER_FRAMES.len() as u128).unwrap_or(0);
    SPINNER_FRAMES[index]
}

fn cells(points: f32) -> u16 {
    let cells = (points / POINTS_PER_CELL).round();
    if cells <= 0.0 {
        0
    } else if cells >= f32::from(u16::MAX) {
        u16::MAX
    } else {
        cells as u16
    }
}

fn text_width(s: &str) -> u16 {
    u16::try_from(UnicodeWidthStr::width(s)).unwrap_or(u16::MAX)
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalContent {
    Spinner {
        tint: Color,
    },
    Message {
        text: String,
        buttons: Vec<String>,
        tint: Color,
        button_spacing: u16,
        row_spacing: u16,
    },
    Custom {
        tag: u32,
        title: String,
        body: String,
        tint: Color,
    },
}

/// A button label placed relative to the content box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSlot {
    pub index: usize,
    pub label: String,
    pub x: u16,
    pub y: u16,
    pub width: u16,
}

/// Content laid out for a given maximum width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayout {
    /// Outer size including the border.
    pub width: u16,
    pub height: u16,
    pub title: Option<String>,
    /// Body lines, positioned inside the border and padding.
    pub lines: Vec<String>,
    pub buttons: Vec<ButtonSlot>,
}

impl TerminalContent {
    pub fn tint(&self) -> Color {
        match self {
            TerminalContent::Spinner { tint }
            | TerminalContent::Message { tint, .. }
            | TerminalContent::Custom { tint, .. } => *tint,
        }
    }

    /// Lays the content out within `max_width` outer columns.
    ///
    /// The spinner glyph is not part of the layout; the renderer draws the
    /// frame for the current time into the single body line.
    pub fn layout(&self, max_width: u16) -> ContentLayout {
        let inner_max = max_width.saturating_sub(H_CHROME).max(1);
        match self {
            TerminalContent::Spinner { .. } => ContentLayout {
                width: H_CHROME + 1,
                height: V_CHROME + 1,
                title: None,
                lines: vec![" ".to_string()],
                buttons: Vec::new(),
            },
            TerminalContent::Message {
                text,
                buttons,
                button_spacing,
                row_spacing,
                ..
            } => {
                let lines = wrap(text, inner_max);
                let labels: Vec<String> = buttons
                    .iter()
                    .map(|b| truncate(&format!("[ {b} ]"), inner_max))
                    .collect();
                let widths: Vec<u16> = labels.iter().map(|l| text_width(l)).collect();
                let rows = pack_rows(&widths, *button_spacing, inner_max);
                let row_width = rows.iter().map(|(_, width)| *width).max().unwrap_or(0);
                let body_width = lines.iter().map(|l| text_width(l)).max().unwrap_or(0);
                let inner_width = body_width.max(row_width).min(inner_max).max(1);

                let body_rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
                let mut labels = labels.into_iter();
                let mut slots = Vec::new();
                let mut y = body_rows.saturating_add(*row_spacing);
                for (range, width) in rows {
                    let mut x = inner_width.saturating_sub(width) / 2;
                    for (index, label) in range.zip(labels.by_ref()) {
                        let width = widths[index];
                        slots.push(ButtonSlot {
                            index,
                            label,
                            x,
                            y,
                            width,
                        });
                        x = x.saturating_add(width).saturating_add(*button_spacing);
                    }
                    y = y.saturating_add(1);
                }
                let height = if slots.is_empty() { body_rows } else { y };

                ContentLayout {
                    width: inner_width.saturating_add(H_CHROME),
                    height: height.saturating_add(V_CHROME),
                    title: None,
                    lines,
                    buttons: slots,
                }
            }
            TerminalContent::Custom { title, body, .. } => {
                let lines = wrap(body, inner_max);
                let width = lines
                    .iter()
                    .map(|l| text_width(l))
                    .chain([text_width(title).saturating_add(2)])
                    .max()
                    .unwrap_or(1)
                    .min(inner_max);
                ContentLayout {
                    width: width.saturating_add(H_CHROME),
                    height: u16::try_from(lines.len())
                        .unwrap_or(u16::MAX)
                        .saturating_add(V_CHROME),
                    title: Some(truncate(title, inner_max.saturating_sub(2))),
                    lines,
                    buttons: Vec::new(),
                }
            }
        }
    }
}

/// Packs consecutive button widths into rows no wider than `max_width`.
///
/// Returns each row's index range and its width including spacing.
fn pack_rows(widths: &[u16], spacing: u16, max_width: u16) -> Vec<(Range<usize>, u16)> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut row_width = 0u16;
    for (index, &width) in widths.iter().enumerate() {
        if index > start {
            let extended = row_width.saturating_add(spacing).saturating_add(width);
            if extended <= max_width {
                row_width = extended;
                continue;
            }
            rows.push((start..index, row_width));
            start = index;
        }
        row_width = width;
    }
    if start < widths.len() {
        rows.push((start..widths.len(), row_width));
    }
    rows
}

/// Cuts `text` to at most `width` display columns.
fn truncate(text: &str, width: u16) -> String {
    let width = usize::from(width);
    let mut used = 0;
    text.chars()
        .take_while(|ch| {
            used += ch.width().unwrap_or(0);
            used <= width
        })
        .collect()
}

/// Greedy word wrap by display width; words longer than `width` are split.
fn wrap(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = UnicodeWidthStr::width(word);
            let sep = usize::from(!line.is_empty());
            if line_width + sep + word_width <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += sep + word_width;
                continue;
            }
            if !line.is_empty() {
                lines.push(mem::take(&mut line));
                line_width = 0;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width + ch_width > width && !line.is_empty() {
                    lines.push(mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += ch_width;
            }
        }
        lines.push(line);
    }
    lines
}

/// Builds [`TerminalContent`] and counts live handles.
#[derive(Debug, Default)]
pub struct TerminalContentFactory {
    built: usize,
    live: usize,
}

impl TerminalContentFactory {
    pub fn built_count(&self) -> usize {
        self.built
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    fn track(&mut self, content: TerminalContent) -> TerminalContent {
        self.built += 1;
        self.live += 1;
        content
    }
}

impl ContentFactory for TerminalContentFactory {
    type Content = TerminalContent;

    fn loader(&mut self, style: &ContentStyle) -> TerminalContent {
        self.track(TerminalContent::Spinner {
            tint: style.tint.unwrap_or(DEFAULT_TINT),
        })
    }

    fn message(&mut self, text: &str, buttons: &[String], style: &ContentStyle) -> TerminalContent {
        self.track(TerminalContent::Message {
            text: text.to_string(),
            buttons: buttons.to_vec(),
            tint: style.tint.unwrap_or(DEFAULT_TINT),
            button_spacing: cells(style.horizontal_spacing).max(1),
            row_spacing: cells(style.vertical_spacing),
        })
    }

    fn custom(&mut self, tag: u32, payload: &str, style: &ContentStyle) -> TerminalContent {
        let (title, body) = payload.split_once('\n').unwrap_or((payload, ""));
        self.track(TerminalContent::Custom {
            tag,
            title: title.to_string(),
            body: body.to_string(),
            tint: style.tint.unwrap_or(DEFAULT_TINT),
        })
    }

    fn release(&mut self, content: TerminalContent) {
        trace!(?content, "content released");
        self.live = self.live.saturating_sub(1);
    }
}
