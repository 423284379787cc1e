//! Frame rendering: the host screen first, then the active HUD on top.
//!
//! Terminal cells have no alpha channel, so every translucent effect is a
//! colour blend against what is already in the buffer:
//! - the cover tints host cells by `cover.a * cover_alpha * surface_alpha`
//! - a `dim` backing darkens, a `blur` backing also washes text into its
//!   background
//! - content blends from the covered backdrop towards its own colours

use std::time::Duration;

use hud_core::config::{Backing, Color, StatusBar};
use hud_core::{Element, HudId, PresentationManager, Visuals};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color as TermColor, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::content::{ContentLayout, TerminalContent, TerminalContentFactory, spinner_frame};
use crate::surface::{OverlayLayer, TerminalSurfaces};

pub type TerminalManager = PresentationManager<TerminalSurfaces, TerminalContentFactory>;

pub const HOST_BG: Color = Color::rgb(22, 24, 33);
pub const HOST_FG: Color = Color::rgb(171, 178, 191);
const ACCENT: Color = Color::rgb(97, 175, 239);
const PANEL_BG: Color = Color::rgb(40, 44, 52);

const DIM_STRENGTH: f32 = 0.6;
const BLUR_WASH: f32 = 0.85;
const BLUR_DIM: f32 = 0.3;

/// What the host application shows under the HUD.
#[derive(Debug, Clone, Copy)]
pub struct HostView<'a> {
    pub title: &'a str,
    pub hint: &'a str,
    pub lines: &'a [String],
}

/// Interactive areas of the last frame, for mouse hit testing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMap {
    hud: Option<HudId>,
    content: Option<Rect>,
    buttons: Vec<(usize, Rect)>,
}

impl HitMap {
    pub fn hud(&self) -> Option<HudId> {
        self.hud
    }

    /// Resolves a click. Clicks on the content body outside any button hit
    /// nothing; clicks anywhere else on screen hit the cover.
    pub fn hit(&self, column: u16, row: u16) -> Option<(HudId, Element)> {
        let hud = self.hud?;
        let position = Position::new(column, row);
        if let Some((index, _)) = self
            .buttons
            .iter()
            .find(|(_, rect)| rect.contains(position))
        {
            return Some((hud, Element::Button(*index)));
        }
        if self.content.is_some_and(|rect| rect.contains(position)) {
            return None;
        }
        Some((hud, Element::Cover))
    }
}

fn term(color: Color) -> TermColor {
    TermColor::Rgb(color.r, color.g, color.b)
}

fn from_term(color: TermColor, fallback: Color) -> Color {
    match color {
        TermColor::Rgb(r, g, b) => Color::rgb(r, g, b),
        TermColor::Black => Color::BLACK,
        TermColor::White => Color::WHITE,
        _ => fallback,
    }
}

/// Renders one frame and returns its hit map.
///
/// `elapsed` drives the spinner.
pub fn render(
    frame: &mut Frame,
    manager: &TerminalManager,
    host: &HostView<'_>,
    elapsed: Duration,
) -> HitMap {
    let area = frame.area();
    render_host(frame, area, host, manager.surfaces().status_bar());

    let (Some(hud), Some(layer)) = (manager.active(), manager.active_surface()) else {
        return HitMap::default();
    };
    let visuals = hud.visuals();
    let buf = frame.buffer_mut();
    apply_cover(buf, area, layer, visuals);

    let Some(current) = hud.content() else {
        return HitMap {
            hud: Some(hud.id()),
            ..HitMap::default()
        };
    };
    let backdrop = covered(HOST_BG, layer, visuals);
    let max_width = area.width.saturating_sub(4);
    let current_layout = current.layout(max_width);
    let previous = hud
        .previous_content()
        .map(|content| (content, content.layout(max_width)));

    let (width, height) = previous.as_ref().map_or(
        (current_layout.width, current_layout.height),
        |(_, layout)| {
            (
                current_layout.width.max(layout.width),
                current_layout.height.max(layout.height),
            )
        },
    );
    let offset = (visuals.content_offset.clamp(0.0, 1.0) * f32::from(height)).round() as u16;
    let panel = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        (area.y + area.height.saturating_sub(height) / 2).saturating_add(offset),
        width,
        height,
    );

    let panel_alpha = visuals.surface_alpha * visuals.content_alpha;
    draw_panel(buf, area, panel, backdrop, current.tint(), panel_alpha);
    if let Some((content, layout)) = &previous {
        draw_body(
            buf,
            area,
            panel,
            content,
            layout,
            Blend::new(backdrop, visuals.previous_alpha()),
            elapsed,
        );
    }
    draw_body(
        buf,
        area,
        panel,
        current,
        &current_layout,
        Blend::new(backdrop, visuals.current_alpha()),
        elapsed,
    );
    if let Some(title) = &current_layout.title {
        let blend = Blend::new(backdrop, panel_alpha);
        put(
            buf,
            area,
            panel.x.saturating_add(2),
            panel.y,
            &format!(" {title} "),
            blend.color(current.tint()),
            Modifier::BOLD,
        );
    }

    let body = inner(panel);
    HitMap {
        hud: Some(hud.id()),
        content: Some(panel.intersection(area)),
        buttons: current_layout
            .buttons
            .iter()
            .map(|slot| {
                let rect = Rect::new(
                    body.x.saturating_add(slot.x),
                    body.y.saturating_add(slot.y),
                    slot.width,
                    1,
                );
                (slot.index, rect.intersection(area))
            })
            .filter(|(_, rect)| !rect.is_empty())
            .collect(),
    }
}

fn render_host(frame: &mut Frame, area: Rect, host: &HostView<'_>, status_bar: StatusBar) {
    frame.render_widget(
        Block::default().style(Style::default().bg(term(HOST_BG)).fg(term(HOST_FG))),
        area,
    );

    let status = Rect::new(area.x, area.y, area.width, area.height.min(1));
    let status_style = match status_bar {
        StatusBar::Default => Some(Style::default().fg(term(HOST_BG)).bg(term(ACCENT))),
        StatusBar::Light => Some(Style::default().fg(term(Color::BLACK)).bg(term(Color::WHITE))),
        StatusBar::Dark => Some(Style::default().fg(term(Color::WHITE)).bg(term(Color::BLACK))),
        StatusBar::Hidden => None,
    };
    if let Some(style) = status_style {
        let hint_width = u16::try_from(host.hint.chars().count()).unwrap_or(0);
        let title_width = u16::try_from(host.title.chars().count()).unwrap_or(u16::MAX);
        let gap = area
            .width
            .saturating_sub(hint_width)
            .saturating_sub(title_width.saturating_add(1));
        let line = Line::from(vec![
            Span::styled(format!(" {}", host.title), style.add_modifier(Modifier::BOLD)),
            Span::styled(" ".repeat(usize::from(gap)), style),
            Span::styled(host.hint, style),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), status);
    }

    if area.height > 2 {
        let body = Rect::new(
            area.x + 2,
            area.y + 2,
            area.width.saturating_sub(4),
            area.height - 2,
        );
        let lines: Vec<Line> = host
            .lines
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();
        frame.render_widget(Paragraph::new(lines), body);
    }
}

/// Colour a host cell of colour `color` takes under the cover and backing.
fn covered(color: Color, layer: &OverlayLayer, visuals: &Visuals) -> Color {
    let backing = visuals.backing_alpha * visuals.surface_alpha;
    let backed = match layer.backing {
        Backing::None => color,
        Backing::Dim => color.mix(Color::BLACK, DIM_STRENGTH * backing),
        Backing::Blur(_) => color.mix(Color::BLACK, BLUR_DIM * backing),
    };
    let strength = f32::from(layer.cover.a) / 255.0 * visuals.cover_alpha * visuals.surface_alpha;
    backed.mix(layer.cover, strength)
}

fn apply_cover(buf: &mut Buffer, area: Rect, layer: &OverlayLayer, visuals: &Visuals) {
    let wash = match layer.backing {
        Backing::Blur(_) => BLUR_WASH * visuals.backing_alpha * visuals.surface_alpha,
        _ => 0.0,
    };
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let Some(cell) = buf.cell_mut((x, y)) else {
                continue;
            };
            let bg = from_term(cell.bg, HOST_BG);
            let fg = from_term(cell.fg, HOST_FG).mix(bg, wash);
            cell.set_bg(term(covered(bg, layer, visuals)));
            cell.set_fg(term(covered(fg, layer, visuals)));
        }
    }
}

/// Blends content colours from the backdrop by `alpha`.
#[derive(Debug, Clone, Copy)]
struct Blend {
    backdrop: Color,
    alpha: f32,
}

impl Blend {
    fn new(backdrop: Color, alpha: f32) -> Self {
        Self { backdrop, alpha }
    }

    fn color(self, color: Color) -> TermColor {
        term(self.backdrop.mix(color, self.alpha))
    }

    fn is_invisible(self) -> bool {
        self.alpha <= f32::EPSILON
    }
}

fn inner(panel: Rect) -> Rect {
    Rect::new(
        panel.x.saturating_add(2),
        panel.y.saturating_add(1),
        panel.width.saturating_sub(4),
        panel.height.saturating_sub(2),
    )
}

fn draw_panel(buf: &mut Buffer, area: Rect, panel: Rect, backdrop: Color, tint: Color, alpha: f32) {
    let blend = Blend::new(backdrop, alpha);
    let bg = term(backdrop.mix(PANEL_BG, alpha));
    let border = blend.color(tint.mix(PANEL_BG, 0.5));
    let right = panel.right().saturating_sub(1);
    let bottom = panel.bottom().saturating_sub(1);

    for y in panel.top()..panel.bottom() {
        for x in panel.left()..panel.right() {
            if !area.contains(Position::new(x, y)) {
                continue;
            }
            let Some(cell) = buf.cell_mut((x, y)) else {
                continue;
            };
            let symbol = match (x == panel.x, x == right, y == panel.y, y == bottom) {
                (true, _, true, _) => "╭",
                (_, true, true, _) => "╮",
                (true, _, _, true) => "╰",
                (_, true, _, true) => "╯",
                (_, _, true, _) | (_, _, _, true) => "─",
                (true, _, _, _) | (_, true, _, _) => "│",
                _ => " ",
            };
            cell.set_symbol(symbol)
                .set_bg(bg)
                .set_fg(border)
                .set_style(Style::default().remove_modifier(Modifier::all()));
        }
    }
}

fn draw_body(
    buf: &mut Buffer,
    area: Rect,
    panel: Rect,
    content: &TerminalContent,
    layout: &ContentLayout,
    blend: Blend,
    elapsed: Duration,
) {
    if blend.is_invisible() {
        return;
    }
    let body = inner(panel);
    let fg = blend.color(content.tint());

    if let TerminalContent::Spinner { .. } = content {
        let x = body.x.saturating_add(body.width.saturating_sub(1) / 2);
        put(buf, area, x, body.y, spinner_frame(elapsed), fg, Modifier::empty());
        return;
    }

    for (row, line) in layout.lines.iter().enumerate() {
        let Ok(row) = u16::try_from(row) else { break };
        put(
            buf,
            area,
            body.x,
            body.y.saturating_add(row),
            line,
            fg,
            Modifier::empty(),
        );
    }
    for slot in &layout.buttons {
        put(
            buf,
            area,
            body.x.saturating_add(slot.x),
            body.y.saturating_add(slot.y),
            &slot.label,
            fg,
            Modifier::BOLD,
        );
    }
}

/// Writes the non-blank glyphs of `text`, keeping the cells' backgrounds.
fn put(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, fg: TermColor, modifier: Modifier) {
    let mut column = x;
    for ch in text.chars() {
        let width = u16::try_from(ch.width().unwrap_or(0)).unwrap_or(0);
        if !ch.is_whitespace()
            && area.contains(Position::new(column, y))
            && let Some(cell) = buf.cell_mut((column, y))
        {
            cell.set_char(ch)
                .set_fg(fg)
                .set_style(Style::default().add_modifier(modifier));
        }
        column = column.saturating_add(width);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use hud_core::config::HudConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    const HOST: HostView<'static> = HostView {
        title: "hud",
        hint: "q quit ",
        lines: &[],
    };

    fn manager(config: HudConfig) -> TerminalManager {
        PresentationManager::new(
            TerminalSurfaces::default(),
            TerminalContentFactory::default(),
            config,
        )
    }

    fn settle(manager: &mut TerminalManager) {
        let mut now = Instant::now();
        manager.tick(now);
        for _ in 0..50 {
            now += Duration::from_millis(50);
            if !manager.tick(now) {
                return;
            }
        }
    }

    fn draw(manager: &TerminalManager) -> (Terminal<TestBackend>, HitMap) {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let mut hits = HitMap::default();
        terminal
            .draw(|frame| hits = render(frame, manager, &HOST, Duration::ZERO))
            .unwrap();
        (terminal, hits)
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.width)
            .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol().to_string()))
            .collect()
    }

    #[test]
    fn test_idle_screen_has_no_hits() {
        let manager = manager(HudConfig::default());
        let (terminal, hits) = draw(&manager);

        assert_eq!(hits.hud(), None);
        assert_eq!(hits.hit(10, 10), None);
        let cell = terminal.backend().buffer().cell((0, 10)).unwrap();
        assert_eq!(cell.bg, term(HOST_BG));
    }

    #[test]
    fn test_buttons_are_hit_tested() {
        let mut manager = manager(HudConfig::default());
        let hud = manager.show_message("Delete?", vec!["Ok".into(), "Cancel".into()], None);
        settle(&mut manager);
        let (terminal, hits) = draw(&manager);

        let (index, rect) = hits.buttons[1];
        assert_eq!(index, 1);
        assert_eq!(hits.hit(rect.x, rect.y), Some((hud, Element::Button(1))));
        assert!(row_text(&terminal, rect.y).contains("[ Cancel ]"));

        let content = hits.content.unwrap();
        assert_eq!(hits.hit(content.x, content.y), None);
        assert_eq!(hits.hit(0, 19), Some((hud, Element::Cover)));
    }

    #[test]
    fn test_wrapped_buttons_stay_inside_panel() {
        let mut manager = manager(HudConfig::default());
        let labels: Vec<String> = (1..=6).map(|i| format!("Option {i}")).collect();
        let hud = manager.show_message("Pick one", labels, None);
        settle(&mut manager);
        let (_, hits) = draw(&manager);

        let content = hits.content.unwrap();
        assert_eq!(hits.buttons.len(), 6);
        for (index, rect) in &hits.buttons {
            assert!(content.contains(Position::new(rect.x, rect.y)));
            assert!(rect.right() <= content.right() - 2, "button {index} crosses the border");
            assert_eq!(hits.hit(rect.x, rect.y), Some((hud, Element::Button(*index))));
        }
        assert_eq!(hits.buttons[3].1.y, hits.buttons[0].1.y + 1);
    }

    #[test]
    fn test_cover_tints_host() {
        let mut manager = manager(HudConfig::default());
        manager.show_loading();
        settle(&mut manager);
        let (terminal, _) = draw(&manager);

        let cell = terminal.backend().buffer().cell((0, 19)).unwrap();
        assert_ne!(cell.bg, term(HOST_BG));
    }

    #[test]
    fn test_spinner_glyph_is_drawn() {
        let mut manager = manager(HudConfig::default());
        manager.show_loading();
        settle(&mut manager);
        let (terminal, _) = draw(&manager);

        let screen: String = (0..20).map(|y| row_text(&terminal, y)).collect();
        assert!(screen.contains(spinner_frame(Duration::ZERO)));
    }

    #[test]
    fn test_hidden_status_bar_while_shown() {
        let mut manager = manager(HudConfig {
            status_bar: StatusBar::Hidden,
            ..HudConfig::default()
        });
        let (terminal, _) = draw(&manager);
        assert!(row_text(&terminal, 0).contains("hud"));

        manager.show_loading();
        let (terminal, _) = draw(&manager);
        assert!(!row_text(&terminal, 0).contains("hud"));
    }

    #[test]
    fn test_exited_hud_is_not_drawn() {
        let mut manager = manager(HudConfig::default());
        let hud = manager.show_message("bye", Vec::new(), None);
        settle(&mut manager);
        manager.dismiss(hud);
        settle(&mut manager);

        let (terminal, hits) = draw(&manager);
        assert_eq!(hits.hud(), None);
        let screen: String = (0..20).map(|y| row_text(&terminal, y)).collect();
        assert!(!screen.contains("bye"));
    }
}
