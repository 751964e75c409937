//! Scene painter
//!
//! Full repaint, back to front: background, grid, circles, alignment guides,
//! cards in store order, selection overlay. The same code paints the live
//! canvas and the high-density export; only the surface scale differs.

use std::collections::HashMap;

use tiny_skia::Pixmap;

use crate::color::{HexColor, Opacity};
use crate::constants::card::INITIALS_WORDS;
use crate::constants::paint::*;
use crate::constants::palette;
use crate::geometry::{compute_layout, CardBounds, CircleId, VennLayout};
use crate::store::Card;
use crate::types::{CardId, Point};
use crate::workspace::Workspace;

use super::surface::{Fill, Surface};
use super::template::{Pattern, TemplateStyle};
use super::text::TextRenderer;

/// Decoded logos keyed by company name
pub type LogoCache = HashMap<String, Pixmap>;

pub struct Scene<'a> {
    pub workspace: &'a Workspace,
    pub hovered: Option<CardId>,
    pub logos: &'a LogoCache,
    /// Labels for the Top, Left and Right circles
    pub circle_labels: &'a [String; 3],
}

/// First letter of each of the first words, uppercased ("Acme Corp" -> "AC")
pub fn initials(company: &str) -> String {
    company
        .split_whitespace()
        .take(INITIALS_WORDS)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

fn color(argb: u32) -> HexColor {
    HexColor::from_argb32(argb)
}

pub struct Painter<'a> {
    text: Option<&'a TextRenderer>,
}

impl<'a> Painter<'a> {
    /// Without a text renderer, initials and labels are skipped
    pub fn new(text: Option<&'a TextRenderer>) -> Self {
        Self { text }
    }

    pub fn paint(&self, surface: &mut Surface, scene: &Scene) {
        let settings = &scene.workspace.settings;
        let (width, height) = surface.logical_size();

        surface.fill(color(palette::BACKGROUND));

        if settings.show_grid {
            self.paint_grid(surface, settings.grid_size, width, height);
        }

        if settings.show_circles {
            let layout = compute_layout(width, height, settings.circle_radius, settings.circle_spacing);
            self.paint_circles(surface, &layout, Opacity::from_percent(settings.circle_opacity), scene.circle_labels);
        }

        let selection = scene.workspace.selection();
        let store = &scene.workspace.store;
        if settings.show_guides && !selection.is_empty() {
            let guide = color(palette::GUIDE);
            for card in selection.ids().iter().filter_map(|id| store.get(*id)) {
                surface.line(Point::new(card.x, 0.0), Point::new(card.x, height), 1.0, guide, Some(GUIDE_DASH));
                surface.line(Point::new(0.0, card.y), Point::new(width, card.y), 1.0, guide, Some(GUIDE_DASH));
            }
        }

        for card in store.cards() {
            let selected = selection.contains(card.id);
            let hovered = scene.hovered == Some(card.id);
            self.paint_card(surface, card, settings.card_size, selected, hovered, scene.logos);
        }

        for card in selection.ids().iter().filter_map(|id| store.get(*id)) {
            paint_selection(surface, card, settings.card_size);
        }
    }

    fn paint_grid(&self, surface: &mut Surface, grid: f32, width: f32, height: f32) {
        if grid <= 0.0 {
            return;
        }
        let line = color(palette::GRID_LINE);
        let mut x = 0.0;
        while x <= width {
            surface.line(Point::new(x, 0.0), Point::new(x, height), 1.0, line, None);
            x += grid;
        }
        let mut y = 0.0;
        while y <= height {
            surface.line(Point::new(0.0, y), Point::new(width, y), 1.0, line, None);
            y += grid;
        }
    }

    fn paint_circles(&self, surface: &mut Surface, layout: &VennLayout, opacity: Opacity, labels: &[String; 3]) {
        if layout.radius <= 0.0 {
            return;
        }
        let stroke = color(palette::CIRCLE_STROKE).fade(opacity.factor());
        let label_color = color(palette::CIRCLE_LABEL);
        for (id, label) in CircleId::ALL.into_iter().zip(labels) {
            let center = layout.center(id);
            surface.stroke_circle(center, layout.radius, CIRCLE_STROKE_WIDTH, stroke, None);

            // Labels sit on the outer side of each circle
            let inset = CIRCLE_LABEL_PX * 1.5;
            let anchor = match id {
                CircleId::Top => Point::new(center.x, center.y - layout.radius + inset),
                CircleId::Left | CircleId::Right => Point::new(center.x, center.y + layout.radius - inset),
            };
            self.draw_text_centered(surface, label, anchor, CIRCLE_LABEL_PX, label_color);
        }
    }

    fn paint_card(&self, surface: &mut Surface, card: &Card, size: f32, selected: bool, hovered: bool, logos: &LogoCache) {
        let style = card.template.style();
        let bounds = CardBounds::around(card.x, card.y, size);
        let radius = (size * CORNER_RADIUS_FACTOR).max(MIN_CORNER_RADIUS);

        let intensity = if selected {
            SHADOW_SELECTED
        } else if hovered {
            SHADOW_HOVERED
        } else {
            1.0
        };
        surface.shadow(
            bounds,
            radius,
            style.shadow.blur * intensity,
            (0.0, style.shadow.offset * intensity),
            style.shadow.color,
        );

        surface.fill_rounded_rect(bounds, radius, Fill::Diagonal(style.background.0, style.background.1));
        paint_pattern(surface, &style, bounds, radius);
        if style.gloss {
            let white = HexColor::rgb(0xFF, 0xFF, 0xFF);
            surface.fill_rounded_rect(bounds, radius, Fill::Diagonal(white.fade(0.18), white.fade(0.0)));
        }

        let (border, border_width) = if selected {
            (color(palette::SELECTED), BORDER_SELECTED)
        } else if hovered {
            (color(palette::HOVERED), BORDER_HOVERED)
        } else {
            (style.border, BORDER_DEFAULT)
        };
        let dash = card.is_portfolio.then_some(PORTFOLIO_DASH);
        surface.stroke_rounded_rect(bounds, radius, border_width, border, dash);

        if style.highlight {
            let white = HexColor::rgb(0xFF, 0xFF, 0xFF).fade(0.4);
            surface.stroke_rounded_rect(bounds.inflate(-2.0), (radius - 1.0).max(0.0), 1.0, white, None);
        }

        match logos.get(&card.company).filter(|_| card.logo_loaded) {
            Some(logo) => {
                surface.blit_image(logo, CardBounds::around(card.x, card.y, size * LOGO_FACTOR));
            }
            None => {
                let px = (size * INITIALS_FACTOR).max(MIN_INITIALS_PX);
                self.draw_text_centered(surface, &initials(&card.company), card.position(), px, style.text);
            }
        }

        let dot_radius = (size * INDICATOR_FACTOR).max(MIN_INDICATOR_RADIUS);
        let dot = Point::new(bounds.right() - INDICATOR_INSET, bounds.top() + INDICATOR_INSET);
        surface.fill_circle(dot, dot_radius, card.category.color());
        surface.stroke_circle(dot, dot_radius, 2.0, color(palette::INDICATOR_RING), None);
    }

    fn draw_text_centered(&self, surface: &mut Surface, text: &str, center: Point, px: f32, fg: HexColor) {
        let Some(renderer) = self.text else {
            return;
        };
        let scale = surface.scale();
        let mask = renderer.render(text, px * scale);
        if mask.is_empty() {
            return;
        }
        let x = (center.x * scale - mask.width as f32 / 2.0).round() as i32;
        let y = (center.y * scale - mask.height as f32 / 2.0).round() as i32;
        surface.blit_coverage(&mask, x, y, fg);
    }
}

/// Faint decorative pattern, kept inside the rounded corners
fn paint_pattern(surface: &mut Surface, style: &TemplateStyle, bounds: CardBounds, radius: f32) {
    const SPACING: f32 = 8.0;
    let ink = style.pattern_color.fade(0.12);
    let inner = bounds.inflate(-radius * 0.3);
    let (x0, y0, x1, y1) = (inner.left(), inner.top(), inner.right(), inner.bottom());

    match style.pattern {
        Pattern::None => {}
        Pattern::Grid => {
            let mut offset = SPACING;
            while offset < inner.width {
                surface.line(Point::new(x0 + offset, y0), Point::new(x0 + offset, y1), 0.8, ink, None);
                surface.line(Point::new(x0, y0 + offset), Point::new(x1, y0 + offset), 0.8, ink, None);
                offset += SPACING;
            }
        }
        Pattern::Dots => {
            let mut dy = SPACING;
            while dy < inner.height {
                let mut dx = SPACING;
                while dx < inner.width {
                    surface.fill_circle(Point::new(x0 + dx, y0 + dy), 1.5, ink);
                    dx += SPACING;
                }
                dy += SPACING;
            }
        }
        Pattern::Lines => {
            // 45° hatching clipped to the inner square
            let mut offset = -inner.height + SPACING;
            while offset < inner.width {
                let start = Point::new(x0 + offset.max(0.0), y0 + (-offset).max(0.0));
                let length = (x1 - start.x).min(y1 - start.y);
                if length > 0.0 {
                    surface.line(start, Point::new(start.x + length, start.y + length), 0.8, ink, None);
                }
                offset += SPACING;
            }
        }
        Pattern::Circuit => {
            let (w, h) = (inner.width, inner.height);
            let at = |fx: f32, fy: f32| Point::new(x0 + w * fx, y0 + h * fy);
            let traces = [
                (at(0.25, 0.25), at(0.75, 0.25)),
                (at(0.75, 0.25), at(0.75, 0.75)),
                (at(0.75, 0.75), at(0.25, 0.75)),
                (at(0.25, 0.75), at(0.25, 0.5)),
                (at(0.25, 0.5), at(0.5, 0.5)),
            ];
            for (from, to) in traces {
                surface.line(from, to, 1.0, ink, None);
                surface.fill_circle(to, 1.5, ink);
            }
        }
    }
}

/// Dashed frame plus corner and edge handles around a selected card
fn paint_selection(surface: &mut Surface, card: &Card, size: f32) {
    let padding = (size * 0.1).max(6.0);
    let frame = CardBounds::around(card.x, card.y, size).inflate(padding);
    let accent = color(palette::SELECTED);
    surface.stroke_rounded_rect(frame, 8.0, BORDER_SELECTED, accent, Some(SELECTION_DASH));

    let (cx, cy) = (card.x, card.y);
    let handles = [
        (frame.left(), frame.top()),
        (frame.right(), frame.top()),
        (frame.right(), frame.bottom()),
        (frame.left(), frame.bottom()),
        (cx, frame.top()),
        (frame.right(), cy),
        (cx, frame.bottom()),
        (frame.left(), cy),
    ];
    let ring = color(palette::INDICATOR_RING);
    for (x, y) in handles {
        let center = Point::new(x, y);
        surface.fill_circle(center, 4.0, accent);
        surface.stroke_circle(center, 4.0, 2.0, ring, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewCard;

    fn labels() -> [String; 3] {
        ["HRIS".into(), "Payroll".into(), "Expense".into()]
    }

    fn render(workspace: &Workspace, hovered: Option<CardId>) -> Surface {
        let logos = LogoCache::new();
        let labels = labels();
        let scene = Scene {
            workspace,
            hovered,
            logos: &logos,
            circle_labels: &labels,
        };
        let mut surface = Surface::new(400, 300, 1.0).unwrap();
        Painter::new(None).paint(&mut surface, &scene);
        surface
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Acme Corp"), "AC");
        assert_eq!(initials("  culture   amp  inc "), "CA");
        assert_eq!(initials("ADP"), "A");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_empty_scene_is_background() {
        let mut workspace = Workspace::default();
        workspace.settings.show_circles = false;
        let surface = render(&workspace, None);
        let bg = color(palette::BACKGROUND);
        assert_eq!(surface.pixel(10, 10), Some([bg.red(), bg.green(), bg.blue(), 255]));
        assert_eq!(surface.pixel(399, 299), Some([bg.red(), bg.green(), bg.blue(), 255]));
    }

    #[test]
    fn test_card_is_painted_at_its_center() {
        let mut workspace = Workspace::default();
        workspace.settings.show_circles = false;
        workspace.store.create(NewCard::new("Acme Corp").at(100.0, 100.0));
        let surface = render(&workspace, None);

        let bg = color(palette::BACKGROUND);
        let center = surface.pixel(100, 100).unwrap();
        assert_ne!(center, [bg.red(), bg.green(), bg.blue(), 255]);
        // Far corner of the canvas stays untouched
        assert_eq!(surface.pixel(390, 290), Some([bg.red(), bg.green(), bg.blue(), 255]));
    }

    #[test]
    fn test_selection_overlay_and_hover_change_output() {
        let mut workspace = Workspace::default();
        workspace.settings.show_circles = false;
        workspace.settings.show_guides = false;
        let id = workspace.store.create(NewCard::new("Acme Corp").at(150.0, 150.0)).id;

        let plain = render(&workspace, None);
        let hovered = render(&workspace, Some(id));
        workspace.select_only(id);
        let selected = render(&workspace, None);

        assert_ne!(plain.pixels(), hovered.pixels());
        assert_ne!(plain.pixels(), selected.pixels());
        // Top-left selection handle: card edge 110, padding 8
        let handle = selected.pixel(102, 102).unwrap();
        let accent = color(palette::SELECTED);
        assert_eq!(handle[..3], [accent.red(), accent.green(), accent.blue()]);
    }

    #[test]
    fn test_circles_follow_visibility_toggle() {
        let mut workspace = Workspace::default();
        workspace.settings.circle_opacity = 100;
        let with_circles = render(&workspace, None);
        workspace.settings.show_circles = false;
        let without = render(&workspace, None);
        assert_ne!(with_circles.pixels(), without.pixels());
    }

    #[test]
    fn test_loaded_logo_is_drawn() {
        let mut workspace = Workspace::default();
        workspace.settings.show_circles = false;
        let id = workspace.store.create(NewCard::new("Acme Corp").at(100.0, 100.0)).id;
        workspace.store.mark_logo_loaded(id, "https://logo.clearbit.com/acmecorp.com");

        let mut logo = Pixmap::new(1, 1).unwrap();
        logo.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        let mut logos = LogoCache::new();
        logos.insert("Acme Corp".into(), logo);
        let labels = labels();
        let scene = Scene {
            workspace: &workspace,
            hovered: None,
            logos: &logos,
            circle_labels: &labels,
        };
        let mut surface = Surface::new(200, 200, 1.0).unwrap();
        Painter::new(None).paint(&mut surface, &scene);
        assert_eq!(surface.pixel(100, 100), Some([255, 0, 0, 255]));
    }
}
