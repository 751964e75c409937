//! Visual style table for card templates

use crate::color::HexColor;
use crate::types::Template;

/// Decorative pattern painted faintly over a card background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    None,
    Dots,
    Grid,
    Lines,
    Circuit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub color: HexColor,
    pub blur: f32,
    /// Downward offset in logical pixels
    pub offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateStyle {
    /// Diagonal background gradient, top-left to bottom-right
    pub background: (HexColor, HexColor),
    pub border: HexColor,
    pub text: HexColor,
    pub shadow: ShadowStyle,
    pub pattern: Pattern,
    pub pattern_color: HexColor,
    /// Thin white inner outline
    pub highlight: bool,
    /// White sheen fading toward the bottom-right
    pub gloss: bool,
}

const WHITE: HexColor = HexColor::rgb(0xFF, 0xFF, 0xFF);

impl Template {
    pub fn style(self) -> TemplateStyle {
        match self {
            Template::Executive => TemplateStyle {
                background: (HexColor::rgb(0x1F, 0x29, 0x37), HexColor::rgb(0x11, 0x18, 0x27)),
                border: HexColor::rgb(0x37, 0x41, 0x51),
                text: WHITE,
                shadow: ShadowStyle {
                    color: HexColor::from_argb32(0x66667EEA),
                    blur: 35.0,
                    offset: 0.0,
                },
                pattern: Pattern::Grid,
                pattern_color: WHITE,
                highlight: true,
                gloss: true,
            },
            Template::Modern => TemplateStyle {
                background: (HexColor::rgb(0x66, 0x7E, 0xEA), HexColor::rgb(0x76, 0x4B, 0xA2)),
                border: HexColor::rgb(0x5A, 0x67, 0xD8),
                text: WHITE,
                shadow: ShadowStyle {
                    color: HexColor::from_argb32(0x40667EEA),
                    blur: 20.0,
                    offset: 8.0,
                },
                pattern: Pattern::Dots,
                pattern_color: WHITE,
                highlight: false,
                gloss: false,
            },
            Template::Classic => TemplateStyle {
                background: (HexColor::rgb(0xF8, 0xFA, 0xFC), HexColor::rgb(0xE2, 0xE8, 0xF0)),
                border: HexColor::rgb(0x94, 0xA3, 0xB8),
                text: HexColor::rgb(0x1E, 0x29, 0x3B),
                shadow: ShadowStyle {
                    color: HexColor::from_argb32(0x4064748B),
                    blur: 15.0,
                    offset: 6.0,
                },
                pattern: Pattern::Lines,
                pattern_color: HexColor::rgb(0x33, 0x41, 0x55),
                highlight: false,
                gloss: false,
            },
            Template::Corporate => TemplateStyle {
                background: (HexColor::rgb(0x1E, 0x40, 0xAF), HexColor::rgb(0x1E, 0x3A, 0x8A)),
                border: HexColor::rgb(0x3B, 0x82, 0xF6),
                text: WHITE,
                shadow: ShadowStyle {
                    color: HexColor::from_argb32(0x4D1E40AF),
                    blur: 16.0,
                    offset: 8.0,
                },
                pattern: Pattern::None,
                pattern_color: WHITE,
                highlight: true,
                gloss: false,
            },
            Template::Neon => TemplateStyle {
                background: (HexColor::rgb(0x0F, 0x17, 0x2A), HexColor::rgb(0x02, 0x06, 0x17)),
                border: HexColor::rgb(0x00, 0xFF, 0xFF),
                text: HexColor::rgb(0x00, 0xFF, 0xFF),
                shadow: ShadowStyle {
                    color: HexColor::from_argb32(0x8000FFFF),
                    blur: 30.0,
                    offset: 0.0,
                },
                pattern: Pattern::Circuit,
                pattern_color: HexColor::rgb(0x00, 0xFF, 0xFF),
                highlight: true,
                gloss: false,
            },
        }
    }
}
