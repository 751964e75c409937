//! ARGB color helpers shared by the painter, templates and GUI

/// 32-bit color stored as 0xAARRGGBB (straight, not premultiplied)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor(u32);

impl HexColor {
    pub const fn from_argb32(argb: u32) -> Self {
        Self(argb)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading '#'
    /// 6-digit input gets full opacity
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Self(0xFF00_0000 | value)),
            8 => Some(Self(value)),
            _ => None,
        }
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Scale the alpha channel by `factor` (clamped to 0.0..=1.0)
    pub fn fade(self, factor: f32) -> Self {
        let alpha = (self.alpha() as f32 * factor.clamp(0.0, 1.0)).round() as u32;
        Self((alpha << 24) | (self.0 & 0x00FF_FFFF))
    }

    pub fn to_egui(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.red(), self.green(), self.blue(), self.alpha())
    }
}

/// Opacity expressed as a whole percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opacity(u8);

impl Opacity {
    pub fn from_percent(percent: u8) -> Self {
        Self(percent.min(100))
    }

    pub fn factor(self) -> f32 {
        self.0 as f32 / 100.0
    }
}
