//! Core value types shared across the editor

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::HexColor;
use crate::constants::view::*;

/// Store-assigned card identifier
pub type CardId = u64;

/// Canvas-space point (logical pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Business category of a company; drives the indicator dot color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Technology,
    Finance,
    Healthcare,
    Education,
    Retail,
    Manufacturing,
    Services,
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Finance,
        Category::Healthcare,
        Category::Education,
        Category::Retail,
        Category::Manufacturing,
        Category::Services,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Finance => "finance",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Retail => "retail",
            Category::Manufacturing => "manufacturing",
            Category::Services => "services",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Finance => "Finance",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Retail => "Retail",
            Category::Manufacturing => "Manufacturing",
            Category::Services => "Services",
            Category::Other => "Other",
        }
    }

    pub fn color(self) -> HexColor {
        HexColor::from_argb32(match self {
            Category::Technology => 0xFF3B82F6,
            Category::Finance => 0xFF10B981,
            Category::Healthcare => 0xFFEF4444,
            Category::Education => 0xFF8B5CF6,
            Category::Retail => 0xFFF59E0B,
            Category::Manufacturing => 0xFF6B7280,
            Category::Services => 0xFF06B6D4,
            Category::Other => 0xFF84CC16,
        })
    }
}

/// Named card style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Modern,
    Classic,
    Corporate,
    Neon,
    #[default]
    #[serde(other)]
    Executive,
}

impl Template {
    pub const ALL: [Template; 5] = [
        Template::Executive,
        Template::Modern,
        Template::Classic,
        Template::Corporate,
        Template::Neon,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Template::Executive => "Executive",
            Template::Modern => "Modern",
            Template::Classic => "Classic",
            Template::Corporate => "Corporate",
            Template::Neon => "Neon",
        }
    }
}

/// Canvas-wide view settings, independent of any card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub card_size: f32,
    pub circle_radius: f32,
    pub circle_spacing: f32,
    /// Circle stroke opacity in percent
    pub circle_opacity: u8,
    pub grid_size: f32,
    pub show_circles: bool,
    pub show_grid: bool,
    pub show_guides: bool,
    pub snap_to_grid: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            card_size: DEFAULT_CARD_SIZE,
            circle_radius: DEFAULT_CIRCLE_RADIUS,
            circle_spacing: DEFAULT_CIRCLE_SPACING,
            circle_opacity: DEFAULT_CIRCLE_OPACITY,
            grid_size: DEFAULT_GRID_SIZE,
            show_circles: true,
            show_grid: false,
            show_guides: true,
            snap_to_grid: true,
        }
    }
}

impl ViewSettings {
    /// Clamp every numeric field into its supported range
    /// Non-finite values fall back to the default for that field
    pub fn validate_and_clamp(&mut self) {
        let defaults = ViewSettings::default();

        clamp_field("card_size", &mut self.card_size, defaults.card_size, MIN_CARD_SIZE, MAX_CARD_SIZE);
        clamp_field("circle_radius", &mut self.circle_radius, defaults.circle_radius, MIN_CIRCLE_RADIUS, MAX_CIRCLE_RADIUS);
        clamp_field("circle_spacing", &mut self.circle_spacing, defaults.circle_spacing, MIN_CIRCLE_SPACING, MAX_CIRCLE_SPACING);
        clamp_field("grid_size", &mut self.grid_size, defaults.grid_size, MIN_GRID_SIZE, MAX_GRID_SIZE);

        if self.circle_opacity > MAX_CIRCLE_OPACITY {
            warn!(circle_opacity = self.circle_opacity, max = MAX_CIRCLE_OPACITY, "circle_opacity exceeds maximum, clamping");
            self.circle_opacity = MAX_CIRCLE_OPACITY;
        }
    }
}

fn clamp_field(name: &str, value: &mut f32, default: f32, min: f32, max: f32) {
    if !value.is_finite() {
        warn!(field = name, using = default, "non-finite view setting, using default");
        *value = default;
    } else if *value < min {
        warn!(field = name, value = *value, min = min, "view setting below minimum, clamping");
        *value = min;
    } else if *value > max {
        warn!(field = name, value = *value, max = max, "view setting exceeds maximum, clamping");
        *value = max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Healthcare).unwrap();
        assert_eq!(json, "\"healthcare\"");
    }

    #[test]
    fn test_unknown_category_becomes_other() {
        let category: Category = serde_json::from_str("\"aerospace\"").unwrap();
        assert_eq!(category, Category::Other);
    }

    #[test]
    fn test_unknown_template_becomes_executive() {
        let template: Template = serde_json::from_str("\"gradient\"").unwrap();
        assert_eq!(template, Template::Executive);
        let template: Template = serde_json::from_str("\"neon\"").unwrap();
        assert_eq!(template, Template::Neon);
    }

    #[test]
    fn test_view_settings_missing_fields_default() {
        let settings: ViewSettings = serde_json::from_str(r#"{"cardSize": 100, "showGrid": true}"#).unwrap();
        assert_eq!(settings.card_size, 100.0);
        assert!(settings.show_grid);
        assert_eq!(settings.circle_radius, DEFAULT_CIRCLE_RADIUS);
        assert!(settings.snap_to_grid);
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut settings = ViewSettings {
            card_size: 5.0,
            circle_radius: 9000.0,
            circle_spacing: f32::NAN,
            circle_opacity: 250,
            grid_size: 20.0,
            ..ViewSettings::default()
        };
        settings.validate_and_clamp();

        assert_eq!(settings.card_size, MIN_CARD_SIZE);
        assert_eq!(settings.circle_radius, MAX_CIRCLE_RADIUS);
        assert_eq!(settings.circle_spacing, DEFAULT_CIRCLE_SPACING);
        assert_eq!(settings.circle_opacity, MAX_CIRCLE_OPACITY);
        assert_eq!(settings.grid_size, 20.0);
    }

    #[test]
    fn test_category_colors_are_opaque() {
        for category in Category::ALL {
            assert_eq!(category.color().alpha(), 0xFF, "{category:?}");
        }
    }
}
