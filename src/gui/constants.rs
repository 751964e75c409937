//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Editor window limits (the initial size comes from the config)
pub const WINDOW_MIN_WIDTH: f32 = 900.0;
pub const WINDOW_MIN_HEIGHT: f32 = 600.0;

/// Layout spacing
pub const SIDE_PANEL_WIDTH: f32 = 300.0;
pub const SECTION_SPACING: f32 = 12.0;
pub const ITEM_SPACING: f32 = 6.0;
pub const CARD_LIST_HEIGHT: f32 = 220.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(220, 60, 60);
pub const STATUS_INFO: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);

/// How long a status message stays visible
pub const STATUS_TTL_MS: u64 = 4000;

/// Repaint cadence while logo or remote work may deliver results
pub const BACKGROUND_POLL_MS: u64 = 200;
