//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Venn layout constants
pub mod layout {
    /// Minimum gap between any circle and the viewport edge
    pub const MARGIN: f32 = 20.0;

    /// Smallest circle radius the layout will produce (unless the viewport cannot fit it)
    pub const MIN_RADIUS: f32 = 40.0;

    /// Largest circle radius the layout will produce
    pub const MAX_RADIUS: f32 = 400.0;

    /// Cards placed by populate sit on a ring at this fraction of the radius
    pub const POPULATE_RING_FACTOR: f32 = 0.6;

    /// At most this many companies are placed around each circle
    pub const POPULATE_PER_CIRCLE: usize = 8;

    /// Viewport assumed when seeding before any window exists
    pub const SEED_VIEWPORT: (f32, f32) = (1200.0, 800.0);
}

/// Card geometry and store constants
pub mod card {
    /// Offset applied to a duplicated card
    pub const DUPLICATE_OFFSET: (f32, f32) = (20.0, 20.0);

    /// Suffix appended to the company name when duplicating with a suffix policy
    pub const COPY_SUFFIX: &str = " Copy";

    /// First id handed out by a fresh or cleared store
    pub const FIRST_ID: u64 = 1;

    /// Largest id kept on import; JSON readers holding numbers as doubles lose
    /// precision above this
    pub const MAX_ID: u64 = (1 << 53) - 1;

    /// Maximum number of words contributing to initials
    pub const INITIALS_WORDS: usize = 2;
}

/// View settings defaults and validation bounds
pub mod view {
    pub const DEFAULT_CARD_SIZE: f32 = 80.0;
    pub const DEFAULT_CIRCLE_RADIUS: f32 = 180.0;
    pub const DEFAULT_CIRCLE_SPACING: f32 = 310.0;
    pub const DEFAULT_CIRCLE_OPACITY: u8 = 30;
    pub const DEFAULT_GRID_SIZE: f32 = 20.0;

    pub const MIN_CARD_SIZE: f32 = 40.0;
    pub const MAX_CARD_SIZE: f32 = 200.0;
    pub const MIN_CIRCLE_RADIUS: f32 = 40.0;
    pub const MAX_CIRCLE_RADIUS: f32 = 400.0;
    pub const MIN_CIRCLE_SPACING: f32 = 50.0;
    pub const MAX_CIRCLE_SPACING: f32 = 800.0;
    pub const MAX_CIRCLE_OPACITY: u8 = 100;
    pub const MIN_GRID_SIZE: f32 = 5.0;
    pub const MAX_GRID_SIZE: f32 = 100.0;
}

/// Colors shared by the painter (ARGB)
pub mod palette {
    pub const BACKGROUND: u32 = 0xFF0F172A;
    pub const GRID_LINE: u32 = 0x80E5E7EB;
    pub const CIRCLE_STROKE: u32 = 0xFF667EEA;
    pub const CIRCLE_LABEL: u32 = 0xFFC7D2FE;
    pub const GUIDE: u32 = 0xB3667EEA;
    pub const SELECTED: u32 = 0xFF667EEA;
    pub const HOVERED: u32 = 0xFF764BA2;
    pub const INDICATOR_RING: u32 = 0xFFFFFFFF;
}

/// Card painting proportions
pub mod paint {
    /// Corner radius is this fraction of the card size, never below `MIN_CORNER_RADIUS`
    pub const CORNER_RADIUS_FACTOR: f32 = 0.15;
    pub const MIN_CORNER_RADIUS: f32 = 4.0;

    pub const SHADOW_SELECTED: f32 = 1.5;
    pub const SHADOW_HOVERED: f32 = 1.2;

    pub const BORDER_SELECTED: f32 = 3.0;
    pub const BORDER_HOVERED: f32 = 2.5;
    pub const BORDER_DEFAULT: f32 = 2.0;

    /// Portfolio border dash pattern (on, off)
    pub const PORTFOLIO_DASH: (f32, f32) = (6.0, 4.0);
    /// Selection overlay dash pattern (on, off)
    pub const SELECTION_DASH: (f32, f32) = (8.0, 4.0);
    /// Alignment guide dash pattern (on, off)
    pub const GUIDE_DASH: (f32, f32) = (5.0, 5.0);

    /// Logo occupies this fraction of the card
    pub const LOGO_FACTOR: f32 = 0.7;
    /// Initials font size as a fraction of the card size, never below `MIN_INITIALS_PX`
    pub const INITIALS_FACTOR: f32 = 0.25;
    pub const MIN_INITIALS_PX: f32 = 14.0;

    /// Category dot: radius fraction of card size, minimum radius, inset from top-right
    pub const INDICATOR_FACTOR: f32 = 0.1;
    pub const MIN_INDICATOR_RADIUS: f32 = 6.0;
    pub const INDICATOR_INSET: f32 = 12.0;

    pub const CIRCLE_STROKE_WIDTH: f32 = 2.0;
    pub const CIRCLE_LABEL_PX: f32 = 16.0;
}

/// Export constants
pub mod export {
    /// Pixel density multiplier for exported images
    pub const SCALE: f32 = 2.0;

    /// Exported file name prefix
    pub const FILE_PREFIX: &str = "business-cards-";

    /// Exported file name suffix
    pub const FILE_SUFFIX: &str = "@2x.png";

    /// Default export viewport for headless runs
    pub const DEFAULT_WIDTH: u32 = 1200;
    pub const DEFAULT_HEIGHT: u32 = 800;
}

/// Remote mirror constants
pub mod remote {
    /// Quiet period before a pending document is pushed
    pub const DEBOUNCE_MS: u64 = 1000;

    /// Default polling interval for the subscription fallback
    pub const DEFAULT_POLL_SECS: u64 = 5;

    pub const MIN_POLL_SECS: u64 = 1;
    pub const MAX_POLL_SECS: u64 = 3600;

    /// Per-request network timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// Logo fetch constants
pub mod logos {
    pub const CLEARBIT: &str = "https://logo.clearbit.com/";
    pub const UPLEAD: &str = "https://logo.uplead.com/";
    pub const AVATAR: &str = "https://ui-avatars.com/api/";

    /// Largest accepted logo payload (bytes)
    pub const MAX_BYTES: usize = 2 * 1024 * 1024;

    pub const REQUEST_TIMEOUT_SECS: u64 = 8;
}

/// Config and data file locations
pub mod config {
    /// Application directory under the platform config/data dirs
    pub const APP_DIR: &str = "card-canvas";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Persisted canvas document file name
    pub const DATA_FILENAME: &str = "canvas.json";

    /// Environment variable overriding the remote document URL
    pub const ENV_REMOTE_URL: &str = "CARD_CANVAS_REMOTE_URL";

    /// Environment variable overriding the data file path
    pub const ENV_DATA_FILE: &str = "CARD_CANVAS_DATA";

    /// Environment variable selecting the log level
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

    pub const DEFAULT_LOG_LEVEL: &str = "info";
    pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

    pub const DEFAULT_WINDOW_WIDTH: u16 = 1400;
    pub const DEFAULT_WINDOW_HEIGHT: u16 = 900;
    pub const MIN_WINDOW_DIMENSION: u16 = 480;
    pub const MAX_WINDOW_DIMENSION: u16 = 7680;

    /// Labels drawn above the top, bottom-left and bottom-right circles
    pub const DEFAULT_CIRCLE_LABELS: [&str; 3] = ["HRIS", "Payroll", "Expense"];
}
