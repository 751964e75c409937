//! Software rendering of the card canvas

pub mod export;
pub mod font_discovery;
pub mod painter;
pub mod surface;
pub mod template;
pub mod text;

pub use export::export_png;
pub use painter::{LogoCache, Painter, Scene};
pub use surface::{decode_image, Surface};
pub use text::TextRenderer;
