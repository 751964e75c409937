//! Raster target backed by a tiny-skia pixmap
//!
//! Drawing calls take logical coordinates. Every path goes through
//! `Transform::from_scale(scale, scale)`, so the same paint code serves the
//! on-screen canvas (scale 1) and high-density export (scale 2).
//! Pixel data is premultiplied RGBA8, as tiny-skia stores it.

use anyhow::{Context, Result};
use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, IntSize, LinearGradient, Paint, Path, PathBuilder, Pattern,
    Pixmap, PixmapPaint, Rect, SpreadMode, Stroke, StrokeDash, Transform,
};

use crate::color::HexColor;
use crate::geometry::CardBounds;
use crate::types::Point;

use super::text::Coverage;

/// Cubic control distance for a quarter circle, as a fraction of the radius
const KAPPA: f32 = 0.552_284_8;

/// Stacked layers used to approximate a blurred shadow
const SHADOW_LAYERS: usize = 6;

/// How a filled shape is colored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(HexColor),
    /// Linear blend from the top-left corner to the bottom-right corner
    Diagonal(HexColor, HexColor),
}

/// Optional dash pattern (on, off) in logical pixels
pub type Dash = Option<(f32, f32)>;

fn skia_color(color: HexColor) -> Color {
    Color::from_rgba8(color.red(), color.green(), color.blue(), color.alpha())
}

fn solid(color: HexColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32, dash: Dash) -> Stroke {
    Stroke {
        width,
        dash: dash.and_then(|(on, off)| StrokeDash::new(vec![on, off], 0.0)),
        ..Stroke::default()
    }
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

/// Rounded rectangle outline; a zero radius gives a plain rectangle
fn rounded_rect(rect: CardBounds, radius: f32) -> Option<Path> {
    let r = radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
    let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    if r <= 0.0 {
        return Rect::from_ltrb(l, t, rt, b).map(PathBuilder::from_rect);
    }
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(l + r, t);
    pb.line_to(rt - r, t);
    pb.cubic_to(rt - r + k, t, rt, t + r - k, rt, t + r);
    pb.line_to(rt, b - r);
    pb.cubic_to(rt, b - r + k, rt - r + k, b, rt - r, b);
    pb.line_to(l + r, b);
    pb.cubic_to(l + r - k, b, l, b - r + k, l, b - r);
    pb.line_to(l, t + r);
    pb.cubic_to(l, t + r - k, l + r - k, t, l + r, t);
    pb.close();
    pb.finish()
}

fn segment(from: Point, to: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    pb.finish()
}

/// Decode PNG, JPEG, GIF, WebP, ICO or BMP bytes into a premultiplied pixmap
pub fn decode_image(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)
        .context("Unsupported or corrupt image")?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).context("Image has no pixels")?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3];
        for channel in &mut px[..3] {
            *channel = premultiply(*channel, alpha);
        }
    }
    Pixmap::from_vec(data, size).context("Image buffer does not match its dimensions")
}

pub struct Surface {
    pixmap: Pixmap,
    scale: f32,
}

impl Surface {
    /// Blank (fully transparent) surface of `width`×`height` device pixels
    pub fn new(width: u32, height: u32, scale: f32) -> Result<Self> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .with_context(|| format!("Cannot allocate a {width}x{height} canvas"))?;
        Ok(Self {
            pixmap,
            scale: if scale > 0.0 && scale.is_finite() { scale } else { 1.0 },
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Size in logical pixels
    pub fn logical_size(&self) -> (f32, f32) {
        (self.width() as f32 / self.scale, self.height() as f32 / self.scale)
    }

    /// Premultiplied RGBA8, row-major
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap.encode_png().context("Failed to encode PNG")
    }

    /// Straight RGBA at device pixel (`x`, `y`)
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    /// Overwrite every pixel with `color`
    pub fn fill(&mut self, color: HexColor) {
        self.pixmap.fill(skia_color(color));
    }

    pub fn fill_rounded_rect(&mut self, rect: CardBounds, radius: f32, fill: Fill) {
        let Some(path) = rounded_rect(rect, radius) else {
            return;
        };
        let paint = match fill {
            Fill::Solid(color) => solid(color),
            Fill::Diagonal(from, to) => {
                let gradient = LinearGradient::new(
                    tiny_skia::Point::from_xy(rect.left(), rect.top()),
                    tiny_skia::Point::from_xy(rect.right(), rect.bottom()),
                    vec![GradientStop::new(0.0, skia_color(from)), GradientStop::new(1.0, skia_color(to))],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                match gradient {
                    Some(shader) => Paint {
                        shader,
                        anti_alias: true,
                        ..Paint::default()
                    },
                    None => solid(from),
                }
            }
        };
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, self.transform(), None);
    }

    /// Soft rounded-rect shadow built from stacked translucent layers;
    /// `blur` is the falloff width in logical pixels
    pub fn shadow(&mut self, rect: CardBounds, radius: f32, blur: f32, offset: (f32, f32), color: HexColor) {
        let shifted = CardBounds {
            x: rect.x + offset.0,
            y: rect.y + offset.1,
            ..rect
        };
        let layer = solid(color.fade(1.0 / SHADOW_LAYERS as f32));
        for i in 0..SHADOW_LAYERS {
            // Outermost layer first, each one shrinking toward the card edge
            let spread = blur * (0.5 - i as f32 / SHADOW_LAYERS as f32);
            if let Some(path) = rounded_rect(shifted.inflate(spread), radius + spread.max(0.0)) {
                self.pixmap.fill_path(&path, &layer, FillRule::Winding, self.transform(), None);
            }
        }
    }

    pub fn stroke_rounded_rect(&mut self, rect: CardBounds, radius: f32, width: f32, color: HexColor, dash: Dash) {
        if let Some(path) = rounded_rect(rect, radius) {
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke(width, dash), self.transform(), None);
        }
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: HexColor) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.pixmap
                .fill_path(&path, &solid(color), FillRule::Winding, self.transform(), None);
        }
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f32, width: f32, color: HexColor, dash: Dash) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke(width, dash), self.transform(), None);
        }
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: HexColor, dash: Dash) {
        if let Some(path) = segment(from, to) {
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke(width, dash), self.transform(), None);
        }
    }

    /// Scale `image` into `dest` with bilinear filtering
    pub fn blit_image(&mut self, image: &Pixmap, dest: CardBounds) {
        let Some(rect) = Rect::from_xywh(dest.x, dest.y, dest.width, dest.height) else {
            return;
        };
        let sx = dest.width / image.width() as f32;
        let sy = dest.height / image.height() as f32;
        let paint = Paint {
            shader: Pattern::new(
                image.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                1.0,
                Transform::from_row(sx, 0.0, 0.0, sy, dest.x, dest.y),
            ),
            ..Paint::default()
        };
        self.pixmap.fill_rect(rect, &paint, self.transform(), None);
    }

    /// Tint a coverage mask with `color`, top-left at device pixel (`x`, `y`)
    pub fn blit_coverage(&mut self, mask: &Coverage, x: i32, y: i32, color: HexColor) {
        let Some(size) = IntSize::from_wh(mask.width as u32, mask.height as u32) else {
            return;
        };
        let data = mask
            .data
            .iter()
            .flat_map(|&coverage| {
                let alpha = premultiply(color.alpha(), coverage);
                [
                    premultiply(color.red(), alpha),
                    premultiply(color.green(), alpha),
                    premultiply(color.blue(), alpha),
                    alpha,
                ]
            })
            .collect();
        let Some(glyphs) = Pixmap::from_vec(data, size) else {
            return;
        };
        self.pixmap
            .draw_pixmap(x, y, glyphs.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RED: HexColor = HexColor::rgb(255, 0, 0);
    const BLUE: HexColor = HexColor::rgb(0, 0, 255);

    fn surface(width: u32, height: u32, scale: f32) -> Surface {
        Surface::new(width, height, scale).unwrap()
    }

    #[test]
    fn test_fill_and_pixel() {
        let mut surface = surface(4, 3, 1.0);
        surface.fill(HexColor::rgb(15, 23, 42));
        assert_eq!(surface.pixel(3, 2), Some([15, 23, 42, 255]));
        assert_eq!(surface.pixel(4, 0), None);
        assert_eq!(surface.pixels().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_rect_interior_and_exterior() {
        let mut surface = surface(20, 20, 1.0);
        surface.fill_rounded_rect(CardBounds { x: 5.0, y: 5.0, width: 10.0, height: 10.0 }, 0.0, Fill::Solid(RED));
        assert_eq!(surface.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_scale_doubles_device_extent() {
        let mut surface = surface(40, 40, 2.0);
        assert_eq!(surface.logical_size(), (20.0, 20.0));
        surface.fill_rounded_rect(CardBounds { x: 5.0, y: 5.0, width: 10.0, height: 10.0 }, 0.0, Fill::Solid(RED));
        assert_eq!(surface.pixel(29, 29), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(31, 31), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_rounded_corner_stays_clear() {
        let mut surface = surface(40, 40, 1.0);
        surface.fill_rounded_rect(CardBounds { x: 0.0, y: 0.0, width: 40.0, height: 40.0 }, 12.0, Fill::Solid(RED));
        assert_eq!(surface.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(surface.pixel(20, 20).unwrap()[3], 255);
    }

    #[test]
    fn test_diagonal_gradient_endpoints() {
        let mut surface = surface(50, 50, 1.0);
        surface.fill_rounded_rect(
            CardBounds { x: 0.0, y: 0.0, width: 50.0, height: 50.0 },
            0.0,
            Fill::Diagonal(RED, BLUE),
        );
        let top_left = surface.pixel(0, 0).unwrap();
        let bottom_right = surface.pixel(49, 49).unwrap();
        assert!(top_left[0] > 240 && top_left[2] < 15);
        assert!(bottom_right[2] > 240 && bottom_right[0] < 15);
    }

    #[test]
    fn test_blend_over_opaque_background() {
        let mut surface = surface(2, 2, 1.0);
        surface.fill(HexColor::rgb(0, 0, 0));
        surface.fill_rounded_rect(CardBounds { x: 0.0, y: 0.0, width: 2.0, height: 2.0 }, 0.0, Fill::Solid(RED.fade(0.5)));
        let [r, g, b, a] = surface.pixel(0, 0).unwrap();
        assert_eq!(a, 255);
        assert!((125..=130).contains(&r));
        assert_eq!((g, b), (0, 0));
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut surface = surface(40, 5, 1.0);
        surface.line(Point::new(0.0, 2.5), Point::new(40.0, 2.5), 2.0, RED, Some((6.0, 4.0)));
        // First dash covers 0..6, the gap 6..10, the next dash starts at 10
        assert!(surface.pixel(3, 2).unwrap()[3] > 200);
        assert_eq!(surface.pixel(8, 2).unwrap()[3], 0);
        assert!(surface.pixel(12, 2).unwrap()[3] > 200);
    }

    #[test]
    fn test_solid_stroke_circle_ring() {
        let mut surface = surface(40, 40, 1.0);
        surface.stroke_circle(Point::new(20.0, 20.0), 15.0, 2.0, BLUE, None);
        assert_eq!(surface.pixel(20, 20).unwrap()[3], 0);
        assert!(surface.pixel(35, 20).unwrap()[3] > 100);
    }

    #[test]
    fn test_shadow_fades_outward() {
        let mut surface = surface(60, 60, 1.0);
        let card = CardBounds { x: 20.0, y: 20.0, width: 20.0, height: 20.0 };
        surface.shadow(card, 4.0, 12.0, (0.0, 0.0), HexColor::rgb(0, 0, 0));
        let inside = surface.pixel(30, 30).unwrap()[3];
        let edge = surface.pixel(30, 16).unwrap()[3];
        assert!(inside > edge && edge > 0);
        assert_eq!(surface.pixel(2, 2).unwrap()[3], 0);
    }

    #[test]
    fn test_blit_image_clips_to_surface() {
        let mut image = Pixmap::new(2, 2).unwrap();
        image.fill(Color::from_rgba8(0, 255, 0, 255));
        let mut surface = surface(10, 10, 1.0);
        surface.blit_image(&image, CardBounds { x: 6.0, y: 6.0, width: 8.0, height: 8.0 });
        assert_eq!(surface.pixel(9, 9), Some([0, 255, 0, 255]));
        assert_eq!(surface.pixel(5, 5).unwrap()[3], 0);
    }

    #[test]
    fn test_blit_coverage() {
        let mask = Coverage {
            width: 2,
            height: 1,
            data: vec![255, 0],
        };
        let mut surface = surface(4, 4, 1.0);
        surface.blit_coverage(&mask, 1, 1, RED);
        assert_eq!(surface.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(2, 1).unwrap()[3], 0);
    }

    #[test]
    fn test_png_encode_then_decode() {
        let mut surface = surface(3, 2, 1.0);
        surface.fill(HexColor::rgb(10, 20, 30));
        let decoded = decode_image(&surface.encode_png().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        let c = decoded.pixel(2, 1).unwrap().demultiply();
        assert_eq!([c.red(), c.green(), c.blue(), c.alpha()], [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_jpeg_logo() {
        let logo = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 40, 40]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(logo)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(decoded.pixel(4, 3).unwrap().alpha(), 255);
    }

    #[test]
    fn test_decode_premultiplies_alpha() {
        let logo = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 128]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(logo)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let px = decode_image(&bytes).unwrap().pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.alpha()), (128, 128));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
