//! TrueType text rasterization using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use super::font_discovery;

/// 8-bit coverage mask of a rendered string (row-major)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Coverage {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Distinct (text, size) pairs kept before the cache starts over
const MAX_CACHED_STRINGS: usize = 512;

/// Rendered strings keyed by text and pixel size
#[derive(Debug, Default)]
struct CoverageCache {
    entries: HashMap<(String, u32), Arc<Coverage>>,
}

impl CoverageCache {
    fn get_or_render(&mut self, text: &str, px: f32, render: impl FnOnce() -> Coverage) -> Arc<Coverage> {
        let key = (text.to_string(), px.to_bits());
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }
        if self.entries.len() >= MAX_CACHED_STRINGS {
            debug!(entries = self.entries.len(), "Text cache full, clearing");
            self.entries.clear();
        }
        let coverage = Arc::new(render());
        self.entries.insert(key, Arc::clone(&coverage));
        coverage
    }
}

/// Font renderer using fontdue; the pixel size is chosen per call
#[derive(Debug)]
pub struct TextRenderer {
    font: Font,
    cache: Mutex<CoverageCache>,
}

impl TextRenderer {
    /// Load a TrueType font from a file path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;

        debug!(path = %path.display(), "Loaded font");
        Ok(Self {
            font,
            cache: Mutex::default(),
        })
    }

    /// Resolve a family (+ optional style) name through fontconfig
    pub fn from_font_name(font_name: &str) -> Result<Self> {
        let path = font_discovery::locate(font_name)?;
        Self::from_path(path)
    }

    /// Configured font if given, otherwise the first bold sans we can find
    pub fn load(font_name: Option<&str>) -> Result<Self> {
        if let Some(name) = font_name {
            match Self::from_font_name(name) {
                Ok(renderer) => {
                    info!(font = name, "Using configured font");
                    return Ok(renderer);
                }
                Err(e) => info!(font = name, error = %e, "Configured font unavailable, trying system fonts"),
            }
        }
        Self::from_system_font()
    }

    /// Try to find and load a common system font
    pub fn from_system_font() -> Result<Self> {
        // Compile-time font path for packaged builds
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(build_font_path) = FONT_PATH
            && let Ok(renderer) = Self::from_path(PathBuf::from(build_font_path))
        {
            return Ok(renderer);
        }

        if let Ok(renderer) = Self::from_font_name("DejaVu Sans Bold") {
            return Ok(renderer);
        }

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
        ];

        for path in &font_paths {
            if let Ok(renderer) = Self::from_path(PathBuf::from(path)) {
                return Ok(renderer);
            }
        }

        Err(anyhow::anyhow!(
            "Could not find any system fonts. Tried FONT_PATH ({:?}), fontconfig and hardcoded paths: {:?}",
            FONT_PATH,
            font_paths
        ))
    }

    /// Coverage mask of `text` at `px` pixels; repeated requests reuse the first rasterization
    pub fn render(&self, text: &str, px: f32) -> Arc<Coverage> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get_or_render(text, px, || self.rasterize(text, px))
    }

    fn rasterize(&self, text: &str, px: f32) -> Coverage {
        if text.is_empty() || px <= 0.0 {
            return Coverage::default();
        }

        // Layout glyphs
        let mut glyphs = Vec::new();
        let mut x = 0.0f32;
        let mut max_ascent = 0i32;
        let mut max_descent = 0i32;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);

            let ascent = metrics.height as i32 + metrics.ymin;
            let descent = -metrics.ymin;
            max_ascent = max_ascent.max(ascent);
            max_descent = max_descent.max(descent);

            glyphs.push((x.round() as i32 + metrics.xmin, metrics, bitmap));
            x += metrics.advance_width;
        }

        let width = x.ceil() as usize;
        let height = (max_ascent + max_descent).max(0) as usize;
        if width == 0 || height == 0 {
            return Coverage::default();
        }

        let mut data = vec![0u8; width * height];
        for (x_offset, metrics, bitmap) in glyphs {
            // Baseline sits `max_ascent` rows from the top
            let top = max_ascent - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let px = x_offset + gx as i32;
                    let py = top + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let slot = &mut data[py as usize * width + px as usize];
                    *slot = (*slot).max(bitmap[gy * metrics.width + gx]);
                }
            }
        }

        Coverage { width, height, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_initials_when_font_available() {
        // Font availability depends on the host; only assert when one is found
        let Ok(renderer) = TextRenderer::from_system_font() else {
            return;
        };
        let small = renderer.render("AC", 14.0);
        let large = renderer.render("AC", 40.0);
        assert!(!small.is_empty());
        assert!(large.width > small.width);
        assert!(large.data.iter().any(|v| *v > 200));
        assert!(renderer.render("", 20.0).is_empty());
        assert!(renderer.render("AC", 0.0).is_empty());
    }

    #[test]
    fn test_cache_reuses_rendered_text() {
        let mut cache = CoverageCache::default();
        let mut renders = 0;
        let mut render = || {
            renders += 1;
            Coverage {
                width: 1,
                height: 1,
                data: vec![255],
            }
        };
        let first = cache.get_or_render("AC", 24.0, &mut render);
        let again = cache.get_or_render("AC", 24.0, &mut render);
        let other_size = cache.get_or_render("AC", 48.0, &mut render);
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other_size));
        assert_eq!(renders, 2);
    }

    #[test]
    fn test_cache_starts_over_when_full() {
        let mut cache = CoverageCache::default();
        for i in 0..MAX_CACHED_STRINGS {
            cache.get_or_render(&i.to_string(), 12.0, Coverage::default);
        }
        assert_eq!(cache.entries.len(), MAX_CACHED_STRINGS);
        cache.get_or_render("one more", 12.0, Coverage::default);
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn test_missing_font_file() {
        assert!(TextRenderer::from_path(PathBuf::from("/nonexistent/font.ttf")).is_err());
    }
}
