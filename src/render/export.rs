//! High-density PNG export

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::constants::export::{FILE_PREFIX, FILE_SUFFIX, SCALE};

use super::painter::{Painter, Scene};
use super::surface::Surface;

/// `business-cards-YYYY-MM-DDTHH-MM-SS@2x.png`
pub fn export_filename(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");
    // The format only uses numeric components, so formatting cannot fail
    let stamp = at.format(format).unwrap_or_default();
    format!("{FILE_PREFIX}{stamp}{FILE_SUFFIX}")
}

/// Paint `scene` at `SCALE`× onto an offscreen surface sized for the logical viewport
pub fn render_scene(painter: &Painter, scene: &Scene, width: f32, height: f32) -> Result<Surface> {
    let device_w = (width * SCALE).round().max(1.0) as u32;
    let device_h = (height * SCALE).round().max(1.0) as u32;
    let mut surface = Surface::new(device_w, device_h, SCALE)?;
    painter.paint(&mut surface, scene);
    Ok(surface)
}

/// Render and write the PNG; `target` may be a directory (timestamped name) or a file path
pub fn export_png(painter: &Painter, scene: &Scene, width: f32, height: f32, target: &Path) -> Result<PathBuf> {
    let surface = render_scene(painter, scene, width, height)?;
    let bytes = surface.encode_png()?;

    let path = if target.is_dir() {
        target.join(export_filename(OffsetDateTime::now_utc()))
    } else {
        target.to_path_buf()
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }
    fs::write(&path, &bytes).with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(
        path = %path.display(),
        width = surface.width(),
        height = surface.height(),
        bytes = bytes.len(),
        "Exported canvas"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::painter::LogoCache;
    use crate::render::surface::decode_image;
    use crate::workspace::Workspace;
    use time::macros::datetime;

    #[test]
    fn test_export_filename() {
        let name = export_filename(datetime!(2024-03-05 14:07:09 UTC));
        assert_eq!(name, "business-cards-2024-03-05T14-07-09@2x.png");
    }

    #[test]
    fn test_export_writes_double_density_file() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::default();
        let logos = LogoCache::new();
        let labels = ["A".to_string(), "B".to_string(), "C".to_string()];
        let scene = Scene {
            workspace: &workspace,
            hovered: None,
            logos: &logos,
            circle_labels: &labels,
        };

        let path = export_png(&Painter::new(None), &scene, 120.0, 80.0, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX));

        let image = decode_image(&fs::read(&path).unwrap()).unwrap();
        assert_eq!((image.width(), image.height()), (240, 160));
    }
}
