//! Card font lookup through fontconfig
//!
//! The font picker offers only faces the text renderer can open, named the way
//! the config stores them: the family, then the style words ("Inter SemiBold").

use anyhow::{bail, Context, Result};
use fontconfig::{Fontconfig, Pattern};
use std::collections::BTreeSet;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Words that name a weight, width or slant rather than part of a family
const STYLE_WORDS: &[&str] = &[
    "Thin",
    "ExtraLight",
    "Light",
    "Regular",
    "Book",
    "Medium",
    "SemiBold",
    "Bold",
    "ExtraBold",
    "Black",
    "Condensed",
    "Italic",
    "Oblique",
];

/// Outline formats fontdue parses
const LOADABLE_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// A configured card font split into its fontconfig query parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice<'a> {
    pub family: &'a str,
    pub style: Option<&'a str>,
}

impl<'a> FontChoice<'a> {
    /// Trailing style words become the style; at least one word stays the family
    pub fn parse(name: &'a str) -> Self {
        let name = name.trim();
        let mut family_end = name.len();
        while let Some(space) = name[..family_end].trim_end().rfind(' ') {
            let word = name[space + 1..family_end].trim();
            if !STYLE_WORDS.iter().any(|style| style.eq_ignore_ascii_case(word)) {
                break;
            }
            family_end = space;
        }
        let style = name[family_end..].trim();
        Self {
            family: name[..family_end].trim_end(),
            style: Some(style).filter(|s| !s.is_empty()),
        }
    }
}

/// Name shown in the picker and saved in the config; regular faces are just the family
fn display_name(family: &str, style: Option<&str>) -> String {
    match style {
        None | Some("Regular") => family.to_string(),
        Some(style) => format!("{family} {style}"),
    }
}

fn is_loadable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LOADABLE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Installed faces the card renderer can load, sorted by display name
pub fn list_fonts() -> Result<Vec<String>> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let font_set = fontconfig::list_fonts(&Pattern::new(&fc), None);

    let mut fonts = BTreeSet::new();
    let mut skipped = 0;
    for face in font_set.iter() {
        let (Some(family), Some(file)) = (face.get_string(fontconfig::FC_FAMILY), face.filename()) else {
            continue;
        };
        if is_loadable(Path::new(file)) {
            fonts.insert(display_name(family, face.get_string(fontconfig::FC_STYLE)));
        } else {
            skipped += 1;
        }
    }

    info!(count = fonts.len(), skipped = skipped, "Listed card fonts");
    Ok(fonts.into_iter().collect())
}

/// Font file for a configured card font name
///
/// Fontconfig substitutes a fallback family for unknown names; that counts as
/// not installed so the caller keeps its current font.
pub fn locate(font_name: &str) -> Result<PathBuf> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let choice = FontChoice::parse(font_name);

    let mut pattern = Pattern::new(&fc);
    let family = CString::new(choice.family).with_context(|| format!("Invalid font family: {}", choice.family))?;
    pattern.add_string(fontconfig::FC_FAMILY, &family);
    if let Some(style) = choice.style {
        let style = CString::new(style).with_context(|| format!("Invalid font style: {style}"))?;
        pattern.add_string(fontconfig::FC_STYLE, &style);
    }

    let matched = pattern.font_match();
    let matched_family = matched.get_string(fontconfig::FC_FAMILY).unwrap_or_default();
    if !matched_family.eq_ignore_ascii_case(choice.family) {
        bail!("Font '{font_name}' is not installed (closest match: '{matched_family}')");
    }

    let path = PathBuf::from(
        matched
            .filename()
            .with_context(|| format!("Font '{font_name}' has no file"))?,
    );
    if !is_loadable(&path) {
        bail!("Font file {} is not a TrueType or OpenType outline", path.display());
    }
    if !path.exists() {
        bail!("Font file {} does not exist", path.display());
    }

    debug!(font = font_name, family = choice.family, style = ?choice.style, path = %path.display(), "Located card font");
    Ok(path)
}
