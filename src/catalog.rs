//! The list of assets that make up a theme.

use std::path::{Component, Path};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ThemegenError;

/// One image to generate and where it ends up.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct AssetDescriptor {
    /// Category directory under the output root, eg `icons`
    #[serde(alias = "path")]
    pub subdirectory: String,
    /// Output filename inside the category directory
    pub filename: String,
    /// Pixel width requested from the service
    pub width: u32,
    /// Pixel height requested from the service
    pub height: u32,
    /// What to draw, the style suffixes get added later
    pub prompt: String,
}

impl AssetDescriptor {
    /// Builds a descriptor from borrowed parts.
    pub fn new(subdirectory: &str, filename: &str, width: u32, height: u32, prompt: &str) -> Self {
        Self {
            subdirectory: subdirectory.to_string(),
            filename: filename.to_string(),
            width,
            height,
            prompt: prompt.to_string(),
        }
    }

    /// Rejects descriptors that can't produce a sane output path or request.
    pub fn validate(&self) -> Result<(), ThemegenError> {
        if self.width == 0 || self.height == 0 {
            return Err(ThemegenError::Catalog(format!(
                "{} has a zero dimension ({}x{})",
                self.filename, self.width, self.height
            )));
        }
        if self.prompt.trim().is_empty() {
            return Err(ThemegenError::Catalog(format!(
                "{} has an empty prompt",
                self.filename
            )));
        }
        for (label, value) in [
            ("subdirectory", &self.subdirectory),
            ("filename", &self.filename),
        ] {
            if !is_single_component(value) {
                return Err(ThemegenError::Catalog(format!(
                    "{label} {value:?} must be a single plain path component"
                )));
            }
        }
        Ok(())
    }
}

fn is_single_component(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !value.contains(['/', '\\'])
}

const WINDOW_SIZE: u32 = 32;
const ICON_SIZE: u32 = 128;
const CURSOR_SIZE: u32 = 32;

/// (subdirectory, filename, size, prompt), all built-in assets are square.
const BUILTIN_TABLE: &[(&str, &str, u32, &str)] = &[
    // window decorations
    (
        "window",
        "window_close_normal.png",
        WINDOW_SIZE,
        "UI button, (ornate X symbol), glowing ruby red gem, centered, flat background.",
    ),
    (
        "window",
        "window_close_hover.png",
        WINDOW_SIZE,
        "UI button, (ornate X symbol), brightly glowing ruby red gem, centered, flat background, high contrast.",
    ),
    (
        "window",
        "window_close_pressed.png",
        WINDOW_SIZE,
        "UI button, (ornate X symbol), deep red gem with inner light, centered, flat background, inset shadow.",
    ),
    (
        "window",
        "window_maximize_normal.png",
        WINDOW_SIZE,
        "UI button, (ornate square symbol), glowing emerald green gem, centered, flat background.",
    ),
    (
        "window",
        "window_maximize_hover.png",
        WINDOW_SIZE,
        "UI button, (ornate square symbol), brightly glowing emerald green gem, centered, flat background, high contrast.",
    ),
    (
        "window",
        "window_maximize_pressed.png",
        WINDOW_SIZE,
        "UI button, (ornate square symbol), deep green gem with inner light, centered, flat background, inset shadow.",
    ),
    (
        "window",
        "window_minimize_normal.png",
        WINDOW_SIZE,
        "UI button, (ornate underscore symbol), glowing amber gem, centered, flat background.",
    ),
    (
        "window",
        "window_minimize_hover.png",
        WINDOW_SIZE,
        "UI button, (ornate underscore symbol), brightly glowing amber gem, centered, flat background, high contrast.",
    ),
    (
        "window",
        "window_minimize_pressed.png",
        WINDOW_SIZE,
        "UI button, (ornate underscore symbol), deep amber gem with inner light, centered, flat background, inset shadow.",
    ),
    // icons
    (
        "icons",
        "icon_app_default.png",
        ICON_SIZE,
        "UI icon, a beautiful ornate silver gear, centered, simple background, clean lines.",
    ),
    (
        "icons",
        "icon_folder.png",
        ICON_SIZE,
        "UI icon, an ornate leather-bound folder with a gold clasp, centered, simple background.",
    ),
    (
        "icons",
        "icon_file_document.png",
        ICON_SIZE,
        "UI icon, a piece of aged parchment with a single elegant quill pen, centered, simple background.",
    ),
    (
        "icons",
        "icon_terminal.png",
        ICON_SIZE,
        "UI icon, a stylized command prompt symbol >_ made of glowing green magical runes, centered, simple background.",
    ),
    (
        "icons",
        "icon_settings.png",
        ICON_SIZE,
        "UI icon, interlocking ornate silver and gold gears, intricate, centered, simple background.",
    ),
    // cursors
    (
        "cursors",
        "cursor_default.png",
        CURSOR_SIZE,
        "UI cursor, ornate elegant mouse pointer arrow, silver filigree, sharp tip, centered, simple background, high contrast.",
    ),
    (
        "cursors",
        "cursor_hand.png",
        CURSOR_SIZE,
        "UI cursor, elegant pointing hand, gauntlet with filigree, centered, simple background, high contrast.",
    ),
    (
        "cursors",
        "cursor_text.png",
        CURSOR_SIZE,
        "UI cursor, ornate I-beam symbol, glowing silver, centered, simple background, high contrast.",
    ),
    (
        "cursors",
        "cursor_resize.png",
        CURSOR_SIZE,
        "UI cursor, ornate double-headed arrow, centered, simple background, high contrast.",
    ),
    (
        "cursors",
        "cursor_busy.png",
        CURSOR_SIZE,
        "UI cursor, ornate spinning hourglass with glowing sand, centered, simple background, high contrast.",
    ),
];

/// The default theme, in generation order.
pub static BUILTIN_CATALOG: LazyLock<Vec<AssetDescriptor>> = LazyLock::new(|| {
    BUILTIN_TABLE
        .iter()
        .map(|(subdirectory, filename, size, prompt)| {
            AssetDescriptor::new(subdirectory, filename, *size, *size, prompt)
        })
        .collect()
});

/// Returns a copy of the built-in catalog.
pub fn builtin() -> Vec<AssetDescriptor> {
    BUILTIN_CATALOG.clone()
}

/// Loads a catalog from a JSON array of descriptors.
pub fn load_catalog(path: &Path) -> Result<Vec<AssetDescriptor>, ThemegenError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ThemegenError::Catalog(format!("Failed to read {}: {err}", path.display()))
    })?;
    parse_catalog(&raw)
}

/// Parses and validates catalog JSON.
pub fn parse_catalog(raw: &str) -> Result<Vec<AssetDescriptor>, ThemegenError> {
    let assets: Vec<AssetDescriptor> = serde_json::from_str(raw)
        .map_err(|err| ThemegenError::Catalog(format!("Failed to parse catalog JSON: {err}")))?;
    if assets.is_empty() {
        return Err(ThemegenError::Catalog("Catalog contains no assets".to_string()));
    }
    for asset in &assets {
        asset.validate()?;
    }
    Ok(assets)
}

/// Keeps only the assets in the named categories, preserving order. An empty
/// filter keeps everything.
pub fn filter_categories(
    assets: Vec<AssetDescriptor>,
    categories: &[String],
) -> Vec<AssetDescriptor> {
    if categories.is_empty() {
        return assets;
    }
    assets
        .into_iter()
        .filter(|asset| categories.iter().any(|c| c == &asset.subdirectory))
        .collect()
}
