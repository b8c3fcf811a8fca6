//! # Image Assets
//!
//! Image properties only carry a path relative to the project folder. While
//! converting, each path is registered in the run's [`AssetTable`] under a
//! derived id, and the widget refers to the id. After conversion every asset
//! is recoded to RGB565 and listed in the document's `image:` section.

use crate::error::AssetError;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};

/// Derive an asset id from its path: basename, `.` and spaces become `_`
pub fn asset_id(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    base.replace(['.', ' '], "_")
}

/// `asset id → declared source path`, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTable {
    entries: IndexMap<String, String>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` and return the id the document should reference
    pub fn register(&mut self, path: &str) -> String {
        let id = asset_id(path);
        self.entries.insert(id.clone(), path.to_string());
        id
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, path)| (id.as_str(), path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Converts a source image into the pixel format the firmware embeds
pub trait AssetRecoder {
    /// Recode `source`, returning the path of the written file
    fn recode(&self, source: &Path) -> Result<PathBuf, AssetError>;
}

/// Quantizes images to RGB565 precision while keeping the alpha channel.
///
/// The result is written next to the source as `<stem>_RGB565.png`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rgb565Recoder;

impl Rgb565Recoder {
    pub fn output_path(source: &Path) -> Result<PathBuf, AssetError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AssetError::BadPath(source.to_path_buf()))?;
        Ok(source.with_file_name(format!("{stem}_RGB565.png")))
    }
}

impl AssetRecoder for Rgb565Recoder {
    fn recode(&self, source: &Path) -> Result<PathBuf, AssetError> {
        let output = Self::output_path(source)?;
        let image = image::open(source).map_err(|e| AssetError::Image {
            path: source.to_path_buf(),
            source: e,
        })?;

        // Images without alpha come out fully opaque.
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let [r, g, b, _] = &mut pixel.0;
            *r = (*r >> 3) << 3;
            *g = (*g >> 2) << 2;
            *b = (*b >> 3) << 3;
        }

        rgba.save(&output).map_err(|e| AssetError::Image {
            path: output.clone(),
            source: e,
        })?;
        tracing::debug!("Recoded {} -> {}", source.display(), output.display());
        Ok(output)
    }
}

/// Express `path` relative to the directory `base`. Both should be absolute.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Different roots (e.g. other drive): nothing to be relative to.
    if common == 0 && path.first().is_some_and(|c| matches!(c, Component::Prefix(_))) {
        return path.iter().collect();
    }

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
