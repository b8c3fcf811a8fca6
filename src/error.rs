//! # Conversion Errors
//!
//! Fatal error kinds surfaced to the caller. Everything that is recoverable
//! (unknown widget kinds, unknown tags, unresolved action targets, broken
//! style attributes, failed image recoding) is logged and skipped instead.

use std::path::PathBuf;

/// Errors that abort a conversion run
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Project file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read project file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed project: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Malformed project: missing `root` object")]
    MissingRoot,

    #[error("Failed to render YAML: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Failure to decode a single property record.
///
/// Never fatal: the caller logs it and moves on to the next record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {expected} in `{tag}`")]
    WrongShape { tag: String, expected: &'static str },

    #[error("`{tag}` has {found} components, needs {needed}")]
    TooShort {
        tag: String,
        found: usize,
        needed: usize,
    },

    #[error("alignment index {index} out of range in `{tag}`")]
    BadAlignment { tag: String, index: i64 },
}

/// Failure to recode one image asset
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("empty image path for asset `{0}`")]
    EmptyPath(String),

    #[error("cannot derive output name from {}", .0.display())]
    BadPath(PathBuf),

    #[error("image error for {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
