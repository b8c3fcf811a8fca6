//! # SquareLine to ESPHome Converter (SLESP)
//!
//! Converts SquareLine Studio projects (`.spj`) into ESPHome LVGL
//! configuration YAML.
//!
//! SLESP understands the SquareLine widget tree and provides:
//! - Per-property decoding of widget geometry, flags, states and styles
//! - Translation of event handlers into ESPHome automations
//! - Image asset collection with RGB565 recoding
//! - YAML output supporting the ESPHome `!lambda`, `!secret` and `!include` tags
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slesp::{convert_file, ConvertOptions, Rgb565Recoder};
//! use std::path::Path;
//!
//! let input = Path::new("ui.spj");
//! let options = ConvertOptions::for_input(input, Some(Path::new("lvgl.yaml")));
//!
//! match convert_file(input, &options, &Rgb565Recoder) {
//!     Ok(document) => {
//!         std::fs::write("lvgl.yaml", document.to_yaml()?)?;
//!     }
//!     Err(e) => eprintln!("Conversion failed: {}", e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! SLESP follows a multi-phase conversion pipeline:
//!
//! 1. **Project Loading** - Decode the `.spj` JSON into typed property records
//! 2. **Identity Indexing** - Map every named widget's guid to its ESPHome id
//! 3. **Widget Conversion** - Walk each screen, decoding properties, styles and events
//! 4. **Image Recoding** - Recode collected image assets to RGB565
//! 5. **Serialization** - Render the document as ESPHome YAML

pub mod assets;
pub mod codegen;
pub mod compiler;
pub mod document;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod project;
pub mod yaml;

// Re-export the main conversion API
pub use compiler::{assemble_images, convert_file, convert_project, ConvertOptions};

// Re-export model types
pub use assets::{AssetRecoder, AssetTable, Rgb565Recoder};
pub use document::{Document, Fragment, ImageEntry, Mapping, Value};
pub use error::{AssetError, ConvertError, DecodeError, Result};
pub use identity::{slugify, IdentityIndex};
pub use project::{load_project, Project, PropertyRecord, PropertyValue, SourceNode};
