//! # Project Converter
//!
//! Main entry points for converting SquareLine projects to ESPHome documents.

use crate::assets::{relative_path, AssetRecoder, AssetTable};
use crate::codegen::{convert_page, WidgetCodeGenerator};
use crate::document::{Document, ImageEntry};
use crate::error::{AssetError, Result};
use crate::identity::IdentityIndex;
use crate::metadata::SCREEN_KIND;
use crate::project::{load_project, Project, SourceNode};
use std::path::{Path, PathBuf};

/// Where a conversion reads assets from and writes its output to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Folder image paths in the project are relative to
    pub project_dir: PathBuf,
    /// Output YAML file, if any. Image files are listed relative to its folder.
    pub output_path: Option<PathBuf>,
}

impl ConvertOptions {
    /// Relative paths are resolved against the current directory
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: absolute(&project_dir.into()),
            output_path: None,
        }
    }

    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(absolute(&output_path.into()));
        self
    }

    /// Options for converting the project file at `input`
    pub fn for_input(input: &Path, output_path: Option<&Path>) -> Self {
        let project_dir = input.parent().map_or(Path::new("."), non_empty_dir);
        let options = Self::new(project_dir);
        match output_path {
            Some(output_path) => options.with_output(output_path),
            None => options,
        }
    }

    /// Folder image paths are made relative to
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_path
            .as_deref()
            .map(|out| out.parent().map_or(Path::new("."), non_empty_dir))
    }
}

fn non_empty_dir(dir: &Path) -> &Path {
    if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Convert a parsed project into an ESPHome document
///
/// This is the main entry point of the converter. Every `SCREEN` in the tree
/// becomes one LVGL page; image assets referenced while converting are recoded
/// and listed in the document's `image:` section.
///
/// # Arguments
///
/// * `project` - The parsed SquareLine project
/// * `options` - Project and output locations used to resolve image files
/// * `recoder` - Converts each referenced image to the embedded pixel format
///
/// # Returns
///
/// The assembled document. Nothing in the tree is fatal: unsupported widgets,
/// broken properties and failed images are logged and left out.
///
/// # Examples
///
/// ```rust,no_run
/// use slesp::{convert_project, ConvertOptions, Project, Rgb565Recoder};
///
/// let project = Project::from_json(&std::fs::read_to_string("ui.spj")?)?;
/// let options = ConvertOptions::new(".");
/// let document = convert_project(&project, &options, &Rgb565Recoder);
/// println!("{}", document.to_yaml()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_project(
    project: &Project,
    options: &ConvertOptions,
    recoder: &dyn AssetRecoder,
) -> Document {
    tracing::info!("[SLESP] Starting conversion");

    // Phase 1: Index named widgets
    tracing::info!("[SLESP] Phase 1: Indexing widget names...");
    let identities = IdentityIndex::build(&project.root);
    tracing::info!("[SLESP] Indexed {} named widgets", identities.len());

    // Phase 2: Convert screens
    tracing::info!("[SLESP] Phase 2: Converting screens...");
    let mut screens = Vec::new();
    collect_screens(&project.root, &mut screens);

    let mut generator = WidgetCodeGenerator::new(&identities);
    let pages: Vec<_> = screens
        .into_iter()
        .filter_map(|screen| convert_page(&mut generator, screen))
        .collect();
    tracing::info!("[SLESP] Converted {} pages", pages.len());

    // Phase 3: Recode images
    tracing::info!("[SLESP] Phase 3: Recoding {} images...", generator.assets().len());
    let images = assemble_images(&generator.into_assets(), options, recoder);

    tracing::info!("[SLESP] Conversion complete");
    Document { pages, images }
}

/// Read, parse and convert the project file at `path`
///
/// # Returns
///
/// * `Ok(Document)` - The converted document
/// * `Err(ConvertError)` - The file is missing, unreadable or not a project
pub fn convert_file(
    path: &Path,
    options: &ConvertOptions,
    recoder: &dyn AssetRecoder,
) -> Result<Document> {
    tracing::info!("[SLESP] Loading {}", path.display());
    let project = load_project(path)?;
    Ok(convert_project(&project, options, recoder))
}

/// Depth-first list of every `SCREEN` node, screens nested in screens included
fn collect_screens<'n>(node: &'n SourceNode, screens: &mut Vec<&'n SourceNode>) {
    if node.kind.as_deref() == Some(SCREEN_KIND) {
        screens.push(node);
    }
    for child in &node.children {
        collect_screens(child, screens);
    }
}

/// Recode every registered asset and build the `image:` entries
///
/// Assets that cannot be recoded are logged and omitted.
pub fn assemble_images(
    assets: &AssetTable,
    options: &ConvertOptions,
    recoder: &dyn AssetRecoder,
) -> Vec<ImageEntry> {
    let output_dir = options.output_dir();
    let mut images = Vec::with_capacity(assets.len());

    for (id, path) in assets.iter() {
        let recoded = if path.is_empty() {
            Err(AssetError::EmptyPath(id.to_string()))
        } else {
            recoder.recode(&options.project_dir.join(path))
        };

        match recoded {
            Ok(file) => {
                let file = match output_dir {
                    Some(dir) => relative_path(&file, dir),
                    None => file,
                };
                images.push(ImageEntry {
                    id: id.to_string(),
                    file: file.to_string_lossy().into_owned(),
                });
            }
            Err(e) => tracing::warn!("Skipping image {}: {}", id, e),
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records requested sources and succeeds for everything but `broken.png`
    #[derive(Default)]
    struct FakeRecoder {
        requested: RefCell<Vec<PathBuf>>,
    }

    impl AssetRecoder for FakeRecoder {
        fn recode(&self, source: &Path) -> std::result::Result<PathBuf, AssetError> {
            self.requested.borrow_mut().push(source.to_path_buf());
            if source.ends_with("broken.png") {
                return Err(AssetError::BadPath(source.to_path_buf()));
            }
            Ok(source.with_extension("rgb565.png"))
        }
    }

    fn table(paths: &[&str]) -> AssetTable {
        let mut assets = AssetTable::new();
        for path in paths {
            assets.register(path);
        }
        assets
    }

    #[test]
    fn test_options_for_input() {
        let options = ConvertOptions::for_input(Path::new("ui.spj"), None);
        assert!(options.project_dir.is_absolute());
        assert_eq!(options.output_dir(), None);

        let options = ConvertOptions::new("/p").with_output("out.yaml");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(options.output_dir(), Some(cwd.as_path()));
    }

    #[test]
    fn test_relative_project_dir_with_absolute_output() {
        let cwd = std::env::current_dir().unwrap();
        let options = ConvertOptions::new(".").with_output(cwd.join("out/ui.yaml"));
        assert!(options.project_dir.is_absolute());

        let images = assemble_images(&table(&["gear.png"]), &options, &FakeRecoder::default());
        assert_eq!(images[0].file, "../gear.rgb565.png");
    }

    #[test]
    fn test_images_relative_to_output_dir() {
        let options = ConvertOptions::new("/proj").with_output("/proj/out/ui.yaml");
        let recoder = FakeRecoder::default();
        let images = assemble_images(&table(&["assets/gear.png"]), &options, &recoder);

        assert_eq!(
            recoder.requested.borrow().as_slice(),
            &[PathBuf::from("/proj/assets/gear.png")]
        );
        assert_eq!(
            images,
            vec![ImageEntry {
                id: "gear_png".to_string(),
                file: "../assets/gear.rgb565.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_images_absolute_without_output() {
        let options = ConvertOptions::new("/proj");
        let images = assemble_images(&table(&["gear.png"]), &options, &FakeRecoder::default());
        assert_eq!(images[0].file, "/proj/gear.rgb565.png");
    }

    #[test]
    fn test_failed_and_empty_assets_are_omitted() {
        let options = ConvertOptions::new("/proj");
        let recoder = FakeRecoder::default();
        let images = assemble_images(&table(&["broken.png", "", "ok.png"]), &options, &recoder);

        assert_eq!(recoder.requested.borrow().len(), 2);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "ok_png");
    }

    #[test]
    fn test_nested_screens_are_found() {
        let screen = |children| SourceNode {
            kind: Some(SCREEN_KIND.to_string()),
            children,
            ..SourceNode::default()
        };
        let root = SourceNode {
            children: vec![screen(vec![screen(vec![])]), screen(vec![])],
            ..SourceNode::default()
        };
        let mut screens = Vec::new();
        collect_screens(&root, &mut screens);
        assert_eq!(screens.len(), 3);
    }
}
