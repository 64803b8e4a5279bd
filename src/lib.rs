mod batch;
mod config;
mod convert;
mod document;
mod error;
pub mod logging;
mod merge;
mod paths;
mod reference;
mod resolver;

pub use batch::{Job, Summary, discover_roots, plan_outputs, run};
pub use config::{Config, ConverterConfig, MergeConfig, MetadataConfig, Overrides, ResolveConfig};
pub use convert::Converter;
pub use document::{Built, build_document, default_output, locate_root};
pub use error::Error;
pub use merge::{merge_files, rewrite_image_paths, strip_front_matter};
pub use paths::{absolutize, has_markdown_extension, normalize};
pub use reference::{DEFAULT_SECTION_MARKER, Reference, ReferenceGrammar};
pub use resolver::{ResolvedFileSet, Resolution, RootDocument, resolve};

use std::path::Path;

/// Resolve the files a root document references, using default settings.
pub fn resolve_files(root: &Path) -> Result<ResolvedFileSet, Error> {
    let document = RootDocument::read(root)?;
    let grammar = ReferenceGrammar::new(DEFAULT_SECTION_MARKER)?;
    Ok(resolve(&document, None, &grammar).files)
}
