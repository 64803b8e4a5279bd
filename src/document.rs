use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::convert::Converter;
use crate::error::Error;
use crate::merge::merge_files;
use crate::reference::ReferenceGrammar;
use crate::resolver::{RootDocument, resolve};

/// A PDF that was produced successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Number of Markdown files bound into the PDF, root included.
    pub files: usize,
}

/// The root document for `input`: the file itself, or `<input>/<root_name>`
/// for a directory.
pub fn locate_root(input: &Path, root_name: &str) -> PathBuf {
    if input.is_dir() {
        input.join(root_name)
    } else {
        input.to_path_buf()
    }
}

/// Default PDF location: next to the root document.
pub fn default_output(root: &Path) -> PathBuf {
    root.with_extension("pdf")
}

/// Resolve, merge and convert one root document.
pub fn build_document(input: &Path, output: &Path, config: &Config) -> Result<Built, Error> {
    let grammar = ReferenceGrammar::new(&config.resolve.section_marker)?;
    let converter = Converter::new(&config.converter, &config.metadata);
    build_with(input, output, config, &grammar, &converter)
}

pub(crate) fn build_with(
    input: &Path,
    output: &Path,
    config: &Config,
    grammar: &ReferenceGrammar,
    converter: &Converter,
) -> Result<Built, Error> {
    let root_path = locate_root(input, &config.resolve.root_name);
    let root = RootDocument::read(&root_path)?;
    tracing::info!(root = %root.path().display(), "building document");

    let resolution = resolve(&root, config.resolve.repo_root.as_deref(), grammar);
    for reference in &resolution.unresolved {
        tracing::warn!(root = %root.path().display(), "skipping unresolved {}", reference);
    }
    let files = resolution.files;
    tracing::debug!(files = ?files.as_slice(), "resolved files");

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if config.merge.combine {
        let merged = merge_files(&files, &config.merge)?;
        // Removed on drop, whether or not the conversion succeeds.
        let mut temp = tempfile::Builder::new()
            .prefix("mdbind-")
            .suffix(".md")
            .tempfile()?;
        temp.write_all(merged.as_bytes())?;
        temp.flush()?;
        converter.convert(&[temp.path().to_path_buf()], output)?;
    } else {
        converter.convert(files.as_slice(), output)?;
    }

    tracing::info!(output = %output.display(), files = files.len(), "created PDF");
    Ok(Built {
        root: root.path().to_path_buf(),
        output: output.to_path_buf(),
        files: files.len(),
    })
}
