//! Resolution of a root document into the ordered set of files to bind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;
use crate::paths::{absolutize, has_markdown_extension, normalize};
use crate::reference::{Reference, ReferenceGrammar};

/// The entry document: its text and where it lives.
#[derive(Debug, Clone)]
pub struct RootDocument {
    path: PathBuf,
    dir: PathBuf,
    text: String,
}

impl RootDocument {
    /// Read a root document from disk. The stored path is absolute and normalized.
    pub fn read(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let path = std::path::absolute(path)?;
        Ok(Self::new(path, text))
    }

    /// Build a root document from text already in memory. A relative `path`
    /// is taken from the current directory.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path: PathBuf = path.into();
        let path = normalize(&std::path::absolute(&path).unwrap_or(path));
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self {
            path,
            dir,
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered, duplicate-free list of files. The root document is always first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFileSet {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl ResolvedFileSet {
    pub fn new(root: &Path) -> Self {
        let root = normalize(root);
        Self {
            paths: vec![root.clone()],
            seen: HashSet::from([root]),
        }
    }

    /// Append `path` unless an equal normalized path is already present.
    pub fn insert(&mut self, path: &Path) -> bool {
        let path = normalize(path);
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn root(&self) -> &Path {
        &self.paths[0]
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Never true: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Outcome of resolving a root document.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub files: ResolvedFileSet,
    /// Markdown links to missing files and markers naming missing directories.
    pub unresolved: Vec<Reference>,
}

/// Resolve every file `root` references.
///
/// Links starting with a separator are taken from `repo_root` when given
/// (relative to the current directory if it is relative), otherwise from the
/// root document's directory. Links to anything but an
/// existing Markdown file are dropped. Section markers pull in every Markdown
/// file below their directory in file-name order.
pub fn resolve(
    root: &RootDocument,
    repo_root: Option<&Path>,
    grammar: &ReferenceGrammar,
) -> Resolution {
    let repo_root =
        repo_root.map(|dir| std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf()));
    let mut files = ResolvedFileSet::new(root.path());
    let mut unresolved = Vec::new();

    for reference in grammar.scan(root.text()) {
        let found = match &reference {
            Reference::Link { target } => resolve_link(target, root.dir(), repo_root.as_deref()),
            Reference::Section { dir } => resolve_section(dir, root.dir()),
        };
        match found {
            Lookup::Files(paths) => {
                for path in &paths {
                    files.insert(path);
                }
            }
            Lookup::Ignored => {}
            Lookup::Missing => unresolved.push(reference),
        }
    }

    Resolution { files, unresolved }
}

enum Lookup {
    Files(Vec<PathBuf>),
    /// Not a document reference at all (e.g. a link to an image).
    Ignored,
    Missing,
}

fn resolve_link(target: &str, dir: &Path, repo_root: Option<&Path>) -> Lookup {
    let path = match target.strip_prefix(['/', '\\']) {
        Some(rooted) => absolutize(Path::new(rooted), repo_root.unwrap_or(dir)),
        None => absolutize(Path::new(target), dir),
    };

    if !has_markdown_extension(&path) {
        return Lookup::Ignored;
    }
    if path.is_file() {
        Lookup::Files(vec![path])
    } else {
        Lookup::Missing
    }
}

fn resolve_section(name: &str, dir: &Path) -> Lookup {
    let section = absolutize(Path::new(name), dir);
    if !section.is_dir() {
        return Lookup::Missing;
    }

    let files = WalkDir::new(&section)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        // `Path::is_file` follows symlinks, as a direct link to the file would
        .filter(|entry| entry.path().is_file() && has_markdown_extension(entry.path()))
        .map(|entry| normalize(entry.path()))
        .collect();

    Lookup::Files(files)
}
