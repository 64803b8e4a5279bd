//! Recursive mode: every root document below a directory tree.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::convert::Converter;
use crate::document::{Built, build_with, default_output};
use crate::error::Error;
use crate::reference::ReferenceGrammar;

/// One root document and where its PDF goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub root: PathBuf,
    pub output: PathBuf,
}

/// Aggregated outcome of a run.
#[derive(Debug, Default)]
pub struct Summary {
    pub built: Vec<Built>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl Summary {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }
}

/// Find every file named `root_name` below `tree`, in path order.
///
/// Hidden directories and directories named in `ignore` are not entered.
pub fn discover_roots(tree: &Path, root_name: &str, ignore: &[String]) -> Vec<PathBuf> {
    WalkDir::new(tree)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, ignore))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == root_name)
        .map(DirEntry::into_path)
        .collect()
}

fn is_skipped_dir(entry: &DirEntry, ignore: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || ignore.iter().any(|skip| *skip == name)
}

/// Pair each root with its output path.
///
/// Without `out_dir` each PDF lands next to its root. With it, the root at
/// `tree/a/b/README.md` becomes `out_dir/a/b.pdf` and the tree's own root
/// becomes `out_dir/<tree name>.pdf`.
pub fn plan_outputs(tree: &Path, roots: Vec<PathBuf>, out_dir: Option<&Path>) -> Vec<Job> {
    roots
        .into_iter()
        .map(|root| {
            let output = match out_dir {
                Some(out_dir) => out_dir.join(output_name(tree, &root)),
                None => default_output(&root),
            };
            Job { root, output }
        })
        .collect()
}

fn output_name(tree: &Path, root: &Path) -> PathBuf {
    let relative_dir = root
        .parent()
        .and_then(|dir| dir.strip_prefix(tree).ok())
        .filter(|rel| !rel.as_os_str().is_empty());

    // Appended rather than `with_extension` so `v1.2/` keeps its full name.
    let mut name = match relative_dir {
        Some(rel) => rel.as_os_str().to_os_string(),
        None => std::path::absolute(tree)
            .ok()
            .and_then(|abs| abs.file_name().map(|n| n.to_os_string()))
            .unwrap_or_else(|| "document".into()),
    };
    name.push(".pdf");
    PathBuf::from(name)
}

/// Build every job in order. A failing job is recorded and the run goes on.
pub fn run(jobs: &[Job], config: &Config) -> Result<Summary, Error> {
    let grammar = ReferenceGrammar::new(&config.resolve.section_marker)?;
    let converter = Converter::new(&config.converter, &config.metadata);
    let mut summary = Summary::default();

    for job in jobs {
        match build_with(&job.root, &job.output, config, &grammar, &converter) {
            Ok(built) => summary.built.push(built),
            Err(e) => {
                tracing::error!(root = %job.root.display(), error = %e, "failed to build document");
                summary.failed.push((job.root.clone(), e));
            }
        }
    }

    tracing::info!(
        built = summary.built.len(),
        failed = summary.failed.len(),
        "finished"
    );
    Ok(summary)
}
