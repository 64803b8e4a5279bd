use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub resolve: ResolveConfig,
    pub merge: MergeConfig,
    pub converter: ConverterConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolveConfig {
    pub root_name: String,
    pub section_marker: String,
    pub ignore: Vec<String>,
    pub repo_root: Option<PathBuf>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            root_name: "README.md".to_string(),
            section_marker: "➢".to_string(),
            ignore: vec![
                ".git".to_string(),
                "target".to_string(),
                "node_modules".to_string(),
            ],
            repo_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    /// Concatenate into one temporary file before converting. When off, the
    /// converter receives the resolved files as separate arguments.
    pub combine: bool,
    pub rewrite_images: bool,
    pub separator: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            combine: true,
            rewrite_images: true,
            separator: "\n\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    pub program: String,
    /// Extra arguments placed before the input files.
    pub args: Vec<String>,
    pub toc: bool,
    pub stylesheet: Option<PathBuf>,
    pub paper: Option<String>,
    pub margin: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            args: Vec::new(),
            toc: true,
            stylesheet: None,
            paper: Some("a4".to_string()),
            margin: Some("2cm".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetadataConfig {
    pub title: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            version: None,
            language: Some("en".to_string()),
        }
    }
}

/// Values given on the command line. `None` leaves the config untouched.
#[derive(Debug, Default)]
pub struct Overrides {
    pub stylesheet: Option<PathBuf>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub repo_root: Option<PathBuf>,
    pub no_toc: bool,
}

impl Config {
    /// The defaults bundled with the binary.
    pub fn compiled_default() -> Self {
        Self::parse(DEFAULT_CONFIG).unwrap_or_default()
    }

    pub fn parse(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::compiled_default()),
            Err(source) => Err(Error::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(stylesheet) = overrides.stylesheet {
            self.converter.stylesheet = Some(stylesheet);
        }
        if let Some(title) = overrides.title {
            self.metadata.title = Some(title);
        }
        if let Some(author) = overrides.author {
            self.metadata.author = Some(author);
        }
        if let Some(version) = overrides.version {
            self.metadata.version = Some(version);
        }
        if let Some(repo_root) = overrides.repo_root {
            self.resolve.repo_root = Some(repo_root);
        }
        if overrides.no_toc {
            self.converter.toc = false;
        }
    }
}
