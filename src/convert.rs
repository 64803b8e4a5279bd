//! Invocation of the external document converter.
//!
//! Arguments follow pandoc's conventions; other tools can be plugged in
//! through `converter.program` and `converter.args`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{ConverterConfig, MetadataConfig};
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Converter {
    program: String,
    args: Vec<String>,
    toc: bool,
    stylesheet: Option<PathBuf>,
    paper: Option<String>,
    margin: Option<String>,
    metadata: Vec<(&'static str, String)>,
}

impl Converter {
    pub fn new(config: &ConverterConfig, metadata: &MetadataConfig) -> Self {
        let metadata = [
            ("title", &metadata.title),
            ("author", &metadata.author),
            ("version", &metadata.version),
            ("lang", &metadata.language),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect();

        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            toc: config.toc,
            stylesheet: config.stylesheet.clone(),
            paper: config.paper.clone(),
            margin: config.margin.clone(),
            metadata,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the converter command for `inputs`, writing to `output`.
    pub fn command(&self, inputs: &[PathBuf], output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.arguments(inputs, output));
        command
    }

    fn arguments(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();

        args.extend(inputs.iter().map(|p| p.as_os_str().to_owned()));
        args.push("-o".into());
        args.push(output.as_os_str().to_owned());

        if self.toc {
            args.push("--toc".into());
        }
        if let Some(ref stylesheet) = self.stylesheet {
            args.push("--css".into());
            args.push(stylesheet.as_os_str().to_owned());
        }
        for (key, value) in &self.metadata {
            args.push("-M".into());
            args.push(format!("{}={}", key, value).into());
        }
        if let Some(ref paper) = self.paper {
            args.push("-V".into());
            args.push(format!("papersize={}", paper).into());
        }
        if let Some(ref margin) = self.margin {
            args.push("-V".into());
            args.push(format!("geometry:margin={}", margin).into());
        }

        args
    }

    /// Run the converter once and wait for it.
    pub fn convert(&self, inputs: &[PathBuf], output: &Path) -> Result<(), Error> {
        let mut command = self.command(inputs, output);
        tracing::debug!(command = ?command, "running converter");

        let result = command.output().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        if !result.status.success() {
            return Err(Error::Conversion {
                status: result.status.to_string(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(program = %self.program, stderr = %stderr, "converter diagnostics");
        }
        Ok(())
    }
}
