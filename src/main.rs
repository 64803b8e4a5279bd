use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use mdbind::{Config, Job, Overrides};

const DEFAULT_CONFIG_FILE: &str = "mdbind.toml";

#[derive(Parser)]
#[command(name = "mdbind")]
#[command(about = "Bind a README and the Markdown files it links to into one PDF")]
struct Cli {
    /// Root document, or a directory containing one
    input: PathBuf,

    /// Output PDF file, or output directory with --recursive
    /// (defaults to the root document's name with a .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Build every root document found under INPUT
    #[arg(short, long)]
    recursive: bool,

    /// Configuration file (defaults to ./mdbind.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stylesheet passed to the converter
    #[arg(long = "css", value_name = "PATH")]
    stylesheet: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Document author
    #[arg(long)]
    author: Option<String>,

    /// Document version
    #[arg(long = "doc-version", value_name = "VERSION")]
    version: Option<String>,

    /// Directory that links starting with '/' are resolved against
    #[arg(long, value_name = "DIR")]
    repo_root: Option<PathBuf>,

    /// Do not ask the converter for a table of contents
    #[arg(long)]
    no_toc: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    mdbind::logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(ref path) = cli.config {
        anyhow::ensure!(path.is_file(), "config file {} not found", path.display());
    }
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    config.apply_overrides(Overrides {
        stylesheet: cli.stylesheet,
        title: cli.title,
        author: cli.author,
        version: cli.version,
        repo_root: cli.repo_root,
        no_toc: cli.no_toc,
    });

    let jobs = if cli.recursive {
        recursive_jobs(&cli.input, cli.output.as_deref(), &config)
    } else {
        vec![single_job(&cli.input, cli.output, &config)]
    };

    if jobs.is_empty() {
        tracing::warn!(
            input = %cli.input.display(),
            root_name = %config.resolve.root_name,
            "no root documents found"
        );
    }

    let summary = mdbind::run(&jobs, &config)?;
    for built in &summary.built {
        println!("Created {}", built.output.display());
    }
    for (root, e) in &summary.failed {
        eprintln!("Error building {}: {}", root.display(), e);
    }

    Ok(ExitCode::from(summary.exit_code() as u8))
}

fn single_job(input: &Path, output: Option<PathBuf>, config: &Config) -> Job {
    let root = mdbind::locate_root(input, &config.resolve.root_name);
    let output = output.unwrap_or_else(|| mdbind::default_output(&root));
    Job { root, output }
}

fn recursive_jobs(tree: &Path, out_dir: Option<&Path>, config: &Config) -> Vec<Job> {
    let roots = mdbind::discover_roots(tree, &config.resolve.root_name, &config.resolve.ignore);
    mdbind::plan_outputs(tree, roots, out_dir)
}
