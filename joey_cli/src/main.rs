use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use joey_common::{default_config_path, load_config, save_config, DiffConfig};
use joey_core::{DiffEvent, DiffOptions, FilesDiffer, JsonDiffer};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "joey")]
#[command(author = "Joey Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural diff for JSON and YAML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two documents, or the documents of two directories
    Diff {
        /// Source file or directory
        source: PathBuf,

        /// Target file or directory
        target: PathBuf,

        /// Write results to this file, or one file per pair into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (defaults to the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path patterns to skip (can be specified multiple times)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Do not report properties that only exist in the target
        #[arg(long)]
        allow_new_target_properties: bool,

        /// Report paths as arrays of keys
        #[arg(long)]
        path_as_array: bool,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Write a default config file
    Init {
        /// Where to write the config (defaults to the platform config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff {
            source,
            target,
            output,
            config,
            ignore,
            allow_new_target_properties,
            path_as_array,
            no_progress,
        } => run_diff(
            source,
            target,
            output,
            config,
            ignore,
            allow_new_target_properties,
            path_as_array,
            no_progress,
        ),
        Commands::Init { path, force } => run_init(path, force),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_diff(
    source: PathBuf,
    target: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    ignore: Vec<String>,
    allow_new_target_properties: bool,
    path_as_array: bool,
    no_progress: bool,
) -> anyhow::Result<()> {
    let loaded = load_config(config_path.as_deref()).context("Failed to load config")?;
    match (&loaded.path, loaded.exists) {
        (Some(path), true) => info!("Using config {}", path.display()),
        _ => debug!("No config file found, using defaults"),
    }

    let config = merge_flags(loaded.config, ignore, allow_new_target_properties, path_as_array);
    let differ = JsonDiffer::new(DiffOptions::from_config(&config));

    let mut files_differ = FilesDiffer::new(differ);
    let progress = (!no_progress && std::io::stderr().is_terminal()).then(|| ProgressBar::new(0));
    if let Some(bar) = &progress {
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")?
                .progress_chars("=> "),
        );
        let bar = bar.clone();
        files_differ = files_differ.with_progress(move |event| update_progress(&bar, event));
    }

    let results = files_differ
        .diff(&source, &target, output.as_deref())
        .with_context(|| format!("Failed to diff {} against {}", source.display(), target.display()))?;

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    match output {
        Some(output) => info!("Results saved to {}", output.display()),
        None => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    Ok(())
}

/// Command-line flags extend the configured blacklist and switch options on
fn merge_flags(
    mut config: DiffConfig,
    ignore: Vec<String>,
    allow_new_target_properties: bool,
    path_as_array: bool,
) -> DiffConfig {
    config.blacklist.extend(ignore);
    config.allow_new_target_properties |= allow_new_target_properties;
    config.return_path_as_sequence |= path_as_array;
    config
}

fn update_progress(bar: &ProgressBar, event: &DiffEvent) {
    match event {
        DiffEvent::FilesStart { total } => bar.set_length(*total as u64),
        DiffEvent::FileStart { source, .. } => {
            bar.set_message(source.display().to_string());
        }
        DiffEvent::FileEnd { .. } => bar.inc(1),
        DiffEvent::SaveStart { output } => {
            bar.set_message(format!("saving {}", output.display()));
        }
        DiffEvent::SaveEnd { .. } => {}
        DiffEvent::FilesEnd { .. } => bar.finish_and_clear(),
    }
}

fn run_init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => default_config_path().context("Could not determine a config directory")?,
    };

    if path.exists() && !force {
        bail!("{} already exists, use --force to overwrite", path.display());
    }

    save_config(&path, &DiffConfig::default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote default config to {}", path.display());
    println!("{}", path.display());
    Ok(())
}
