//! Entry point for the book splitter.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Set up logging to the console and `splitter.log`.
//! - Load user configuration from `conf/config.toml`.
//! - Hand over to the interactive session.

mod book_loader;
mod config;
mod document;
mod error;
mod i18n;
mod normalizer;
mod prompts;
mod scheduler;
mod segmenter;
mod session;
mod text_utils;

use crate::config::load_config;
use crate::prompts::ConsolePrompter;
use crate::session::{Outcome, SessionOptions, run_session};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Split a book into daily reading chunks sized to your reading speed.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Book to split (.fb2, .fb2.zip, .epub or .txt); asked for when omitted.
    book: Option<PathBuf>,
    /// Settings file.
    #[arg(long, default_value = "conf/config.toml")]
    config: PathBuf,
    /// Directory with the interface translations.
    #[arg(long, default_value = "locales")]
    locales: PathBuf,
    /// Log file, appended to on every run.
    #[arg(long, default_value = "splitter.log")]
    log_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let reload_handle = init_tracing(&cli.log_file);
    if let Err(err) = run(cli, &reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, reload_handle: &ReloadHandle) -> Result<()> {
    let loaded = load_config(&cli.config);
    set_log_level(reload_handle, loaded.config.log_level.as_filter_str());
    info!(
        config = %cli.config.display(),
        first_run = loaded.first_run,
        level = %loaded.config.log_level,
        "Starting book splitter"
    );

    let options = SessionOptions {
        book: cli.book,
        config_path: cli.config,
        locales_dir: cli.locales,
        show_progress: true,
    };
    let mut prompter = ConsolePrompter::new();
    let today = Local::now().date_naive();
    let outcome =
        run_session(&mut prompter, &options, loaded, today).context("Splitting run failed")?;
    match outcome {
        Outcome::Completed(summary) => info!(chunks = summary.chunk_count, "Run finished"),
        other => info!(outcome = ?other, "Run ended without splitting"),
    }
    Ok(())
}

/// Warnings go to stderr; everything allowed by the reloadable filter goes to
/// the log file.
fn init_tracing(log_file: &Path) -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    let file_layer = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        ),
        Err(err) => {
            eprintln!("Cannot open log file {}: {err}", log_file.display());
            None
        }
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();
    info!(path = %log_file.display(), "Logging initialized; override level with config log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
