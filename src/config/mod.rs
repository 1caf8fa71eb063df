//! Configuration loading for the book splitter.
//!
//! Reading pace, splitting behaviour and logging are loaded from
//! `conf/config.toml` when present. Missing or invalid entries fall back to
//! defaults; a missing file or language marks the run as a first run.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{LoadedConfig, load_config, save_config};
pub use models::{AppConfig, Language, LogLevel, SplittingConfig};
