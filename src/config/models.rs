use serde::Deserialize;

/// High-level app configuration, flattened from the TOML tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub minutes_per_day: u32,
    pub words_per_minute: u32,
    pub language: Language,
    pub splitting: SplittingConfig,
    pub log_level: LogLevel,
}

impl AppConfig {
    /// Words in one day's chunk.
    pub fn words_per_chunk(&self) -> usize {
        self.words_per_minute as usize * self.minutes_per_day as usize
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            minutes_per_day: crate::config::defaults::default_minutes_per_day(),
            words_per_minute: crate::config::defaults::default_words_per_minute(),
            language: Language::default(),
            splitting: SplittingConfig::default(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

/// The `[splitting]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SplittingConfig {
    /// Characters past the word cutoff within which a paragraph or sentence
    /// break is accepted.
    #[serde(default = "crate::config::defaults::default_snap_window_chars")]
    pub snap_window_chars: usize,
    #[serde(default = "crate::config::defaults::default_strip_reference_markers")]
    pub strip_reference_markers: bool,
    #[serde(default = "crate::config::defaults::default_caption_labels")]
    pub caption_labels: Vec<String>,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        SplittingConfig {
            snap_window_chars: crate::config::defaults::default_snap_window_chars(),
            strip_reference_markers: crate::config::defaults::default_strip_reference_markers(),
            caption_labels: crate::config::defaults::default_caption_labels(),
        }
    }
}

/// Interface language.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ru" => Some(Language::Ru),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
