use super::defaults;
use super::models::{AppConfig, Language, LogLevel, SplittingConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    pub(super) reading: ReadingConfig,
    #[serde(default)]
    pub(super) splitting: SplittingConfig,
    #[serde(default)]
    pub(super) logging: LoggingConfig,
}

impl ConfigTables {
    /// Flatten into an `AppConfig`. The flag is true when no usable
    /// language was configured, which means the user has not been asked yet.
    pub(super) fn into_app_config(self) -> (AppConfig, bool) {
        let language = self.reading.language.as_deref().and_then(|code| {
            let parsed = Language::from_code(code);
            if parsed.is_none() {
                tracing::warn!(%code, "Unknown interface language in config");
            }
            parsed
        });

        let config = AppConfig {
            minutes_per_day: positive_or_default(
                "minutes_per_day",
                self.reading.minutes_per_day,
                defaults::default_minutes_per_day(),
            ),
            words_per_minute: positive_or_default(
                "words_per_minute",
                self.reading.words_per_minute,
                defaults::default_words_per_minute(),
            ),
            language: language.unwrap_or_default(),
            splitting: self.splitting,
            log_level: self.logging.log_level,
        };
        (config, language.is_none())
    }
}

fn positive_or_default(key: &str, value: u32, fallback: u32) -> u32 {
    if value == 0 {
        tracing::warn!(%key, fallback, "Config value must be positive; using default");
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ReadingConfig {
    #[serde(default = "defaults::default_minutes_per_day")]
    minutes_per_day: u32,
    #[serde(default = "defaults::default_words_per_minute")]
    words_per_minute: u32,
    #[serde(default)]
    language: Option<String>,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            minutes_per_day: defaults::default_minutes_per_day(),
            words_per_minute: defaults::default_words_per_minute(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
