use super::models::{AppConfig, Language};
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration plus whether the interactive first-run setup is still due.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub first_run: bool,
}

impl Default for LoadedConfig {
    fn default() -> Self {
        LoadedConfig {
            config: AppConfig::default(),
            first_run: true,
        }
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> LoadedConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return LoadedConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(loaded) => {
            debug!(first_run = loaded.first_run, "Parsed configuration from disk");
            loaded
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            LoadedConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<LoadedConfig, toml::de::Error> {
    let tables: ConfigTables = toml::from_str(contents)?;
    let (config, first_run) = tables.into_app_config();
    Ok(LoadedConfig { config, first_run })
}

/// Persist the reading settings.
///
/// A new file gets a commented template in the interface language. An
/// existing file only has its `minutes_per_day`, `words_per_minute` and
/// `language` lines rewritten so user comments survive.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(existing) => update_reading_values(&existing, config),
        Err(_) => render_template(config),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    info!(
        path = %path.display(),
        minutes = config.minutes_per_day,
        wpm = config.words_per_minute,
        language = %config.language,
        "Saved config"
    );
    Ok(())
}

const READING_KEYS: [&str; 3] = ["minutes_per_day", "words_per_minute", "language"];

fn reading_line(key: &str, config: &AppConfig) -> String {
    match key {
        "minutes_per_day" => format!("minutes_per_day = {}", config.minutes_per_day),
        "words_per_minute" => format!("words_per_minute = {}", config.words_per_minute),
        _ => format!("language = \"{}\"", config.language.code()),
    }
}

fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}

fn update_reading_values(existing: &str, config: &AppConfig) -> String {
    let mut seen = [false; READING_KEYS.len()];
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            let position = line_key(line).and_then(|key| READING_KEYS.iter().position(|k| *k == key));
            match position {
                Some(idx) => {
                    seen[idx] = true;
                    reading_line(READING_KEYS[idx], config)
                }
                None => line.to_string(),
            }
        })
        .collect();

    let missing: Vec<String> = READING_KEYS
        .iter()
        .zip(seen)
        .filter(|(_, seen)| !seen)
        .map(|(key, _)| reading_line(key, config))
        .collect();

    if !missing.is_empty() {
        match lines.iter().position(|line| line.trim() == "[reading]") {
            Some(header) => {
                for (offset, line) in missing.into_iter().enumerate() {
                    lines.insert(header + 1 + offset, line);
                }
            }
            None => {
                if lines.last().is_some_and(|line| !line.trim().is_empty()) {
                    lines.push(String::new());
                }
                lines.push("[reading]".to_string());
                lines.extend(missing);
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_template(config: &AppConfig) -> String {
    let minutes = config.minutes_per_day;
    let wpm = config.words_per_minute;
    let language = config.language.code();
    let window = config.splitting.snap_window_chars;
    let strip = config.splitting.strip_reference_markers;
    let labels = config
        .splitting
        .caption_labels
        .iter()
        .map(|label| format!("{label:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    let level = config.log_level;

    match config.language {
        Language::Ru => format!(
            r#"# Настройки для скорочтения

[reading]
# Рекомендуемое время ежедневных тренировок (минуты)
# 5-10 минут достаточно для начала без переутомления
minutes_per_day = {minutes}

# Целевая скорость чтения (слов в минуту)
# Средняя скорость: 200-300 слов/мин
# 350-500 - хорошая цель для начала скорочтения
words_per_minute = {wpm}

# Язык интерфейса. Доступны: "en" (английский), "ru" (русский)
language = "{language}"

[splitting]
# На сколько символов фрагмент может продлиться, чтобы закончиться на абзаце или предложении
snap_window_chars = {window}
# Удалять ссылки вида [12] при очистке сносок
strip_reference_markers = {strip}
# Подписи, удаляемые при очистке, например "Рис. 3. "
caption_labels = [{labels}]

[logging]
# Одно из: trace, debug, info, warn, error
log_level = "{level}"
"#
        ),
        Language::En => format!(
            r#"# Settings for speed reading

[reading]
# Recommended daily training time (minutes)
# 5-10 minutes is enough to start without overexertion
minutes_per_day = {minutes}

# Target reading speed (words per minute)
# Average speed: 200-300 words/min
# 350-500 is a good goal to start speed reading
words_per_minute = {wpm}

# Interface language. Available: "en" (English), "ru" (Russian)
language = "{language}"

[splitting]
# How many characters a chunk may stretch to end on a paragraph or sentence
snap_window_chars = {window}
# Remove numbered references such as [12] when cleaning footnotes
strip_reference_markers = {strip}
# Caption prefixes removed when cleaning, e.g. "Рис. 3. "
caption_labels = [{labels}]

[logging]
# One of: trace, debug, info, warn, error
log_level = "{level}"
"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_a_first_run_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let loaded = load_config(&dir.path().join("absent.toml"));
        assert!(loaded.first_run);
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(loaded.config.words_per_chunk(), 2800);
    }

    #[test]
    fn missing_language_marks_first_run_but_keeps_values() {
        let loaded = parse_config("[reading]\nminutes_per_day = 5\nwords_per_minute = 400\n")
            .expect("config should parse");
        assert!(loaded.first_run);
        assert_eq!(loaded.config.minutes_per_day, 5);
        assert_eq!(loaded.config.words_per_minute, 400);
    }

    #[test]
    fn unknown_language_falls_back_to_english_first_run() {
        let loaded = parse_config("[reading]\nlanguage = \"de\"\n").expect("config should parse");
        assert!(loaded.first_run);
        assert_eq!(loaded.config.language, Language::En);
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let loaded = parse_config(
            "[reading]\nminutes_per_day = 0\nwords_per_minute = 0\nlanguage = \"ru\"\n",
        )
        .expect("config should parse");
        assert!(!loaded.first_run);
        assert_eq!(loaded.config.language, Language::Ru);
        assert_eq!(loaded.config.minutes_per_day, 8);
        assert_eq!(loaded.config.words_per_minute, 350);
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[reading\nminutes_per_day = ").expect("config should be written");
        assert_eq!(load_config(&path), LoadedConfig::default());
    }

    #[test]
    fn template_round_trips_through_the_loader() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("conf").join("config.toml");
        let config = AppConfig {
            minutes_per_day: 12,
            words_per_minute: 420,
            language: Language::Ru,
            log_level: LogLevel::Debug,
            ..AppConfig::default()
        };

        save_config(&path, &config).expect("config should save");
        let written = fs::read_to_string(&path).expect("config should exist");
        assert!(written.starts_with("# Настройки для скорочтения"));

        let loaded = load_config(&path);
        assert!(!loaded.first_run);
        assert_eq!(loaded.config, config);
    }

    #[test]
    fn existing_file_keeps_comments_and_other_tables() {
        let existing = "# my notes\n[reading]\n# pace\nwords_per_minute = 300\nminutes_per_day = 5\nlanguage = \"en\"\n\n[logging]\nlog_level = \"warn\"\n";
        let config = AppConfig {
            minutes_per_day: 9,
            words_per_minute: 500,
            language: Language::Ru,
            ..AppConfig::default()
        };

        let updated = update_reading_values(existing, &config);
        assert_eq!(
            updated,
            "# my notes\n[reading]\n# pace\nwords_per_minute = 500\nminutes_per_day = 9\nlanguage = \"ru\"\n\n[logging]\nlog_level = \"warn\"\n"
        );
    }

    #[test]
    fn missing_keys_are_inserted_under_reading_table() {
        let existing = "[reading]\nminutes_per_day = 5\n";
        let config = AppConfig {
            minutes_per_day: 6,
            ..AppConfig::default()
        };

        let updated = update_reading_values(existing, &config);
        assert_eq!(
            updated,
            "[reading]\nwords_per_minute = 350\nlanguage = \"en\"\nminutes_per_day = 6\n"
        );
        let loaded = parse_config(&updated).expect("updated config should parse");
        assert!(!loaded.first_run);
    }

    #[test]
    fn missing_reading_table_is_appended() {
        let existing = "[logging]\nlog_level = \"debug\"";
        let updated = update_reading_values(existing, &AppConfig::default());
        assert_eq!(
            updated,
            "[logging]\nlog_level = \"debug\"\n\n[reading]\nminutes_per_day = 8\nwords_per_minute = 350\nlanguage = \"en\"\n"
        );
    }
}
