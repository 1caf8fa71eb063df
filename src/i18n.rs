//! Interface message catalogues.
//!
//! Catalogues are flat JSON objects in `locales/<lang>.json`. The English
//! catalogue is compiled in and backs up any missing file or key.

use crate::config::Language;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const BUILTIN_EN: &str = include_str!("../locales/en.json");

#[derive(Debug, Clone)]
pub struct Translations {
    language: Language,
    messages: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl Translations {
    /// English messages from the compiled-in catalogue.
    pub fn builtin() -> Self {
        Self {
            language: Language::En,
            messages: HashMap::new(),
            fallback: builtin_messages(),
        }
    }

    pub fn load(dir: &Path, language: Language) -> Self {
        let path = dir.join(format!("{}.json", language.code()));
        let messages = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                Ok(messages) => {
                    debug!(path = %path.display(), keys = messages.len(), "Loaded translations");
                    messages
                }
                Err(err) => {
                    warn!(path = %path.display(), "Invalid translations JSON: {err}");
                    HashMap::new()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), "Falling back to built-in English messages: {err}");
                HashMap::new()
            }
        };

        Self {
            language,
            messages,
            fallback: builtin_messages(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Message for `key`; the key itself when no catalogue knows it.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// Message for `key` with `{name}` placeholders substituted.
    pub fn format(&self, key: &str, args: &[(&str, String)]) -> String {
        let mut out = self.get(key).to_string();
        for (name, value) in args {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }
}

fn builtin_messages() -> HashMap<String, String> {
    serde_json::from_str(BUILTIN_EN).unwrap_or_default()
}
