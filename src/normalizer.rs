//! Removal of reference markers and figure/table caption prefixes.
//!
//! Markers are matched with patterns rather than enumerated, so there is no
//! upper bound on the marker number. Caption labels are matched literally.

use crate::config::SplittingConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static RE_NUMERIC_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[0-9]+\]").unwrap());

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    strip_references: bool,
    captions: Vec<Regex>,
}

impl TextNormalizer {
    pub fn from_config(config: &SplittingConfig) -> Self {
        let captions = config
            .caption_labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .filter_map(|label| {
                let pattern = format!(r"{} [0-9]+\. ", regex::escape(label));
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(err) => {
                        tracing::warn!(%label, "Skipping caption label: {err}");
                        None
                    }
                }
            })
            .collect();

        Self {
            strip_references: config.strip_reference_markers,
            captions,
        }
    }

    /// Strip every configured marker. Passes repeat until nothing changes, so
    /// markers exposed by an earlier removal are removed too.
    pub fn clean(&self, input: &str) -> String {
        let mut text = input.to_string();
        loop {
            let before = text.len();
            if self.strip_references {
                text = remove_all(&RE_NUMERIC_REFERENCE, text);
            }
            for caption in &self.captions {
                text = remove_all(caption, text);
            }
            if text.len() == before {
                return text;
            }
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::from_config(&SplittingConfig::default())
    }
}

fn remove_all(re: &Regex, text: String) -> String {
    match re.replace_all(&text, "") {
        Cow::Borrowed(_) => text,
        Cow::Owned(replaced) => replaced,
    }
}
