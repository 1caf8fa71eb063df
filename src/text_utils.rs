//! Word counting shared by statistics and the segmenter.

use once_cell::sync::Lazy;
use regex::{Matches, Regex};

/// A word is a maximal run of Unicode word characters.
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Count word tokens in `text`.
pub fn count_words(text: &str) -> usize {
    RE_WORD.find_iter(text).count()
}

/// Iterate over word tokens in order; match offsets are relative to `text`.
pub fn words(text: &str) -> Matches<'static, '_> {
    RE_WORD.find_iter(text)
}

/// Character offset of a byte offset, for user-facing positions.
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_latin_and_cyrillic_words() {
        assert_eq!(count_words("Alpha beta, gamma!"), 3);
        assert_eq!(count_words("Мама мыла раму."), 3);
        assert_eq!(count_words("snake_case and 42 apples"), 4);
    }

    #[test]
    fn empty_and_punctuation_only_have_no_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  ... -- !? \n\n"), 0);
    }

    #[test]
    fn counting_is_deterministic() {
        let text = "Один, два; three-four.\n\nfive";
        assert_eq!(count_words(text), count_words(text));
        assert_eq!(count_words(text), 5);
    }

    #[test]
    fn word_offsets_are_relative_to_slice() {
        let text = "  hello world";
        let spans: Vec<(usize, usize)> = words(text).map(|m| (m.start(), m.end())).collect();
        assert_eq!(spans, vec![(2, 7), (8, 13)]);
    }

    #[test]
    fn char_offset_handles_multibyte_text() {
        let text = "Привет мир";
        let byte = text.find("мир").expect("phrase should be present");
        assert_eq!(char_offset(text, byte), 7);
    }
}
