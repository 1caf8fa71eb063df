//! The loaded book and the read position into it.

use crate::error::SplitError;
use crate::text_utils::{char_offset, count_words};

/// Full extracted book text with its word count. Never mutated once built.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    total_words: usize,
}

impl Document {
    pub fn new(text: String) -> Self {
        let total_words = count_words(&text);
        Self { text, total_words }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Cursor at the first case-sensitive occurrence of `phrase`, or at the
    /// start of the book when the phrase is empty.
    pub fn cursor_at_phrase(&self, phrase: &str) -> Result<Cursor, SplitError> {
        if phrase.is_empty() {
            return Ok(Cursor::default());
        }
        self.text
            .find(phrase)
            .map(Cursor)
            .ok_or_else(|| SplitError::PhraseNotFound {
                phrase: phrase.to_string(),
            })
    }

    /// Character position of a cursor, as shown to the user.
    pub fn char_position(&self, cursor: Cursor) -> usize {
        char_offset(&self.text, cursor.offset())
    }
}

/// Byte offset into a [`Document`]; only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

impl Cursor {
    pub fn offset(self) -> usize {
        self.0
    }

    pub(crate) fn advance_to(&mut self, offset: usize) {
        debug_assert!(offset >= self.0, "cursor must not move backwards");
        self.0 = self.0.max(offset);
    }
}
