//! Chunk boundary selection.
//!
//! A chunk first takes `target_words` word tokens from the cursor, then its
//! end is moved forward to the first paragraph break (`"\n\n"`) or, failing
//! that, the first sentence break (`". "`) that starts within the snap window.
//! With neither in reach the chunk is cut right after the last word.

use crate::text_utils::words;

/// Default look-ahead, in characters, for a paragraph or sentence break.
pub const DEFAULT_SNAP_WINDOW: usize = 100;

const PARAGRAPH_BREAK: &str = "\n\n";
const SENTENCE_BREAK: &str = ". ";

/// Which boundary ended a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Paragraph,
    Sentence,
    HardCut,
}

/// One chunk's span in byte offsets of the full text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    /// Offset right after the last counted word.
    pub raw_end: usize,
    /// Offset after boundary snapping; the next chunk starts here.
    pub end: usize,
    pub boundary: Boundary,
}

impl Segment {
    /// The chunk text with surrounding whitespace removed.
    pub fn text<'a>(&self, full_text: &'a str) -> &'a str {
        full_text[self.start..self.end].trim()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    snap_window: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_WINDOW)
    }
}

impl Segmenter {
    pub fn new(snap_window: usize) -> Self {
        Self { snap_window }
    }

    /// Next segment starting at byte offset `start`, or `None` when no word
    /// remains after it.
    pub fn segment(&self, text: &str, start: usize, target_words: usize) -> Option<Segment> {
        if start >= text.len() {
            return None;
        }

        let target = target_words.max(1);
        let mut counted = 0usize;
        let mut raw_end = start;
        for word in words(&text[start..]) {
            counted += 1;
            raw_end = start + word.end();
            if counted >= target {
                break;
            }
        }
        if counted == 0 {
            return None;
        }

        let (end, boundary) = self.snap(text, raw_end);
        Some(Segment {
            start,
            raw_end,
            end,
            boundary,
        })
    }

    /// Only breaks whose first character lies less than `snap_window`
    /// characters past `raw_end` count. The scanned slice therefore stops one
    /// character past the window so a two-character break starting at its
    /// last position is still seen.
    fn snap(&self, text: &str, raw_end: usize) -> (usize, Boundary) {
        let rest = &text[raw_end..];
        let scan_len = rest
            .char_indices()
            .nth(self.snap_window.saturating_add(1))
            .map_or(rest.len(), |(idx, _)| idx);
        let window = &rest[..scan_len];

        if let Some(pos) = window.find(PARAGRAPH_BREAK) {
            return (raw_end + pos + PARAGRAPH_BREAK.len(), Boundary::Paragraph);
        }
        if let Some(pos) = window.find(SENTENCE_BREAK) {
            return (raw_end + pos + SENTENCE_BREAK.len(), Boundary::Sentence);
        }
        (raw_end, Boundary::HardCut)
    }
}
