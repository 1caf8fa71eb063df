//! Daily chunk scheduling.
//!
//! The scheduler walks the document with the segmenter, gives each chunk the
//! next calendar day and hands it to a [`ChunkSink`]. Only counters survive a
//! chunk; the text is dropped as soon as the sink has it. The first sink
//! failure ends the run, and files already written stay on disk.

use crate::document::{Cursor, Document};
use crate::error::SplitError;
use crate::segmenter::{Segment, Segmenter};
use crate::text_utils::count_words;
use chrono::{Days, NaiveDate};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// One day's reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<'a> {
    /// Zero-based day index.
    pub index: usize,
    pub date: NaiveDate,
    /// Trimmed chunk text.
    pub text: &'a str,
    /// Words in `text`, counted after boundary snapping.
    pub word_count: usize,
    pub segment: Segment,
}

/// Destination for finished chunks.
pub trait ChunkSink {
    fn write_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SplitError>;
}

/// Receives the word count of every chunk as it is written.
pub trait ProgressSink {
    fn advance(&mut self, words: usize);
}

impl ProgressSink for ProgressBar {
    fn advance(&mut self, words: usize) {
        self.inc(words as u64);
    }
}

/// Folder name for a book's chunks.
pub fn output_dir_name(book_name: &str, words_per_minute: u32) -> String {
    format!("{book_name} {words_per_minute}wpm")
}

/// Writes every chunk to its own UTF-8 file:
/// `{book}_{YYYY-MM-DD}_{words}-{unit}_{wpm}wpm.txt`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    book_name: String,
    words_per_minute: u32,
    words_unit: String,
}

impl DirectorySink {
    pub fn create(
        dir: &Path,
        book_name: &str,
        words_per_minute: u32,
        words_unit: &str,
    ) -> Result<Self, SplitError> {
        fs::create_dir_all(dir).map_err(|source| SplitError::OutputDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            book_name: book_name.to_string(),
            words_per_minute,
            words_unit: words_unit.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, chunk: &Chunk<'_>) -> String {
        format!(
            "{}_{}_{}-{}_{}wpm.txt",
            self.book_name,
            chunk.date.format("%Y-%m-%d"),
            chunk.word_count,
            self.words_unit,
            self.words_per_minute
        )
    }
}

impl ChunkSink for DirectorySink {
    fn write_chunk(&mut self, chunk: &Chunk<'_>) -> Result<(), SplitError> {
        let path = self.dir.join(self.file_name(chunk));
        if let Err(source) = fs::write(&path, chunk.text) {
            error!(path = %path.display(), "File writing error: {source}");
            return Err(SplitError::Write { path, source });
        }
        debug!(
            path = %path.display(),
            day = chunk.index + 1,
            words = chunk.word_count,
            boundary = ?chunk.segment.boundary,
            "Wrote chunk"
        );
        Ok(())
    }
}

/// Totals reported once splitting stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub chunk_count: usize,
    /// Sum of the per-chunk word counts.
    pub words_written: usize,
    pub total_hours: f64,
    pub average_chunk_words: usize,
    pub last_date: Option<NaiveDate>,
    pub final_cursor: Cursor,
}

impl ScheduleSummary {
    /// One chunk per day, so the number of days equals the chunk count.
    pub fn days(&self) -> usize {
        self.chunk_count
    }
}

#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    segmenter: Segmenter,
    words_per_chunk: usize,
    words_per_minute: u32,
    start_date: NaiveDate,
}

impl ChunkScheduler {
    pub fn new(
        segmenter: Segmenter,
        words_per_minute: u32,
        minutes_per_day: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            segmenter,
            words_per_chunk: words_per_minute as usize * minutes_per_day as usize,
            words_per_minute,
            start_date,
        }
    }

    pub fn words_per_chunk(&self) -> usize {
        self.words_per_chunk
    }

    /// Date of the chunk with zero-based `index`.
    pub fn date_for(&self, index: usize) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(index as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn run<S, P>(
        &self,
        document: &Document,
        start: Cursor,
        sink: &mut S,
        progress: &mut P,
    ) -> Result<ScheduleSummary, SplitError>
    where
        S: ChunkSink + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let text = document.text();
        let mut cursor = start;
        let mut chunk_count = 0usize;
        let mut words_written = 0usize;

        info!(
            start = cursor.offset(),
            words_per_chunk = self.words_per_chunk,
            start_date = %self.start_date,
            "Starting split"
        );

        while cursor.offset() < document.len() {
            let Some(segment) = self
                .segmenter
                .segment(text, cursor.offset(), self.words_per_chunk)
            else {
                break;
            };
            let chunk_text = segment.text(text);
            if chunk_text.is_empty() {
                break;
            }

            let chunk = Chunk {
                index: chunk_count,
                date: self.date_for(chunk_count),
                text: chunk_text,
                word_count: count_words(chunk_text),
                segment,
            };
            sink.write_chunk(&chunk)?;

            cursor.advance_to(segment.end);
            chunk_count += 1;
            words_written += chunk.word_count;
            progress.advance(chunk.word_count);
        }

        let total_words = document.total_words();
        let summary = ScheduleSummary {
            chunk_count,
            words_written,
            total_hours: total_words as f64 / self.words_per_minute.max(1) as f64 / 60.0,
            average_chunk_words: total_words.checked_div(chunk_count).unwrap_or(0),
            last_date: chunk_count.checked_sub(1).map(|idx| self.date_for(idx)),
            final_cursor: cursor,
        };
        info!(
            chunks = summary.chunk_count,
            hours = format!("{:.1}", summary.total_hours),
            average_words = summary.average_chunk_words,
            "Splitting completed"
        );
        Ok(summary)
    }
}
