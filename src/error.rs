//! Error taxonomy for extraction and splitting.
//!
//! Running out of words and failing to find a boundary are not errors: the
//! segmenter reports those through its return type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning a book file into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported book format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("malformed FB2 XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("archive contains no .fb2 member")]
    MissingFb2Member,
    #[error("epub error: {0}")]
    Epub(String),
}

/// Failures that abort a splitting run.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("could not read {}", path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
    #[error("starting phrase not found: {phrase:?}")]
    PhraseNotFound { phrase: String },
    #[error("failed to create output directory {}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write chunk {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
