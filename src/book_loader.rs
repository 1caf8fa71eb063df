//! Book loading utilities.
//!
//! Knows how to open FB2 (plain or zipped), EPUB and plain-text books and
//! return a single `String` with paragraphs separated by blank lines. The
//! blank lines matter: the segmenter prefers them as chunk boundaries.

use crate::error::ExtractError;
use epub::doc::EpubDoc;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use scraper::{Html, Selector};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

const PARAGRAPH_SEPARATOR: &str = "\n\n";
/// Upper bound on the buffer reserved from an archive member's declared size.
const MAX_MEMBER_PREALLOC: u64 = 64 * 1024 * 1024;

static P_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("paragraph selector should parse"));

/// Supported input formats, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Fb2,
    Fb2Zip,
    Epub,
    PlainText,
}

impl BookFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(BookFormat::Fb2Zip),
            "fb2" => Some(BookFormat::Fb2),
            "epub" => Some(BookFormat::Epub),
            "txt" => Some(BookFormat::PlainText),
            _ => None,
        }
    }
}

/// Name used for the output folder and chunk files: the file stem without
/// an inner `.fb2` for zipped books, stripped of characters that are not
/// allowed in file names.
pub fn book_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match BookFormat::from_path(path) {
        Some(BookFormat::Fb2Zip) => {
            let cut = stem.len().saturating_sub(4);
            let inner_fb2 = stem
                .get(cut..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(".fb2"));
            if inner_fb2 { stem[..cut].to_string() } else { stem }
        }
        _ => stem,
    };
    stem.chars()
        .filter(|ch| !matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect()
}

/// Load a book from disk and return its text content as a single string.
pub fn load_book_text(path: &Path) -> Result<String, ExtractError> {
    let format = BookFormat::from_path(path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(path.to_path_buf()))?;
    info!(path = %path.display(), ?format, "Loading book content");

    let text = match format {
        BookFormat::PlainText => fs::read_to_string(path)?,
        BookFormat::Fb2 => fb2_text(BufReader::new(File::open(path)?))?,
        BookFormat::Fb2Zip => load_fb2_zip(path)?,
        BookFormat::Epub => load_epub(path)?,
    };

    if text.trim().is_empty() {
        warn!(path = %path.display(), "No textual content found in this book");
    }
    info!(total_chars = text.len(), "Finished loading book content");
    Ok(text)
}

fn load_fb2_zip(path: &Path) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    for idx in 0..archive.len() {
        let mut member = archive.by_index(idx)?;
        if !member.name().to_lowercase().ends_with(".fb2") {
            continue;
        }
        debug!(member = %member.name(), "Reading FB2 member from archive");
        let mut data = Vec::with_capacity(prealloc_hint(member.size()));
        member.read_to_end(&mut data)?;
        return fb2_text(data.as_slice());
    }
    Err(ExtractError::MissingFb2Member)
}

/// The declared size comes from the archive header and is not trusted.
fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_MEMBER_PREALLOC)).unwrap_or(0)
}

/// Collect the text of every `<p>` and `<v>` element in document order.
fn fb2_text<R: BufRead>(source: R) -> Result<String, ExtractError> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::with_capacity(8192);
    let mut parts: Vec<String> = Vec::new();
    let mut depth = 0usize;
    // Depth of the open paragraph element and the text gathered so far.
    let mut current: Option<(usize, String)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                depth += 1;
                if current.is_none() && matches!(e.local_name().as_ref(), b"p" | b"v") {
                    current = Some((depth, String::new()));
                }
            }
            Event::Text(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    match e.unescape() {
                        Ok(unescaped) => text.push_str(&unescaped),
                        Err(err) => {
                            debug!("Keeping raw FB2 text after unescape failure: {err}");
                            text.push_str(&String::from_utf8_lossy(e));
                        }
                    }
                }
            }
            Event::CData(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    match reader.decoder().decode(e) {
                        Ok(decoded) => text.push_str(&decoded),
                        Err(err) => {
                            debug!("Keeping raw FB2 CDATA after decode failure: {err}");
                            text.push_str(&String::from_utf8_lossy(e));
                        }
                    }
                }
            }
            Event::End(_) => {
                if current.as_ref().is_some_and(|(open, _)| *open == depth) {
                    if let Some((_, text)) = current.take() {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            parts.push(trimmed.to_string());
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(paragraphs = parts.len(), "Parsed FB2 body");
    Ok(parts.join(PARAGRAPH_SEPARATOR))
}

fn load_epub(path: &Path) -> Result<String, ExtractError> {
    let mut doc = EpubDoc::new(path).map_err(|err| ExtractError::Epub(err.to_string()))?;
    let mut parts: Vec<String> = Vec::new();
    let mut documents = 0usize;

    loop {
        if let Some((chapter, _mime)) = doc.get_current_str() {
            documents += 1;
            let paragraphs = html_paragraphs(&chapter);
            debug!(
                document = documents,
                paragraphs = paragraphs.len(),
                "Parsed EPUB document"
            );
            parts.extend(paragraphs);
        }

        if !doc.go_next() {
            break;
        }
    }

    info!(documents, paragraphs = parts.len(), "Finished reading EPUB spine");
    Ok(parts.join(PARAGRAPH_SEPARATOR))
}

/// Paragraph texts of one XHTML document. Documents without `<p>` elements
/// are rendered with `html2text` and split on blank lines instead.
fn html_paragraphs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let paragraphs: Vec<String> = document
        .select(&P_SELECTOR)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();
    if !paragraphs.is_empty() || document.select(&P_SELECTOR).next().is_some() {
        return paragraphs;
    }

    // Use a very large width so no hard line breaks are baked in.
    match html2text::from_read(html.as_bytes(), 10_000) {
        Ok(rendered) => rendered
            .split("\n\n")
            .map(collapse_whitespace)
            .filter(|text| !text.is_empty())
            .collect(),
        Err(err) => {
            warn!("html2text failed: {err}");
            Vec::new()
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
