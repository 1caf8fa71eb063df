//! One interactive splitting run, from settings to the final statistics.

use crate::book_loader::{BookFormat, book_name, load_book_text};
use crate::config::{AppConfig, LoadedConfig, save_config};
use crate::document::{Cursor, Document};
use crate::error::SplitError;
use crate::i18n::Translations;
use crate::normalizer::TextNormalizer;
use crate::prompts::{
    Prompter, ask_language, ask_positive, ask_yes_no, clean_path_answer, parse_start_date,
};
use crate::scheduler::{ChunkScheduler, DirectorySink, ScheduleSummary, output_dir_name};
use crate::segmenter::Segmenter;
use anyhow::Result;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Paths and switches fixed before the run starts.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Book given on the command line; asked for when `None`.
    pub book: Option<PathBuf>,
    pub config_path: PathBuf,
    pub locales_dir: PathBuf,
    pub show_progress: bool,
}

/// How a run ended without an error.
#[derive(Debug)]
pub enum Outcome {
    Completed(ScheduleSummary),
    NoBookSelected,
    UnsupportedFormat,
    Cancelled,
}

/// Drive the whole run. Failures that end the run are shown to the user and
/// then returned; files already written stay where they are.
pub fn run_session<P: Prompter + ?Sized>(
    prompter: &mut P,
    options: &SessionOptions,
    loaded: LoadedConfig,
    today: NaiveDate,
) -> Result<Outcome> {
    let LoadedConfig {
        mut config,
        first_run,
    } = loaded;

    let tr = if first_run {
        let builtin = Translations::builtin();
        prompter.say(&header(&builtin));
        config.language = ask_language(prompter, &builtin)?;
        let tr = Translations::load(&options.locales_dir, config.language);
        ask_reading_speed(prompter, &tr, &mut config)?;
        persist(&options.config_path, &config);
        tr
    } else {
        let tr = Translations::load(&options.locales_dir, config.language);
        prompter.say(&header(&tr));
        tr
    };
    info!(language = %tr.language(), first_run, "Interface ready");

    let Some(book_path) = select_book(prompter, &tr, options.book.as_deref())? else {
        prompter.say(tr.get("no_file_selected"));
        info!("No book selected");
        return Ok(Outcome::NoBookSelected);
    };
    if BookFormat::from_path(&book_path).is_none() {
        warn!(path = %book_path.display(), "Unsupported book format");
        prompter.say(tr.get("unsupported_format"));
        return Ok(Outcome::UnsupportedFormat);
    }

    prompter.say(tr.get("reading_book"));
    let raw_text = match load_book_text(&book_path) {
        Ok(text) => text,
        Err(source) => {
            error!(path = %book_path.display(), "Error reading file: {source}");
            prompter.say(tr.get("error_reading_file"));
            return Err(SplitError::Extraction {
                path: book_path,
                source,
            }
            .into());
        }
    };
    info!(path = %book_path.display(), "File read successfully");

    let document = Document::new(clean_text(prompter, &tr, &config, raw_text)?);
    prompter.say(&tr.format(
        "total_words",
        &[("total_words", document.total_words().to_string())],
    ));
    info!(total_words = document.total_words(), "Book statistics");

    if !first_run {
        let before = (config.words_per_minute, config.minutes_per_day);
        ask_reading_speed(prompter, &tr, &mut config)?;
        if before != (config.words_per_minute, config.minutes_per_day) {
            persist(&options.config_path, &config);
        }
    }
    prompter.say(&tr.format(
        "calculation",
        &[
            ("wpm", config.words_per_minute.to_string()),
            ("minutes", config.minutes_per_day.to_string()),
            ("chunk", config.words_per_chunk().to_string()),
        ],
    ));

    let name = book_name(&book_path);
    let folder = output_dir_name(&name, config.words_per_minute);
    let output_dir = book_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&folder);
    if has_entries(&output_dir) {
        let question = tr.format("folder_exists", &[("folder", folder)]);
        if !ask_yes_no(prompter, &tr, &question, None)? {
            prompter.say(tr.get("operation_cancelled"));
            info!(dir = %output_dir.display(), "Overwrite declined");
            return Ok(Outcome::Cancelled);
        }
    }

    let start = ask_start_cursor(prompter, &tr, &document)?;
    let start_date = ask_start_date(prompter, &tr, today)?;

    let mut sink = DirectorySink::create(
        &output_dir,
        &name,
        config.words_per_minute,
        tr.get("words_unit"),
    )?;
    let scheduler = ChunkScheduler::new(
        Segmenter::new(config.splitting.snap_window_chars),
        config.words_per_minute,
        config.minutes_per_day,
        start_date,
    );
    let mut progress = progress_bar(
        document.total_words(),
        tr.get("splitting_progress"),
        options.show_progress,
    );
    let result = scheduler.run(&document, start, &mut sink, &mut progress);
    progress.finish_and_clear();
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            if matches!(err, SplitError::Write { .. }) {
                prompter.say(tr.get("error_writing_file"));
            }
            return Err(err.into());
        }
    };

    report(prompter, &tr, &summary, sink.dir());
    Ok(Outcome::Completed(summary))
}

fn header(tr: &Translations) -> String {
    tr.format("header", &[("version", VERSION.to_string())])
}

fn ask_reading_speed<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    config: &mut AppConfig,
) -> Result<()> {
    config.words_per_minute = ask_positive(
        prompter,
        tr,
        "wpm_prompt",
        "speed_positive",
        config.words_per_minute,
    )?;
    config.minutes_per_day = ask_positive(
        prompter,
        tr,
        "minutes_prompt",
        "time_positive",
        config.minutes_per_day,
    )?;
    Ok(())
}

/// Saving is best effort: a failure is logged and the run goes on.
fn persist(path: &Path, config: &AppConfig) {
    if let Err(err) = save_config(path, config) {
        warn!(path = %path.display(), "Failed to save settings: {err:?}");
    }
}

fn select_book<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    given: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = given {
        return Ok(Some(path.to_path_buf()));
    }
    let answer = prompter.ask(tr.get("select_book"))?;
    let answer = clean_path_answer(&answer);
    Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
}

fn clean_text<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    config: &AppConfig,
    raw_text: String,
) -> Result<String> {
    if ask_yes_no(prompter, tr, tr.get("clean_footnotes_prompt"), Some(true))? {
        let cleaned = TextNormalizer::from_config(&config.splitting).clean(&raw_text);
        info!(
            before = raw_text.len(),
            after = cleaned.len(),
            "Removed reference markers and captions"
        );
        prompter.say(tr.get("cleaned"));
        Ok(cleaned)
    } else {
        prompter.say(tr.get("not_cleaned"));
        Ok(raw_text)
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn ask_start_cursor<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    document: &Document,
) -> Result<Cursor> {
    let answer = prompter.ask(tr.get("start_phrase_prompt"))?;
    let phrase = answer.trim();
    match document.cursor_at_phrase(phrase) {
        Ok(cursor) if phrase.is_empty() => {
            prompter.say(tr.get("start_from_beginning"));
            Ok(cursor)
        }
        Ok(cursor) => {
            let position = document.char_position(cursor);
            info!(phrase, position, "Starting phrase found");
            prompter.say(&tr.format("found_position", &[("pos", position.to_string())]));
            Ok(cursor)
        }
        Err(err) => {
            warn!(phrase, "Starting phrase not found");
            prompter.say(&tr.format("phrase_not_found", &[("phrase", phrase.to_string())]));
            Err(err.into())
        }
    }
}

fn ask_start_date<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    today: NaiveDate,
) -> Result<NaiveDate> {
    let answer = prompter.ask(tr.get("date_prompt"))?;
    Ok(match parse_start_date(&answer) {
        Ok(Some(date)) => date,
        Ok(None) => today,
        Err(err) => {
            warn!(input = answer.trim(), "Invalid start date, using today: {err}");
            prompter.say(tr.get("invalid_date"));
            today
        }
    })
}

fn progress_bar(total_words: usize, label: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total_words as u64);
    match ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len} ({percent}%)") {
        Ok(style) => bar.set_style(style),
        Err(err) => warn!("Invalid progress template: {err}"),
    }
    bar.set_message(label.to_string());
    bar
}

fn report<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    summary: &ScheduleSummary,
    output_dir: &Path,
) {
    let hours = format!("{:.1}", summary.total_hours);
    prompter.say(&tr.format("done", &[("count", summary.chunk_count.to_string())]));
    prompter.say(&tr.format("output_dir", &[("dir", output_dir.display().to_string())]));
    prompter.say(tr.get("stats_header"));
    prompter.say(&tr.format("stats_days", &[("days", summary.days().to_string())]));
    prompter.say(&tr.format("stats_total_time", &[("hours", hours.clone())]));
    prompter.say(&tr.format(
        "stats_avg_chunk",
        &[("avg", summary.average_chunk_words.to_string())],
    ));
    info!(
        chunks = summary.chunk_count,
        days = summary.days(),
        hours = %hours,
        average_words = summary.average_chunk_words,
        words_written = summary.words_written,
        last_date = ?summary.last_date,
        final_offset = summary.final_cursor.offset(),
        dir = %output_dir.display(),
        "Final statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, load_config};
    use crate::prompts::ScriptedPrompter;
    use pretty_assertions::assert_eq;

    const BOOK: &str = "Alpha beta gamma. Delta epsilon.\n\nZeta eta[1] theta iota.\n\n";

    fn locales() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("locales")
    }

    fn options(root: &Path, book: Option<PathBuf>) -> SessionOptions {
        SessionOptions {
            book,
            config_path: root.join("conf").join("config.toml"),
            locales_dir: locales(),
            show_progress: false,
        }
    }

    fn returning_user() -> LoadedConfig {
        LoadedConfig {
            config: AppConfig::default(),
            first_run: false,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn write_book(root: &Path) -> PathBuf {
        let path = root.join("book.txt");
        fs::write(&path, BOOK).expect("book should be written");
        path
    }

    fn split_error(err: &anyhow::Error) -> &SplitError {
        err.downcast_ref::<SplitError>()
            .expect("run should fail with a split error")
    }

    #[test]
    fn first_run_asks_settings_saves_them_and_splits() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let book = write_book(tmp.path());
        let opts = options(tmp.path(), Some(book));
        // language, wpm, minutes, clean, phrase, date
        let mut prompter = ScriptedPrompter::new(&["en", "3", "1", "", "", "2024-01-01"]);

        let outcome = run_session(&mut prompter, &opts, LoadedConfig::default(), date(2030, 1, 1))
            .expect("run should succeed");
        let summary = match outcome {
            Outcome::Completed(summary) => summary,
            other => panic!("expected a completed run, got {other:?}"),
        };
        assert_eq!(summary.chunk_count, 2);
        assert_eq!(prompter.remaining(), 0);

        let out = tmp.path().join("book 3wpm");
        let first = fs::read_to_string(out.join("book_2024-01-01_5-words_3wpm.txt"))
            .expect("first chunk written");
        assert_eq!(first, "Alpha beta gamma. Delta epsilon.");
        let second = fs::read_to_string(out.join("book_2024-01-02_4-words_3wpm.txt"))
            .expect("second chunk written");
        assert_eq!(second, "Zeta eta theta iota.");

        let saved = load_config(&opts.config_path);
        assert!(!saved.first_run);
        assert_eq!(saved.config.language, Language::En);
        assert_eq!(saved.config.words_per_minute, 3);
        assert_eq!(saved.config.minutes_per_day, 1);

        let tr = Translations::builtin();
        assert!(prompter.said.iter().any(|line| line == tr.get("cleaned")));
        assert!(prompter.said.iter().any(|line| line == "Days of reading: 2"));
    }

    #[test]
    fn returning_user_keeps_settings_and_starts_at_phrase() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let book = write_book(tmp.path());
        let opts = options(tmp.path(), Some(book));
        // clean, wpm, minutes, phrase, date
        let mut prompter = ScriptedPrompter::new(&["n", "", "", "Zeta", "someday"]);
        let today = date(2025, 3, 10);

        let outcome = run_session(&mut prompter, &opts, returning_user(), today)
            .expect("run should succeed");
        assert!(matches!(outcome, Outcome::Completed(ref s) if s.chunk_count == 1));

        let chunk = tmp
            .path()
            .join("book 350wpm")
            .join("book_2025-03-10_5-words_350wpm.txt");
        assert_eq!(
            fs::read_to_string(chunk).expect("chunk written"),
            "Zeta eta[1] theta iota."
        );
        assert!(!opts.config_path.exists(), "unchanged settings are not saved");

        let tr = Translations::builtin();
        assert!(prompter.said.iter().any(|line| line == tr.get("invalid_date")));
        assert!(prompter.said.iter().any(|line| line == "Phrase found at character 34."));
    }

    #[test]
    fn changed_speed_is_saved_on_later_runs() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let book = write_book(tmp.path());
        let opts = options(tmp.path(), Some(book));
        let mut prompter = ScriptedPrompter::new(&["", "400", "", "", ""]);

        run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect("run should succeed");
        let saved = load_config(&opts.config_path);
        assert_eq!(saved.config.words_per_minute, 400);
        assert!(tmp.path().join("book 400wpm").is_dir());
    }

    #[test]
    fn missing_phrase_aborts_before_writing() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let book = write_book(tmp.path());
        let opts = options(tmp.path(), Some(book));
        let mut prompter = ScriptedPrompter::new(&["", "", "", "Omega"]);

        let err = run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect_err("phrase is absent");
        assert!(matches!(split_error(&err), SplitError::PhraseNotFound { phrase } if phrase == "Omega"));
        assert!(!tmp.path().join("book 350wpm").exists());
        assert!(prompter.said.iter().any(|line| line.contains("\"Omega\"")));
    }

    #[test]
    fn declining_overwrite_cancels_the_run() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let book = write_book(tmp.path());
        let out = tmp.path().join("book 350wpm");
        fs::create_dir_all(&out).expect("output dir created");
        fs::write(out.join("old.txt"), "keep me").expect("old file written");
        let opts = options(tmp.path(), Some(book));
        let mut prompter = ScriptedPrompter::new(&["", "", "", "нет"]);

        let outcome = run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect("cancel is not an error");
        assert!(matches!(outcome, Outcome::Cancelled));
        let question = prompter.asked.last().expect("overwrite was asked");
        assert!(question.contains("\"book 350wpm\""), "{question}");
        assert!(
            !question.contains(&tmp.path().display().to_string()),
            "only the folder name is shown: {question}"
        );
        assert_eq!(
            fs::read_dir(&out).expect("dir readable").count(),
            1,
            "nothing new written"
        );
    }

    #[test]
    fn empty_book_answer_ends_quietly() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let opts = options(tmp.path(), None);
        let mut prompter = ScriptedPrompter::new(&["  "]);

        let outcome = run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect("no book is not an error");
        assert!(matches!(outcome, Outcome::NoBookSelected));
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let opts = options(tmp.path(), Some(tmp.path().join("book.pdf")));
        let mut prompter = ScriptedPrompter::new(&[]);

        let outcome = run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect("unsupported format is not an error");
        assert!(matches!(outcome, Outcome::UnsupportedFormat));
    }

    #[test]
    fn unreadable_book_is_an_extraction_error() {
        let tmp = tempfile::tempdir().expect("temp dir should be created");
        let opts = options(tmp.path(), Some(tmp.path().join("missing.fb2")));
        let mut prompter = ScriptedPrompter::new(&[]);

        let err = run_session(&mut prompter, &opts, returning_user(), date(2025, 1, 1))
            .expect_err("file does not exist");
        assert!(matches!(split_error(&err), SplitError::Extraction { .. }));
        let tr = Translations::builtin();
        assert_eq!(prompter.said.last().map(String::as_str), Some(tr.get("error_reading_file")));
    }
}
