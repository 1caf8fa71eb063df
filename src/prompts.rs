//! Interactive prompts.
//!
//! The run asks its questions through a [`Prompter`]; every answer is checked
//! by a pure parser here and re-asked until it is acceptable.

use crate::config::Language;
use crate::i18n::Translations;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use dialoguer::Input;
use std::io::{self, BufRead, IsTerminal, Write};

const YES_TOKENS: [&str; 4] = ["yes", "y", "да", "д"];
const NO_TOKENS: [&str; 4] = ["no", "n", "нет", "н"];

/// Synchronous question/answer channel to the user.
pub trait Prompter {
    /// Show `message` and return the raw answer line.
    fn ask(&mut self, message: &str) -> Result<String>;
    /// Show an informational line.
    fn say(&mut self, message: &str);
}

/// Terminal prompter. Uses `dialoguer` when attached to a terminal and plain
/// line reads when input is piped.
#[derive(Debug)]
pub struct ConsolePrompter {
    interactive: bool,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ConsolePrompter {
    fn ask(&mut self, message: &str) -> Result<String> {
        if self.interactive {
            // dialoguer adds its own ": " suffix.
            let prompt = message.trim_end().trim_end_matches(':');
            let answer = Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?;
            return Ok(answer);
        }

        print!("{message}");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            bail!("standard input closed while waiting for an answer");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Why a numeric answer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberRejection {
    NotANumber,
    NotPositive,
}

/// Interface language from an answer; empty means English.
pub fn parse_language(input: &str) -> Option<Language> {
    match input.trim().to_lowercase().as_str() {
        "" | "en" | "english" => Some(Language::En),
        "ru" | "русский" | "russian" => Some(Language::Ru),
        _ => None,
    }
}

/// Positive whole number; an empty answer keeps `current`.
pub fn parse_positive(input: &str, current: u32) -> Result<u32, NumberRejection> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(current);
    }
    let value: i64 = input.parse().map_err(|_| NumberRejection::NotANumber)?;
    if value <= 0 {
        return Err(NumberRejection::NotPositive);
    }
    u32::try_from(value).map_err(|_| NumberRejection::NotANumber)
}

/// Yes/no answer in English or Russian. An empty answer yields `default`.
pub fn parse_yes_no(input: &str, default: Option<bool>) -> Option<bool> {
    let answer = input.trim().to_lowercase();
    if answer.is_empty() {
        return default;
    }
    if YES_TOKENS.contains(&answer.as_str()) {
        Some(true)
    } else if NO_TOKENS.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Start date in `YYYY-MM-DD`. `Ok(None)` for an empty answer.
pub fn parse_start_date(input: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map(Some)
}

/// Strip whitespace and the quotes terminals add around dropped paths.
pub fn clean_path_answer(input: &str) -> &str {
    input.trim().trim_matches(['"', '\'']).trim()
}

pub fn ask_language<P: Prompter + ?Sized>(prompter: &mut P, tr: &Translations) -> Result<Language> {
    loop {
        let answer = prompter.ask(tr.get("language_prompt"))?;
        match parse_language(&answer) {
            Some(language) => return Ok(language),
            None => prompter.say(tr.get("invalid_language")),
        }
    }
}

/// Ask for a positive number until one is given. `prompt_key` must take a
/// `{current}` placeholder; `positive_key` is shown for zero or negatives.
pub fn ask_positive<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    prompt_key: &str,
    positive_key: &str,
    current: u32,
) -> Result<u32> {
    let message = tr.format(prompt_key, &[("current", current.to_string())]);
    loop {
        let answer = prompter.ask(&message)?;
        match parse_positive(&answer, current) {
            Ok(value) => return Ok(value),
            Err(NumberRejection::NotPositive) => prompter.say(tr.get(positive_key)),
            Err(NumberRejection::NotANumber) => prompter.say(tr.get("positive_number")),
        }
    }
}

pub fn ask_yes_no<P: Prompter + ?Sized>(
    prompter: &mut P,
    tr: &Translations,
    message: &str,
    default: Option<bool>,
) -> Result<bool> {
    loop {
        let answer = prompter.ask(message)?;
        match parse_yes_no(&answer, default) {
            Some(choice) => return Ok(choice),
            None => prompter.say(tr.get("invalid_choice")),
        }
    }
}

/// Replays canned answers and records everything shown.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
    pub said: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| answer.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("no scripted answer for {message:?}"),
        }
    }

    fn say(&mut self, message: &str) {
        self.said.push(message.to_string());
    }
}
