//! Rule-based red-flag phrase filter, modelled on legacy parental-control tools.
use crate::corpus::{GROOMING, NORMAL};

/// Report name of the keyword detector; trained models may not reuse it.
pub const KEYWORD_DETECTOR_NAME: &str = "keyword_filter";

/// Phrases the built-in detector flags.
pub const DEFAULT_RED_FLAG_PHRASES: &[&str] = &[
    "where do you live",
    "our secret",
    "don't tell",
    "dont tell",
    "keep this between us",
    "are you alone",
    "how old are you",
    "send me a pic",
    "send me a photo",
    "what are you wearing",
    "delete this chat",
    "delete our messages",
    "mature for your age",
    "nobody needs to know",
    "meet in person",
    "what school do you go to",
];

/// Case-insensitive substring matcher over a fixed phrase list.
///
/// Needs no training; the phrase list is lowercased once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDetector {
    phrases: Vec<String>,
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::new(DEFAULT_RED_FLAG_PHRASES.iter().copied())
    }
}

impl KeywordDetector {
    /// Build a detector from custom phrases. Blank phrases are dropped.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// First phrase found in `text`, if any.
    pub fn matched_phrase(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// 1 when any red-flag phrase occurs in `text`, else 0.
    pub fn predict(&self, text: &str) -> u8 {
        if self.matched_phrase(text).is_some() {
            GROOMING
        } else {
            NORMAL
        }
    }

    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<u8> {
        texts.iter().map(|t| self.predict(t.as_ref())).collect()
    }

    pub fn name(&self) -> &str {
        KEYWORD_DETECTOR_NAME
    }
}
