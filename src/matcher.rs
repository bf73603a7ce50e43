//! Reconciling noisy OCR output with the closed vocabulary of package names.
//!
//! Text and labels go through the same normalization: lower-casing (with the
//! Turkish dotted capital I folded to a plain `i`), every character that is
//! not a letter, digit or whitespace replaced by a space, and whitespace runs
//! collapsed. Labels are then tried in vocabulary order and the first label
//! that matches wins, using two passes per label:
//!
//! 1. [`MatchStrategy::WordBoundary`]: the label appears as whole words.
//! 2. [`MatchStrategy::Substring`]: the label appears anywhere, even inside a
//!    longer token. This recovers labels that OCR glued to neighbouring text,
//!    at the price of false positives for short labels that happen to be part
//!    of unrelated words (`"para"` matches inside `"paracetamol"`).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::VocabularyError;
use crate::vocabulary::Vocabulary;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s]+")
        .unwrap_or_else(|e| panic!("Failed to compile regex pattern: {e}"))
});

/// Which pass accepted a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    WordBoundary,
    Substring,
}

/// A vocabulary label found in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch<'a> {
    pub label: &'a str,
    pub index: usize,
    pub strategy: MatchStrategy,
}

struct Entry {
    label: String,
    key: String,
    word: Regex,
}

/// Pre-compiled matcher over one vocabulary.
pub struct VocabularyMatcher {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for VocabularyMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyMatcher")
            .field("labels", &self.entries.len())
            .finish()
    }
}

/// Lower-case `text`, replace punctuation with spaces and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let mut lowered = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            // Default lower-casing turns it into `i` + U+0307.
            'İ' => lowered.push('i'),
            _ => lowered.extend(c.to_lowercase()),
        }
    }

    let spaced = NON_WORD.replace_all(&lowered, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl VocabularyMatcher {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, VocabularyError> {
        let mut entries = Vec::with_capacity(vocabulary.len());
        for label in vocabulary.iter() {
            let key = normalize_text(label);
            let word = Regex::new(&format!(r"\b{}\b", regex::escape(&key))).map_err(|source| {
                VocabularyError::Pattern {
                    label: label.to_string(),
                    source,
                }
            })?;
            entries.push(Entry {
                label: label.to_string(),
                key,
                word,
            });
        }
        Ok(Self { entries })
    }

    /// Find the first vocabulary label present in `raw_text`.
    pub fn find(&self, raw_text: &str) -> Option<LabelMatch<'_>> {
        if raw_text.trim().is_empty() {
            return None;
        }

        let text = normalize_text(raw_text);
        if text.is_empty() {
            return None;
        }

        for (index, entry) in self.entries.iter().enumerate() {
            // A label made only of punctuation normalizes to nothing and
            // would otherwise be contained in every text.
            if entry.key.is_empty() {
                continue;
            }

            let strategy = if entry.word.is_match(&text) {
                MatchStrategy::WordBoundary
            } else if text.contains(entry.key.as_str()) {
                MatchStrategy::Substring
            } else {
                continue;
            };

            debug!(label = %entry.label, ?strategy, "vocabulary label found in OCR text");
            return Some(LabelMatch {
                label: &entry.label,
                index,
                strategy,
            });
        }

        None
    }

    /// Convenience wrapper returning only the label.
    pub fn match_label(&self, raw_text: &str) -> Option<&str> {
        self.find(raw_text).map(|m| m.label)
    }
}
