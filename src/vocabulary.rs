//! The ordered, closed set of package names a pipeline can recognize.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::VocabularyError;
use crate::matcher::normalize_text;

/// Ordered list of unique labels.
///
/// Index `i` of a classifier's probability vector refers to `labels()[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VocabularyFile {
    Names { names: Vec<String> },
    List(Vec<String>),
}

impl Vocabulary {
    /// Build a vocabulary, rejecting empty sets, blank labels and duplicates.
    ///
    /// Labels that only differ in case or punctuation count as duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.into().trim().to_string())
            .collect();

        if labels.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let mut seen = HashSet::new();
        let mut keys: HashMap<String, &str> = HashMap::new();
        for (index, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(VocabularyError::BlankLabel { index });
            }
            if !seen.insert(label.as_str()) {
                return Err(VocabularyError::DuplicateLabel {
                    label: label.clone(),
                });
            }

            let key = normalize_text(label);
            if key.is_empty() {
                continue;
            }
            if let Some(existing) = keys.insert(key, label.as_str()) {
                return Err(VocabularyError::AmbiguousLabel {
                    label: label.clone(),
                    existing: existing.to_string(),
                });
            }
        }

        Ok(Self { labels })
    }

    /// Load labels from disk.
    ///
    /// `.json` files may hold either a plain array or an object with a
    /// `names` array. Anything else is read as one label per line, skipping
    /// blank lines and `#` comments.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            let file: VocabularyFile =
                serde_json::from_str(&contents).map_err(|source| VocabularyError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            let labels = match file {
                VocabularyFile::Names { names } => names,
                VocabularyFile::List(list) => list,
            };
            Self::new(labels)
        } else {
            Self::new(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#')),
            )
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
