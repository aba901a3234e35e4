use crate::words::normalize_word;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A citation of a word's use elsewhere in scripture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordOccurrence {
    pub reference: String,
    pub verse_number: u32,
    pub context: String,
}

impl WordOccurrence {
    pub fn new(
        reference: impl Into<String>,
        verse_number: u32,
        context: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            verse_number,
            context: context.into(),
        }
    }
}

/// Source of occurrences for a normalized word.
pub trait Concordance: Send + Sync {
    fn lookup_occurrences(&self, normalized_word: &str) -> Vec<WordOccurrence>;
}

/// Concordance with no data; every lookup is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConcordance;

impl Concordance for NoConcordance {
    fn lookup_occurrences(&self, _normalized_word: &str) -> Vec<WordOccurrence> {
        Vec::new()
    }
}

/// In-memory concordance, usually loaded from a JSON object mapping words to
/// occurrence lists.
#[derive(Debug, Clone, Default)]
pub struct StaticConcordance {
    occurrences: HashMap<String, Vec<WordOccurrence>>,
}

impl StaticConcordance {
    /// Builds a concordance from `(word, occurrences)` pairs. Words are
    /// normalized, and lists for words that normalize alike are concatenated.
    pub fn from_entries<I, W>(entries: I) -> Self
    where
        I: IntoIterator<Item = (W, Vec<WordOccurrence>)>,
        W: AsRef<str>,
    {
        let mut occurrences: HashMap<String, Vec<WordOccurrence>> = HashMap::new();
        for (word, list) in entries {
            let key = normalize_word(word.as_ref());
            if key.is_empty() {
                continue;
            }
            occurrences.entry(key).or_default().extend(list);
        }
        Self { occurrences }
    }

    pub fn from_json(json: &str) -> Result<Self, ConcordanceError> {
        let raw: BTreeMap<String, Vec<WordOccurrence>> = serde_json::from_str(json)?;
        Ok(Self::from_entries(raw))
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

impl Concordance for StaticConcordance {
    fn lookup_occurrences(&self, normalized_word: &str) -> Vec<WordOccurrence> {
        self.occurrences
            .get(normalized_word)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum ConcordanceError {
    Json(serde_json::Error),
}

impl fmt::Display for ConcordanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcordanceError::Json(err) => write!(f, "invalid concordance data: {err}"),
        }
    }
}

impl std::error::Error for ConcordanceError {}

impl From<serde_json::Error> for ConcordanceError {
    fn from(value: serde_json::Error) -> Self {
        ConcordanceError::Json(value)
    }
}
