use crate::concordance::{Concordance, NoConcordance, WordOccurrence};
use crate::passage::PassageElement;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORD_LIST.iter().copied().collect());

const STOPWORD_LIST: &[&str] = &[
    "the", "and", "of", "to", "a", "in", "that", "is", "was", "he", "for", "it", "with", "as",
    "his", "on", "be", "at", "by", "i", "this", "had", "not", "are", "but", "from", "or", "have",
    "an", "they", "which", "one", "you", "were", "her", "all", "she", "there", "would", "their",
    "we", "him", "been", "has", "when", "who", "will", "more", "if", "no", "out", "so", "said",
    "what", "up", "its", "about", "into", "than", "them", "can", "only", "other", "new", "some",
    "could", "time", "these", "two", "may", "then", "do", "first", "any", "my", "now", "such",
    "like", "our", "over", "man", "me", "even", "most", "made", "after", "also", "did", "many",
    "before", "must", "through", "back", "years", "where", "much", "your", "way", "well", "down",
    "should", "because", "each", "just", "those", "people", "mr", "how", "too", "little", "state",
    "good", "very", "make", "world", "still", "own", "see", "men", "work", "long", "get", "here",
    "between", "both", "life", "being", "under", "never", "day", "same", "another", "know",
    "while", "last", "might", "us", "great", "old", "year", "off", "come", "since", "against",
    "go", "came", "right", "used", "take", "three",
];

/// Lowercases `raw` and keeps only `a`-`z`.
pub fn normalize_word(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_lowercase)
        .collect()
}

pub fn is_stopword(raw: &str) -> bool {
    STOPWORDS.contains(normalize_word(raw).as_str())
}

/// The fixed stopword vocabulary, in no particular order.
pub fn stopwords() -> impl Iterator<Item = &'static str> {
    STOPWORD_LIST.iter().copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Word,
    Punctuation,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Segments verse text into word, punctuation and whitespace runs.
/// Concatenating the token texts gives back `text` exactly.
pub fn tokenize(text: &str) -> Vec<Token> {
    segments(text)
        .into_iter()
        .map(|(kind, text)| Token {
            kind,
            text: text.to_string(),
        })
        .collect()
}

/// Word tokens of `text`, in order.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    segments(text)
        .into_iter()
        .filter(|(kind, _)| *kind == TokenKind::Word)
        .map(|(_, text)| text)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    WordLike,
    Space,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
        CharClass::WordLike
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

// A word is a run of ASCII word characters and apostrophes that starts and
// ends on a word character; edge apostrophes fall back to punctuation.
fn segments(text: &str) -> Vec<(TokenKind, &str)> {
    let mut out: Vec<(TokenKind, &str)> = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let class = classify(c);
        let next_class = chars.peek().map(|&(_, next)| classify(next));
        if next_class == Some(class) {
            continue;
        }
        let end = idx + c.len_utf8();
        let run = &text[start..end];
        match class {
            CharClass::Space => push_segment(&mut out, TokenKind::Whitespace, text, start, end),
            CharClass::Other => push_segment(&mut out, TokenKind::Punctuation, text, start, end),
            CharClass::WordLike => {
                let core = run.trim_matches('\'');
                if core.is_empty() {
                    push_segment(&mut out, TokenKind::Punctuation, text, start, end);
                } else {
                    let lead = run.len() - run.trim_start_matches('\'').len();
                    let core_start = start + lead;
                    let core_end = core_start + core.len();
                    push_segment(&mut out, TokenKind::Punctuation, text, start, core_start);
                    push_segment(&mut out, TokenKind::Word, text, core_start, core_end);
                    push_segment(&mut out, TokenKind::Punctuation, text, core_end, end);
                }
            }
        }
        start = end;
    }
    out
}

/// Appends `text[start..end]`, merging adjacent punctuation into one run.
fn push_segment<'a>(
    out: &mut Vec<(TokenKind, &'a str)>,
    kind: TokenKind,
    text: &'a str,
    start: usize,
    end: usize,
) {
    if start == end {
        return;
    }
    if kind == TokenKind::Punctuation {
        if let Some(last) = out.last_mut() {
            if last.0 == TokenKind::Punctuation {
                let merged_start = start - last.1.len();
                last.1 = &text[merged_start..end];
                return;
            }
        }
    }
    out.push((kind, &text[start..end]));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyEntry {
    pub normalized_word: String,
    pub raw_forms: BTreeSet<String>,
    pub count: usize,
    pub verse_numbers: BTreeSet<u32>,
}

/// Word counts for one passage keyed by normalized word.
///
/// Entries iterate in order of first occurrence, which is also the tie-break
/// used by [`top_frequent_words`].
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<WordFrequencyEntry>,
    index: HashMap<String, usize>,
    total_words: usize,
}

impl FrequencyTable {
    pub fn get(&self, normalized_word: &str) -> Option<&WordFrequencyEntry> {
        self.index
            .get(normalized_word)
            .map(|&slot| &self.entries[slot])
    }

    pub fn entries(&self) -> &[WordFrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of counted word tokens (the sum of every entry's count).
    pub fn total_words(&self) -> usize {
        self.total_words
    }

    fn record(&mut self, raw: &str, normalized: String, verse_number: u32) {
        let slot = match self.index.get(&normalized) {
            Some(&slot) => slot,
            None => {
                self.entries.push(WordFrequencyEntry {
                    normalized_word: normalized.clone(),
                    raw_forms: BTreeSet::new(),
                    count: 0,
                    verse_numbers: BTreeSet::new(),
                });
                self.index.insert(normalized, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[slot];
        entry.count += 1;
        if !entry.raw_forms.contains(raw) {
            entry.raw_forms.insert(raw.to_owned());
        }
        entry.verse_numbers.insert(verse_number);
        self.total_words += 1;
    }
}

/// Counts every word, stopwords included, across the verse elements.
pub fn build_frequency_table(elements: &[PassageElement]) -> FrequencyTable {
    let mut table = FrequencyTable::default();
    for verse in elements.iter().filter_map(PassageElement::verse) {
        for raw in words(&verse.text) {
            let normalized = normalize_word(raw);
            if !normalized.is_empty() {
                table.record(raw, normalized, verse.number);
            }
        }
    }
    table
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    /// Relative to the most frequent selected word.
    pub percentage: f64,
}

/// Ranks entries by descending count, first occurrence winning ties, and
/// scales percentages against the top count.
pub fn top_frequent_words(
    table: &FrequencyTable,
    n: usize,
    exclude_stopwords: bool,
) -> Vec<WordFrequency> {
    let mut selected: Vec<&WordFrequencyEntry> = table
        .entries()
        .iter()
        .filter(|entry| !exclude_stopwords || !is_stopword(&entry.normalized_word))
        .collect();
    selected.sort_by(|a, b| b.count.cmp(&a.count));
    selected.truncate(n);

    let max_count = selected.first().map(|entry| entry.count).unwrap_or(1).max(1);
    selected
        .into_iter()
        .map(|entry| WordFrequency {
            word: entry.normalized_word.clone(),
            count: entry.count,
            percentage: 100.0 * entry.count as f64 / max_count as f64,
        })
        .collect()
}

/// Summary figures shown next to the frequency ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageStats {
    pub verse_count: usize,
    pub total_words: usize,
    pub significant_words: usize,
    pub unique_words: usize,
    pub unique_significant_words: usize,
    pub words_per_verse: f64,
}

pub fn passage_stats(elements: &[PassageElement], table: &FrequencyTable) -> PassageStats {
    let verse_count = elements.iter().filter(|e| e.verse().is_some()).count();
    let (significant_words, unique_significant_words) = table
        .entries()
        .iter()
        .filter(|entry| !is_stopword(&entry.normalized_word))
        .fold((0, 0), |(total, unique), entry| (total + entry.count, unique + 1));
    let words_per_verse = if verse_count == 0 {
        0.0
    } else {
        significant_words as f64 / verse_count as f64
    };
    PassageStats {
        verse_count,
        total_words: table.total_words(),
        significant_words,
        unique_words: table.len(),
        unique_significant_words,
        words_per_verse,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAnalysis {
    pub word: String,
    pub normalized_word: String,
    pub count: usize,
    pub percentage_of_passage: f64,
    pub is_stopword: bool,
    pub occurrences: Vec<WordOccurrence>,
}

/// Analyzes one word against the passage table without consulting a
/// concordance, so `occurrences` is always empty.
pub fn analyze_word(
    table: &FrequencyTable,
    raw_word: &str,
    total_word_count: usize,
) -> WordAnalysis {
    analyze_word_with(table, raw_word, total_word_count, &NoConcordance)
}

/// Like [`analyze_word`], pulling occurrences from `concordance`. Stopwords
/// and words absent from the passage never carry occurrences.
pub fn analyze_word_with(
    table: &FrequencyTable,
    raw_word: &str,
    total_word_count: usize,
    concordance: &dyn Concordance,
) -> WordAnalysis {
    let normalized_word = normalize_word(raw_word);
    let is_stopword = is_stopword(raw_word);
    let Some(entry) = table.get(&normalized_word) else {
        return WordAnalysis {
            word: raw_word.to_string(),
            normalized_word,
            count: 0,
            percentage_of_passage: 0.0,
            is_stopword,
            occurrences: Vec::new(),
        };
    };

    let percentage_of_passage = if total_word_count == 0 {
        0.0
    } else {
        100.0 * entry.count as f64 / total_word_count as f64
    };
    let occurrences = if is_stopword {
        Vec::new()
    } else {
        concordance.lookup_occurrences(&normalized_word)
    };
    WordAnalysis {
        word: raw_word.to_string(),
        normalized_word,
        count: entry.count,
        percentage_of_passage,
        is_stopword,
        occurrences,
    }
}
