mod concordance;
mod passage;
mod reference;
mod words;

#[cfg(feature = "web")]
pub mod web;

pub use concordance::{
    Concordance, ConcordanceError, NoConcordance, StaticConcordance, WordOccurrence,
};
pub use passage::{ParsedPassage, PassageElement, Verse, parse};
pub use reference::{Command, PassageRef};
pub use words::{
    FrequencyTable, PassageStats, Token, TokenKind, WordAnalysis, WordFrequency,
    WordFrequencyEntry, analyze_word, analyze_word_with, build_frequency_table, is_stopword,
    normalize_word, passage_stats, stopwords, tokenize, top_frequent_words, words,
};

/// Defaults for ranking and word-detail views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Rows returned by the frequency ranking.
    pub top_n: usize,
    pub exclude_stopwords: bool,
    /// Maximum occurrences kept on a word analysis.
    pub occurrence_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            exclude_stopwords: true,
            occurrence_limit: 10,
        }
    }
}

/// Everything the analysis panel shows for one passage.
#[derive(Debug, Clone)]
pub struct PassageAnalysis {
    pub stats: PassageStats,
    pub top_words: Vec<WordFrequency>,
    pub table: FrequencyTable,
}

impl AnalysisConfig {
    pub fn analyze_passage(&self, elements: &[PassageElement]) -> PassageAnalysis {
        let table = build_frequency_table(elements);
        let stats = passage_stats(elements, &table);
        let top_words = top_frequent_words(&table, self.top_n, self.exclude_stopwords);
        PassageAnalysis {
            stats,
            top_words,
            table,
        }
    }

    /// Word detail against the passage total, occurrences capped at
    /// `occurrence_limit`.
    pub fn analyze_word(
        &self,
        table: &FrequencyTable,
        raw_word: &str,
        concordance: &dyn Concordance,
    ) -> WordAnalysis {
        let mut analysis = analyze_word_with(table, raw_word, table.total_words(), concordance);
        analysis.occurrences.truncate(self.occurrence_limit);
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "The Creation of the World\n\n[1] In the beginning, God created the heavens and the earth. [2] The earth was without form and void, and darkness was over the face of the deep. And the Spirit of God was hovering over the face of the waters.\n\n[3] And God said, “Let there be light,” and there was light.";

    #[test]
    fn passage_analysis_end_to_end() {
        let parsed = parse(GENESIS);
        assert_eq!(parsed.headings().collect::<Vec<_>>(), vec!["The Creation of the World"]);
        let analysis = AnalysisConfig::default().analyze_passage(&parsed.elements);
        assert_eq!(analysis.stats.verse_count, 3);
        let top: Vec<(&str, usize)> = analysis
            .top_words
            .iter()
            .take(2)
            .map(|w| (w.word.as_str(), w.count))
            .collect();
        assert_eq!(top, vec![("god", 3), ("earth", 2)]);
        assert!(analysis.top_words.len() <= 10);
        assert!(analysis.top_words.iter().all(|w| !is_stopword(&w.word)));
    }

    #[test]
    fn word_detail_caps_occurrences() {
        let parsed = parse(GENESIS);
        let table = build_frequency_table(&parsed.elements);
        let occurrences: Vec<WordOccurrence> = (1..=15)
            .map(|n| WordOccurrence::new(format!("Psalm 19:{n}"), n, "the heavens declare"))
            .collect();
        let concordance = StaticConcordance::from_entries([("light", occurrences)]);
        let config = AnalysisConfig {
            occurrence_limit: 4,
            ..AnalysisConfig::default()
        };
        let light = config.analyze_word(&table, "Light", &concordance);
        assert_eq!(light.count, 2);
        assert_eq!(light.occurrences.len(), 4);
        assert_eq!(light.occurrences[0].verse_number, 1);
    }
}
