use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static VERSE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:[0-9]\s)?[A-Za-z]+)\s+([0-9]+):([0-9]+)").expect("valid reference pattern")
});
static CANONICAL_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s+([0-9]+)").expect("valid canonical pattern"));
static VERSE_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v([0-9]+)$").expect("valid verse command pattern"));
static CHAPTER_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ch([0-9]+)$").expect("valid chapter command pattern"));

/// A book and chapter, optionally narrowed to one verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRef {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

impl PassageRef {
    /// Parses a verse reference such as `John 3:16` or `1 John 2:15`.
    pub fn parse(reference: &str) -> Option<Self> {
        let caps = VERSE_REFERENCE.captures(reference)?;
        Some(Self {
            book: caps[1].trim().to_string(),
            chapter: caps[2].parse().ok()?,
            verse: Some(caps[3].parse().ok()?),
        })
    }

    /// Parses a canonical chapter reference as returned by the passage API,
    /// e.g. `Psalm 119` or `Song of Solomon 2`.
    pub fn parse_canonical(reference: &str) -> Option<Self> {
        let caps = CANONICAL_REFERENCE.captures(reference)?;
        let book = caps[1].trim();
        if book.is_empty() {
            return None;
        }
        Some(Self {
            book: book.to_string(),
            chapter: caps[2].parse().ok()?,
            verse: None,
        })
    }

    pub fn chapter_ref(&self) -> Self {
        Self {
            book: self.book.clone(),
            chapter: self.chapter,
            verse: None,
        }
    }
}

impl fmt::Display for PassageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verse {
            Some(verse) => write!(f, "{} {}:{}", self.book, self.chapter, verse),
            None => write!(f, "{} {}", self.book, self.chapter),
        }
    }
}

/// Navigation shorthand typed into the command palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GoToVerse(u32),
    GoToChapter(u32),
}

impl Command {
    /// Accepts `v<N>` and `ch<N>`, case-insensitive, surrounding whitespace
    /// ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let cmd = input.trim().to_lowercase();
        if let Some(caps) = VERSE_COMMAND.captures(&cmd) {
            return caps[1].parse().ok().map(Command::GoToVerse);
        }
        if let Some(caps) = CHAPTER_COMMAND.captures(&cmd) {
            return caps[1].parse().ok().map(Command::GoToChapter);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verse_references() {
        let john = PassageRef::parse("John 3:16").unwrap();
        assert_eq!(john.book, "John");
        assert_eq!(john.chapter, 3);
        assert_eq!(john.verse, Some(16));

        let first_john = PassageRef::parse("1 John 2:15").unwrap();
        assert_eq!(first_john.book, "1 John");
        assert_eq!(first_john.to_string(), "1 John 2:15");
        assert_eq!(first_john.chapter_ref().to_string(), "1 John 2");
    }

    #[test]
    fn rejects_incomplete_references() {
        assert!(PassageRef::parse("John 3").is_none());
        assert!(PassageRef::parse("3:16").is_none());
        assert!(PassageRef::parse("").is_none());
    }

    #[test]
    fn parses_canonical_chapters() {
        let psalm = PassageRef::parse_canonical("Psalm 119").unwrap();
        assert_eq!((psalm.book.as_str(), psalm.chapter), ("Psalm", 119));
        let song = PassageRef::parse_canonical("Song of Solomon 2").unwrap();
        assert_eq!(song.book, "Song of Solomon");
        assert_eq!(song.verse, None);
        assert!(PassageRef::parse_canonical("Genesis").is_none());
    }

    #[test]
    fn parses_palette_commands() {
        assert_eq!(Command::parse("v30"), Some(Command::GoToVerse(30)));
        assert_eq!(Command::parse("  CH2 "), Some(Command::GoToChapter(2)));
        assert_eq!(Command::parse("v"), None);
        assert_eq!(Command::parse("chapter 2"), None);
    }
}
