use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bracketed verse number plus any whitespace that follows it.
static VERSE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([0-9]+)\]\s*").expect("valid verse marker pattern"));

const HEADING_MIN_CHARS: usize = 3;
const HEADING_MAX_CHARS: usize = 80;

/// One numbered verse with its rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

impl Verse {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A single layout element of a passage, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PassageElement {
    Heading { content: String },
    Verse { verse: Verse },
    ParagraphBreak,
}

impl PassageElement {
    pub fn is_paragraph_break(&self) -> bool {
        matches!(self, PassageElement::ParagraphBreak)
    }

    /// Returns the verse carried by a `Verse` element.
    pub fn verse(&self) -> Option<&Verse> {
        match self {
            PassageElement::Verse { verse } => Some(verse),
            PassageElement::Heading { .. } | PassageElement::ParagraphBreak => None,
        }
    }
}

/// Output of [`parse`]: the flat verse list and the ordered element stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPassage {
    pub verses: Vec<Verse>,
    pub elements: Vec<PassageElement>,
}

impl ParsedPassage {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn headings(&self) -> impl Iterator<Item = &str> + '_ {
        self.elements.iter().filter_map(|element| match element {
            PassageElement::Heading { content } => Some(content.as_str()),
            _ => None,
        })
    }

    fn push_break(&mut self) {
        let after_content = self
            .elements
            .last()
            .is_some_and(|last| !last.is_paragraph_break());
        if after_content {
            self.elements.push(PassageElement::ParagraphBreak);
        }
    }

    fn push_verse(&mut self, verse: Verse) {
        self.verses.push(verse.clone());
        self.elements.push(PassageElement::Verse { verse });
    }
}

/// Parses raw passage text (`[n] text` verse markers, blank-line paragraph
/// breaks, bare capitalized heading lines) into structured elements.
///
/// Never fails: text that matches none of the conventions simply yields
/// fewer elements.
pub fn parse(text: &str) -> ParsedPassage {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut passage = ParsedPassage::default();

    for (idx, raw_line) in lines.iter().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            passage.push_break();
            continue;
        }

        let follows_blank = idx == 0 || lines[idx - 1].trim().is_empty();
        if follows_blank && is_heading_line(raw_line, line) {
            passage.elements.push(PassageElement::Heading {
                content: line.to_string(),
            });
            continue;
        }

        for verse in verses_in_line(line) {
            passage.push_verse(verse);
        }
    }

    passage
}

/// Line-local part of the heading heuristic; blank-line adjacency is checked
/// by the caller.
fn is_heading_line(raw_line: &str, line: &str) -> bool {
    if raw_line.starts_with(' ') || VERSE_MARKER.is_match(line) {
        return false;
    }
    let len = line.chars().count();
    if len <= HEADING_MIN_CHARS || len >= HEADING_MAX_CHARS {
        return false;
    }
    line.chars().next().is_some_and(is_upper_or_caseless)
}

fn is_upper_or_caseless(c: char) -> bool {
    c.to_uppercase().eq(std::iter::once(c))
}

/// Splits one trimmed line on verse markers. Text before the first marker is
/// dropped, as are markers whose text is empty.
fn verses_in_line(line: &str) -> Vec<Verse> {
    let markers: Vec<_> = VERSE_MARKER.captures_iter(line).collect();
    let mut verses = Vec::with_capacity(markers.len());
    for (idx, caps) in markers.iter().enumerate() {
        let whole = caps.get(0).expect("capture group 0 always present");
        let end = markers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(line.len());
        let body = line[whole.end()..end].trim();
        if body.is_empty() {
            continue;
        }
        verses.push(Verse::new(verse_number(&caps[1]), body));
    }
    verses
}

fn verse_number(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(content: &str) -> PassageElement {
        PassageElement::Heading {
            content: content.to_string(),
        }
    }

    fn verse(number: u32, text: &str) -> PassageElement {
        PassageElement::Verse {
            verse: Verse::new(number, text),
        }
    }

    #[test]
    fn heading_break_and_verses() {
        let text = "Heading One\n\n[1] In the beginning God created the heavens and the earth.\n[2] The earth was without form, and void;";
        let parsed = parse(text);
        assert_eq!(
            parsed.elements,
            vec![
                heading("Heading One"),
                PassageElement::ParagraphBreak,
                verse(1, "In the beginning God created the heavens and the earth."),
                verse(2, "The earth was without form, and void;"),
            ]
        );
        assert_eq!(parsed.verses.len(), 2);
        assert_eq!(parsed.verses[1].number, 2);
    }

    #[test]
    fn indented_line_is_never_a_heading() {
        let parsed = parse("   Indented poetic line");
        assert!(parsed.headings().next().is_none());
        assert!(parsed.elements.is_empty());

        let parsed = parse("   [3] Indented poetic line");
        assert_eq!(parsed.elements, vec![verse(3, "Indented poetic line")]);
    }

    #[test]
    fn consecutive_blank_lines_collapse() {
        let parsed = parse("[1] First.\n\n\n   \n[2] Second.");
        assert_eq!(
            parsed.elements,
            vec![
                verse(1, "First."),
                PassageElement::ParagraphBreak,
                verse(2, "Second."),
            ]
        );
    }

    #[test]
    fn leading_blank_lines_emit_nothing() {
        assert!(parse("\n\n[1] Text").elements[0].verse().is_some());
        assert_eq!(parse("").elements, vec![]);
        assert_eq!(parse("   \n\t\n").elements, vec![]);
    }

    #[test]
    fn multiple_markers_on_one_line() {
        let parsed = parse("[4] Jesus wept. [5] So the Jews said,   [6]   ");
        assert_eq!(
            parsed.elements,
            vec![verse(4, "Jesus wept."), verse(5, "So the Jews said,")]
        );
    }

    #[test]
    fn text_before_first_marker_is_dropped() {
        let parsed = parse("[1] a\nand more [2] second");
        assert_eq!(parsed.verses, vec![Verse::new(1, "a"), Verse::new(2, "second")]);
    }

    #[test]
    fn duplicate_numbers_are_kept() {
        let parsed = parse("[1] one [1] again\n[1] third");
        let numbers: Vec<u32> = parsed.verses.iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![1, 1, 1]);
    }

    #[test]
    fn heading_requires_preceding_blank_line() {
        let parsed = parse("[1] Verse text\nThe Creation of Man");
        assert_eq!(parsed.elements, vec![verse(1, "Verse text")]);

        let parsed = parse("[1] Verse text\n\nThe Creation of Man\n[2] More");
        assert_eq!(
            parsed.elements,
            vec![
                verse(1, "Verse text"),
                PassageElement::ParagraphBreak,
                heading("The Creation of Man"),
                verse(2, "More"),
            ]
        );
    }

    #[test]
    fn heading_length_bounds_are_exclusive() {
        assert!(parse("Abc").elements.is_empty());
        assert_eq!(parse("Abcd").elements, vec![heading("Abcd")]);
        let long = format!("A{}", "b".repeat(79));
        assert!(parse(&long).elements.is_empty());
        let almost = format!("A{}", "b".repeat(78));
        assert_eq!(parse(&almost).elements, vec![heading(&almost)]);
    }

    #[test]
    fn lowercase_start_is_not_a_heading() {
        assert!(parse("and so it was").elements.is_empty());
    }

    #[test]
    fn caseless_start_counts_as_uppercase() {
        assert_eq!(parse("“Come Follow”").elements, vec![heading("“Come Follow”")]);
    }

    #[test]
    fn heading_is_trimmed_and_tolerates_carriage_returns() {
        let parsed = parse("The Beatitudes\t\r\n\r\n[3] Blessed are the poor\r");
        assert_eq!(
            parsed.elements,
            vec![
                heading("The Beatitudes"),
                PassageElement::ParagraphBreak,
                verse(3, "Blessed are the poor"),
            ]
        );
    }

    #[test]
    fn malformed_brackets_do_not_panic() {
        for input in ["[", "]]", "[x] text", "[12", "[] empty", "[[1]] odd", "[99999999999] big"] {
            let _ = parse(input);
        }
        let parsed = parse("[[1]] odd");
        assert_eq!(parsed.verses, vec![Verse::new(1, "] odd")]);
        let parsed = parse("[99999999999] big");
        assert_eq!(parsed.verses[0].number, u32::MAX);
    }

    #[test]
    fn no_blank_lines_yields_uninterrupted_verses() {
        let parsed = parse("[1] a\n[2] b\n[3] c");
        assert!(parsed.elements.iter().all(|e| e.verse().is_some()));
        assert_eq!(parsed.verses.len(), 3);
    }

    #[test]
    fn verse_texts_reconstruct_marker_stripped_content() {
        let text = "[1] In the beginning\n[2] was the Word, [3] and the Word";
        let parsed = parse(text);
        let joined: Vec<&str> = parsed.verses.iter().map(|v| v.text.as_str()).collect();
        let flat = text.replace('\n', " ");
        let stripped: Vec<&str> = VERSE_MARKER
            .split(&flat)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(joined, stripped);
    }

    #[test]
    fn zero_verse_number_is_kept() {
        let parsed = parse("[0] Superscription\n[1] First verse");
        assert_eq!(
            parsed.verses,
            vec![Verse::new(0, "Superscription"), Verse::new(1, "First verse")]
        );
    }

    #[test]
    fn elements_serialize_with_type_tags() {
        let json = serde_json::to_value(parse("Title Here\n\n[1] x")).unwrap();
        assert_eq!(json["elements"][0]["type"], "heading");
        assert_eq!(json["elements"][1]["type"], "paragraph-break");
        assert_eq!(json["elements"][2]["verse"]["number"], 1);
    }
}
