use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use lectio_rs::{
    AnalysisConfig, Command as PaletteCommand, Concordance, NoConcordance, ParsedPassage,
    PassageElement, PassageRef, StaticConcordance, TokenKind, WordAnalysis, WordFrequency,
    build_frequency_table, parse, tokenize,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};

#[derive(Parser, Debug)]
#[command(name = "lectio-rs", about = "Parse and analyze scripture passages", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse passage text into headings, paragraph breaks and verses.
    Parse {
        /// Passage text file; reads stdin when omitted or `-`.
        file: Option<PathBuf>,
    },
    /// Split text into word, punctuation and whitespace tokens.
    Tokenize {
        /// Text to segment.
        text: String,
    },
    /// Rank the most frequent words of a passage.
    Words {
        file: Option<PathBuf>,
        /// Maximum number of words to list.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Keep common words such as "the" and "and" in the ranking.
        #[arg(long)]
        include_stopwords: bool,
    },
    /// Show frequency details for a single word.
    Word {
        /// Word to analyze; case and punctuation are ignored.
        word: String,
        file: Option<PathBuf>,
        /// JSON concordance supplying occurrences elsewhere.
        #[arg(long)]
        concordance: Option<PathBuf>,
        /// Maximum number of occurrences to show.
        #[arg(long, default_value_t = 10)]
        occurrences: usize,
    },
    /// Parse a verse reference (`John 3:16`) or palette command (`v30`, `ch2`).
    Ref {
        reference: String,
    },
    /// Serve the JSON API over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        #[arg(long)]
        concordance: Option<PathBuf>,
        /// Default number of ranked words.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { file } => handle_parse(file.as_deref(), cli.json),
        Command::Tokenize { text } => handle_tokenize(&text, cli.json),
        Command::Words {
            file,
            limit,
            include_stopwords,
        } => handle_words(file.as_deref(), limit, include_stopwords, cli.json),
        Command::Word {
            word,
            file,
            concordance,
            occurrences,
        } => handle_word(
            &word,
            file.as_deref(),
            concordance.as_deref(),
            occurrences,
            cli.json,
        ),
        Command::Ref { reference } => handle_ref(&reference, cli.json),
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            concordance,
            top,
        } => handle_serve(addr, concordance, top),
    }
}

fn read_input(file: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()).into()),
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn load_concordance(path: Option<&Path>) -> Result<Box<dyn Concordance>, Box<dyn Error>> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
            Ok(Box::new(StaticConcordance::from_json(&json)?))
        }
        None => Ok(Box::new(NoConcordance)),
    }
}

fn handle_parse(file: Option<&Path>, as_json: bool) -> Result<(), Box<dyn Error>> {
    let parsed = parse(&read_input(file)?);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_passage(&parsed);
    }
    Ok(())
}

fn handle_tokenize(text: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let tokens = tokenize(text);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }
    println!("{:<12}  {}", "KIND", "TEXT");
    println!("{:-<12}  {}", "", "----");
    for token in &tokens {
        let kind = match token.kind {
            TokenKind::Word => "word",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Whitespace => "whitespace",
        };
        println!("{:<12}  {:?}", kind, token.text);
    }
    Ok(())
}

fn handle_words(
    file: Option<&Path>,
    limit: usize,
    include_stopwords: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let config = AnalysisConfig {
        top_n: limit,
        exclude_stopwords: !include_stopwords,
        ..AnalysisConfig::default()
    };
    let parsed = parse(&read_input(file)?);
    let analysis = config.analyze_passage(&parsed.elements);

    if as_json {
        let payload = json!({
            "stats": analysis.stats,
            "top_words": analysis.top_words,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let stats = &analysis.stats;
    println!(
        "Verses: {}  Words: {}  Significant: {}  Unique: {}  Per verse: {:.1}",
        stats.verse_count,
        stats.total_words,
        stats.significant_words,
        stats.unique_significant_words,
        stats.words_per_verse
    );
    print_frequency_table(&analysis.top_words);
    Ok(())
}

fn handle_word(
    word: &str,
    file: Option<&Path>,
    concordance: Option<&Path>,
    occurrence_limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if word.trim().is_empty() {
        return Err("Word cannot be empty".into());
    }
    let concordance = load_concordance(concordance)?;
    let parsed = parse(&read_input(file)?);
    let table = build_frequency_table(&parsed.elements);
    let config = AnalysisConfig {
        occurrence_limit,
        ..AnalysisConfig::default()
    };
    let analysis = config.analyze_word(&table, word.trim(), concordance.as_ref());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_word_analysis(&analysis);
    }
    Ok(())
}

fn handle_ref(reference: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    if let Some(command) = PaletteCommand::parse(reference) {
        let (kind, number) = match command {
            PaletteCommand::GoToVerse(n) => ("verse", n),
            PaletteCommand::GoToChapter(n) => ("chapter", n),
        };
        if as_json {
            println!("{}", json!({ "command": kind, "number": number }));
        } else {
            println!("Go to {kind} {number}");
        }
        return Ok(());
    }

    let parsed = PassageRef::parse(reference)
        .or_else(|| PassageRef::parse_canonical(reference))
        .ok_or_else(|| format!("Unrecognized reference {reference:?}"))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("Book: {}", parsed.book);
        println!("Chapter: {}", parsed.chapter);
        if let Some(verse) = parsed.verse {
            println!("Verse: {verse}");
        }
    }
    Ok(())
}

#[cfg(feature = "web")]
fn handle_serve(
    addr: std::net::SocketAddr,
    concordance: Option<PathBuf>,
    top: usize,
) -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = lectio_rs::web::WebConfig {
        addr,
        analysis: AnalysisConfig {
            top_n: top,
            ..AnalysisConfig::default()
        },
        concordance_path: concordance,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(lectio_rs::web::serve(config))?;
    Ok(())
}

fn print_passage(parsed: &ParsedPassage) {
    if parsed.is_empty() {
        println!("No passage content found.");
        return;
    }
    let markdown = passage_markdown(parsed);
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, &markdown, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{markdown}");
    }
}

fn passage_markdown(parsed: &ParsedPassage) -> String {
    let mut out = String::new();
    for element in &parsed.elements {
        match element {
            PassageElement::Heading { content } => {
                out.push_str("## ");
                out.push_str(content);
                out.push('\n');
            }
            PassageElement::Verse { verse } => {
                out.push_str(&format!("**{}** {}\n", verse.number, verse.text));
            }
            PassageElement::ParagraphBreak => out.push('\n'),
        }
    }
    out
}

fn print_frequency_table(rows: &[WordFrequency]) {
    if rows.is_empty() {
        println!("No words to rank.");
        return;
    }
    let width = rows
        .iter()
        .map(|row| row.word.len())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    println!("{:<width$}  {:>5}  {}", "WORD", "COUNT", "BAR", width = width);
    println!("{:-<width$}  {:->5}  {}", "", "", "---", width = width);
    for row in rows {
        let bar = "#".repeat((row.percentage / 5.0).round() as usize);
        println!(
            "{:<width$}  {:>5}  {}",
            row.word,
            row.count,
            bar,
            width = width
        );
    }
}

fn print_word_analysis(analysis: &WordAnalysis) {
    println!("Word: {} ({})", analysis.word, analysis.normalized_word);
    if analysis.is_stopword {
        println!("Common word");
    }
    let noun = if analysis.count == 1 {
        "occurrence"
    } else {
        "occurrences"
    };
    println!("{} {noun} in this passage", analysis.count);
    println!("{:.1}% of all words", analysis.percentage_of_passage);
    if !analysis.occurrences.is_empty() {
        println!("\nOther Occurrences:");
        for occurrence in &analysis.occurrences {
            println!("- {}: {}", occurrence.reference, occurrence.context);
        }
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}
