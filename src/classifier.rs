//! # Line Classifier
//!
//! Decides what a single line of a song sheet is. The checks run in a fixed order
//! on the trimmed line and the first one that fires wins:
//!
//! | # | Check                                   | Result        |
//! |---|-----------------------------------------|---------------|
//! | 1 | blank                                   | `Empty`       |
//! | 2 | `key: value` with a known key, short    | `Metadata`    |
//! | 3 | `[/...]`                                | `CloseMarker` |
//! | 4 | `[Label]` or `Label:` naming a section  | `Header`      |
//! | 5 | chord coverage thresholds               | `Chords`      |
//! | 6 | majority of numeric melody tokens       | `Number`      |
//! | 7 | anything else                           | `Text`        |
//!
//! The thresholds are heuristics the chord display depends on; they are kept as
//! named constants below and must not drift.

use crate::ast::SectionKind;
use crate::chord::{chord_spans, is_bar_token, is_chord, is_filler};
use regex::Regex;
use std::sync::LazyLock;

/// A line is a chord line when at least this share of its tokens are chords or filler...
pub const TOKEN_COVERAGE_PERCENT: usize = 70;
/// ...or when chord text covers at least this share of its non-space characters.
pub const CHAR_COVERAGE_PERCENT: usize = 50;
/// Metadata lines must be shorter than this many characters.
pub const METADATA_MAX_CHARS: usize = 50;
/// `Label:` headers longer than this many words are lyrics, not labels.
const COLON_LABEL_MAX_WORDS: usize = 3;
const BRACKET_LABEL_MAX_CHARS: usize = 40;

/// Metadata keys as written (lowercase) and the name they are stored under.
const METADATA_KEYS: &[(&str, &str)] = &[
    ("title", "title"),
    ("artist", "artist"),
    ("key", "key"),
    ("tempo", "tempo"),
    ("time", "time"),
    ("time signature", "time"),
    ("original key", "original_key"),
];

/// Substrings naming a song part, checked in order, and the normalized name.
const STRUCTURE_KEYWORDS: &[(&str, &str)] = &[
    ("pre-chorus", "pre-chorus"),
    ("prechorus", "pre-chorus"),
    ("pre chorus", "pre-chorus"),
    ("pre-reff", "pre-chorus"),
    ("interlude", "interlude"),
    ("intro", "intro"),
    ("verse", "verse"),
    ("chorus", "chorus"),
    ("reff", "chorus"),
    ("bridge", "bridge"),
    ("outro", "outro"),
    ("solo", "solo"),
    ("refrain", "refrain"),
    ("musik", "musik"),
    ("music", "musik"),
];

/// Abbreviations accepted only as the whole first word of a label (`Int:`, `Ref 2`).
const STRUCTURE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("int", "intro"),
    ("vs", "verse"),
    ("pre", "pre-chorus"),
    ("ref", "chorus"),
    ("rf", "chorus"),
    ("chor", "chorus"),
    ("br", "bridge"),
    ("out", "outro"),
    ("inst", "interlude"),
];

/// Instrument names, including Indonesian spellings.
const INSTRUMENT_KEYWORDS: &[&str] = &[
    "guitar", "gitar", "bass", "piano", "keyboard", "keys", "organ", "synth", "brass",
    "horn", "trumpet", "terompet", "trombone", "sax", "flute", "suling", "string", "violin",
    "biola", "cello", "vocal", "vokal", "voice", "drum", "perkusi", "percussion", "cajon",
    "conga",
];

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-7][.']*$").unwrap());

/// A section header, `[Chorus]` or `Int: C G Am`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    /// Normalized section name (`verse`, `pre-chorus`, or the instrument label).
    pub name: String,
    /// The label as written, without brackets or colon.
    pub label: &'a str,
    pub kind: SectionKind,
    /// Byte offset in the raw line where the text after the label starts.
    pub rest_offset: usize,
    /// Whatever follows the label on the same line, often inline chords.
    pub rest: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Empty,
    Metadata { key: &'static str, value: &'a str },
    CloseMarker,
    Header(Header<'a>),
    Chords,
    Number,
    Text,
}

/// Classify one raw line.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Empty;
    }
    if let Some((key, value)) = metadata_entry(trimmed) {
        return LineKind::Metadata { key, value };
    }
    if is_close_marker(trimmed) {
        return LineKind::CloseMarker;
    }
    if let Some(header) = parse_header(line) {
        return LineKind::Header(header);
    }
    if is_chord_line(line) {
        return LineKind::Chords;
    }
    if is_number_line(line) {
        return LineKind::Number;
    }
    LineKind::Text
}

/// `Key: Am` → `("key", "Am")`.
pub fn metadata_entry(trimmed: &str) -> Option<(&'static str, &str)> {
    if trimmed.chars().count() >= METADATA_MAX_CHARS {
        return None;
    }
    let (key, value) = trimmed.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    metadata_key(key).map(|name| (name, value))
}

/// Normalize a metadata key as written in a line or front matter.
pub(crate) fn metadata_key(key: &str) -> Option<&'static str> {
    let key = key.trim().to_lowercase().replace(['-', '_'], " ");
    METADATA_KEYS
        .iter()
        .find(|(written, _)| *written == key)
        .map(|(_, name)| *name)
}

fn is_close_marker(trimmed: &str) -> bool {
    trimmed.starts_with("[/") && trimmed.ends_with(']')
}

/// Map a label to a section name, song parts first, then instruments.
pub fn section_name(label: &str) -> Option<(String, SectionKind)> {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some((_, name)) = STRUCTURE_KEYWORDS.iter().find(|(kw, _)| lower.contains(kw)) {
        return Some((name.to_string(), SectionKind::Structure));
    }

    let first_word: String = lower.chars().take_while(|c| c.is_alphabetic()).collect();
    if let Some((_, name)) = STRUCTURE_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == first_word)
    {
        return Some((name.to_string(), SectionKind::Structure));
    }

    if INSTRUMENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some((lower, SectionKind::Instrument));
    }
    None
}

/// Recognize `[Label] rest` or `Label: rest` when the label names a section.
pub fn parse_header(line: &str) -> Option<Header<'_>> {
    let lead = line.len() - line.trim_start().len();
    let body = &line[lead..];

    let (label, rest_offset) = if let Some(inner) = body.strip_prefix('[') {
        let close = inner.find(']')?;
        let label = &inner[..close];
        if label.chars().count() > BRACKET_LABEL_MAX_CHARS {
            return None;
        }
        (label, lead + 1 + close + 1)
    } else {
        let colon = body.find(':')?;
        let label = &body[..colon];
        if label.split_whitespace().count() > COLON_LABEL_MAX_WORDS {
            return None;
        }
        (label, lead + colon + 1)
    };

    let (name, kind) = section_name(label)?;
    Some(Header {
        name,
        label: label.trim(),
        kind,
        rest_offset,
        rest: &line[rest_offset..],
    })
}

/// Chord line test, either path is enough:
/// (a) chords and `.`/`-` filler make up at least 70% of the whitespace tokens
///     (bar lines not counted), or
/// (b) the chord text found on the line, compact chains included, covers at
///     least 50% of its non-space characters.
/// A line with no chord at all is never a chord line.
pub fn is_chord_line(line: &str) -> bool {
    let spans = chord_spans(line);
    if spans.is_empty() {
        return false;
    }

    let tokens: Vec<&str> = line
        .split_whitespace()
        .filter(|t| !is_bar_token(t))
        .collect();
    let chordish = tokens
        .iter()
        .filter(|t| is_chord(t) || is_filler(t))
        .count();
    if !tokens.is_empty() && chordish * 100 >= tokens.len() * TOKEN_COVERAGE_PERCENT {
        return true;
    }

    let covered: usize = spans
        .iter()
        .map(|(start, end)| line[*start..*end].chars().count())
        .sum();
    let non_space = line.chars().filter(|c| !c.is_whitespace()).count();
    covered * 100 >= non_space * CHAR_COVERAGE_PERCENT
}

/// Numeric melody line: more than half of the tokens (bar lines removed) are a
/// scale degree `1`-`7` with optional `.`/`'` octave marks, or a dot filler.
pub fn is_number_line(line: &str) -> bool {
    let tokens: Vec<&str> = line
        .split_whitespace()
        .filter(|t| !is_bar_token(t))
        .collect();
    if tokens.is_empty() {
        return false;
    }
    let numeric = tokens
        .iter()
        .filter(|t| NUMBER_TOKEN.is_match(t) || t.chars().all(|c| c == '.'))
        .count();
    numeric * 2 > tokens.len()
}
