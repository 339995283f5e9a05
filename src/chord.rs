//! # Chord Grammar
//!
//! Recognizes chord symbols in chord-over-lyrics text.
//!
//! ## Chord Symbol Shape
//! ```text
//! [-] Root [quality] [extension] [alterations] [/Bass] [....]
//!  │   │       │          │            │          │      └── hold dots (duration)
//!  │   │       │          │            │          └── slash bass note
//!  │   │       │          │            └── b5, #9, add9, sus4 ...
//!  │   │       │          └── 7, 9, 11, 13 (free-form digits)
//!  │   │       └── m, min, maj, M, dim, aug, sus2, sus4 ...
//!  │   └── A-G with optional # or b
//!  └── passing chord marker
//! ```
//!
//! Several chords may share one token in compact notation: `D..Gm..Bb`, `C-G`.
//! Inside a chain the dot runs are joiners, only a dot run that ends the token is a
//! hold marker.
//!
//! The grammar is permissive on purpose: anything that does not fit is simply not a
//! chord, and the line falls through to lyric text.

use crate::error::ChordError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Pitch classes spelled with sharps, index 0 = C.
pub const NOTES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch classes spelled with flats, index 0 = C.
pub const NOTES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// One chord symbol without hold dots, anchored at the start of the haystack.
static CHORD_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?[A-G][#b]?(?:maj|min|dim|aug|sus|add|m|M|\+|°)?\d*(?:(?:add|sus|maj|b|#)\d+)*(?:/[A-G][#b]?)?",
    )
    .unwrap()
});

/// A whole token that is exactly one chord, optionally held with trailing dots.
static CHORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?[A-G][#b]?(?:maj|min|dim|aug|sus|add|m|M|\+|°)?\d*(?:(?:add|sus|maj|b|#)\d+)*(?:/[A-G][#b]?)?\.*$",
    )
    .unwrap()
});

/// Decomposes a token already accepted by `CHORD_TOKEN`.
static CHORD_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?)([A-G][#b]?)([^/.]*)(?:/([A-G][#b]?))?(\.*)$").unwrap()
});

/// Accidental convention used when spelling a pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Spelling {
    Sharp,
    Flat,
}

impl Spelling {
    /// The spelling a chord symbol is written in.
    ///
    /// A root carrying its own accidental decides; a natural root falls back to
    /// flats when a `b` appears anywhere in the symbol (`Cm7b5`), sharps otherwise.
    pub fn of(symbol: &str) -> Self {
        let body = symbol.trim_start_matches('-');
        let mut chars = body.chars();
        chars.next();
        match chars.next() {
            Some('#') => Spelling::Sharp,
            Some('b') => Spelling::Flat,
            _ if symbol.contains('b') => Spelling::Flat,
            _ => Spelling::Sharp,
        }
    }

    pub fn table(self) -> &'static [&'static str; 12] {
        match self {
            Spelling::Sharp => &NOTES_SHARP,
            Spelling::Flat => &NOTES_FLAT,
        }
    }
}

/// Pitch class index (0 = C) of a note name such as `F#` or `Bb`.
///
/// Both spelling tables are consulted. Returns `None` for anything else,
/// including enharmonic oddities like `Cb` or `E#`.
pub fn note_index(note: &str) -> Option<usize> {
    NOTES_SHARP
        .iter()
        .position(|n| *n == note)
        .or_else(|| NOTES_FLAT.iter().position(|n| *n == note))
}

/// Spell a (possibly negative or > 11) pitch class.
pub fn note_name(index: i32, spelling: Spelling) -> &'static str {
    spelling.table()[index.rem_euclid(12) as usize]
}

/// Length in bytes of the root (`A`-`G` plus an optional `#`/`b`) at the start of `s`.
pub(crate) fn root_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b'A'..=b'G') => {}
        _ => return None,
    }
    match bytes.get(1) {
        Some(b'#') | Some(b'b') => Some(2),
        _ => Some(1),
    }
}

/// A pitch class parsed strictly from a note or key name (`"F#"`, `"Bbm"`, `"Am"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchClass(u8);

impl PitchClass {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self, spelling: Spelling) -> &'static str {
        spelling.table()[self.index()]
    }
}

impl FromStr for PitchClass {
    type Err = ChordError;

    /// Only the root is read; any quality after it (`m`, `maj`, ...) is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let len = root_len(trimmed).ok_or_else(|| ChordError::UnknownNote(trimmed.to_string()))?;
        note_index(&trimmed[..len])
            .map(|i| PitchClass(i as u8))
            .ok_or_else(|| ChordError::UnknownNote(trimmed.to_string()))
    }
}

/// Chord family read from the quality part of the suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ChordQuality {
    /// Empty, `maj` or `M` without digits
    Major,
    /// `m`, `min`
    Minor,
    /// `maj7`, `M9`, ...: major triad with a major seventh
    MajorSeventh,
    /// `dim`, `°`
    Diminished,
    /// `aug`, `+`
    Augmented,
    /// `sus2`, `sus4`, bare `sus` (= 4)
    Suspended(u8),
    /// Anything the decomposition does not understand, kept verbatim
    Raw(String),
}

/// Extra tones or altered degrees after the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "degree")]
pub enum Alteration {
    Flat(u8),
    Sharp(u8),
    Add(u8),
    Sus(u8),
}

/// Decomposed chord symbol.
///
/// `suffix` keeps the quality/extension/alteration text exactly as written so that
/// `Display` reproduces the original token byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub passing: bool,
    pub root: String,
    pub suffix: String,
    pub quality: ChordQuality,
    pub extension: Option<u8>,
    pub alterations: Vec<Alteration>,
    pub bass: Option<String>,
    pub hold: usize,
}

impl Chord {
    /// Parse a single chord token such as `-Am7/G..`. Returns `None` for
    /// anything `is_chord` rejects.
    pub fn parse(token: &str) -> Option<Self> {
        if !CHORD_TOKEN.is_match(token) {
            return None;
        }
        let caps = CHORD_PARTS.captures(token)?;
        let suffix = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let (quality, extension, alterations) = decompose_suffix(&suffix);
        Some(Chord {
            passing: !caps[1].is_empty(),
            root: caps[2].to_string(),
            quality,
            extension,
            alterations,
            suffix,
            bass: caps.get(4).map(|m| m.as_str().to_string()),
            hold: caps.get(5).map_or(0, |m| m.as_str().len()),
        })
    }

    pub fn root_index(&self) -> Option<usize> {
        note_index(&self.root)
    }

    pub fn spelling(&self) -> Spelling {
        Spelling::of(&self.to_string())
    }

    /// The symbol without passing marker and hold dots (`-G..` → `G`).
    pub fn display_name(&self) -> String {
        match &self.bass {
            Some(bass) => format!("{}{}/{}", self.root, self.suffix, bass),
            None => format!("{}{}", self.root, self.suffix),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passing {
            write!(f, "-")?;
        }
        write!(f, "{}", self.display_name())?;
        for _ in 0..self.hold {
            write!(f, ".")?;
        }
        Ok(())
    }
}

fn take_digits(s: &str) -> (Option<u8>, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return (None, s);
    }
    (s[..end].parse().ok(), &s[end..])
}

fn decompose_suffix(suffix: &str) -> (ChordQuality, Option<u8>, Vec<Alteration>) {
    let raw = || (ChordQuality::Raw(suffix.to_string()), None, Vec::new());

    let (quality, rest) = if let Some(rest) = suffix.strip_prefix("maj").or_else(|| suffix.strip_prefix('M')) {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            (ChordQuality::MajorSeventh, rest)
        } else {
            (ChordQuality::Major, rest)
        }
    } else if let Some(rest) = suffix.strip_prefix("min").or_else(|| suffix.strip_prefix('m')) {
        (ChordQuality::Minor, rest)
    } else if let Some(rest) = suffix.strip_prefix("dim").or_else(|| suffix.strip_prefix('°')) {
        (ChordQuality::Diminished, rest)
    } else if let Some(rest) = suffix.strip_prefix("aug").or_else(|| suffix.strip_prefix('+')) {
        (ChordQuality::Augmented, rest)
    } else if let Some(rest) = suffix.strip_prefix("sus") {
        match rest.as_bytes().first() {
            Some(b'2') => (ChordQuality::Suspended(2), &rest[1..]),
            Some(b'4') => (ChordQuality::Suspended(4), &rest[1..]),
            _ => (ChordQuality::Suspended(4), rest),
        }
    } else {
        (ChordQuality::Major, suffix)
    };

    let (extension, mut rest) = take_digits(rest);

    let mut alterations = Vec::new();
    while !rest.is_empty() {
        let (make, tail): (fn(u8) -> Alteration, &str) = if let Some(t) = rest.strip_prefix("add") {
            (Alteration::Add, t)
        } else if let Some(t) = rest.strip_prefix("sus") {
            (Alteration::Sus, t)
        } else if let Some(t) = rest.strip_prefix('b') {
            (Alteration::Flat, t)
        } else if let Some(t) = rest.strip_prefix('#') {
            (Alteration::Sharp, t)
        } else {
            return raw();
        };
        match take_digits(tail) {
            (Some(degree), after) => {
                alterations.push(make(degree));
                rest = after;
            }
            (None, _) => return raw(),
        }
    }

    (quality, extension, alterations)
}

/// Does this whitespace-free token spell exactly one chord?
///
/// Compact chains like `D..Gm..Bb` are not single chords; `extract_chords`
/// finds them instead.
pub fn is_chord(token: &str) -> bool {
    CHORD_TOKEN.is_match(token)
}

/// A `.` run or a `-` run standing in for a held beat.
pub fn is_filler(token: &str) -> bool {
    !token.is_empty() && (token.chars().all(|c| c == '.') || token.chars().all(|c| c == '-'))
}

/// A bar line token: `|`, `||`, `|:`, `:|`, `||:`, `:||`.
pub fn is_bar_token(token: &str) -> bool {
    !token.is_empty() && token.contains('|') && token.chars().all(|c| c == '|' || c == ':')
}

/// A chord found on a line, with its column (in characters) for lyric alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordPosition {
    pub chord: String,
    pub position: usize,
}

impl ChordPosition {
    pub fn new(chord: impl Into<String>, position: usize) -> Self {
        Self {
            chord: chord.into(),
            position,
        }
    }
}

/// Byte spans of the chords making up a compact chain token, or `None` if the
/// token is not entirely chords and joiners.
fn scan_chain(token: &str) -> Option<Vec<(usize, usize)>> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    loop {
        let body = CHORD_BODY.find(&token[cursor..])?;
        let start = cursor;
        let end = cursor + body.end();

        let rest = &token[end..];
        let run = rest.bytes().take_while(|b| *b == b'.' || *b == b'-').count();

        if end + run == token.len() {
            // Trailing dots hold the last chord, trailing dashes are just filler.
            if run > 0 && rest.bytes().all(|b| b == b'.') {
                spans.push((start, token.len()));
            } else {
                spans.push((start, end));
            }
            return Some(spans);
        }
        if run == 0 {
            return None;
        }

        spans.push((start, end));
        cursor = end + run;
        // `..-Bb`: the dots join, the dash marks the next chord as passing.
        let joiner = &rest[..run];
        if joiner.ends_with('-') && joiner.contains('.') {
            cursor -= 1;
        }
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '|' || c == ':'
}

/// Split a line into `(byte offset, token)` pairs on whitespace, bar lines and colons.
pub(crate) fn tokens_with_offsets(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        if is_separator(c) {
            if let Some(s) = start.take() {
                out.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

/// Byte spans of every chord on the line, in order.
pub(crate) fn chord_spans(line: &str) -> Vec<(usize, usize)> {
    tokens_with_offsets(line)
        .into_iter()
        .filter_map(|(offset, token)| {
            scan_chain(token).map(|spans| {
                spans
                    .into_iter()
                    .map(|(s, e)| (offset + s, offset + e))
                    .collect::<Vec<_>>()
            })
        })
        .flatten()
        .collect()
}

/// Every chord on the line with its character column.
///
/// ```
/// use chordsheet::chord::{extract_chords, ChordPosition};
///
/// let chords = extract_chords("C   G   Am");
/// assert_eq!(chords[1], ChordPosition::new("G", 4));
/// ```
pub fn extract_chords(line: &str) -> Vec<ChordPosition> {
    chord_spans(line)
        .into_iter()
        .map(|(start, end)| ChordPosition {
            chord: line[start..end].to_string(),
            position: line[..start].chars().count(),
        })
        .collect()
}

/// Chord identity for inventories: no passing marker, no hold dots.
pub fn strip_decorations(chord: &str) -> &str {
    chord.trim_start_matches('-').trim_end_matches('.')
}
