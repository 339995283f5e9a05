//! # Numeric Melody Notation
//!
//! Melodies are written as scale degrees (not angka):
//!
//! ```text
//! 1 2 3 4 | 5' 5-- 6. 5b | - 1m
//! │         │  │   │  │    │ └── minor quality mark
//! │         │  │   │  │    └── rest
//! │         │  │   │  └── flat
//! │         │  │   └── one octave down (repeatable: 6..)
//! │         │  └── two extra beats (duration 3)
//! │         └── one octave up (repeatable: 5'')
//! └── degree 1-7
//! ```
//!
//! Bars are separated by `|`, notes by whitespace. A rest is `-` or `_`, or `0`
//! followed by optional dashes for a longer rest.
//!
//! ## Transposition
//! Melodies move by scale degree, not chromatically: `semitones / 2` (rounded
//! down) degrees, carrying into the octave. A whole tone up turns `1` into `2`,
//! a semitone up leaves it alone. Stored melodies are displayed with this rule, so
//! it stays as is.

use crate::error::ChordError;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::trace;

static NOTE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-7])([#b]?)([.']*)(-*)(m?)$").unwrap());
static REST_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[-_]|0(-*))$").unwrap());

/// Staff line of each degree in C major, degree 1 on line 0.
const STAFF_LINES: [i32; 7] = [0, 1, 2, 3, 4, 5, 6];

const SOLFEGE: [&str; 7] = ["Do", "Re", "Mi", "Fa", "Sol", "La", "Si"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Accidental {
    #[default]
    #[serde(rename = "")]
    Natural,
    #[serde(rename = "#")]
    Sharp,
    #[serde(rename = "b")]
    Flat,
}

impl Accidental {
    fn symbol(self) -> &'static str {
        match self {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NoteQuality {
    #[default]
    #[serde(rename = "")]
    Plain,
    #[serde(rename = "m")]
    Minor,
}

/// A sounding note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Scale degree, 1-7.
    pub degree: u8,
    pub accidental: Accidental,
    /// 0 is the middle octave, each `'` adds one and each `.` takes one away.
    pub octave: i32,
    /// In beats, at least 1.
    pub duration: u32,
    pub quality: NoteQuality,
    pub bar: usize,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MelodyNote {
    Note(Note),
    Rest {
        duration: u32,
        bar: usize,
        position: usize,
    },
}

impl MelodyNote {
    pub fn duration(&self) -> u32 {
        match self {
            MelodyNote::Note(note) => note.duration,
            MelodyNote::Rest { duration, .. } => *duration,
        }
    }

    pub fn bar(&self) -> usize {
        match self {
            MelodyNote::Note(note) => note.bar,
            MelodyNote::Rest { bar, .. } => *bar,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            MelodyNote::Note(note) => note.position,
            MelodyNote::Rest { position, .. } => *position,
        }
    }
}

/// Vertical placement on a staff, in lines/spaces counted from degree 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaffPosition {
    pub line: i32,
    pub degree: u8,
}

fn parse_token(token: &str, bar: usize, position: usize) -> Option<MelodyNote> {
    if let Some(caps) = REST_TOKEN.captures(token) {
        let extra = caps.get(1).map_or(0, |m| m.as_str().len()) as u32;
        return Some(MelodyNote::Rest {
            duration: 1 + extra,
            bar,
            position,
        });
    }

    let caps = NOTE_TOKEN.captures(token)?;
    let octave_marks = &caps[3];
    let up = octave_marks.chars().filter(|c| *c == '\'').count() as i32;
    let down = octave_marks.chars().filter(|c| *c == '.').count() as i32;
    Some(MelodyNote::Note(Note {
        degree: caps[1].parse().ok()?,
        accidental: match &caps[2] {
            "#" => Accidental::Sharp,
            "b" => Accidental::Flat,
            _ => Accidental::Natural,
        },
        octave: up - down,
        duration: 1 + caps[4].len() as u32,
        quality: if caps[5].is_empty() {
            NoteQuality::Plain
        } else {
            NoteQuality::Minor
        },
        bar,
        position,
    }))
}

/// Note tokens per bar. Empty segments (a trailing `|`) are not bars, and
/// repeat colons (`|:`, `:|`) are dropped.
fn bars(melody: &str) -> impl Iterator<Item = Vec<&str>> {
    melody
        .split('|')
        .map(|segment| {
            segment
                .split_whitespace()
                .filter(|t| !t.chars().all(|c| c == ':'))
                .collect::<Vec<_>>()
        })
        .filter(|tokens| !tokens.is_empty())
}

/// Parse a melody string, skipping tokens that are neither notes nor rests.
///
/// ```
/// use chordsheet::parse_melody_string;
///
/// let notes = parse_melody_string("1 2 3 4 | 5 5 6 5 |");
/// assert_eq!(notes.len(), 8);
/// assert_eq!(notes[4].bar(), 1);
/// ```
pub fn parse_melody_string(melody: &str) -> Vec<MelodyNote> {
    let mut notes = Vec::new();
    for (bar, tokens) in bars(melody).enumerate() {
        let mut position = 0;
        for token in tokens {
            match parse_token(token, bar, position) {
                Some(note) => {
                    notes.push(note);
                    position += 1;
                }
                None => trace!(token, bar, "skipping melody token"),
            }
        }
    }
    notes
}

/// Parse a melody string, failing on the first unrecognized token.
pub fn parse_melody_strict(melody: &str) -> Result<Vec<MelodyNote>, ChordError> {
    let mut notes = Vec::new();
    for (bar, tokens) in bars(melody).enumerate() {
        for (position, token) in tokens.into_iter().enumerate() {
            let note = parse_token(token, bar, position).ok_or_else(|| {
                ChordError::InvalidMelodyToken {
                    bar,
                    position,
                    token: token.to_string(),
                }
            })?;
            notes.push(note);
        }
    }
    Ok(notes)
}

/// Move every note by `semitones / 2` scale degrees (rounded down), wrapping
/// into the next or previous octave. Rests are untouched.
pub fn transpose_melody(notes: &[MelodyNote], semitones: i32) -> Vec<MelodyNote> {
    let shift = semitones.div_euclid(2);
    notes
        .iter()
        .map(|note| match note {
            MelodyNote::Note(n) => {
                let index = n.degree as i32 - 1 + shift;
                MelodyNote::Note(Note {
                    degree: (index.rem_euclid(7) + 1) as u8,
                    octave: n.octave + index.div_euclid(7),
                    ..*n
                })
            }
            rest => *rest,
        })
        .collect()
}

/// The token for one note, in the same syntax the parser reads.
///
/// Rests print as `-`, or `0` plus dashes when longer than a beat.
pub fn format_note_display(note: &MelodyNote) -> String {
    match note {
        MelodyNote::Note(n) => {
            let octave = if n.octave >= 0 {
                "'".repeat(n.octave as usize)
            } else {
                ".".repeat(n.octave.unsigned_abs() as usize)
            };
            format!(
                "{}{}{}{}{}",
                n.degree,
                n.accidental.symbol(),
                octave,
                "-".repeat(n.duration.saturating_sub(1) as usize),
                if n.quality == NoteQuality::Minor { "m" } else { "" },
            )
        }
        MelodyNote::Rest { duration: 1, .. } => "-".to_string(),
        MelodyNote::Rest { duration, .. } => {
            format!("0{}", "-".repeat(duration.saturating_sub(1) as usize))
        }
    }
}

/// Print a whole melody, bars separated by ` | `.
pub fn format_melody(notes: &[MelodyNote]) -> String {
    let mut bars: Vec<Vec<String>> = Vec::new();
    let mut current_bar = None;
    for note in notes {
        if current_bar != Some(note.bar()) {
            bars.push(Vec::new());
            current_bar = Some(note.bar());
        }
        if let Some(bar) = bars.last_mut() {
            bar.push(format_note_display(note));
        }
    }
    bars.iter()
        .map(|bar| bar.join(" "))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Staff placement of a degree, C major, shifted 7 lines per octave.
/// Degrees outside 1-7 sit on line 0 of their octave.
pub fn degree_to_staff_position(degree: u8, octave: i32) -> StaffPosition {
    let base = match degree {
        1..=7 => STAFF_LINES[degree as usize - 1],
        _ => 0,
    };
    StaffPosition {
        line: base + octave * 7,
        degree,
    }
}

/// Solfège name of a degree (`1` → `Do`), empty for anything else.
pub fn get_scale_degree_name(degree: u8) -> &'static str {
    match degree {
        1..=7 => SOLFEGE[degree as usize - 1],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(token: &str) -> Note {
        match parse_melody_string(token).first() {
            Some(MelodyNote::Note(n)) => *n,
            other => panic!("{token} parsed as {other:?}"),
        }
    }

    #[test]
    fn test_parse_bars_and_positions() {
        let notes = parse_melody_string("1 2 3 4 | 5 5 6 5 |");
        assert_eq!(notes.len(), 8);
        let degrees: Vec<u8> = notes
            .iter()
            .map(|n| match n {
                MelodyNote::Note(n) => n.degree,
                MelodyNote::Rest { .. } => 0,
            })
            .collect();
        assert_eq!(degrees, vec![1, 2, 3, 4, 5, 5, 6, 5]);
        assert!(notes.iter().all(|n| n.duration() == 1));
        assert_eq!(notes[3].bar(), 0);
        assert_eq!(notes[3].position(), 3);
        assert_eq!(notes[4].bar(), 1);
        assert_eq!(notes[4].position(), 0);
    }

    #[test]
    fn test_parse_markers() {
        let n = note("5#''--m");
        assert_eq!(n.degree, 5);
        assert_eq!(n.accidental, Accidental::Sharp);
        assert_eq!(n.octave, 2);
        assert_eq!(n.duration, 3);
        assert_eq!(n.quality, NoteQuality::Minor);

        let n = note("3b..");
        assert_eq!(n.accidental, Accidental::Flat);
        assert_eq!(n.octave, -2);
        assert_eq!(n.duration, 1);
    }

    #[test]
    fn test_parse_rests() {
        let notes = parse_melody_string("- _ 0 0--");
        let durations: Vec<u32> = notes.iter().map(|n| n.duration()).collect();
        assert_eq!(durations, vec![1, 1, 1, 3]);
        assert!(notes.iter().all(|n| matches!(n, MelodyNote::Rest { .. })));
    }

    #[test]
    fn test_invalid_tokens() {
        let notes = parse_melody_string("1 9 x 2");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].position(), 1);

        match parse_melody_strict("1 2 | 3 9") {
            Err(ChordError::InvalidMelodyToken { bar, position, token }) => {
                assert_eq!((bar, position, token.as_str()), (1, 1, "9"));
            }
            other => panic!("expected invalid token, got {other:?}"),
        }
        assert_eq!(parse_melody_strict("|: 1 2 :|").unwrap().len(), 2);
    }

    #[test]
    fn test_transpose_by_degree() {
        let notes = parse_melody_string("1 7 3");
        let up = transpose_melody(&notes, 2);
        let shifted: Vec<(u8, i32)> = up
            .iter()
            .map(|n| match n {
                MelodyNote::Note(n) => (n.degree, n.octave),
                MelodyNote::Rest { .. } => (0, 0),
            })
            .collect();
        assert_eq!(shifted, vec![(2, 0), (1, 1), (4, 0)]);

        // one semitone rounds down to no movement, minus one rounds to a degree down
        assert_eq!(transpose_melody(&notes, 1), notes);
        match transpose_melody(&notes, -1)[0] {
            MelodyNote::Note(n) => assert_eq!((n.degree, n.octave), (7, -1)),
            _ => panic!("expected note"),
        }
    }

    #[test]
    fn test_transpose_keeps_rests_and_markers() {
        let notes = parse_melody_string("5#-m -");
        let up = transpose_melody(&notes, 4);
        assert_eq!(format_note_display(&up[0]), "7#-m");
        assert_eq!(up[1], notes[1]);
    }

    #[test]
    fn test_format_parse_inverse() {
        for token in ["1", "2#", "3b'", "4..", "5''---", "6m", "7.-m"] {
            let parsed = note(token);
            let formatted = format_note_display(&MelodyNote::Note(parsed));
            assert_eq!(formatted, token);
            let reparsed = note(&formatted);
            assert_eq!(
                (reparsed.degree, reparsed.octave, reparsed.duration),
                (parsed.degree, parsed.octave, parsed.duration)
            );
        }
    }

    #[test]
    fn test_format_melody() {
        let notes = parse_melody_string("1 2 | 3-- 0-- | 5.");
        assert_eq!(format_melody(&notes), "1 2 | 3-- 0-- | 5.");
        assert_eq!(format_melody(&parse_melody_string("- 1")), "- 1");
        assert_eq!(format_melody(&[]), "");
    }

    #[test]
    fn test_staff_position() {
        assert_eq!(degree_to_staff_position(1, 0), StaffPosition { line: 0, degree: 1 });
        assert_eq!(degree_to_staff_position(5, 0).line, 4);
        assert_eq!(degree_to_staff_position(3, 1).line, 9);
        assert_eq!(degree_to_staff_position(7, -1).line, -1);
        assert_eq!(degree_to_staff_position(9, 1).line, 7);
    }

    #[test]
    fn test_scale_degree_names() {
        let names: Vec<&str> = (1..=7).map(get_scale_degree_name).collect();
        assert_eq!(names, vec!["Do", "Re", "Mi", "Fa", "Sol", "La", "Si"]);
        assert_eq!(get_scale_degree_name(0), "");
    }

    #[test]
    fn test_serialized_shape() {
        let notes = parse_melody_string("1' -");
        let json = serde_json::to_value(&notes).unwrap();
        assert_eq!(json[0]["type"], "note");
        assert_eq!(json[0]["degree"], 1);
        assert_eq!(json[0]["octave"], 1);
        assert_eq!(json[0]["accidental"], "");
        assert_eq!(json[1]["type"], "rest");
        assert_eq!(json[1]["duration"], 1);
    }
}
