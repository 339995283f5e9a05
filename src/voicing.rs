//! Keyboard voicings for chord symbols
//!
//! Turns a chord symbol (C, Am7, F#m7b5/A, Dsus4, ...) into the keys to press, for
//! the on-screen keyboard diagram next to a song's chord list.

use crate::chord::{note_index, note_name, Alteration, Chord, ChordQuality};
use serde::Serialize;

/// Root octave: C3 = MIDI 48.
const BASE_MIDI: u8 = 48;

/// The keys for one chord.
///
/// # Fields
/// - `root`: MIDI note of the root, in the C3 octave (48-59)
/// - `notes`: chord tones from the root upwards, ascending, no duplicates
/// - `note_names`: the same tones spelled like the chord (`Bb` chords use flats)
/// - `bass`: slash bass note, one octave below the root octave
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardVoicing {
    pub chord: String,
    pub root: u8,
    pub notes: Vec<u8>,
    pub note_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass: Option<u8>,
}

/// Semitones above the root for a chord family and extension.
///
/// Intervals: minor 3rd = 3, major 3rd = 4, perfect 5th = 7, minor 7th = 10,
/// major 7th = 11, 9th = 14, 11th = 17, 13th = 21.
fn intervals(quality: &ChordQuality, extension: Option<u8>) -> Vec<u8> {
    let triad: &[u8] = match quality {
        ChordQuality::Minor => &[0, 3, 7],
        ChordQuality::Diminished => &[0, 3, 6],
        ChordQuality::Augmented => &[0, 4, 8],
        ChordQuality::Suspended(2) => &[0, 2, 7],
        ChordQuality::Suspended(_) => &[0, 5, 7],
        // Unknown suffixes still get a playable major triad
        ChordQuality::Major | ChordQuality::MajorSeventh | ChordQuality::Raw(_) => &[0, 4, 7],
    };
    let mut tones = triad.to_vec();

    let seventh = match quality {
        ChordQuality::MajorSeventh => 11,
        ChordQuality::Diminished => 9,
        _ => 10,
    };
    match extension {
        Some(6) => tones.push(9),
        Some(7) => tones.push(seventh),
        Some(9) => tones.extend([seventh, 14]),
        Some(11) => tones.extend([seventh, 14, 17]),
        Some(13) => tones.extend([seventh, 14, 21]),
        _ => {}
    }
    tones
}

/// Semitones above the root of a chord degree (`9` → 14, `4` → 5).
fn degree_interval(degree: u8) -> Option<u8> {
    match degree {
        2 => Some(2),
        4 => Some(5),
        5 => Some(7),
        6 => Some(9),
        9 => Some(14),
        11 => Some(17),
        13 => Some(21),
        _ => None,
    }
}

fn apply_alteration(tones: &mut Vec<u8>, alteration: Alteration) {
    match alteration {
        Alteration::Add(degree) => {
            if let Some(interval) = degree_interval(degree) {
                tones.push(interval);
            }
        }
        Alteration::Sus(degree) => {
            // replaces the third
            tones.retain(|t| *t != 3 && *t != 4);
            tones.push(if degree == 2 { 2 } else { 5 });
        }
        Alteration::Flat(degree) | Alteration::Sharp(degree) => {
            let Some(natural) = degree_interval(degree) else {
                return;
            };
            let altered = if matches!(alteration, Alteration::Flat(_)) {
                natural - 1
            } else {
                natural + 1
            };
            tones.retain(|t| *t != natural);
            tones.push(altered);
        }
    }
}

/// Keyboard voicing for a chord symbol, or `None` when it is not a chord.
///
/// # Examples
/// ```
/// use chordsheet::keyboard_voicing;
///
/// // C major: C3, E3, G3
/// assert_eq!(keyboard_voicing("C").unwrap().notes, vec![48, 52, 55]);
///
/// // G7: G3, B3, D4, F4
/// assert_eq!(keyboard_voicing("G7").unwrap().notes, vec![55, 59, 62, 65]);
///
/// // Passing markers and hold dots do not matter
/// assert_eq!(keyboard_voicing("-Dm..").unwrap().notes, vec![50, 53, 57]);
/// ```
pub fn keyboard_voicing(symbol: &str) -> Option<KeyboardVoicing> {
    let chord = Chord::parse(symbol)?;
    let root_index = chord.root_index()?;
    let root = BASE_MIDI + root_index as u8;

    let mut tones = intervals(&chord.quality, chord.extension);
    for alteration in &chord.alterations {
        apply_alteration(&mut tones, *alteration);
    }
    tones.sort_unstable();
    tones.dedup();

    let spelling = chord.spelling();
    let notes: Vec<u8> = tones.iter().map(|t| root + t).collect();
    let note_names = notes
        .iter()
        .map(|n| note_name(*n as i32, spelling).to_string())
        .collect();

    let bass = chord
        .bass
        .as_deref()
        .and_then(note_index)
        .map(|i| BASE_MIDI - 12 + i as u8);

    Some(KeyboardVoicing {
        chord: chord.display_name(),
        root,
        notes,
        note_names,
        bass,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(symbol: &str) -> Vec<u8> {
        keyboard_voicing(symbol).unwrap().notes
    }

    #[test]
    fn test_triads() {
        assert_eq!(notes("C"), vec![48, 52, 55]);
        assert_eq!(notes("Dm"), vec![50, 53, 57]);
        assert_eq!(notes("F#"), vec![54, 58, 61]);
        assert_eq!(notes("Bbm"), vec![58, 61, 65]);
        assert_eq!(notes("Bdim"), vec![59, 62, 65]);
        assert_eq!(notes("Caug"), vec![48, 52, 56]);
        assert_eq!(notes("Csus2"), vec![48, 50, 55]);
        assert_eq!(notes("Dsus4"), vec![50, 55, 57]);
    }

    #[test]
    fn test_sevenths_and_extensions() {
        assert_eq!(notes("Cmaj7"), vec![48, 52, 55, 59]);
        assert_eq!(notes("Am7"), vec![57, 60, 64, 67]);
        assert_eq!(notes("C9"), vec![48, 52, 55, 58, 62]);
        assert_eq!(notes("C6"), vec![48, 52, 55, 57]);
        assert_eq!(notes("Cdim7"), vec![48, 51, 54, 57]);
    }

    #[test]
    fn test_alterations() {
        assert_eq!(notes("Cadd9"), vec![48, 52, 55, 62]);
        assert_eq!(notes("Cm7b5"), vec![48, 51, 54, 58]);
        assert_eq!(notes("C7sus4"), vec![48, 53, 55, 58]);
        assert_eq!(notes("C7#9"), vec![48, 52, 55, 58, 63]);
    }

    #[test]
    fn test_names_follow_chord_spelling() {
        let voicing = keyboard_voicing("Eb").unwrap();
        assert_eq!(voicing.note_names, vec!["Eb", "G", "Bb"]);
        let voicing = keyboard_voicing("D#").unwrap();
        assert_eq!(voicing.note_names, vec!["D#", "G", "A#"]);
    }

    #[test]
    fn test_slash_bass() {
        let voicing = keyboard_voicing("C/G").unwrap();
        assert_eq!(voicing.bass, Some(43));
        assert_eq!(voicing.chord, "C/G");
        assert_eq!(keyboard_voicing("C").unwrap().bass, None);
    }

    #[test]
    fn test_not_a_chord() {
        assert_eq!(keyboard_voicing("Hello"), None);
        assert_eq!(keyboard_voicing(""), None);
        assert_eq!(keyboard_voicing("Cb"), None);
    }
}
