use crate::ast::{Line, ParsedSong};
use crate::chord::{chord_spans, note_index, note_name, root_len, PitchClass, Spelling};
use crate::classifier::{classify_line, is_chord_line, LineKind};

/// Pitch class of a key name's root (`"Am"` → 9), ignoring any quality.
fn key_index(key: &str) -> Option<i32> {
    key.parse::<PitchClass>().ok().map(|p| p.index() as i32)
}

/// Transpose one chord symbol by `steps` semitones.
///
/// Only the root changes. Everything after it (quality, extension, slash bass,
/// hold dots) is carried over byte for byte, and a leading `-` passing marker is
/// kept. The new root is spelled in the symbol's own convention, see
/// [`Spelling::of`]. Anything without a recognizable root comes back unchanged.
///
/// ```
/// use chordsheet::transpose_chord;
///
/// assert_eq!(transpose_chord("Am7", 2), "Bm7");
/// assert_eq!(transpose_chord("Bb", 1), "B");
/// assert_eq!(transpose_chord("-F#m..", -1), "-Fm..");
/// assert_eq!(transpose_chord("N.C.", 3), "N.C.");
/// ```
pub fn transpose_chord(chord: &str, steps: i32) -> String {
    transpose_chord_spelled(chord, steps, Spelling::of(chord))
}

/// [`transpose_chord`] with the new root spelled in a fixed convention.
///
/// ```
/// use chordsheet::chord::Spelling;
/// use chordsheet::transpose::transpose_chord_spelled;
///
/// assert_eq!(transpose_chord_spelled("C#m", 0, Spelling::Flat), "Dbm");
/// ```
pub fn transpose_chord_spelled(chord: &str, steps: i32, spelling: Spelling) -> String {
    let (marker, body) = match chord.strip_prefix('-') {
        Some(body) => ("-", body),
        None => ("", chord),
    };
    let Some(len) = root_len(body) else {
        return chord.to_string();
    };
    let Some(index) = note_index(&body[..len]) else {
        return chord.to_string();
    };
    let root = note_name(index as i32 + steps.rem_euclid(12), spelling);
    format!("{}{}{}", marker, root, &body[len..])
}

/// Semitones to move from one key to another, always the shorter way round.
///
/// The result lies in `-6..=6`: a tritone up is `6`, a tritone down is `-6`, so
/// `transpose_steps(a, b) == -transpose_steps(b, a)` for every pair. Only the roots
/// are compared (`"Am"` and `"A"` are the same). Unknown names give `0`.
///
/// ```
/// use chordsheet::transpose_steps;
///
/// assert_eq!(transpose_steps("C", "D"), 2);
/// assert_eq!(transpose_steps("C", "Bb"), -2);
/// assert_eq!(transpose_steps("C", "F#"), 6);
/// assert_eq!(transpose_steps("F#", "C"), -6);
/// ```
pub fn transpose_steps(from_key: &str, to_key: &str) -> i32 {
    let (Some(from), Some(to)) = (key_index(from_key), key_index(to_key)) else {
        return 0;
    };
    let diff = to - from;
    if diff > 6 {
        diff - 12
    } else if diff < -6 {
        diff + 12
    } else {
        diff
    }
}

/// Transpose every chord of a raw chord line.
///
/// Columns are kept where the spaces after a chord allow it: a longer chord eats
/// into the following run of spaces (always leaving one), a shorter one pads it.
///
/// ```
/// use chordsheet::transpose::transpose_chord_line;
///
/// assert_eq!(transpose_chord_line("C   G   Am   F", 1), "C#  G#  A#m  F#");
/// ```
pub fn transpose_chord_line(line: &str, steps: i32) -> String {
    transpose_chord_line_with(line, steps, None)
}

fn transpose_chord_line_with(line: &str, steps: i32, spelling: Option<Spelling>) -> String {
    let spans = chord_spans(line);
    let mut out = String::with_capacity(line.len() + spans.len());
    // Characters the output is ahead (> 0) or behind (< 0) of the original.
    let mut drift: isize = 0;
    let mut cursor = 0;

    for (start, end) in spans {
        realign(&line[cursor..start], &mut drift, &mut out);
        let original = &line[start..end];
        let transposed = match spelling {
            Some(spelling) => transpose_chord_spelled(original, steps, spelling),
            None => transpose_chord(original, steps),
        };
        drift += transposed.chars().count() as isize - original.chars().count() as isize;
        out.push_str(&transposed);
        cursor = end;
    }
    out.push_str(&line[cursor..]);
    out
}

/// Copy the text between two chords, absorbing `drift` when it is plain spaces.
fn realign(gap: &str, drift: &mut isize, out: &mut String) {
    if gap.is_empty() || !gap.chars().all(|c| c == ' ') {
        out.push_str(gap);
        return;
    }
    if *drift > 0 {
        let removable = gap.len() - 1;
        let remove = (*drift as usize).min(removable);
        out.push_str(&gap[remove..]);
        *drift -= remove as isize;
    } else {
        out.push_str(gap);
        for _ in 0..(-*drift) {
            out.push(' ');
        }
        *drift = 0;
    }
}

/// Transpose the chord lines of a raw song sheet, leaving every other line
/// untouched. Chords after a section label (`Int: C G`) are transposed, the
/// label is not.
pub fn transpose_text(text: &str, steps: i32) -> String {
    transpose_text_with(text, steps, None)
}

/// [`transpose_text`], optionally respelling every chord root with sharps or flats.
pub fn transpose_text_with(text: &str, steps: i32, spelling: Option<Spelling>) -> String {
    if spelling.is_none() && steps.rem_euclid(12) == 0 {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| match classify_line(line) {
            LineKind::Chords => transpose_chord_line_with(line, steps, spelling),
            LineKind::Header(header) if is_chord_line(header.rest) => {
                let label = &line[..header.rest_offset];
                let chords = transpose_chord_line_with(header.rest, steps, spelling);
                format!("{}{}", label, chords)
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A copy of `song` with every chord moved by `steps` semitones.
///
/// Chord positions stay where they were so the chords still sit over the same
/// syllables. The `key` metadata follows the chords; `original_key` does not.
pub fn transpose_song(song: &ParsedSong, steps: i32) -> ParsedSong {
    let mut transposed = song.clone();
    for line in &mut transposed.lines {
        if let Line::LineWithChords { chords, source, .. } = line {
            for position in chords.iter_mut() {
                position.chord = transpose_chord(&position.chord, steps);
            }
            *source = transpose_chord_line(source, steps);
        }
    }
    if let Some(key) = transposed.metadata.get_mut("key") {
        *key = transpose_chord(key, steps);
    }
    transposed.rebuild_structures();
    transposed
}
