pub mod ast;
pub mod chord;
pub mod classifier;
pub mod config;
pub mod error;
pub mod melody;
pub mod parser;
pub mod transpose;
pub mod voicing;

pub use ast::{Line, ParsedSong, Section, SectionKind};
pub use chord::{
    extract_chords, is_chord, note_index, Chord, ChordPosition, ChordQuality, PitchClass,
    Spelling,
};
pub use classifier::{classify_line, is_chord_line, LineKind};
pub use config::{Config, OutputFormat};
pub use error::*;
pub use melody::{
    degree_to_staff_position, format_melody, format_note_display, get_scale_degree_name,
    parse_melody_strict, parse_melody_string, transpose_melody, MelodyNote, StaffPosition,
};
pub use parser::{get_all_chords, get_chords_by_bar, parse_song, parse_song_strict};
pub use transpose::{transpose_chord, transpose_song, transpose_steps, transpose_text};
pub use voicing::{keyboard_voicing, KeyboardVoicing};

/// Parse a song and transpose it in one go, the way the chord view shows a song
/// in a setlist's key.
///
/// `target_key` is compared against the song's `original_key` metadata, falling
/// back to `key`. A song without either is returned untransposed.
pub fn parse_for_key(source: &str, target_key: &str) -> ParsedSong {
    let song = parse_song(source);
    let steps = song
        .metadata("original_key")
        .or_else(|| song.metadata("key"))
        .map(|from| transpose_steps(from, target_key));
    match steps {
        Some(steps) => transpose_song(&song, steps),
        None => song,
    }
}
