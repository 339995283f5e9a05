//! # Song Structure Parser
//!
//! Turns a raw song sheet into a [`ParsedSong`].
//!
//! ## Algorithm
//! 1. Optional YAML front matter (`---` … `---`) is read into the metadata map.
//! 2. Every remaining line is classified (see `classifier`) and handled in order:
//!    - headers open a section, closing whichever one is open (no nesting);
//!      inline chords after the label become a chord line whose positions are
//!      shifted by the label's width
//!    - a chord line swallows the lyric line right under it, if that line is
//!      plain text (one line of look-ahead)
//!    - metadata lines go to the metadata map and are dropped from `lines`
//!    - `[/...]` closes the open section
//! 3. The open section, if any, is closed at the end of input.
//! 4. `structures` is rebuilt from `lines`.
//!
//! ## Failure Semantics
//! [`parse_song`] never fails. Anything unrecognized is kept as a `Text` line, and
//! broken front matter is ignored (logged at `warn`). [`parse_song_strict`] is the
//! same parser but reports broken front matter.
//!
//! ## Example
//! ```rust
//! use chordsheet::parse_song;
//!
//! let song = parse_song("Key: G\n[Chorus]\nG   D\nLa la la");
//! assert_eq!(song.metadata("key"), Some("G"));
//! assert!(song.structures.contains_key("chorus"));
//! ```

use crate::ast::{Line, ParsedSong};
use crate::chord::extract_chords;
use crate::classifier::{classify_line, is_chord_line, metadata_key, Header, LineKind};
use crate::error::ChordError;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

const FRONT_MATTER_FENCE: &str = "---";

/// Parse a song sheet, best effort.
pub fn parse_song(text: &str) -> ParsedSong {
    let lines: Vec<&str> = text.lines().collect();
    match front_matter(&lines) {
        Some((Ok(metadata), body_start)) => parse_body(metadata, &lines[body_start..]),
        Some((Err(e), _)) => {
            warn!(error = %e, "ignoring front matter");
            parse_body(BTreeMap::new(), &lines)
        }
        None => parse_body(BTreeMap::new(), &lines),
    }
}

/// Like [`parse_song`], but invalid YAML front matter is an error.
pub fn parse_song_strict(text: &str) -> Result<ParsedSong, ChordError> {
    let lines: Vec<&str> = text.lines().collect();
    match front_matter(&lines) {
        Some((metadata, body_start)) => Ok(parse_body(metadata?, &lines[body_start..])),
        None => Ok(parse_body(BTreeMap::new(), &lines)),
    }
}

/// Sorted, de-duplicated chord names used anywhere in the song.
pub fn get_all_chords(song: &ParsedSong) -> Vec<String> {
    song.all_chords()
}

/// Chords per bar, in document order.
pub fn get_chords_by_bar(song: &ParsedSong) -> Vec<Vec<String>> {
    song.chords_by_bar()
}

/// Metadata from a leading `---` fenced YAML block and the index of the first
/// line after it. `None` when the song has no (closed) front matter.
fn front_matter(
    lines: &[&str],
) -> Option<(Result<BTreeMap<String, String>, ChordError>, usize)> {
    if lines.first()?.trim() != FRONT_MATTER_FENCE {
        return None;
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|l| l.trim() == FRONT_MATTER_FENCE)?
        + 1;
    let content = lines[1..close].join("\n");
    Some((parse_front_matter(&content), close + 1))
}

fn parse_front_matter(content: &str) -> Result<BTreeMap<String, String>, ChordError> {
    let mut metadata = BTreeMap::new();
    if content.trim().is_empty() {
        return Ok(metadata);
    }

    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(content).map_err(|e| ChordError::FrontMatter(e.to_string()))?;

    for (key, value) in raw {
        let Some(name) = metadata_key(&key) else {
            trace!(key = %key, "skipping unknown front matter key");
            continue;
        };
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => {
                return Err(ChordError::FrontMatter(format!(
                    "'{}' must be a scalar, got {:?}",
                    key, other
                )))
            }
        };
        metadata.insert(name.to_string(), value);
    }
    Ok(metadata)
}

/// Accumulates lines and tracks the open section.
struct SongBuilder {
    metadata: BTreeMap<String, String>,
    lines: Vec<Line>,
    open: Option<String>,
}

impl SongBuilder {
    fn new(metadata: BTreeMap<String, String>) -> Self {
        Self {
            metadata,
            lines: Vec::new(),
            open: None,
        }
    }

    fn open_section(&mut self, header: &Header<'_>) {
        self.close_section();
        debug!(name = %header.name, label = header.label, "open section");
        self.lines.push(Line::StructureStart {
            name: header.name.clone(),
            label: header.label.to_string(),
            kind: header.kind,
        });
        self.open = Some(header.name.clone());
    }

    fn close_section(&mut self) {
        if let Some(name) = self.open.take() {
            debug!(name = %name, "close section");
            self.lines.push(Line::StructureEnd { name });
        }
    }

    /// Text after a header label: inline chords, or a lyric fragment.
    fn header_rest(&mut self, raw: &str, header: &Header<'_>) {
        let rest = header.rest;
        if rest.trim().is_empty() {
            return;
        }
        if is_chord_line(rest) {
            let offset = raw[..header.rest_offset].chars().count();
            let chords = extract_chords(rest)
                .into_iter()
                .map(|mut c| {
                    c.position += offset;
                    c
                })
                .collect();
            self.lines.push(Line::LineWithChords {
                chords,
                text: String::new(),
                source: rest.trim().to_string(),
            });
        } else {
            self.lines.push(Line::Text {
                text: rest.trim().to_string(),
            });
        }
    }

    fn finish(mut self) -> ParsedSong {
        self.close_section();
        ParsedSong::new(self.metadata, self.lines)
    }
}

fn parse_body(metadata: BTreeMap<String, String>, lines: &[&str]) -> ParsedSong {
    let mut song = SongBuilder::new(metadata);
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        match classify_line(raw) {
            LineKind::Empty => song.lines.push(Line::Empty),
            LineKind::Metadata { key, value } => {
                song.metadata.insert(key.to_string(), value.to_string());
            }
            LineKind::CloseMarker => song.close_section(),
            LineKind::Header(header) => {
                song.open_section(&header);
                song.header_rest(raw, &header);
            }
            LineKind::Chords => {
                let lyric = lines
                    .get(i + 1)
                    .filter(|next| classify_line(next) == LineKind::Text);
                let text = match lyric {
                    Some(next) => {
                        trace!(line = i, "merging chord line with lyric");
                        i += 1;
                        next.trim_end().to_string()
                    }
                    None => String::new(),
                };
                song.lines.push(Line::LineWithChords {
                    chords: extract_chords(raw),
                    text,
                    source: raw.trim_end().to_string(),
                });
            }
            LineKind::Number => song.lines.push(Line::Number {
                text: raw.trim_end().to_string(),
            }),
            LineKind::Text => song.lines.push(Line::Text {
                text: raw.trim_end().to_string(),
            }),
        }
        i += 1;
    }

    song.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SectionKind;
    use crate::chord::ChordPosition;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chord_line_merges_with_lyric() {
        let song = parse_song("C   G\nHello there");
        assert_eq!(
            song.lines,
            vec![Line::LineWithChords {
                chords: vec![ChordPosition::new("C", 0), ChordPosition::new("G", 4)],
                text: "Hello there".to_string(),
                source: "C   G".to_string(),
            }]
        );
    }

    #[test]
    fn test_chord_line_without_lyric() {
        let song = parse_song("C   G\n\nAm");
        assert_eq!(song.lines.len(), 3);
        assert!(matches!(&song.lines[0], Line::LineWithChords { text, .. } if text.is_empty()));
        assert_eq!(song.lines[1], Line::Empty);
        assert!(matches!(&song.lines[2], Line::LineWithChords { .. }));
    }

    #[test]
    fn test_two_chord_lines_do_not_merge() {
        let song = parse_song("C G\nAm F");
        assert_eq!(song.lines.len(), 2);
    }

    #[test]
    fn test_sections_close_implicitly() {
        let song = parse_song("[Intro]\nC G\n[Verse]\nla\n[Chorus]\nna");
        let kinds: Vec<&str> = song
            .lines
            .iter()
            .map(|l| match l {
                Line::StructureStart { .. } => "start",
                Line::StructureEnd { .. } => "end",
                Line::LineWithChords { .. } => "chords",
                Line::Text { .. } => "text",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["start", "chords", "end", "start", "text", "end", "start", "text", "end"]
        );
        assert_eq!(song.structures.len(), 3);
    }

    #[test]
    fn test_close_marker_ends_section() {
        let song = parse_song("[Chorus]\nla la\n[/Chorus]\noutside");
        assert_eq!(song.structures["chorus"].len(), 1);
        assert_eq!(
            song.lines.last(),
            Some(&Line::Text {
                text: "outside".to_string()
            })
        );
        assert_eq!(
            song.lines
                .iter()
                .filter(|l| matches!(l, Line::StructureEnd { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_header_with_inline_chords_offsets_positions() {
        let song = parse_song("Int: C G Am");
        assert_eq!(
            song.lines[0],
            Line::StructureStart {
                name: "intro".to_string(),
                label: "Int".to_string(),
                kind: SectionKind::Structure,
            }
        );
        let Line::LineWithChords { chords, source, .. } = &song.lines[1] else {
            panic!("expected inline chords");
        };
        assert_eq!(
            chords,
            &vec![
                ChordPosition::new("C", 5),
                ChordPosition::new("G", 7),
                ChordPosition::new("Am", 9),
            ]
        );
        assert_eq!(source, "C G Am");
        assert_eq!(song.structures["intro"].len(), 1);
    }

    #[test]
    fn test_header_with_inline_lyric() {
        let song = parse_song("Reff: na na na");
        assert_eq!(
            song.lines[1],
            Line::Text {
                text: "na na na".to_string()
            }
        );
    }

    #[test]
    fn test_metadata_is_pulled_out_of_lines() {
        let song = parse_song("Title: Song\nArtist: Band\nKey: Am\nTempo: 120\nAm\nla");
        assert_eq!(song.metadata("title"), Some("Song"));
        assert_eq!(song.metadata("artist"), Some("Band"));
        assert_eq!(song.metadata("key"), Some("Am"));
        assert_eq!(song.metadata("tempo"), Some("120"));
        assert_eq!(song.lines.len(), 1);
    }

    #[test]
    fn test_front_matter() {
        let song = parse_song("---\ntitle: Fly\noriginal-key: Bb\ntempo: 96\ncapo: 2\n---\nC\nla");
        assert_eq!(song.metadata("title"), Some("Fly"));
        assert_eq!(song.metadata("original_key"), Some("Bb"));
        assert_eq!(song.metadata("tempo"), Some("96"));
        assert_eq!(song.metadata("capo"), None);
        assert_eq!(song.lines.len(), 1);
    }

    #[test]
    fn test_inline_metadata_overrides_front_matter() {
        let song = parse_song("---\nkey: C\n---\nKey: D");
        assert_eq!(song.metadata("key"), Some("D"));
    }

    #[test]
    fn test_broken_front_matter() {
        let text = "---\n[unclosed\n---\nla";
        let lenient = parse_song(text);
        assert!(lenient.metadata.is_empty());
        assert!(lenient.lines.iter().any(|l| *l
            == Line::Text {
                text: "la".to_string()
            }));

        assert!(matches!(
            parse_song_strict(text),
            Err(ChordError::FrontMatter(_))
        ));
    }

    #[test]
    fn test_unclosed_fence_is_plain_text() {
        let song = parse_song("---\nla");
        assert!(song.metadata.is_empty());
        assert_eq!(song.lines.len(), 2);
    }

    #[test]
    fn test_number_lines_are_kept() {
        let song = parse_song("[Musik]\n1 2 3 | 5 . 6");
        assert_eq!(
            song.structures["musik"],
            vec![Line::Number {
                text: "1 2 3 | 5 . 6".to_string()
            }]
        );
    }

    #[test]
    fn test_chord_inventory_and_bars() {
        let song = parse_song("| C . -G | Am.. |\nla la\nF..C G\n");
        assert_eq!(get_all_chords(&song), vec!["Am", "C", "F", "G"]);
        assert_eq!(
            get_chords_by_bar(&song),
            vec![
                vec!["C".to_string(), "-G".to_string()],
                vec!["Am..".to_string()],
                vec!["F".to_string(), "C".to_string(), "G".to_string()],
            ]
        );
    }

    #[test]
    fn test_crlf_input() {
        let song = parse_song("[Verse]\r\nC G\r\nla\r\n");
        assert!(matches!(&song.lines[1], Line::LineWithChords { text, .. } if text == "la"));
    }
}
