//! # Parsed Song Types
//!
//! ## Type Hierarchy
//! ```text
//! ParsedSong
//!   ├── metadata: title, artist, key, tempo, time, original_key
//!   ├── lines: Vec<Line>
//!   │     ├── Empty
//!   │     ├── StructureStart { name, label, kind }
//!   │     ├── StructureEnd { name }
//!   │     ├── LineWithChords { chords: Vec<ChordPosition>, text, source }
//!   │     ├── Number { text }
//!   │     └── Text { text }
//!   └── structures: name -> lines between that section's start and end
//! ```
//!
//! `structures` is always derived from `lines`. Two sections with the same name
//! (a song with two verses) share one key and the later one wins; use
//! [`ParsedSong::sections`] to see every occurrence.
//!
//! Everything here serializes to the JSON shape the chord display consumes:
//! lines are tagged by `type` (`line_with_chords`, `structure_start`, ...).

use crate::chord::{extract_chords, strip_decorations, ChordPosition};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Whether a section header names a song part or an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Structure,
    Instrument,
}

/// One classified line of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Line {
    Empty,
    StructureStart {
        name: String,
        label: String,
        kind: SectionKind,
    },
    StructureEnd {
        name: String,
    },
    /// A chord line, merged with the lyric line under it when there is one.
    /// `source` is the raw chord line, bar lines included.
    LineWithChords {
        chords: Vec<ChordPosition>,
        text: String,
        source: String,
    },
    /// Numeric melody notation (`1 2 3 | 5 . 6`).
    Number {
        text: String,
    },
    Text {
        text: String,
    },
}

/// Every occurrence of a section, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub label: String,
    pub kind: SectionKind,
    /// 0 for the first section with this name, 1 for the next, ...
    pub occurrence: usize,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSong {
    pub metadata: BTreeMap<String, String>,
    pub lines: Vec<Line>,
    pub structures: BTreeMap<String, Vec<Line>>,
}

impl ParsedSong {
    pub(crate) fn new(metadata: BTreeMap<String, String>, lines: Vec<Line>) -> Self {
        let structures = build_structures(&lines);
        Self {
            metadata,
            lines,
            structures,
        }
    }

    /// Recompute `structures` after `lines` changed.
    pub fn rebuild_structures(&mut self) {
        self.structures = build_structures(&self.lines);
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Every section with its occurrence index, including repeated names that
    /// `structures` collapses.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut open: Option<Section> = None;

        for line in &self.lines {
            match line {
                Line::StructureStart { name, label, kind } => {
                    let count = seen.entry(name.as_str()).or_insert(0);
                    open = Some(Section {
                        name: name.clone(),
                        label: label.clone(),
                        kind: *kind,
                        occurrence: *count,
                        lines: Vec::new(),
                    });
                    *count += 1;
                }
                Line::StructureEnd { .. } => {
                    if let Some(section) = open.take() {
                        sections.push(section);
                    }
                }
                other => {
                    if let Some(section) = open.as_mut() {
                        section.lines.push(other.clone());
                    }
                }
            }
        }
        sections
    }

    /// Sorted, de-duplicated chord names, without passing markers or hold dots.
    pub fn all_chords(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        for line in &self.lines {
            if let Line::LineWithChords { chords, .. } = line {
                for position in chords {
                    set.insert(strip_decorations(&position.chord).to_string());
                }
            }
        }
        set.into_iter().collect()
    }

    /// Chords of every chord line grouped per bar, in document order.
    ///
    /// Bars come from splitting each line's raw source on `|`; segments holding
    /// nothing but whitespace or repeat colons are not bars.
    pub fn chords_by_bar(&self) -> Vec<Vec<String>> {
        let mut bars = Vec::new();
        for line in &self.lines {
            if let Line::LineWithChords { source, .. } = line {
                for segment in source.split('|') {
                    if segment.chars().all(|c| c.is_whitespace() || c == ':') {
                        continue;
                    }
                    bars.push(
                        extract_chords(segment)
                            .into_iter()
                            .map(|position| position.chord)
                            .collect(),
                    );
                }
            }
        }
        bars
    }
}

fn build_structures(lines: &[Line]) -> BTreeMap<String, Vec<Line>> {
    let mut structures = BTreeMap::new();
    let mut open: Option<(String, Vec<Line>)> = None;

    for line in lines {
        match line {
            Line::StructureStart { name, .. } => open = Some((name.clone(), Vec::new())),
            Line::StructureEnd { .. } => {
                if let Some((name, body)) = open.take() {
                    // Repeated names overwrite the earlier section.
                    structures.insert(name, body);
                }
            }
            other => {
                if let Some((_, body)) = open.as_mut() {
                    body.push(other.clone());
                }
            }
        }
    }
    structures
}
