//! # Command Line Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! transpose: 2          # semitones, used when no steps are given on the command line
//! target-key: Bb        # or: move from the song's original key to this one
//! prefer-flats: true    # respell transposed chords with flats
//! output: json          # json | text
//! ```
//!
//! Every field is optional.

use crate::error::ChordError;
use crate::transpose::transpose_steps;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    pub transpose: i32,
    pub target_key: Option<String>,
    pub prefer_flats: Option<bool>,
    pub output: OutputFormat,
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self, ChordError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ChordError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChordError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ChordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Semitones to transpose a song whose stored key is `song_key`.
    ///
    /// A `target-key` wins over a fixed `transpose` when the song has a key to
    /// measure from.
    pub fn steps_for(&self, song_key: Option<&str>) -> i32 {
        match (&self.target_key, song_key) {
            (Some(target), Some(from)) => transpose_steps(from, target),
            _ => self.transpose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::default().output, OutputFormat::Json);
    }

    #[test]
    fn test_full_config() {
        let config =
            Config::from_yaml("transpose: -3\ntarget-key: Bb\nprefer-flats: true\noutput: text\n")
                .unwrap();
        assert_eq!(config.transpose, -3);
        assert_eq!(config.target_key.as_deref(), Some("Bb"));
        assert_eq!(config.prefer_flats, Some(true));
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_yaml("output: xml"),
            Err(ChordError::Config(_))
        ));
        assert!(matches!(
            Config::from_yaml("colour: blue"),
            Err(ChordError::Config(_))
        ));
    }

    #[test]
    fn test_steps_for() {
        let config = Config {
            transpose: 1,
            target_key: Some("A".to_string()),
            ..Config::default()
        };
        assert_eq!(config.steps_for(Some("G")), 2);
        assert_eq!(config.steps_for(None), 1);
        assert_eq!(Config::default().steps_for(Some("G")), 0);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/chordsheet.yaml"),
            Err(ChordError::Io { .. })
        ));
    }
}
