//! # Error Types
//!
//! The lenient entry points (`parse_song`, `parse_melody_string`, `transpose_chord`, ...)
//! never fail: unknown syntax degrades to plain text and unknown roots transpose to
//! themselves. The variants below are only produced by the strict parsing helpers,
//! configuration loading and the command line front end.
//!
//! ## Usage
//! ```rust
//! use chordsheet::{parse_melody_strict, ChordError};
//!
//! match parse_melody_strict("1 2 x 4") {
//!     Ok(notes) => println!("{} notes", notes.len()),
//!     Err(ChordError::InvalidMelodyToken { bar, position, token }) => {
//!         eprintln!("bad token {token:?} in bar {bar} at {position}");
//!     }
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChordError {
    /// Reading an input or configuration file failed.
    #[error("Cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid YAML configuration.
    ///
    /// # Example
    /// ```
    /// # use chordsheet::ChordError;
    /// let err = ChordError::Config("output must be json or text".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: output must be json or text");
    /// ```
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid YAML front matter at the top of a song.
    ///
    /// # Example
    /// ```
    /// # use chordsheet::ChordError;
    /// let err = ChordError::FrontMatter("unclosed block".to_string());
    /// assert_eq!(err.to_string(), "Invalid front matter: unclosed block");
    /// ```
    #[error("Invalid front matter: {0}")]
    FrontMatter(String),

    /// A note or key name whose root is not one of the twelve pitch classes.
    ///
    /// # Example
    /// ```
    /// # use chordsheet::ChordError;
    /// let err = ChordError::UnknownNote("H".to_string());
    /// assert_eq!(err.to_string(), "Unknown note name: H");
    /// ```
    #[error("Unknown note name: {0}")]
    UnknownNote(String),

    /// A melody token that is neither a note nor a rest.
    ///
    /// # Example
    /// ```
    /// # use chordsheet::ChordError;
    /// let err = ChordError::InvalidMelodyToken { bar: 1, position: 2, token: "9".to_string() };
    /// assert_eq!(err.to_string(), "Invalid melody token '9' in bar 1, position 2");
    /// ```
    #[error("Invalid melody token '{token}' in bar {bar}, position {position}")]
    InvalidMelodyToken {
        bar: usize,
        position: usize,
        token: String,
    },

    /// Serializing command output failed.
    #[error("Cannot write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command line arguments.
    #[error("{0}")]
    Usage(String),
}
