//! Error types for the `multivox` crate.
//!
//! Every failure here is either fatal-and-immediate (raised before any
//! synthesis work begins) or caught per segment into a
//! [`BatchReport`](crate::synth::BatchReport); there are no retries.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// The script file's extension is not one of the supported formats.
    #[error("unsupported file format: {path:?} (use .json or .txt)")]
    UnsupportedExtension {
        /// The offending script path.
        path: PathBuf,
    },

    /// A `.txt` script whose first non-blank line matches neither the
    /// bracketed nor the paired-line layout.
    #[error("unknown TXT layout in {path:?} (expected '[role] text' or a JSON config line)")]
    UnknownTextLayout {
        /// The offending script path.
        path: PathBuf,
    },

    /// I/O failure while reading or writing a file.
    #[error("I/O error for {path:?}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Malformed JSON in a structured script.
    #[error("malformed JSON in {path:?}: {source}")]
    Json {
        /// The offending script path.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// A required top-level section is absent from the script.
    #[error("script must contain a '{name}' section")]
    MissingSection {
        /// Section name, `speakers` or `dialogues`.
        name: &'static str,
    },

    /// A speaker config has no reference audio configured.
    #[error("speaker '{role}' is missing 'ref_audio'")]
    MissingRefAudio {
        /// The speaker name.
        role: String,
    },

    /// A speaker's reference audio path does not resolve to a file.
    #[error("reference audio for '{role}' does not exist: {path:?}")]
    RefAudioNotFound {
        /// The speaker name.
        role: String,
        /// The resolved reference-audio path.
        path: PathBuf,
    },

    /// A dialogue line carries neither `role` nor `speaker`.
    #[error("dialogue line {line} is missing 'role' or 'speaker'")]
    MissingRole {
        /// Zero-based line index in the dialogue sequence.
        line: usize,
    },

    /// A dialogue line references a role absent from the speakers section.
    #[error("dialogue line {line} refers to unknown role '{role}'")]
    UnknownRole {
        /// Zero-based line index in the dialogue sequence.
        line: usize,
        /// The unresolved role name.
        role: String,
    },

    /// A dialogue line has no text.
    #[error("dialogue line {line} is missing 'text'")]
    MissingText {
        /// Zero-based line index in the dialogue sequence.
        line: usize,
    },

    /// Synthesis was requested for a role with no prepared voice prompt.
    #[error("no voice prompt prepared for role '{role}'")]
    NoPrompt {
        /// The speaker name.
        role: String,
    },

    /// A single segment failed to synthesize. Collected into the batch
    /// report rather than aborting the run.
    #[error("synthesis failed for segment {index}: {reason}")]
    Synthesis {
        /// Running index of the segment in the batch.
        index: usize,
        /// Engine-reported reason.
        reason: String,
    },

    /// WAV container error from `hound`.
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
}

/// Result alias used across the public API.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Attach a path to an `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
