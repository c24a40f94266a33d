//! Error type shared by training, configuration and persistence.
//!
//! Scoring itself never fails: a built model degrades to smoothing-floor
//! probabilities for unknown input instead of returning errors.

use std::path::{Path, PathBuf};

/// Errors produced while training, configuring, saving or loading a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An underlying file could not be read or written.
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The alphabet file contained no usable characters.
    #[error("alphabet file {} contains no characters", .path.display())]
    EmptyAlphabet { path: PathBuf },

    /// The perfect-hash load factor is outside the accepted range.
    #[error("perfect-hash load factor {gamma} must be a finite value above {min}")]
    InvalidLoadFactor { gamma: f64, min: f64 },

    /// The training corpus tokenized to zero sentences.
    #[error("corpus produced no sentences")]
    EmptyCorpus,

    /// A word's character length fell outside the accepted range.
    #[error("word length {len} is outside the accepted range 1..{max}")]
    InvalidWordLength { len: usize, max: usize },

    /// The file does not start with the model magic marker.
    #[error("invalid magic number in model file")]
    InvalidMagic,

    /// The file is a model file written by an incompatible version.
    #[error("unsupported model version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    /// The payload ended early or its trailing magic marker is wrong.
    #[error("model payload truncated or corrupted")]
    TruncatedPayload,

    /// The payload bytes could not be decoded.
    #[error("malformed model payload: {0}")]
    Codec(#[from] bincode::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration could not be rendered to TOML.
    #[error("failed to encode configuration: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
}

impl ModelError {
    /// Tie an I/O failure to the file it touched.
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
