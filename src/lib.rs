//! libspell: statistical n-gram language model for spelling correction.
//!
//! Train over a plain-text corpus, then rank candidate sentences by their
//! additive-smoothed unigram/bigram/trigram log-probabilities. Counts live
//! in a minimal-perfect-hash store of `(fingerprint, count)` buckets, so a
//! trained model keeps no key material around at all.
//!
//! Main pieces:
//! - [`LangModel`]: train / score / save / load
//! - [`Vocabulary`] and [`WordId`]: word ⇄ dense-id mapping
//! - [`CounterStore`]: shared perfect-hash count buckets
//! - [`Tokenizer`]: alphabet-driven sentence and word splitting
//! - [`Config`]: smoothing and hash-construction parameters

pub mod error;
pub use error::ModelError;

pub mod vocabulary;
pub use vocabulary::{Vocabulary, WordId, MAX_WORD_LEN};

pub mod tokenizer;
pub use tokenizer::{normalize, Tokenizer};

pub mod ngram;
pub use ngram::{Count, NgramCounts};

pub mod store;
pub use store::CounterStore;

mod serialize;

pub mod model;
pub use model::{LangModel, EMPTY_SCORE};

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunable training parameters.
///
/// Scoring parameters travel inside saved model files, so a loaded model
/// scores identically everywhere regardless of local configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Additive smoothing constant added to every count, which keeps
    /// unseen n-grams at a small positive probability instead of zero.
    pub k: f64,
    /// Load factor for perfect-hash construction. Training rejects values
    /// that are not finite and above 1.01; larger values build faster,
    /// smaller values pack tighter.
    pub phf_gamma: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 0.05,
            phf_gamma: 1.7,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text. Missing fields keep their
    /// defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(text)?)
    }

    /// Render the configuration as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ModelError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|e| ModelError::io(path, e))
    }
}
