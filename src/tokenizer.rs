//! Alphabet-driven tokenizer: normalization plus sentence and word splitting.
//!
//! A tokenizer carries the set of characters treated as word-forming.
//! Everything else ends the current word, and a small punctuation set also
//! ends the current sentence. N-grams never cross the sentences produced
//! here.

use std::path::Path;

use ahash::AHashSet;
use unicode_normalization::UnicodeNormalization;

use crate::error::ModelError;

/// Characters that terminate a sentence.
const SENTENCE_BREAKS: [char; 4] = ['.', '!', '?', '…'];

/// Normalize raw text for tokenization: NFC composition, then lowercasing.
///
/// Hoisted out of [`Tokenizer::process`] so word spans can borrow from the
/// normalized buffer instead of copying every word.
pub fn normalize(text: &str) -> String {
    text.nfc().flat_map(char::to_lowercase).collect()
}

/// Splits normalized text into sentences of words over a fixed alphabet.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    alphabet: AHashSet<char>,
}

impl Tokenizer {
    /// Build a tokenizer from an explicit character set.
    pub fn new(alphabet: impl IntoIterator<Item = char>) -> Self {
        Self {
            alphabet: alphabet.into_iter().collect(),
        }
    }

    /// Load the accepted alphabet from a UTF-8 file.
    ///
    /// Every non-whitespace character in the file joins the alphabet,
    /// normalized the same way as the text it will later split.
    pub fn from_alphabet_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, e))?;
        let alphabet: AHashSet<char> = raw
            .nfc()
            .flat_map(char::to_lowercase)
            .filter(|c| !c.is_whitespace())
            .collect();
        if alphabet.is_empty() {
            return Err(ModelError::EmptyAlphabet {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { alphabet })
    }

    /// The set of characters treated as word-forming.
    pub fn alphabet(&self) -> &AHashSet<char> {
        &self.alphabet
    }

    /// Split already-normalized text into sentences of borrowed word spans.
    ///
    /// Alphabet characters extend the current word; sentence punctuation
    /// closes the sentence; any other character just ends the word.
    /// Sentences that contain no words are dropped.
    pub fn process<'a>(&self, text: &'a str) -> Vec<Vec<&'a str>> {
        let mut sentences = Vec::new();
        let mut sentence: Vec<&'a str> = Vec::new();
        let mut word_start: Option<usize> = None;

        for (pos, ch) in text.char_indices() {
            if self.alphabet.contains(&ch) {
                word_start.get_or_insert(pos);
                continue;
            }
            if let Some(start) = word_start.take() {
                sentence.push(&text[start..pos]);
            }
            if SENTENCE_BREAKS.contains(&ch) && !sentence.is_empty() {
                sentences.push(std::mem::take(&mut sentence));
            }
        }
        if let Some(start) = word_start {
            sentence.push(&text[start..]);
        }
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        sentences
    }
}
