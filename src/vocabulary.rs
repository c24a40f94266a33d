//! Word ⇄ dense-id vocabulary.
//!
//! Words are interned in first-seen order into contiguous `u32` ids, which
//! keeps the serialized gram keys small and fixed-width. The forward map
//! (`word -> id`) is the canonical form; the reverse table is derived from
//! it and rebuilt when a model is loaded, so the two can never drift apart.

use ahash::AHashMap;

use crate::error::ModelError;

/// Maximum accepted word length in characters. Longer tokens are rejected
/// during training; during scoring they simply look up as unknown.
pub const MAX_WORD_LEN: usize = 10_000;

/// Dense identifier of a vocabulary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(pub u32);

impl WordId {
    /// Sentinel for words absent from the vocabulary. Never counted and
    /// never stored; lookups involving it short-circuit to zero.
    pub const UNKNOWN: WordId = WordId(u32::MAX);

    /// Whether this id is the unknown-word sentinel.
    #[inline]
    pub fn is_unknown(self) -> bool {
        self == WordId::UNKNOWN
    }
}

/// Bidirectional mapping between word text and dense ids.
///
/// Interning only happens while training; a built model just calls
/// [`lookup`](Vocabulary::lookup) and [`resolve`](Vocabulary::resolve).
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: AHashMap<String, WordId>,
    /// Canonical word storage, indexed by id.
    words: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `word`, interning it if unseen.
    ///
    /// Ids are handed out sequentially from 0 in first-seen order, so the
    /// same corpus always produces the same numbering.
    pub fn intern(&mut self, word: &str) -> Result<WordId, ModelError> {
        let len = word.chars().count();
        if len == 0 || len >= MAX_WORD_LEN {
            return Err(ModelError::InvalidWordLength {
                len,
                max: MAX_WORD_LEN,
            });
        }
        if let Some(&id) = self.index.get(word) {
            return Ok(id);
        }
        let id = WordId(self.words.len() as u32);
        self.index.insert(word.to_string(), id);
        self.words.push(word.to_string());
        Ok(id)
    }

    /// Id for `word`, or [`WordId::UNKNOWN`] if it was never interned.
    /// Never allocates; this is the scoring path.
    pub fn lookup(&self, word: &str) -> WordId {
        self.index.get(word).copied().unwrap_or(WordId::UNKNOWN)
    }

    /// Canonical text for an id, or `None` for out-of-range ids (the
    /// unknown sentinel included).
    pub fn resolve(&self, id: WordId) -> Option<&str> {
        self.words.get(id.0 as usize).map(String::as_str)
    }

    /// Number of distinct interned words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate `(word, id)` entries in id order, stable across runs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), WordId(i as u32)))
    }

    /// Rebuild a vocabulary from persisted `(word, id)` entries.
    ///
    /// Entries must be dense and in id order; anything else means the
    /// payload was corrupted after its envelope checks passed.
    pub(crate) fn from_entries(entries: Vec<(String, u32)>) -> Result<Self, ModelError> {
        let mut vocab = Vocabulary {
            index: AHashMap::with_capacity(entries.len()),
            words: Vec::with_capacity(entries.len()),
        };
        for (word, id) in entries {
            if id as usize != vocab.words.len() || vocab.index.contains_key(&word) {
                return Err(ModelError::TruncatedPayload);
            }
            vocab.index.insert(word.clone(), WordId(id));
            vocab.words.push(word);
        }
        Ok(vocab)
    }
}
