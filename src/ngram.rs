//! Training-time n-gram accumulation.
//!
//! One pass over id-converted sentences fills three hash maps (unigram,
//! bigram, trigram) plus a running total of word occurrences. The maps are
//! an intermediate: the counter store consumes them and the maps are
//! dropped, so none of this is part of the persisted model.

use ahash::AHashMap;

use crate::vocabulary::WordId;

/// Occurrence counter for a single gram key.
///
/// Fixed-width to keep the bucket array compact. Increments saturate at
/// `u16::MAX` instead of wrapping, so heavily repeated grams pin at the
/// ceiling rather than corrupting their neighbours' ratios.
pub type Count = u16;

#[inline]
fn bump(count: &mut Count) {
    *count = count.saturating_add(1);
}

/// Accumulated n-gram occurrence counts for one training corpus.
#[derive(Debug, Clone, Default)]
pub struct NgramCounts {
    pub(crate) grams1: AHashMap<WordId, Count>,
    pub(crate) grams2: AHashMap<(WordId, WordId), Count>,
    pub(crate) grams3: AHashMap<(WordId, WordId, WordId), Count>,
    total_words: u64,
}

impl NgramCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every unigram, adjacent bigram and adjacent trigram of one
    /// sentence. Grams never span sentences, so each call is independent;
    /// sentences shorter than an order simply contribute nothing at it.
    pub fn add_sentence(&mut self, words: &[WordId]) {
        for &w in words {
            bump(self.grams1.entry(w).or_default());
            self.total_words += 1;
        }
        for pair in words.windows(2) {
            bump(self.grams2.entry((pair[0], pair[1])).or_default());
        }
        for triple in words.windows(3) {
            bump(self.grams3.entry((triple[0], triple[1], triple[2])).or_default());
        }
    }

    /// Total number of word occurrences counted, across all sentences.
    /// This is the smoothing denominator, so it is 64-bit and never
    /// saturates like the per-gram counts do.
    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    /// Count of a single word, zero if unseen.
    pub fn unigram(&self, a: WordId) -> Count {
        self.grams1.get(&a).copied().unwrap_or(0)
    }

    /// Count of an ordered word pair, zero if unseen.
    pub fn bigram(&self, a: WordId, b: WordId) -> Count {
        self.grams2.get(&(a, b)).copied().unwrap_or(0)
    }

    /// Count of an ordered word triple, zero if unseen.
    pub fn trigram(&self, a: WordId, b: WordId, c: WordId) -> Count {
        self.grams3.get(&(a, b, c)).copied().unwrap_or(0)
    }

    /// Number of distinct keys across all three orders. The perfect hash
    /// is built over exactly this many keys.
    pub fn distinct(&self) -> usize {
        self.grams1.len() + self.grams2.len() + self.grams3.len()
    }

    pub fn distinct_unigrams(&self) -> usize {
        self.grams1.len()
    }

    pub fn distinct_bigrams(&self) -> usize {
        self.grams2.len()
    }

    pub fn distinct_trigrams(&self) -> usize {
        self.grams3.len()
    }
}
