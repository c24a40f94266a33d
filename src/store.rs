//! Read-only perfect-hash counter store.
//!
//! All three gram orders share one bucket array indexed by a minimal
//! perfect hash built over the union of their serialized keys. Each bucket
//! pairs a 32-bit fingerprint of the owning key with its count; lookups
//! for keys outside the training set either miss the hash outright or hit
//! a bucket whose fingerprint disagrees, and both read as zero. A
//! fingerprint collision between a trained key and an unseen query is the
//! one accepted source of false counts.

use boomphf::Mphf;
use serde::{Deserialize, Serialize};
use tracing::warn;
use xxhash_rust::xxh32::xxh32;

use crate::ngram::{Count, NgramCounts};
use crate::vocabulary::WordId;

/// Seed for the bucket fingerprints. Pinned: a model file written with one
/// seed is unreadable garbage under another.
const FINGERPRINT_SEED: u32 = 0;

/// Smallest usable load factor; hash construction rejects anything at or
/// below this.
pub(crate) const MIN_GAMMA: f64 = 1.01;

/// Serialized unigram key: the id as a little-endian `u32`.
///
/// The three orders serialize to 4, 8 and 12 bytes, so keys of different
/// orders can never collide in content, only in fingerprint.
pub(crate) fn key1(a: WordId) -> Vec<u8> {
    a.0.to_le_bytes().to_vec()
}

/// Serialized bigram key: both ids, first word first.
pub(crate) fn key2(a: WordId, b: WordId) -> Vec<u8> {
    let mut key = Vec::with_capacity(8);
    key.extend_from_slice(&a.0.to_le_bytes());
    key.extend_from_slice(&b.0.to_le_bytes());
    key
}

/// Serialized trigram key: all three ids in sentence order.
pub(crate) fn key3(a: WordId, b: WordId, c: WordId) -> Vec<u8> {
    let mut key = Vec::with_capacity(12);
    key.extend_from_slice(&a.0.to_le_bytes());
    key.extend_from_slice(&b.0.to_le_bytes());
    key.extend_from_slice(&c.0.to_le_bytes());
    key
}

/// One slot of the store: the fingerprint of the key that owns it, plus
/// that key's count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Bucket {
    pub fingerprint: u32,
    pub count: Count,
}

/// Immutable counter store built once per training run.
///
/// The hash is minimal, so the bucket array has exactly one slot per
/// distinct training key and every slot is owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterStore {
    phf: Mphf<Vec<u8>>,
    buckets: Vec<Bucket>,
}

impl CounterStore {
    /// Build the store from accumulated counts.
    ///
    /// The key list is sorted before hash construction so identical
    /// corpora serialize to byte-identical stores regardless of hash-map
    /// iteration order.
    ///
    /// # Panics
    ///
    /// Hash construction asserts `gamma > 1.01`; training validates the
    /// configured value before calling in here.
    pub fn build(counts: &NgramCounts, gamma: f64) -> Self {
        let mut keys: Vec<Vec<u8>> = Vec::with_capacity(counts.distinct());
        keys.extend(counts.grams1.keys().map(|&a| key1(a)));
        keys.extend(counts.grams2.keys().map(|&(a, b)| key2(a, b)));
        keys.extend(counts.grams3.keys().map(|&(a, b, c)| key3(a, b, c)));
        keys.sort_unstable();

        let phf = Mphf::new(gamma, &keys);
        let mut buckets = vec![Bucket::default(); keys.len()];
        {
            let mut place = |key: Vec<u8>, count: Count| {
                // The hash is perfect over exactly this key set, so every
                // index here is unique and in range.
                let slot = phf.hash(&key) as usize;
                buckets[slot] = Bucket {
                    fingerprint: xxh32(&key, FINGERPRINT_SEED),
                    count,
                };
            };
            for (&a, &count) in counts.grams1.iter() {
                place(key1(a), count);
            }
            for (&(a, b), &count) in counts.grams2.iter() {
                place(key2(a, b), count);
            }
            for (&(a, b, c), &count) in counts.grams3.iter() {
                place(key3(a, b, c), count);
            }
        }
        CounterStore { phf, buckets }
    }

    /// Count of a single word; unknown ids short-circuit to zero without
    /// touching the hash.
    pub fn unigram_count(&self, a: WordId) -> Count {
        if a.is_unknown() {
            return 0;
        }
        self.get(&key1(a))
    }

    /// Count of an ordered word pair.
    pub fn bigram_count(&self, a: WordId, b: WordId) -> Count {
        if a.is_unknown() || b.is_unknown() {
            return 0;
        }
        self.get(&key2(a, b))
    }

    /// Count of an ordered word triple.
    pub fn trigram_count(&self, a: WordId, b: WordId, c: WordId) -> Count {
        if a.is_unknown() || b.is_unknown() || c.is_unknown() {
            return 0;
        }
        self.get(&key3(a, b, c))
    }

    /// Number of buckets, equal to the number of distinct training keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Stored count for a serialized key, or zero for keys outside the
    /// training set.
    ///
    /// The perfect hash may still map an unseen key onto some bucket; the
    /// fingerprint comparison turns those aliased hits into zeros. An
    /// out-of-range slot can only come from a corrupted index structure
    /// and reads as zero rather than panicking the scoring path.
    fn get(&self, key: &[u8]) -> Count {
        let Some(slot) = self.phf.try_hash(key) else {
            return 0;
        };
        match self.buckets.get(slot as usize) {
            Some(bucket) if bucket.fingerprint == xxh32(key, FINGERPRINT_SEED) => bucket.count,
            Some(_) => 0,
            None => {
                warn!(slot, "bucket index out of range, treating key as unseen");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_counts() -> NgramCounts {
        let mut counts = NgramCounts::new();
        // "the cat sat" twice, "the dog sat" once.
        counts.add_sentence(&[WordId(0), WordId(1), WordId(2)]);
        counts.add_sentence(&[WordId(0), WordId(1), WordId(2)]);
        counts.add_sentence(&[WordId(0), WordId(3), WordId(2)]);
        counts
    }

    #[test]
    fn key_encodings_are_order_distinct() {
        assert_eq!(key1(WordId(1)).len(), 4);
        assert_eq!(key2(WordId(1), WordId(1)).len(), 8);
        assert_eq!(key3(WordId(1), WordId(1), WordId(1)).len(), 12);
        assert_eq!(key1(WordId(0x0102_0304)), vec![0x04, 0x03, 0x02, 0x01]);
        // Direction is preserved in the encoding.
        assert_ne!(key2(WordId(1), WordId(2)), key2(WordId(2), WordId(1)));
    }

    #[test]
    fn build_preserves_every_count() {
        let counts = sample_counts();
        let store = CounterStore::build(&counts, 1.7);

        assert_eq!(store.len(), counts.distinct());
        assert_eq!(store.unigram_count(WordId(0)), 3);
        assert_eq!(store.unigram_count(WordId(1)), 2);
        assert_eq!(store.unigram_count(WordId(3)), 1);
        assert_eq!(store.bigram_count(WordId(0), WordId(1)), 2);
        assert_eq!(store.bigram_count(WordId(0), WordId(3)), 1);
        assert_eq!(store.trigram_count(WordId(0), WordId(1), WordId(2)), 2);
    }

    #[test]
    fn unseen_keys_read_as_zero() {
        let store = CounterStore::build(&sample_counts(), 1.7);
        assert_eq!(store.unigram_count(WordId(99)), 0);
        assert_eq!(store.bigram_count(WordId(1), WordId(0)), 0);
        assert_eq!(store.trigram_count(WordId(2), WordId(1), WordId(0)), 0);
    }

    #[test]
    fn unknown_ids_short_circuit() {
        let store = CounterStore::build(&sample_counts(), 1.7);
        assert_eq!(store.unigram_count(WordId::UNKNOWN), 0);
        assert_eq!(store.bigram_count(WordId(0), WordId::UNKNOWN), 0);
        assert_eq!(
            store.trigram_count(WordId::UNKNOWN, WordId(1), WordId(2)),
            0
        );
    }

    #[test]
    fn fingerprint_mismatch_reads_as_zero() {
        let mut store = CounterStore::build(&sample_counts(), 1.7);
        let key = key1(WordId(0));
        let slot = store.phf.hash(&key) as usize;
        // Simulate an aliased bucket by breaking the stored fingerprint.
        store.buckets[slot].fingerprint ^= 1;
        assert_eq!(store.unigram_count(WordId(0)), 0);
        // Other keys are untouched.
        assert_eq!(store.unigram_count(WordId(1)), 2);
    }

    #[test]
    fn build_is_deterministic_across_insertion_orders() {
        let mut a = NgramCounts::new();
        let mut b = NgramCounts::new();
        let sentences: Vec<Vec<WordId>> = (0..50u32)
            .map(|i| vec![WordId(i), WordId((i * 7) % 50), WordId((i * 13) % 50)])
            .collect();
        for s in &sentences {
            a.add_sentence(s);
        }
        for s in sentences.iter().rev() {
            b.add_sentence(s);
        }

        let store_a = CounterStore::build(&a, 1.7);
        let store_b = CounterStore::build(&b, 1.7);
        let bytes_a = bincode::serialize(&store_a).unwrap();
        let bytes_b = bincode::serialize(&store_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn survives_bincode_round_trip() {
        let store = CounterStore::build(&sample_counts(), 1.7);
        let bytes = bincode::serialize(&store).unwrap();
        let back: CounterStore = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.unigram_count(WordId(0)), 3);
        assert_eq!(back.trigram_count(WordId(0), WordId(1), WordId(2)), 2);
        assert_eq!(back.bigram_count(WordId(3), WordId(0)), 0);
    }
}
