//! The trained language model: training, smoothed scoring, persistence.
//!
//! [`LangModel`] is immutable once built. Training goes through a private
//! builder that only [`LangModel::train_with_config`] drives, so every
//! model in existence is fully populated: there is no half-trained state
//! to guard against at scoring time, and a shared reference can serve any
//! number of threads.

use std::path::Path;
use std::time::{Duration, Instant};

use ahash::AHashSet;
use tracing::{debug, info};

use crate::error::ModelError;
use crate::ngram::{Count, NgramCounts};
use crate::serialize::{self, ModelPayloadRef};
use crate::store::{CounterStore, MIN_GAMMA};
use crate::tokenizer::{self, Tokenizer};
use crate::vocabulary::{Vocabulary, WordId};
use crate::Config;

/// Score returned for an empty word sequence: the smallest positive
/// double. It stays below every achievable sentence score while remaining
/// finite for callers that feed scores into further arithmetic.
pub const EMPTY_SCORE: f64 = f64::MIN_POSITIVE;

/// Interval between training progress log lines.
const PROGRESS_EVERY: Duration = Duration::from_secs(4);

/// Immutable additive-smoothed trigram language model.
#[derive(Debug, Clone)]
pub struct LangModel {
    vocabulary: Vocabulary,
    store: CounterStore,
    tokenizer: Tokenizer,
    total_words: u64,
    k: f64,
}

/// Mutable training state. Only `train_with_config` drives it, and
/// [`ModelBuilder::build`] consumes it, which is what keeps partially
/// trained models unrepresentable.
#[derive(Debug, Default)]
struct ModelBuilder {
    vocabulary: Vocabulary,
    counts: NgramCounts,
}

impl ModelBuilder {
    fn add_sentence(&mut self, words: &[&str]) -> Result<(), ModelError> {
        let ids = words
            .iter()
            .map(|w| self.vocabulary.intern(w))
            .collect::<Result<Vec<WordId>, _>>()?;
        self.counts.add_sentence(&ids);
        Ok(())
    }

    fn build(self, tokenizer: Tokenizer, k: f64, gamma: f64) -> LangModel {
        let total_words = self.counts.total_words();
        let store = CounterStore::build(&self.counts, gamma);
        LangModel {
            vocabulary: self.vocabulary,
            store,
            tokenizer,
            total_words,
            k,
        }
    }
}

impl LangModel {
    /// Train a model over a UTF-8 corpus file, using the character set in
    /// `alphabet_path` to delimit words. Uses default parameters.
    pub fn train<P, Q>(corpus_path: P, alphabet_path: Q) -> Result<Self, ModelError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Self::train_with_config(corpus_path, alphabet_path, &Config::default())
    }

    /// Train with explicit smoothing and hash-construction parameters.
    ///
    /// The whole corpus is normalized and tokenized up front, counted in
    /// one pass, and the perfect-hash store is built over the counted
    /// keys. Fails before producing any model if the load factor is out
    /// of range, the alphabet is empty, or the corpus tokenizes to
    /// nothing.
    pub fn train_with_config<P, Q>(
        corpus_path: P,
        alphabet_path: Q,
        config: &Config,
    ) -> Result<Self, ModelError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        // The hash builder asserts on bad load factors; turn those into a
        // typed error before any file is touched.
        if !config.phf_gamma.is_finite() || config.phf_gamma <= MIN_GAMMA {
            return Err(ModelError::InvalidLoadFactor {
                gamma: config.phf_gamma,
                min: MIN_GAMMA,
            });
        }

        let corpus_path = corpus_path.as_ref();
        let tokenizer = Tokenizer::from_alphabet_file(alphabet_path)?;

        info!("loading corpus {}", corpus_path.display());
        let raw = std::fs::read_to_string(corpus_path).map_err(|e| ModelError::io(corpus_path, e))?;
        let text = tokenizer::normalize(&raw);
        drop(raw);

        let sentences = tokenizer.process(&text);
        if sentences.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }
        info!(sentences = sentences.len(), "tokenized corpus");

        let mut builder = ModelBuilder::default();
        let total = sentences.len();
        let mut last_report = Instant::now();
        for (done, sentence) in sentences.iter().enumerate() {
            builder.add_sentence(sentence)?;
            if last_report.elapsed() >= PROGRESS_EVERY {
                info!(
                    "counted {:.1}% of {total} sentences",
                    100.0 * done as f64 / total as f64
                );
                last_report = Instant::now();
            }
        }
        info!(
            unigrams = builder.counts.distinct_unigrams(),
            bigrams = builder.counts.distinct_bigrams(),
            trigrams = builder.counts.distinct_trigrams(),
            total_words = builder.counts.total_words(),
            "n-gram counting finished"
        );

        let keys = builder.counts.distinct();
        let model = builder.build(tokenizer, config.k, config.phf_gamma);
        info!(keys, buckets = model.store.len(), "perfect-hash store built");
        Ok(model)
    }

    /// Log-probability of a word sequence under the model.
    ///
    /// Sums natural logs of the smoothed unigram, bigram-given-context and
    /// trigram-given-context probabilities at every position. Unknown
    /// words contribute their smoothing floors only, so the result is
    /// always finite; an empty sequence returns [`EMPTY_SCORE`].
    pub fn score_words(&self, words: &[&str]) -> f64 {
        let mut ids: Vec<WordId> = words.iter().map(|w| self.vocabulary.lookup(w)).collect();
        if ids.is_empty() {
            return EMPTY_SCORE;
        }
        // Two sentinels let the windowed pass reach the last real word
        // without special-casing the tail.
        ids.push(WordId::UNKNOWN);
        ids.push(WordId::UNKNOWN);

        let mut score = 0.0;
        for window in ids.windows(3) {
            score += self.gram1_prob(window[0]).ln();
            score += self.gram2_prob(window[0], window[1]).ln();
            score += self.gram3_prob(window[0], window[1], window[2]).ln();
        }
        score
    }

    /// Log-probability of raw text.
    ///
    /// Normalizes and tokenizes with the model's own alphabet, then scores
    /// all words as one sequence. Sentence boundaries only matter during
    /// training; here they just separate words.
    pub fn score_text(&self, text: &str) -> f64 {
        let normalized = tokenizer::normalize(text);
        let sentences = self.tokenizer.process(&normalized);
        let words: Vec<&str> = sentences.into_iter().flatten().collect();
        self.score_words(&words)
    }

    /// Persist the model to `path` in the versioned binary layout.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let alphabet = {
            let mut chars: Vec<char> = self.tokenizer.alphabet().iter().copied().collect();
            chars.sort_unstable();
            chars.into_iter().collect::<String>()
        };
        let payload = ModelPayloadRef {
            k: self.k,
            vocab: self.vocabulary.entries().map(|(w, id)| (w, id.0)).collect(),
            total_words: self.total_words,
            alphabet: &alphabet,
            store: &self.store,
        };
        serialize::write_model(path.as_ref(), &payload)?;
        debug!(path = %path.as_ref().display(), "model saved");
        Ok(())
    }

    /// Load a model persisted by [`save`](LangModel::save).
    ///
    /// Any magic, version or payload problem is an error and no model
    /// value is produced, so callers never observe a partially loaded one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let payload = serialize::read_model(path.as_ref())?;
        let vocabulary = Vocabulary::from_entries(payload.vocab)?;
        debug!(
            path = %path.as_ref().display(),
            words = vocabulary.len(),
            buckets = payload.store.len(),
            "model loaded"
        );
        Ok(LangModel {
            vocabulary,
            store: payload.store,
            tokenizer: Tokenizer::new(payload.alphabet.chars()),
            total_words: payload.total_words,
            k: payload.k,
        })
    }

    /// Id of a word, or [`WordId::UNKNOWN`] when absent. The query must
    /// already be normalized the way training text was.
    pub fn word_id(&self, word: &str) -> WordId {
        self.vocabulary.lookup(word)
    }

    /// Canonical text of a word id.
    pub fn word_by_id(&self, id: WordId) -> Option<&str> {
        self.vocabulary.resolve(id)
    }

    /// Canonical stored spelling of `word`, if it is in the vocabulary.
    pub fn word(&self, word: &str) -> Option<&str> {
        self.vocabulary.resolve(self.vocabulary.lookup(word))
    }

    /// Training-corpus occurrence count of a word (saturating).
    pub fn word_count(&self, id: WordId) -> Count {
        self.store.unigram_count(id)
    }

    /// Number of distinct words seen in training.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Total word occurrences counted in training.
    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    /// Smoothing constant baked into this model at training time.
    pub fn smoothing_k(&self) -> f64 {
        self.k
    }

    /// The word ⇄ id mapping.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The raw counter store, for callers that want counts rather than
    /// probabilities.
    pub fn counters(&self) -> &CounterStore {
        &self.store
    }

    /// Accepted character set of the model's tokenizer.
    pub fn alphabet(&self) -> &AHashSet<char> {
        self.tokenizer.alphabet()
    }

    /// Tokenize raw text with the model's alphabet. Words come back owned
    /// because normalization rewrites the text before splitting.
    pub fn tokenize(&self, text: &str) -> Vec<Vec<String>> {
        let normalized = tokenizer::normalize(text);
        self.tokenizer
            .process(&normalized)
            .into_iter()
            .map(|sentence| sentence.into_iter().map(str::to_string).collect())
            .collect()
    }

    /// `P1(a)`: additive-smoothed unigram probability.
    fn gram1_prob(&self, a: WordId) -> f64 {
        let count = f64::from(self.store.unigram_count(a));
        (count + self.k) / (self.total_words as f64 + self.vocabulary.len() as f64)
    }

    /// `P2(b | a)`: smoothed bigram probability given its first word.
    ///
    /// A bigram count above its context's unigram count can only come from
    /// fingerprint aliasing in the store, so it is treated as unseen.
    fn gram2_prob(&self, a: WordId, b: WordId) -> f64 {
        let count1 = f64::from(self.store.unigram_count(a));
        let mut count2 = f64::from(self.store.bigram_count(a, b));
        if count2 > count1 {
            count2 = 0.0;
        }
        (count2 + self.k) / (count1 + self.total_words as f64)
    }

    /// `P3(c | a, b)`: smoothed trigram probability given its leading
    /// bigram, with the same aliasing guard as [`gram2_prob`].
    fn gram3_prob(&self, a: WordId, b: WordId, c: WordId) -> f64 {
        let count2 = f64::from(self.store.bigram_count(a, b));
        let mut count3 = f64::from(self.store.trigram_count(a, b, c));
        if count3 > count2 {
            count3 = 0.0;
        }
        (count3 + self.k) / (count2 + self.total_words as f64)
    }
}
