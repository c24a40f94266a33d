// End-to-end training and scoring over real corpus files.
//
// These tests drive the public surface only: write a small corpus and
// alphabet to disk, train, then check counts, score ordering, determinism
// and concurrent use. Persistence has its own test file.

use std::fs;
use std::path::PathBuf;

use libspell::{Config, LangModel, ModelError, WordId, EMPTY_SCORE};

fn unique_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!("libspell_{tag}_{}_{nanos}.txt", std::process::id()))
}

/// Train over `corpus` with a lowercase ASCII alphabet, cleaning up the
/// input files afterwards.
fn train_from(tag: &str, corpus: &str) -> LangModel {
    let corpus_path = unique_path(&format!("{tag}_corpus"));
    let alpha_path = unique_path(&format!("{tag}_alpha"));
    fs::write(&corpus_path, corpus).unwrap();
    fs::write(&alpha_path, "abcdefghijklmnopqrstuvwxyz").unwrap();
    let model = LangModel::train(&corpus_path, &alpha_path).unwrap();
    let _ = fs::remove_file(&corpus_path);
    let _ = fs::remove_file(&alpha_path);
    model
}

#[test]
fn counts_match_the_corpus() {
    let model = train_from("counts", "the cat sat . the dog sat .");

    let the = model.word_id("the");
    let cat = model.word_id("cat");
    let sat = model.word_id("sat");
    assert_ne!(the, WordId::UNKNOWN);

    assert_eq!(model.word_count(the), 2);
    assert_eq!(model.word_count(cat), 1);
    assert_eq!(model.counters().bigram_count(the, cat), 1);
    assert_eq!(model.counters().trigram_count(the, cat, sat), 1);
    // Grams never cross the sentence break between "sat ." and "the".
    assert_eq!(model.counters().bigram_count(sat, the), 0);

    assert_eq!(model.vocab_size(), 4);
    assert_eq!(model.total_words(), 6);
}

#[test]
fn training_normalizes_case() {
    let model = train_from("case", "The CAT sat .");
    assert_eq!(model.word("cat"), Some("cat"));
    // Queries are expected pre-normalized; raw uppercase misses.
    assert_eq!(model.word_id("CAT"), WordId::UNKNOWN);
    // score_text normalizes on its own, so it still hits the vocabulary.
    assert!(model.score_text("The CAT sat") > model.score_text("zzz qqq www"));
}

#[test]
fn seen_word_order_outscores_swapped_order() {
    let model = train_from("order", "the cat sat . the dog sat . the cat ran .");
    assert!(model.score_text("the cat sat") > model.score_text("cat the sat"));
    assert!(
        model.score_words(&["the", "dog", "sat"]) > model.score_words(&["dog", "the", "sat"])
    );
}

#[test]
fn unknown_words_degrade_gracefully() {
    let model = train_from("unknown", "the cat sat .");
    let unseen = model.score_text("purple elephants waltz");
    assert!(unseen.is_finite());
    assert!(unseen < model.score_text("the cat sat"));
}

#[test]
fn empty_input_scores_the_sentinel() {
    let model = train_from("empty_input", "the cat sat .");
    assert_eq!(model.score_words(&[]), EMPTY_SCORE);
    assert_eq!(model.score_text(""), EMPTY_SCORE);
    assert_eq!(model.score_text("123 ... 456"), EMPTY_SCORE);
}

#[test]
fn training_twice_scores_bit_identically() {
    let corpus = "the cat sat on the mat . the dog sat on the log . a cat and a dog sat .";
    let first = train_from("determinism_a", corpus);
    let second = train_from("determinism_b", corpus);

    for text in ["the cat sat", "a dog sat on the mat", "zzz unseen words"] {
        assert_eq!(
            first.score_text(text).to_bits(),
            second.score_text(text).to_bits(),
            "scores diverged for {text:?}"
        );
    }
    assert_eq!(first.vocab_size(), second.vocab_size());
    assert_eq!(first.total_words(), second.total_words());
}

#[test]
fn custom_config_changes_smoothing() {
    let corpus_path = unique_path("config_corpus");
    let alpha_path = unique_path("config_alpha");
    fs::write(&corpus_path, "the cat sat . the dog sat .").unwrap();
    fs::write(&alpha_path, "abcdefghijklmnopqrstuvwxyz").unwrap();

    let config = Config {
        k: 0.5,
        ..Config::default()
    };
    let heavy = LangModel::train_with_config(&corpus_path, &alpha_path, &config).unwrap();
    let light = LangModel::train(&corpus_path, &alpha_path).unwrap();
    let _ = fs::remove_file(&corpus_path);
    let _ = fs::remove_file(&alpha_path);

    assert_eq!(heavy.smoothing_k(), 0.5);
    assert_eq!(light.smoothing_k(), Config::default().k);
    // Heavier smoothing flattens the gap between seen and unseen text.
    let gap = |m: &LangModel| m.score_text("the cat sat") - m.score_text("cat the sat");
    assert!(gap(&heavy) < gap(&light));
}

#[test]
fn a_shared_model_scores_identically_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LangModel>();

    let model = train_from("threads", "the cat sat . the dog sat . the cat ran .");
    let expected = model.score_text("the cat sat").to_bits();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| model.score_text("the cat sat").to_bits()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn wordless_corpus_is_rejected() {
    let corpus_path = unique_path("wordless_corpus");
    let alpha_path = unique_path("wordless_alpha");
    fs::write(&corpus_path, "123 456 . 789 !").unwrap();
    fs::write(&alpha_path, "abcdefghijklmnopqrstuvwxyz").unwrap();
    let err = LangModel::train(&corpus_path, &alpha_path);
    let _ = fs::remove_file(&corpus_path);
    let _ = fs::remove_file(&alpha_path);
    assert!(matches!(err, Err(ModelError::EmptyCorpus)));
}

#[test]
fn missing_corpus_reports_io_with_its_path() {
    let corpus_path = unique_path("missing_corpus");
    let alpha_path = unique_path("present_alpha");
    fs::write(&alpha_path, "abc").unwrap();
    let err = LangModel::train(&corpus_path, &alpha_path);
    let _ = fs::remove_file(&alpha_path);
    match err {
        Err(ModelError::Io { path, .. }) => assert_eq!(path, corpus_path),
        other => panic!("expected io error for the corpus, got {other:?}"),
    }
}

#[test]
fn alphabet_problems_surface_before_corpus_problems() {
    // Both inputs are bad; the alphabet is checked first.
    let corpus_path = unique_path("never_read_corpus");
    let alpha_path = unique_path("blank_alpha");
    fs::write(&alpha_path, " \n\t").unwrap();
    let err = LangModel::train(&corpus_path, &alpha_path);
    let _ = fs::remove_file(&alpha_path);
    assert!(matches!(err, Err(ModelError::EmptyAlphabet { .. })));
}
