use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use rust_nmf::{ModelConfig, TopicError, TopicModel};
use tempfile::{tempdir, TempDir};

fn corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn animals() -> TempDir {
    corpus(&[
        ("a.txt", "cat dog cat"),
        ("b.txt", "dog bird"),
        ("c.txt", "cat bird fish"),
    ])
}

fn config(out: &Path) -> ModelConfig {
    ModelConfig::new()
        .topics(2)
        .words(2)
        .min_count(1)
        .max_freq(1.0)
        .output_dir(out)
}

#[test]
fn three_document_scenario() {
    let input = animals();
    let out = tempdir().unwrap();
    let results = out.path().join("results");

    let model = TopicModel::fit(input.path(), &config(&results)).unwrap();

    assert_eq!(model.paths().len(), 3);
    let vocabulary: HashSet<&str> = model.vocabulary().iter().collect();
    assert_eq!(vocabulary, ["cat", "dog", "bird", "fish"].into_iter().collect());
    assert_eq!(model.factors().w.dim(), (3, 2));
    assert_eq!(model.factors().h.dim(), (2, 4));

    for row in model.distributions().rows() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }

    // each topic lists its heaviest distinct terms, heaviest first
    let h = &model.factors().h;
    for (topic, words) in model.topic_to_words() {
        assert_eq!(words.len(), 2);
        assert_ne!(words[0], words[1]);
        let first = model.vocabulary().index_of(&words[0]).unwrap();
        let second = model.vocabulary().index_of(&words[1]).unwrap();
        assert!(h[[*topic, first]] >= h[[*topic, second]]);
        assert!(h.row(*topic).iter().all(|&v| v <= h[[*topic, first]]));
    }

    let doc_to_topics: BTreeMap<String, BTreeMap<String, f64>> =
        serde_json::from_str(&fs::read_to_string(results.join("doc_to_topics.json")).unwrap())
            .unwrap();
    assert_eq!(doc_to_topics.len(), 3);
    let a = input.path().join("a.txt").display().to_string();
    let topics = &doc_to_topics[&a];
    assert_eq!(topics.keys().collect::<Vec<_>>(), vec!["0", "1"]);
    assert_abs_diff_eq!(topics.values().sum::<f64>(), 1.0, epsilon = 1e-9);

    let topic_to_words: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&fs::read_to_string(results.join("topic_to_words.json")).unwrap())
            .unwrap();
    assert_eq!(topic_to_words.len(), 2);
    assert_eq!(topic_to_words["0"], model.topic_to_words()[&0]);
}

#[test]
fn single_document_single_topic() {
    let input = corpus(&[("only.txt", "rust compiles rust code")]);
    let out = tempdir().unwrap();

    let model = TopicModel::fit(input.path(), &config(out.path()).topics(1)).unwrap();

    let distributions: Vec<_> = model.doc_to_topics().values().collect();
    assert_eq!(distributions.len(), 1);
    assert_eq!(distributions[0].len(), 1);
    assert_abs_diff_eq!(distributions[0][&0], 1.0, epsilon = 1e-12);
    assert_eq!(model.dominant_topics(), vec![Some(0)]);
}

#[test]
fn empty_directory_fails_without_artifacts() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    let results = out.path().join("results");

    let err = TopicModel::fit(input.path(), &config(&results)).unwrap_err();
    assert!(matches!(err, TopicError::EmptyCorpus { .. }));
    assert!(!results.exists());
}

#[test]
fn undecodable_file_fails_without_artifacts() {
    let input = corpus(&[("a.txt", "cat dog")]);
    fs::write(input.path().join("b.txt"), b"ca\xff").unwrap();
    let out = tempdir().unwrap();
    let results = out.path().join("results");

    let err = TopicModel::fit(input.path(), &config(&results)).unwrap_err();
    assert!(matches!(err, TopicError::Encoding { .. }));
    assert!(!results.exists());
}

#[test]
fn strict_frequency_bounds_fail_with_empty_vocabulary() {
    let input = animals();
    let out = tempdir().unwrap();
    let results = out.path().join("results");

    let err = TopicModel::fit(input.path(), &config(&results).min_count(4)).unwrap_err();
    assert!(matches!(err, TopicError::EmptyVocabulary { .. }));
    assert!(!results.exists());
}

#[test]
fn repeated_runs_are_identical() {
    let input = animals();
    let out = tempdir().unwrap();
    let config = config(out.path()).write_output(false).seed(11);

    let first = TopicModel::fit(input.path(), &config).unwrap();
    let second = TopicModel::fit(input.path(), &config).unwrap();

    assert_eq!(first.doc_to_topics(), second.doc_to_topics());
    assert_eq!(first.topic_to_words(), second.topic_to_words());
    assert_eq!(first.factors(), second.factors());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn stop_word_document_gets_zero_mixture() {
    let input = corpus(&[
        ("a.txt", "cat dog cat"),
        ("b.txt", "dog bird"),
        ("c.txt", "cat bird fish"),
        ("d.txt", "the and of but"),
    ]);
    let out = tempdir().unwrap();

    let model = TopicModel::fit(input.path(), &config(out.path()).write_output(false)).unwrap();

    let d = input.path().join("d.txt").display().to_string();
    let mixture = &model.doc_to_topics()[&d];
    assert_eq!(mixture.len(), 2);
    assert!(mixture.values().all(|&w| w == 0.0));
    assert_eq!(model.dominant_topics()[3], None);
}

#[test]
fn max_files_limits_the_corpus() {
    let input = corpus(&[
        ("a.txt", "cat dog cat"),
        ("b.txt", "dog bird"),
        ("c.txt", "cat bird fish"),
        ("d.txt", "fish whale"),
    ]);
    let out = tempdir().unwrap();

    let model = TopicModel::fit(
        input.path(),
        &config(out.path()).write_output(false).max_files(Some(2)),
    )
    .unwrap();

    assert_eq!(model.paths().len(), 2);
    assert!(model.paths()[0].ends_with("a.txt"));
    assert!(model.paths()[1].ends_with("b.txt"));
    assert_eq!(model.vocabulary().terms(), &["bird", "cat", "dog"]);
}
