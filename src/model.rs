//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! The end-to-end pipeline: corpus -> TF-IDF -> NMF -> topic summaries.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::corpus::{self, Document, Encoding};
use crate::error::{Result, TopicError};
use crate::nmf::{FactorPair, NonNegativeFactorization, DEFAULT_TOLERANCE};
use crate::summary;
use crate::vectorizer::{TfIdfVectorizer, Vocabulary};

pub const DOC_TO_TOPICS_FILE: &str = "doc_to_topics.json";
pub const TOPIC_TO_WORDS_FILE: &str = "topic_to_words.json";

/// Settings for one model run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub encoding: Encoding,
    pub max_files: Option<usize>,
    /// rank of the factorization
    pub topics: usize,
    pub iterations: usize,
    /// terms reported per topic
    pub words: usize,
    /// minimum document frequency of a kept term
    pub min_count: usize,
    /// maximum share of documents a kept term may appear in
    pub max_freq: f64,
    /// defaults to `topics * words * 1000`
    pub max_vocabulary: Option<usize>,
    pub seed: u64,
    pub tolerance: f64,
    pub write_output: bool,
    pub output_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            encoding: Encoding::Utf8,
            max_files: None,
            topics: 20,
            iterations: 100,
            words: 10,
            min_count: 2,
            max_freq: 0.95,
            max_vocabulary: None,
            seed: 1,
            tolerance: DEFAULT_TOLERANCE,
            write_output: true,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl ModelConfig {
    pub fn new() -> Self {
        ModelConfig::default()
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn max_files(mut self, max_files: Option<usize>) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn topics(mut self, topics: usize) -> Self {
        self.topics = topics;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn words(mut self, words: usize) -> Self {
        self.words = words;
        self
    }

    pub fn min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn max_freq(mut self, max_freq: f64) -> Self {
        self.max_freq = max_freq;
        self
    }

    pub fn max_vocabulary(mut self, max_vocabulary: usize) -> Self {
        self.max_vocabulary = Some(max_vocabulary);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn write_output(mut self, write_output: bool) -> Self {
        self.write_output = write_output;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    fn vocabulary_limit(&self) -> usize {
        self.max_vocabulary
            .unwrap_or_else(|| self.topics.saturating_mul(self.words).saturating_mul(1000))
            .max(1)
    }
}

/// A fitted topic model and its two reports.
#[derive(Debug, Clone)]
pub struct TopicModel {
    paths: Vec<PathBuf>,
    vocabulary: Vocabulary,
    factors: FactorPair,
    distributions: Array2<f64>,
    doc_to_topics: BTreeMap<String, BTreeMap<usize, f64>>,
    topic_to_words: BTreeMap<usize, Vec<String>>,
}

impl TopicModel {
    /// Model every file below `root`, writing the reports to
    /// `config.output_dir` when `config.write_output` is set.
    pub fn fit(root: &Path, config: &ModelConfig) -> Result<Self> {
        let documents = corpus::load_corpus(root, config.encoding, config.max_files)?;
        let model = TopicModel::from_documents(&documents, config)?;
        if config.write_output {
            model.write_results(&config.output_dir)?;
        }
        Ok(model)
    }

    /// Model already loaded documents. Touches no files.
    pub fn from_documents(documents: &[Document], config: &ModelConfig) -> Result<Self> {
        let (matrix, vocabulary) = TfIdfVectorizer::english()
            .min_df(config.min_count)
            .max_df_ratio(config.max_freq)
            .max_features(config.vocabulary_limit())
            .build(documents)?;

        let factors = NonNegativeFactorization::new(config.topics)
            .max_iterations(config.iterations)
            .seed(config.seed)
            .tolerance(config.tolerance)
            .factor(&matrix)?;

        let distributions = summary::document_distributions(&factors.w);
        let topic_words = summary::topic_terms(&factors.h, &vocabulary, config.words)?;

        let paths: Vec<PathBuf> = documents.iter().map(|d| d.path.clone()).collect();

        let doc_to_topics = paths
            .iter()
            .zip(distributions.rows())
            .map(|(path, row)| {
                let topics = row.iter().copied().enumerate().collect();
                (path.display().to_string(), topics)
            })
            .collect();
        let topic_to_words = topic_words.into_iter().enumerate().collect();

        info!(
            documents = paths.len(),
            terms = vocabulary.len(),
            topics = config.topics,
            "topic model built"
        );

        Ok(TopicModel {
            paths,
            vocabulary,
            factors,
            distributions,
            doc_to_topics,
            topic_to_words,
        })
    }

    /// document path -> { topic -> share of the document }
    pub fn doc_to_topics(&self) -> &BTreeMap<String, BTreeMap<usize, f64>> {
        &self.doc_to_topics
    }

    /// topic -> top terms, heaviest first
    pub fn topic_to_words(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.topic_to_words
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn factors(&self) -> &FactorPair {
        &self.factors
    }

    pub fn distributions(&self) -> &Array2<f64> {
        &self.distributions
    }

    pub fn dominant_topics(&self) -> Vec<Option<usize>> {
        summary::dominant_topics(&self.distributions)
    }

    /// Write `doc_to_topics.json` and `topic_to_words.json` into `dir`.
    ///
    /// Both files are staged next to their targets and renamed into place
    /// only once both are complete; on failure neither is left behind.
    pub fn write_results(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| TopicError::io(dir, e))?;
        let staged = [
            (dir.join(DOC_TO_TOPICS_FILE), stage_json(dir, &self.doc_to_topics)?),
            (dir.join(TOPIC_TO_WORDS_FILE), stage_json(dir, &self.topic_to_words)?),
        ];

        let mut written: Vec<PathBuf> = Vec::new();
        for (path, file) in staged {
            if let Err(e) = file.persist(&path) {
                for done in &written {
                    let _ = fs::remove_file(done);
                }
                return Err(TopicError::io(path, e.error));
            }
            written.push(path);
        }

        info!(dir = %dir.display(), "results written");
        Ok(())
    }
}

// serialize into a temporary file inside `dir`
fn stage_json<T: Serialize>(dir: &Path, value: &T) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir).map_err(|e| TopicError::io(dir, e))?;
    {
        let mut writer = BufWriter::new(&mut file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(|e| TopicError::io(dir, e))?;
    }
    Ok(file)
}
