//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! Tokenization, vocabulary selection and TF-IDF weighting.
//!
//! Weights are `count(t, d) * idf(t)` with the smoothed
//! `idf(t) = ln((1 + n) / (1 + df(t))) + 1`, after which every document row
//! is scaled to unit L2 length.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Index;
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{Result, TopicError};
use crate::sparse::SparseMatrix;
use crate::stopwords;

// runs of letters and combining marks
const TOKEN_PATTERN: &str = r"[\p{L}\p{M}]+";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern compiles"))
}

/// Splits text into lowercase word tokens, dropping stop words and tokens
/// shorter than `min_length` characters.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    min_length: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer {
            stop_words: HashSet::new(),
            min_length: 2,
        }
    }
}

impl Tokenizer {
    pub fn new(stop_words: HashSet<String>) -> Self {
        Tokenizer {
            stop_words,
            ..Tokenizer::default()
        }
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        token_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|token| token.chars().count() >= self.min_length)
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    /// Token histogram of one document.
    pub fn term_counts(&self, text: &str) -> BTreeMap<String, u64> {
        let mut histogram = BTreeMap::new();
        for token in self.tokenize(text) {
            *histogram.entry(token).or_insert(0) += 1;
        }
        histogram
    }
}

// InvertedIndex is...
//
// word -> { docid : word_freq }
//
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    pub num_documents: usize,
    pub indices: BTreeMap<String, BTreeMap<usize, u64>>,
}

impl Index<&str> for InvertedIndex {
    type Output = BTreeMap<usize, u64>;

    fn index(&self, token: &str) -> &Self::Output {
        match self.indices.get(token) {
            Some(hist) => hist,
            None => panic!(
                "Index<&str> Error: attempted to access an undefined token \"{}\"",
                token
            ),
        }
    }
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    /// Add the next document, given its token histogram.
    pub fn load(&mut self, histogram: BTreeMap<String, u64>) {
        let document_id = self.num_documents;
        for (token, count) in histogram {
            self.indices
                .entry(token)
                .or_default()
                .insert(document_id, count);
        }
        self.num_documents += 1;
    }

    /// Tokenize every document (in parallel) and index them in input order.
    pub fn from_documents<T>(documents: &[T], tokenizer: &Tokenizer) -> Self
    where
        T: AsRef<str> + Sync,
    {
        let histograms: Vec<BTreeMap<String, u64>> = documents
            .par_iter()
            .map(|doc| tokenizer.term_counts(doc.as_ref()))
            .collect();

        let mut index = InvertedIndex::new();
        for histogram in histograms {
            index.load(histogram);
        }
        index
    }

    pub fn document_frequency(&self, token: &str) -> usize {
        self.indices.get(token).map_or(0, |hist| hist.len())
    }
}

/// The ordered set of terms kept by the frequency filters.
///
/// A term's position is its column in the term-weight matrix and in the
/// topic-term factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    document_frequencies: Vec<usize>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    fn new(entries: Vec<(String, usize)>) -> Self {
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, (term, _))| (term.clone(), i))
            .collect();
        let (terms, document_frequencies) = entries.into_iter().unzip();
        Vocabulary {
            terms,
            document_frequencies,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    pub fn document_frequency(&self, index: usize) -> Option<usize> {
        self.document_frequencies.get(index).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

/// Builds the TF-IDF term-weight matrix of a corpus.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    tokenizer: Tokenizer,
    min_df: usize,
    max_df_ratio: f64,
    max_features: usize,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        TfIdfVectorizer {
            tokenizer: Tokenizer::default(),
            min_df: 1,
            max_df_ratio: 1.0,
            max_features: usize::MAX,
        }
    }
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        TfIdfVectorizer::default()
    }

    /// A vectorizer that drops the built-in English stop words.
    pub fn english() -> Self {
        TfIdfVectorizer::new().stop_words(stopwords::english())
    }

    pub fn stop_words(mut self, stop_words: HashSet<String>) -> Self {
        self.tokenizer = Tokenizer::new(stop_words).min_length(self.tokenizer.min_length);
        self
    }

    /// Minimum number of documents a term must occur in.
    pub fn min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Maximum share of documents a term may occur in.
    pub fn max_df_ratio(mut self, ratio: f64) -> Self {
        self.max_df_ratio = ratio;
        self
    }

    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = max;
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    fn validate(&self) -> Result<()> {
        if self.min_df == 0 {
            return Err(TopicError::invalid("min_df", "must be at least 1"));
        }
        if !(self.max_df_ratio > 0.0 && self.max_df_ratio <= 1.0) {
            return Err(TopicError::invalid(
                "max_df_ratio",
                format!("{} is outside (0, 1]", self.max_df_ratio),
            ));
        }
        if self.max_features == 0 {
            return Err(TopicError::invalid("max_features", "must be at least 1"));
        }
        Ok(())
    }

    /// Tokenize `corpus`, select the vocabulary and weight every document.
    ///
    /// Row `d` of the returned matrix belongs to `corpus[d]`.
    pub fn build<T>(&self, corpus: &[T]) -> Result<(SparseMatrix, Vocabulary)>
    where
        T: AsRef<str> + Sync,
    {
        self.validate()?;
        if corpus.is_empty() {
            return Err(TopicError::EmptyCorpus {
                detail: "no documents to vectorize".to_string(),
            });
        }

        let index = InvertedIndex::from_documents(corpus, &self.tokenizer);
        let vocabulary = self.select_vocabulary(&index)?;
        let n = index.num_documents;

        info!(
            documents = n,
            distinct_tokens = index.indices.len(),
            vocabulary = vocabulary.len(),
            "built vocabulary"
        );

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (column, term) in vocabulary.iter().enumerate() {
            let df = index[term].len();
            let idf = ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0;
            for (&document_id, &count) in &index[term] {
                rows[document_id].push((column, count as f64 * idf));
            }
        }

        let mut empty_rows = 0;
        for row in rows.iter_mut() {
            let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.iter_mut().for_each(|(_, w)| *w /= norm);
            } else {
                empty_rows += 1;
            }
        }
        if empty_rows > 0 {
            warn!(documents = empty_rows, "documents without any vocabulary term");
        }

        let matrix = SparseMatrix::from_rows(vocabulary.len(), rows);
        debug!(nnz = matrix.nnz(), shape = ?matrix.shape(), "weighted term matrix");
        Ok((matrix, vocabulary))
    }

    fn select_vocabulary(&self, index: &InvertedIndex) -> Result<Vocabulary> {
        let max_df = self.max_df_ratio * index.num_documents as f64;

        // BTreeMap iteration keeps these in lexicographic order
        let mut kept: Vec<(String, usize)> = index
            .indices
            .iter()
            .map(|(term, hist)| (term, hist.len()))
            .filter(|&(_, df)| df >= self.min_df && df as f64 <= max_df)
            .map(|(term, df)| (term.clone(), df))
            .collect();

        if kept.is_empty() {
            return Err(TopicError::EmptyVocabulary {
                min_df: self.min_df,
                max_df_ratio: self.max_df_ratio,
                documents: index.num_documents,
            });
        }

        if kept.len() > self.max_features {
            kept.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));
            kept.truncate(self.max_features);
            kept.sort_by(|a, b| a.0.cmp(&b.0));
        }

        Ok(Vocabulary::new(kept))
    }
}
