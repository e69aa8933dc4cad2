//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a topic model.
///
/// Every variant is fatal to the run: no artifacts are written once one of
/// these has been returned.
#[derive(Error, Debug)]
pub enum TopicError {
    #[error("empty corpus: {detail}")]
    EmptyCorpus { detail: String },

    #[error(
        "empty vocabulary: no term of {documents} documents has a document frequency \
         between {min_df} and {max_df_ratio} x documents"
    )]
    EmptyVocabulary {
        min_df: usize,
        max_df_ratio: f64,
        documents: usize,
    },

    #[error("invalid rank {rank}: must be in 1..=min({documents} documents, {terms} terms)")]
    InvalidRank {
        rank: usize,
        documents: usize,
        terms: usize,
    },

    #[error("cannot decode {} as {encoding}: {detail}", .path.display())]
    Encoding {
        path: PathBuf,
        encoding: String,
        detail: String,
    },

    #[error("reconstruction error became non-finite at iteration {iteration}")]
    NumericInstability { iteration: usize },

    #[error("invalid parameter `{name}`: {detail}")]
    InvalidParameter { name: &'static str, detail: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TopicError {
    pub(crate) fn invalid(name: &'static str, detail: impl Into<String>) -> Self {
        TopicError::InvalidParameter {
            name,
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TopicError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TopicError>;
