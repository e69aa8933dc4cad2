//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! Topic models from directories of text with non-negative matrix
//! factorization.
//!
//! Documents are weighted with TF-IDF into a sparse document-term matrix `X`,
//! which is factored as `X ≈ W H` with `W` (documents x topics) and `H`
//! (topics x terms) both non-negative. Normalized rows of `W` give each
//! document's topic mixture and the heaviest columns of each row of `H` give
//! the words of a topic.
//!
//! ```no_run
//! use std::path::Path;
//! use rust_nmf::{ModelConfig, TopicModel};
//!
//! let config = ModelConfig::new().topics(5).words(8);
//! let model = TopicModel::fit(Path::new("texts"), &config)?;
//! for (topic, words) in model.topic_to_words() {
//!     println!("{}: {}", topic, words.join(" "));
//! }
//! # Ok::<(), rust_nmf::TopicError>(())
//! ```

pub mod corpus;
pub mod error;
pub mod model;
pub mod nmf;
pub mod sparse;
pub mod stopwords;
pub mod summary;
pub mod vectorizer;

pub use corpus::{get_documents, load_corpus, Document, Encoding};
pub use error::{Result, TopicError};
pub use model::{ModelConfig, TopicModel};
pub use nmf::{factor, FactorPair, NonNegativeFactorization};
pub use sparse::SparseMatrix;
pub use summary::{document_distributions, dominant_topics, topic_terms};
pub use vectorizer::{InvertedIndex, TfIdfVectorizer, Tokenizer, Vocabulary};
