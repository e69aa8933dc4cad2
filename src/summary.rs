//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! Turning factor matrices into topic mixtures and topic word lists.

use ndarray::{Array2, Axis};
use ndarray_stats::QuantileExt;

use crate::error::{Result, TopicError};
use crate::vectorizer::Vocabulary;

/// Row sums at or below this are treated as zero.
pub const ZERO_ROW_TOLERANCE: f64 = 1e-12;

/// Normalize every row of `w` to sum to one.
///
/// A document whose row sums to zero (it shares no vocabulary with any
/// topic) gets an all-zero row rather than NaNs.
pub fn document_distributions(w: &Array2<f64>) -> Array2<f64> {
    let mut distributions = w.to_owned();
    for mut row in distributions.axis_iter_mut(Axis(0)) {
        let total = row.sum();
        if total > ZERO_ROW_TOLERANCE {
            row /= total;
        } else {
            row.fill(0.0);
        }
    }
    distributions
}

/// The `top_k` terms of every topic (row of `h`), heaviest first.
///
/// Ties go to the term with the smaller vocabulary index.
pub fn topic_terms(
    h: &Array2<f64>,
    vocabulary: &Vocabulary,
    top_k: usize,
) -> Result<Vec<Vec<String>>> {
    if top_k == 0 {
        return Err(TopicError::invalid("top_k", "must be at least 1"));
    }
    if h.ncols() != vocabulary.len() {
        return Err(TopicError::invalid(
            "vocabulary",
            format!("{} terms for a factor with {} columns", vocabulary.len(), h.ncols()),
        ));
    }

    let ranked = h
        .axis_iter(Axis(0))
        .map(|topic| {
            let mut order: Vec<usize> = (0..topic.len()).collect();
            // stable sort keeps index order among equal weights
            order.sort_by(|&a, &b| topic[b].total_cmp(&topic[a]));
            order
                .into_iter()
                .take(top_k)
                .filter_map(|i| vocabulary.term(i).map(str::to_owned))
                .collect()
        })
        .collect();

    Ok(ranked)
}

/// The heaviest topic of each document, or `None` for all-zero rows.
pub fn dominant_topics(distributions: &Array2<f64>) -> Vec<Option<usize>> {
    distributions
        .axis_iter(Axis(0))
        .map(|row| {
            if row.sum() > ZERO_ROW_TOLERANCE {
                row.argmax().ok()
            } else {
                None
            }
        })
        .collect()
}
