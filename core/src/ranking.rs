use crate::{Document, ExecutionPolicy};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Relevances closer than this are considered equal and ordered by rating.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// `ln(total_docs / docs_with_word)`.
pub fn inverse_document_freq(total_docs: usize, docs_with_word: usize) -> f64 {
    (total_docs as f64 / docs_with_word as f64).ln()
}

fn by_relevance(lhs: &Document, rhs: &Document) -> Ordering {
    rhs.relevance
        .total_cmp(&lhs.relevance)
        .then_with(|| rhs.rating.cmp(&lhs.rating))
        .then_with(|| lhs.id.cmp(&rhs.id))
}

fn by_rating(lhs: &Document, rhs: &Document) -> Ordering {
    rhs.rating.cmp(&lhs.rating).then_with(|| by_relevance(lhs, rhs))
}

/// Order documents by descending relevance, treating relevances within
/// [`RELEVANCE_EPSILON`] of their neighbour as ties broken by descending rating.
///
/// A tolerance comparison is not transitive, so the sort runs in two passes:
/// a strict total order first, then each run of near-equal neighbours is
/// re-sorted by rating.
///
/// Runs chain through neighbours: each adjacent pair is within the tolerance,
/// but the first and last members of a run may differ by more than it.
pub fn sort_by_relevance(documents: &mut [Document], policy: ExecutionPolicy) {
    match policy {
        ExecutionPolicy::Sequential => documents.sort_unstable_by(by_relevance),
        ExecutionPolicy::Parallel => documents.par_sort_unstable_by(by_relevance),
    }

    let mut start = 0;
    for i in 1..=documents.len() {
        let run_ends = i == documents.len()
            || (documents[i - 1].relevance - documents[i].relevance).abs() >= RELEVANCE_EPSILON;
        if run_ends {
            if i - start > 1 {
                documents[start..i].sort_unstable_by(by_rating);
            }
            start = i;
        }
    }
}

/// Sort and keep the best `limit` documents.
pub fn select_top(mut documents: Vec<Document>, limit: usize, policy: ExecutionPolicy) -> Vec<Document> {
    sort_by_relevance(&mut documents, policy);
    documents.truncate(limit);
    documents
}
