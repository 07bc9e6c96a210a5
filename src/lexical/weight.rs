//! Scoring of documents against a query term.
//!
//! A [`Weight`] is created from its parameters, declares the statistics it
//! needs with [`Weight::stats_needed`], is initialised once per query term
//! with the gathered [`WeightStats`], and is then asked for per-document
//! contributions. Each query term gets its own clone (see
//! [`Weight::clone_box`]), so initialised scorers share no mutable state.

pub mod bm25;
pub mod config;
pub mod lm;
pub mod stats;

use std::fmt::Debug;

use crate::error::Result;
use crate::lexical::termlist::{CursorPhase, PersistedTermList, TermListCursor};

pub use bm25::{Bm25Params, Bm25Weight};
pub use config::{WeightConfig, WeightRegistry};
pub use lm::{LmParams, LmWeight, SmoothingStrategy};
pub use stats::{QueryTermInfo, RelevanceSet, StatsNeeded, WeightStats};

/// Collection-wide statistics a scorer can be initialised from.
pub trait StatsSource {
    /// Number of documents.
    fn collection_size(&self) -> u64;

    /// Sum of all document lengths.
    fn total_length(&self) -> u64;

    /// Smallest and largest document length, `(0, 0)` if there are no
    /// documents.
    fn doclength_bounds(&self) -> (u64, u64);

    /// Number of documents containing `term`.
    fn termfreq(&self, term: &str) -> Result<u64>;

    /// Total occurrences of `term`.
    fn collection_freq(&self, term: &str) -> Result<u64>;

    /// Largest wdf of `term` in any document.
    fn wdf_upper_bound(&self, term: &str) -> Result<u32>;
}

/// A scoring function for one query term.
pub trait Weight: Send + Sync + Debug {
    /// Name under which the scorer is registered.
    fn name(&self) -> &'static str;

    /// Statistics `init` reads.
    fn stats_needed(&self) -> StatsNeeded;

    /// Prepare for scoring. `factor` is the term-independent relevance
    /// factor of the query.
    fn init(&mut self, stats: &WeightStats, factor: f64) -> Result<()>;

    /// Contribution of a document with `wdf` occurrences of the term and
    /// length `doc_length`.
    fn sum_part(&self, wdf: u32, doc_length: u64) -> f64;

    /// As [`sum_part`](Self::sum_part), for scorers that also use the number
    /// of distinct terms in the document.
    fn sum_part_with_unique_terms(&self, wdf: u32, doc_length: u64, _unique_terms: u64) -> f64 {
        self.sum_part(wdf, doc_length)
    }

    /// Upper bound on [`sum_part`](Self::sum_part) over all documents.
    fn max_part(&self) -> f64;

    /// Term-independent contribution of a document of length `doc_length`.
    fn sum_extra(&self, doc_length: u64) -> f64;

    /// Upper bound on [`sum_extra`](Self::sum_extra).
    fn max_extra(&self) -> f64;

    /// Configured parameters as bytes.
    fn serialise(&self) -> Vec<u8>;

    /// New scorer of the same kind with parameters read from `data`.
    fn unserialise(&self, data: &[u8]) -> Result<Box<dyn Weight>>;

    /// New uninitialised scorer with the same configured parameters.
    fn clone_box(&self) -> Box<dyn Weight>;
}

impl Clone for Box<dyn Weight> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Score of the document behind `list` for `term`.
///
/// The list is moved forward to `term`; a document without the term is
/// scored with a wdf of 0.
pub fn score_document(weight: &dyn Weight, list: &mut PersistedTermList, term: &str) -> Result<f64> {
    list.skip_to(term)?;
    let wdf = if list.phase() == CursorPhase::Iterating && list.name()? == term {
        list.wdf()?
    } else {
        0
    };
    let doc_length = list.doc_length();
    Ok(weight.sum_part_with_unique_terms(wdf, doc_length, list.approx_size())
        + weight.sum_extra(doc_length))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lexical::termlist::DocumentTerms;
    use crate::storage::MemoryTermStore;

    #[test]
    fn test_score_document() {
        let store = Arc::new(MemoryTermStore::new());
        for pairs in [&[("a", 1u32), ("b", 3)][..], &[("a", 2)][..], &[("c", 4)][..]] {
            let doc: DocumentTerms = pairs.iter().copied().collect();
            store.add_document(&doc).unwrap();
        }

        let mut weight = Bm25Weight::default();
        let query = QueryTermInfo::new("a");
        let stats = WeightStats::gather(store.as_ref(), weight.stats_needed(), &query, None).unwrap();
        weight.init(&stats, 1.0).unwrap();

        let mut scores = Vec::new();
        for doc_id in 1..=3 {
            let mut list = PersistedTermList::open(store.clone(), doc_id).unwrap();
            scores.push(score_document(&weight, &mut list, "a").unwrap());
        }
        assert!(scores[0] > 0.0);
        assert!(scores[1] > scores[0]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_boxed_clone_is_uninitialised() {
        let weight: Box<dyn Weight> = Box::new(LmWeight::new(LmParams::default().with_param1(0.3)));
        let copy = weight.clone();
        assert_eq!(copy.name(), LmWeight::NAME);
        assert_eq!(copy.serialise(), weight.serialise());
    }
}
