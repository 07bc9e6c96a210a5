//! Statistics a scorer subscribes to, and the provider that gathers them.

use ahash::AHashMap;
use bitflags::bitflags;
use log::debug;

use crate::error::Result;
use crate::lexical::termlist::TermListCursor;
use crate::lexical::weight::StatsSource;

bitflags! {
    /// Statistics a scorer needs.
    ///
    /// Only the statistics named here are computed by [`WeightStats::gather`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatsNeeded: u32 {
        /// Number of documents in the collection.
        const COLLECTION_SIZE = 1 << 0;
        /// Number of documents in the relevance set.
        const RSET_SIZE = 1 << 1;
        /// Average document length.
        const AVERAGE_LENGTH = 1 << 2;
        /// Number of documents the term occurs in.
        const TERMFREQ = 1 << 3;
        /// Number of relevance set documents the term occurs in.
        const RELTERMFREQ = 1 << 4;
        /// Number of terms in the query.
        const QUERY_LENGTH = 1 << 5;
        /// Within-query frequency of the term.
        const WQF = 1 << 6;
        /// Within-document frequency, passed per document.
        const WDF = 1 << 7;
        /// Document length, passed per document.
        const DOC_LENGTH = 1 << 8;
        /// Lower bound on document length.
        const DOC_LENGTH_MIN = 1 << 9;
        /// Upper bound on document length.
        const DOC_LENGTH_MAX = 1 << 10;
        /// Upper bound on the term's wdf.
        const WDF_MAX = 1 << 11;
        /// Total occurrences of the term in the collection.
        const COLLECTION_FREQ = 1 << 12;
        /// Number of distinct terms in the document, passed per document.
        const UNIQUE_TERMS = 1 << 13;
    }
}

/// A term of the query being scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTermInfo {
    pub term: String,
    /// Within-query frequency.
    pub wqf: u32,
    /// Number of terms in the whole query.
    pub query_length: u32,
}

impl QueryTermInfo {
    pub fn new(term: impl Into<String>) -> Self {
        QueryTermInfo {
            term: term.into(),
            wqf: 1,
            query_length: 1,
        }
    }

    pub fn with_wqf(mut self, wqf: u32) -> Self {
        self.wqf = wqf;
        self
    }

    pub fn with_query_length(mut self, query_length: u32) -> Self {
        self.query_length = query_length;
        self
    }
}

/// Documents the user marked as relevant, reduced to per-term counts.
#[derive(Debug, Clone, Default)]
pub struct RelevanceSet {
    size: u64,
    reltermfreq: AHashMap<String, u64>,
}

impl RelevanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the document whose term list `cursor` is positioned before.
    ///
    /// Consumes the cursor up to its end.
    pub fn add_termlist(&mut self, cursor: &mut dyn TermListCursor) -> Result<()> {
        cursor.advance()?;
        while !cursor.at_end() {
            *self.reltermfreq.entry(cursor.name()?.to_string()).or_insert(0) += 1;
            cursor.advance()?;
        }
        self.size += 1;
        Ok(())
    }

    /// Number of documents in the set.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of documents in the set containing `term`.
    pub fn reltermfreq(&self, term: &str) -> u64 {
        self.reltermfreq.get(term).copied().unwrap_or(0)
    }
}

/// Statistics handed to a scorer's `init`.
///
/// Fields the scorer did not subscribe to are left at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightStats {
    pub collection_size: u64,
    pub rset_size: u64,
    pub average_length: f64,
    pub termfreq: u64,
    pub reltermfreq: u64,
    pub query_length: u32,
    pub wqf: u32,
    pub doclength_lower_bound: u64,
    pub doclength_upper_bound: u64,
    pub wdf_upper_bound: u32,
    pub collection_freq: u64,
}

impl WeightStats {
    /// Collect the statistics named in `needed` for `query_term`.
    pub fn gather(
        source: &dyn StatsSource,
        needed: StatsNeeded,
        query_term: &QueryTermInfo,
        rset: Option<&RelevanceSet>,
    ) -> Result<Self> {
        let mut stats = WeightStats::default();
        let term = query_term.term.as_str();

        if needed.intersects(StatsNeeded::COLLECTION_SIZE | StatsNeeded::AVERAGE_LENGTH) {
            stats.collection_size = source.collection_size();
        }
        if needed.contains(StatsNeeded::AVERAGE_LENGTH) && stats.collection_size > 0 {
            stats.average_length = source.total_length() as f64 / stats.collection_size as f64;
        }
        if needed.contains(StatsNeeded::TERMFREQ) {
            stats.termfreq = source.termfreq(term)?;
        }
        if needed.contains(StatsNeeded::COLLECTION_FREQ) {
            stats.collection_freq = source.collection_freq(term)?;
        }
        if needed.intersects(StatsNeeded::DOC_LENGTH_MIN | StatsNeeded::DOC_LENGTH_MAX) {
            let (lower, upper) = source.doclength_bounds();
            stats.doclength_lower_bound = lower;
            stats.doclength_upper_bound = upper;
        }
        if needed.contains(StatsNeeded::WDF_MAX) {
            stats.wdf_upper_bound = source.wdf_upper_bound(term)?;
        }
        if needed.contains(StatsNeeded::QUERY_LENGTH) {
            stats.query_length = query_term.query_length;
        }
        if needed.contains(StatsNeeded::WQF) {
            stats.wqf = query_term.wqf;
        }
        if let Some(rset) = rset {
            if needed.contains(StatsNeeded::RSET_SIZE) {
                stats.rset_size = rset.size();
            }
            if needed.contains(StatsNeeded::RELTERMFREQ) {
                stats.reltermfreq = rset.reltermfreq(term);
            }
        }

        debug!("gathered statistics for {term:?}: {stats:?}");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::lexical::termlist::DocumentTerms;

    /// Source that counts how often the per-term statistics are read.
    #[derive(Default)]
    struct CountingSource {
        term_lookups: Cell<u32>,
    }

    impl StatsSource for CountingSource {
        fn collection_size(&self) -> u64 {
            4
        }

        fn total_length(&self) -> u64 {
            10
        }

        fn doclength_bounds(&self) -> (u64, u64) {
            (1, 4)
        }

        fn termfreq(&self, _term: &str) -> Result<u64> {
            self.term_lookups.set(self.term_lookups.get() + 1);
            Ok(2)
        }

        fn collection_freq(&self, _term: &str) -> Result<u64> {
            self.term_lookups.set(self.term_lookups.get() + 1);
            Ok(3)
        }

        fn wdf_upper_bound(&self, _term: &str) -> Result<u32> {
            self.term_lookups.set(self.term_lookups.get() + 1);
            Ok(2)
        }
    }

    #[test]
    fn test_only_subscribed_statistics_are_read() {
        let source = CountingSource::default();
        let query = QueryTermInfo::new("t").with_wqf(2).with_query_length(3);

        let stats = WeightStats::gather(&source, StatsNeeded::WDF, &query, None).unwrap();
        assert_eq!(stats, WeightStats::default());
        assert_eq!(source.term_lookups.get(), 0);

        let needed = StatsNeeded::AVERAGE_LENGTH
            | StatsNeeded::COLLECTION_FREQ
            | StatsNeeded::DOC_LENGTH_MAX
            | StatsNeeded::WQF;
        let stats = WeightStats::gather(&source, needed, &query, None).unwrap();
        assert_eq!(source.term_lookups.get(), 1);
        assert_eq!(stats.collection_size, 4);
        assert_eq!(stats.average_length, 2.5);
        assert_eq!(stats.collection_freq, 3);
        assert_eq!(stats.termfreq, 0);
        assert_eq!(stats.doclength_upper_bound, 4);
        assert_eq!(stats.wqf, 2);
        assert_eq!(stats.query_length, 0);
    }

    #[test]
    fn test_relevance_set_counts() {
        let first: DocumentTerms = [("a b", 1), ("c d", 2)].into_iter().collect();
        let second: DocumentTerms = [("a b", 3), ("plain", 1)].into_iter().collect();
        let mut rset = RelevanceSet::new();
        rset.add_termlist(&mut first.termlist()).unwrap();
        rset.add_termlist(&mut second.termlist()).unwrap();
        assert_eq!(rset.size(), 2);
        assert_eq!(rset.reltermfreq("a b"), 2);
        assert_eq!(rset.reltermfreq("c d"), 1);
        assert_eq!(rset.reltermfreq("plain"), 0);

        let source = CountingSource::default();
        let needed = StatsNeeded::RSET_SIZE | StatsNeeded::RELTERMFREQ;
        let stats =
            WeightStats::gather(&source, needed, &QueryTermInfo::new("a b"), Some(&rset)).unwrap();
        assert_eq!((stats.rset_size, stats.reltermfreq), (2, 2));
    }
}
