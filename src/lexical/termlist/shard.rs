//! Term lists over a collection split across several shards.

use std::sync::Arc;

use log::debug;

use crate::error::{IrisError, Result};
use crate::lexical::expand::ExpandStats;
use crate::lexical::termlist::persisted::PersistedTermList;
use crate::lexical::termlist::{CursorPhase, TermListCursor};
use crate::lexical::weight::StatsSource;
use crate::storage::TermStore;

/// Cursor from one shard, reporting term frequencies scaled up to the size of
/// the whole collection.
///
/// The scaled frequency is `floor(shard_termfreq * total_docs / shard_docs)`.
/// It is an estimate: the exact value would need the per-shard frequencies
/// of every shard.
#[derive(Debug)]
pub struct ShardTermList {
    inner: Box<dyn TermListCursor>,
    scale_factor: f64,
    shard_index: usize,
}

impl ShardTermList {
    /// Wrap `inner`, read from shard `shard_index` holding `shard_doc_count`
    /// of the collection's `total_doc_count` documents.
    pub fn new(
        inner: Box<dyn TermListCursor>,
        total_doc_count: u64,
        shard_doc_count: u64,
        shard_index: usize,
    ) -> Result<Self> {
        if shard_doc_count == 0 {
            return Err(IrisError::invalid_argument(format!(
                "shard {shard_index} has no documents"
            )));
        }
        let scale_factor = total_doc_count as f64 / shard_doc_count as f64;
        debug!("approximation factor for termfreq on shard {shard_index}: {scale_factor}");

        Ok(ShardTermList {
            inner,
            scale_factor,
            shard_index,
        })
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn shard_index(&self) -> usize {
        self.shard_index
    }

    pub fn into_inner(self) -> Box<dyn TermListCursor> {
        self.inner
    }
}

impl TermListCursor for ShardTermList {
    fn phase(&self) -> CursorPhase {
        self.inner.phase()
    }

    fn approx_size(&self) -> u64 {
        self.inner.approx_size()
    }

    fn name(&self) -> Result<&str> {
        self.inner.name()
    }

    fn wdf(&self) -> Result<u32> {
        self.inner.wdf()
    }

    fn termfreq(&mut self) -> Result<u64> {
        let termfreq = self.inner.termfreq()?;
        Ok((termfreq as f64 * self.scale_factor).floor() as u64)
    }

    fn advance(&mut self) -> Result<()> {
        self.inner.advance()
    }

    fn skip_to(&mut self, term: &str) -> Result<()> {
        self.inner.skip_to(term)
    }

    fn accumulate_stats(&mut self, stats: &mut ExpandStats) -> Result<()> {
        stats.set_shard(self.shard_index);
        self.inner.accumulate_stats(stats)
    }

    fn at_end(&self) -> bool {
        self.inner.at_end()
    }
}

/// Ordered set of shards making up one collection.
///
/// Global document ids are interleaved: id `n` lives on shard
/// `(n - 1) % shards` under local id `(n - 1) / shards + 1`.
#[derive(Debug)]
pub struct ShardSet<S> {
    shards: Vec<Arc<S>>,
}

impl<S> ShardSet<S>
where
    S: TermStore + StatsSource + 'static,
{
    pub fn new(shards: Vec<Arc<S>>) -> Result<Self> {
        if shards.is_empty() {
            return Err(IrisError::invalid_argument("a shard set needs at least one shard"));
        }
        Ok(ShardSet { shards })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard(&self, index: usize) -> Option<&Arc<S>> {
        self.shards.get(index)
    }

    /// Total number of documents over all shards.
    pub fn doc_count(&self) -> u64 {
        self.shards.iter().map(|s| s.doc_count()).sum()
    }

    /// Shard index and shard-local id of global document `doc_id`.
    pub fn locate(&self, doc_id: u64) -> Result<(usize, u64)> {
        if doc_id == 0 {
            return Err(IrisError::invalid_argument("document id 0 is reserved"));
        }
        let n = self.shards.len() as u64;
        Ok((((doc_id - 1) % n) as usize, (doc_id - 1) / n + 1))
    }

    /// Global id of shard-local document `local_id` on shard `shard_index`.
    pub fn global_id(&self, shard_index: usize, local_id: u64) -> Result<u64> {
        if local_id == 0 || shard_index >= self.shards.len() {
            return Err(IrisError::invalid_argument(format!(
                "no document {local_id} on shard {shard_index}"
            )));
        }
        Ok((local_id - 1) * self.shards.len() as u64 + shard_index as u64 + 1)
    }

    /// Open the term list of global document `doc_id`.
    pub fn open_termlist(&self, doc_id: u64) -> Result<ShardTermList> {
        let (index, local_id) = self.locate(doc_id)?;
        let shard = &self.shards[index];
        let store: Arc<dyn TermStore> = Arc::clone(shard) as Arc<dyn TermStore>;
        let list = PersistedTermList::open(store, local_id)?;
        ShardTermList::new(Box::new(list), self.doc_count(), shard.doc_count(), index)
    }
}

impl<S> StatsSource for ShardSet<S>
where
    S: TermStore + StatsSource + 'static,
{
    fn collection_size(&self) -> u64 {
        self.shards.iter().map(|s| s.collection_size()).sum()
    }

    fn total_length(&self) -> u64 {
        self.shards.iter().map(|s| s.total_length()).sum()
    }

    fn doclength_bounds(&self) -> (u64, u64) {
        let mut bounds: Option<(u64, u64)> = None;
        for shard in self.shards.iter().filter(|s| s.collection_size() > 0) {
            let (lower, upper) = shard.doclength_bounds();
            bounds = Some(match bounds {
                Some((l, u)) => (l.min(lower), u.max(upper)),
                None => (lower, upper),
            });
        }
        bounds.unwrap_or((0, 0))
    }

    fn termfreq(&self, term: &str) -> Result<u64> {
        self.shards.iter().map(|s| s.termfreq(term)).sum()
    }

    fn collection_freq(&self, term: &str) -> Result<u64> {
        self.shards.iter().map(|s| s.collection_freq(term)).sum()
    }

    fn wdf_upper_bound(&self, term: &str) -> Result<u32> {
        let mut bound = 0;
        for shard in &self.shards {
            bound = bound.max(shard.wdf_upper_bound(term)?);
        }
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::termlist::entry::DocumentTerms;
    use crate::storage::MemoryTermStore;

    /// Single-entry cursor with a fixed term frequency.
    #[derive(Debug)]
    struct FixedCursor {
        phase: CursorPhase,
        termfreq: u64,
    }

    impl FixedCursor {
        fn new(termfreq: u64) -> Self {
            FixedCursor {
                phase: CursorPhase::Unstarted,
                termfreq,
            }
        }
    }

    impl TermListCursor for FixedCursor {
        fn phase(&self) -> CursorPhase {
            self.phase
        }

        fn approx_size(&self) -> u64 {
            1
        }

        fn name(&self) -> Result<&str> {
            Ok("only term")
        }

        fn wdf(&self) -> Result<u32> {
            Ok(1)
        }

        fn termfreq(&mut self) -> Result<u64> {
            Ok(self.termfreq)
        }

        fn advance(&mut self) -> Result<()> {
            self.phase = match self.phase {
                CursorPhase::Unstarted => CursorPhase::Iterating,
                _ => CursorPhase::AtEnd,
            };
            Ok(())
        }

        fn skip_to(&mut self, _term: &str) -> Result<()> {
            Ok(())
        }

        fn accumulate_stats(&mut self, stats: &mut ExpandStats) -> Result<()> {
            stats.accumulate(1, 1, self.termfreq, 1);
            Ok(())
        }
    }

    fn shard(docs: &[&[(&str, u32)]]) -> Arc<MemoryTermStore> {
        let store = Arc::new(MemoryTermStore::new());
        for pairs in docs {
            let doc: DocumentTerms = pairs.iter().map(|(t, w)| (*t, *w)).collect();
            store.add_document(&doc).unwrap();
        }
        store
    }

    #[test]
    fn test_termfreq_is_scaled_and_floored() {
        let mut list = ShardTermList::new(Box::new(FixedCursor::new(3)), 10, 5, 0).unwrap();
        assert_eq!(list.scale_factor(), 2.0);
        list.advance().unwrap();
        assert_eq!(list.termfreq().unwrap(), 6);

        let mut list = ShardTermList::new(Box::new(FixedCursor::new(3)), 10, 4, 0).unwrap();
        list.advance().unwrap();
        assert_eq!(list.termfreq().unwrap(), 7);
    }

    #[test]
    fn test_empty_shard_is_rejected() {
        assert!(ShardTermList::new(Box::new(FixedCursor::new(1)), 10, 0, 0).is_err());
    }

    #[test]
    fn test_accumulate_stats_records_shard() {
        let mut list = ShardTermList::new(Box::new(FixedCursor::new(2)), 4, 2, 3).unwrap();
        list.advance().unwrap();
        let mut stats = ExpandStats::new(1.0);
        list.accumulate_stats(&mut stats).unwrap();
        assert_eq!(stats.shard(), 3);
        assert_eq!(stats.termfreq, 2);
    }

    #[test]
    fn test_locate_interleaves_ids() {
        let set = ShardSet::new(vec![shard(&[]), shard(&[]), shard(&[])]).unwrap();
        assert_eq!(set.locate(1).unwrap(), (0, 1));
        assert_eq!(set.locate(2).unwrap(), (1, 1));
        assert_eq!(set.locate(4).unwrap(), (0, 2));
        assert_eq!(set.locate(6).unwrap(), (2, 2));
        assert!(set.locate(0).is_err());
        for id in 1..20 {
            let (index, local) = set.locate(id).unwrap();
            assert_eq!(set.global_id(index, local).unwrap(), id);
        }
        assert!(ShardSet::<MemoryTermStore>::new(Vec::new()).is_err());
    }

    #[test]
    fn test_open_termlist_on_shard() {
        let first = shard(&[&[("a b", 1), ("c", 2)], &[("a b", 4)]]);
        let second = shard(&[&[("a b", 3), ("d", 1)]]);
        let set = ShardSet::new(vec![first, second]).unwrap();
        assert_eq!(set.doc_count(), 3);

        // Global 2 is the first document of the second shard.
        let mut list = set.open_termlist(2).unwrap();
        assert_eq!(list.shard_index(), 1);
        assert_eq!(list.scale_factor(), 3.0);
        list.advance().unwrap();
        assert_eq!(list.name().unwrap(), "a b");
        assert_eq!(list.wdf().unwrap(), 3);
        assert_eq!(list.termfreq().unwrap(), 3);

        // Global 3 is the second document of the first shard.
        let mut list = set.open_termlist(3).unwrap();
        list.advance().unwrap();
        assert_eq!(list.wdf().unwrap(), 4);
        assert_eq!(list.termfreq().unwrap(), 3);

        assert!(matches!(set.open_termlist(5), Err(IrisError::NotFound(_))));
    }

    #[test]
    fn test_statistics_are_combined() {
        let first = shard(&[&[("x", 1), ("y", 2)]]);
        let second = shard(&[&[("x", 5)], &[("z", 1)]]);
        let empty = shard(&[]);
        let set = ShardSet::new(vec![first, second, empty]).unwrap();
        assert_eq!(set.collection_size(), 3);
        assert_eq!(set.total_length(), 9);
        assert_eq!(set.doclength_bounds(), (1, 5));
        assert_eq!(set.termfreq("x").unwrap(), 2);
        assert_eq!(set.collection_freq("x").unwrap(), 6);
        assert_eq!(set.wdf_upper_bound("x").unwrap(), 5);
    }
}
