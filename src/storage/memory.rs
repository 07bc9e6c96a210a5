//! In-memory term store.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;
use parking_lot::RwLock;

use crate::error::{IrisError, Result};
use crate::lexical::termlist::codec::encode_termlist;
use crate::lexical::termlist::entry::DocumentTerms;
use crate::lexical::weight::StatsSource;
use crate::storage::{TermStore, termlist_key};

/// Collection-wide counts for one term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStatistics {
    /// Number of documents containing the term.
    pub termfreq: u64,
    /// Total occurrences of the term across all documents.
    pub collection_freq: u64,
    /// Largest wdf of the term in any document.
    pub wdf_upper_bound: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    terms: AHashMap<String, TermStatistics>,
    doc_lengths: BTreeMap<u64, u64>,
    total_length: u64,
}

impl StoreState {
    fn insert(&mut self, doc_id: u64, doc: &DocumentTerms, encoded: Vec<u8>) {
        let doc_length = doc.doc_length();
        for entry in doc.iter() {
            let stats = self.terms.entry(entry.term.clone()).or_default();
            stats.termfreq += 1;
            stats.collection_freq += entry.wdf as u64;
            stats.wdf_upper_bound = stats.wdf_upper_bound.max(entry.wdf);
        }
        self.entries.insert(termlist_key(doc_id), encoded);
        self.doc_lengths.insert(doc_id, doc_length);
        self.total_length += doc_length;

        debug!(
            "stored term list for document {doc_id}: {} terms, length {doc_length}",
            doc.len()
        );
    }
}

/// Thread-safe in-memory table of encoded term lists plus the aggregate
/// statistics a committed collection would keep alongside them.
#[derive(Debug, Default)]
pub struct MemoryTermStore {
    state: RwLock<StoreState>,
}

impl MemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `doc` under the next free document id and return that id.
    ///
    /// Ids start at 1.
    pub fn add_document(&self, doc: &DocumentTerms) -> Result<u64> {
        let encoded = encode_termlist(doc.doc_length(), doc.iter())?;
        let mut state = self.state.write();
        let doc_id = state.doc_lengths.keys().next_back().map_or(1, |last| last + 1);
        state.insert(doc_id, doc, encoded);
        Ok(doc_id)
    }

    /// Commit `doc` under `doc_id`.
    pub fn put_document(&self, doc_id: u64, doc: &DocumentTerms) -> Result<()> {
        if doc_id == 0 {
            return Err(IrisError::invalid_argument("document id 0 is reserved"));
        }

        let encoded = encode_termlist(doc.doc_length(), doc.iter())?;
        let mut state = self.state.write();
        if state.doc_lengths.contains_key(&doc_id) {
            return Err(IrisError::invalid_argument(format!(
                "document {doc_id} already exists"
            )));
        }
        state.insert(doc_id, doc, encoded);
        Ok(())
    }

    /// Store raw bytes under `key`, bypassing encoding and statistics.
    pub fn set_entry(&self, key: Vec<u8>, value: Vec<u8>) {
        self.state.write().entries.insert(key, value);
    }

    /// Collection-wide counts for `term`, if any document contains it.
    pub fn term_statistics(&self, term: &str) -> Option<TermStatistics> {
        self.state.read().terms.get(term).copied()
    }

    /// Length of `doc_id`, if stored.
    pub fn doc_length(&self, doc_id: u64) -> Option<u64> {
        self.state.read().doc_lengths.get(&doc_id).copied()
    }
}

impl TermStore for MemoryTermStore {
    fn get_exact_entry(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.state.read().entries.get(key).cloned())
    }

    fn doc_count(&self) -> u64 {
        self.state.read().doc_lengths.len() as u64
    }

    fn term_frequency(&self, term: &str) -> Result<u64> {
        Ok(self.term_statistics(term).map_or(0, |s| s.termfreq))
    }
}

impl StatsSource for MemoryTermStore {
    fn collection_size(&self) -> u64 {
        self.doc_count()
    }

    fn total_length(&self) -> u64 {
        self.state.read().total_length
    }

    fn doclength_bounds(&self) -> (u64, u64) {
        let state = self.state.read();
        let lower = state.doc_lengths.values().copied().min().unwrap_or(0);
        let upper = state.doc_lengths.values().copied().max().unwrap_or(0);
        (lower, upper)
    }

    fn termfreq(&self, term: &str) -> Result<u64> {
        self.term_frequency(term)
    }

    fn collection_freq(&self, term: &str) -> Result<u64> {
        Ok(self.term_statistics(term).map_or(0, |s| s.collection_freq))
    }

    fn wdf_upper_bound(&self, term: &str) -> Result<u32> {
        Ok(self.term_statistics(term).map_or(0, |s| s.wdf_upper_bound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, u32)]) -> DocumentTerms {
        pairs.iter().map(|(t, w)| (*t, *w)).collect()
    }

    #[test]
    fn test_add_document_updates_statistics() {
        let store = MemoryTermStore::new();
        let first = store
            .add_document(&doc(&[("apple", 2), ("banana", 1)]))
            .unwrap();
        let second = store
            .add_document(&doc(&[("apple", 5), ("cherry", 3)]))
            .unwrap();
        assert_eq!((first, second), (1, 2));

        assert_eq!(store.doc_count(), 2);
        assert_eq!(store.total_length(), 11);
        assert_eq!(store.doclength_bounds(), (3, 8));
        assert_eq!(
            store.term_statistics("apple"),
            Some(TermStatistics {
                termfreq: 2,
                collection_freq: 7,
                wdf_upper_bound: 5,
            })
        );
        assert_eq!(store.term_frequency("missing").unwrap(), 0);
        assert!(store.get_exact_entry(&termlist_key(1)).unwrap().is_some());
        assert!(store.get_exact_entry(&termlist_key(3)).unwrap().is_none());
    }

    #[test]
    fn test_put_document_rejects_duplicates() {
        let store = MemoryTermStore::new();
        store.put_document(4, &doc(&[("a", 1)])).unwrap();
        assert!(store.put_document(4, &doc(&[("b", 1)])).is_err());
        assert!(store.put_document(0, &doc(&[("b", 1)])).is_err());
        assert_eq!(store.add_document(&doc(&[("c", 1)])).unwrap(), 5);
    }

    #[test]
    fn test_empty_store_bounds() {
        let store = MemoryTermStore::new();
        assert_eq!(store.doclength_bounds(), (0, 0));
        assert_eq!(store.collection_size(), 0);
    }
}
