//! Term entries and the per-document term map used while a document is built.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::lexical::termlist::memory::MemoryTermList;

/// Separator between the two words of a bigram term.
pub const BIGRAM_SEPARATOR: char = ' ';

/// Returns true if `term` is a bigram, i.e. has a separator with a word on each side.
pub fn is_bigram(term: &str) -> bool {
    let bytes = term.as_bytes();
    bytes.len() >= 3
        && bytes[1..bytes.len() - 1]
            .iter()
            .any(|&b| b == BIGRAM_SEPARATOR as u8)
}

/// A term and its within-document frequency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TermEntry {
    /// The term text.
    pub term: String,
    /// Number of occurrences of the term in the document.
    pub wdf: u32,
}

impl TermEntry {
    pub fn new(term: impl Into<String>, wdf: u32) -> Self {
        TermEntry {
            term: term.into(),
            wdf,
        }
    }

    /// Increase the wdf, saturating at `u32::MAX`.
    pub fn inc_wdf(&mut self, inc: u32) {
        self.wdf = self.wdf.saturating_add(inc);
    }

    /// Decrease the wdf. Never goes below zero.
    pub fn dec_wdf(&mut self, dec: u32) {
        self.wdf = self.wdf.saturating_sub(dec);
    }

    /// The first word of a bigram term, or the whole term otherwise.
    pub fn first_term(&self) -> &str {
        self.term
            .split(BIGRAM_SEPARATOR)
            .find(|word| !word.is_empty())
            .unwrap_or("")
    }
}

/// Terms of a document that has not been committed yet.
///
/// Entries are kept sorted by byte order of the term, which is the order the
/// encoded list uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTerms {
    terms: BTreeMap<String, TermEntry>,
}

impl DocumentTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `wdf_inc` occurrences of `term`, creating the entry if needed.
    pub fn add_term(&mut self, term: &str, wdf_inc: u32) {
        self.terms
            .entry(term.to_string())
            .or_insert_with(|| TermEntry::new(term, 0))
            .inc_wdf(wdf_inc);
    }

    /// Remove `wdf_dec` occurrences of `term`.
    ///
    /// The entry stays in the map with a wdf clamped at zero. Returns false if
    /// the term was not present.
    pub fn remove_term(&mut self, term: &str, wdf_dec: u32) -> bool {
        match self.terms.get_mut(term) {
            Some(entry) => {
                entry.dec_wdf(wdf_dec);
                true
            }
            None => false,
        }
    }

    /// Drop `term` from the document entirely.
    pub fn delete_term(&mut self, term: &str) -> Option<TermEntry> {
        self.terms.remove(term)
    }

    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    /// Sum of all wdfs.
    pub fn doc_length(&self) -> u64 {
        self.terms.values().map(|e| e.wdf as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, TermEntry> {
        self.terms.values()
    }

    /// Cursor over the bigram terms of this document.
    pub fn termlist(&self) -> MemoryTermList<'_> {
        MemoryTermList::new(self.terms.values())
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for DocumentTerms {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut doc = DocumentTerms::new();
        for (term, wdf) in iter {
            let term = term.into();
            doc.add_term(&term, wdf);
        }
        doc
    }
}
