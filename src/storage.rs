//! Access to the table that holds encoded term lists.
//!
//! The paginated key/value table lives outside this crate. [`TermStore`] is
//! the narrow view of it that cursors need; [`MemoryTermStore`] is an
//! in-memory implementation used by tests and tools.

pub mod memory;

use std::fmt::Debug;

use byteorder::{BigEndian, ByteOrder};

use crate::error::Result;

pub use memory::{MemoryTermStore, TermStatistics};

/// Prefix byte for term list keys.
pub const TERMLIST_KEY_PREFIX: u8 = b'T';

/// Read access to stored term lists and the document counts that go with them.
pub trait TermStore: Send + Sync + Debug {
    /// Value stored under exactly `key`, if any.
    fn get_exact_entry(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Number of documents in the store.
    fn doc_count(&self) -> u64;

    /// Number of documents `term` occurs in. Zero if it occurs in none.
    fn term_frequency(&self, term: &str) -> Result<u64>;
}

/// Key under which the term list of `doc_id` is stored.
///
/// Big-endian so keys sort in document order.
pub fn termlist_key(doc_id: u64) -> Vec<u8> {
    let mut key = vec![0u8; 9];
    key[0] = TERMLIST_KEY_PREFIX;
    BigEndian::write_u64(&mut key[1..], doc_id);
    key
}
