//! Per-document term lists.
//!
//! A term list is the sorted `(term, wdf)` list of one document. It can be read
//! from three places, each behind the [`TermListCursor`] trait:
//!
//! - [`MemoryTermList`]: a document still being built ([`DocumentTerms`]),
//!   restricted to bigram terms.
//! - [`PersistedTermList`]: the encoded list stored for a committed document.
//! - [`ShardTermList`]: a cursor from one shard whose term frequency is
//!   rescaled to approximate the whole sharded collection.

pub mod codec;
pub mod entry;
pub mod memory;
pub mod persisted;
pub mod shard;

use std::fmt::Debug;

use crate::error::{IrisError, Result};
use crate::lexical::expand::ExpandStats;

pub use codec::{TermListDecoder, TermListEncoder, TermListHeader, decode_termlist, encode_termlist};
pub use entry::{DocumentTerms, TermEntry, is_bigram};
pub use memory::MemoryTermList;
pub use persisted::PersistedTermList;
pub use shard::{ShardSet, ShardTermList};

/// Position of a cursor within its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// Created, but `advance` has not been called yet.
    Unstarted,
    /// Positioned on an entry.
    Iterating,
    /// Moved past the last entry. Terminal.
    AtEnd,
}

/// Forward-only cursor over a term list.
///
/// A cursor starts before the first entry, so [`advance`](Self::advance) or
/// [`skip_to`](Self::skip_to) must be called before reading the current
/// entry. Accessors fail with [`IrisError::InvalidOperation`] unless the
/// cursor is in [`CursorPhase::Iterating`].
pub trait TermListCursor: Send + Debug {
    /// Current phase of the cursor.
    fn phase(&self) -> CursorPhase;

    /// Number of entries in the list. May be an estimate for some sources.
    fn approx_size(&self) -> u64;

    /// Term at the current position.
    fn name(&self) -> Result<&str>;

    /// Within-document frequency of the current term.
    fn wdf(&self) -> Result<u32>;

    /// Number of documents the current term occurs in.
    ///
    /// Looked up lazily and cached until the cursor moves.
    fn termfreq(&mut self) -> Result<u64>;

    /// Move to the next entry.
    fn advance(&mut self) -> Result<()>;

    /// Move forward to the first entry whose term is `>= term`, or to the end.
    fn skip_to(&mut self, term: &str) -> Result<()>;

    /// Fold the current entry into `stats`.
    fn accumulate_stats(&mut self, stats: &mut ExpandStats) -> Result<()>;

    /// True once the cursor has moved past the last entry.
    fn at_end(&self) -> bool {
        self.phase() == CursorPhase::AtEnd
    }
}

/// Fails unless `phase` is [`CursorPhase::Iterating`].
pub(crate) fn ensure_iterating(phase: CursorPhase, operation: &str) -> Result<()> {
    match phase {
        CursorPhase::Iterating => Ok(()),
        CursorPhase::Unstarted => Err(IrisError::invalid_operation(format!(
            "{operation} called before the term list was started"
        ))),
        CursorPhase::AtEnd => Err(IrisError::invalid_operation(format!(
            "{operation} called after the end of the term list"
        ))),
    }
}

/// Fails if the cursor has already reached the end.
pub(crate) fn ensure_not_at_end(phase: CursorPhase) -> Result<()> {
    if phase == CursorPhase::AtEnd {
        return Err(IrisError::invalid_operation(
            "advance called after the end of the term list",
        ));
    }
    Ok(())
}

/// Iterator adapter over a boxed cursor.
///
/// Yields one [`TermEntry`] per position. After an error the iterator is
/// fused and yields nothing more.
#[derive(Debug)]
pub struct TermIterator<'a> {
    cursor: Box<dyn TermListCursor + 'a>,
    failed: bool,
}

impl<'a> TermIterator<'a> {
    pub fn new(cursor: Box<dyn TermListCursor + 'a>) -> Self {
        TermIterator {
            cursor,
            failed: false,
        }
    }

    /// Position on the first term `>= term` and return it, if any.
    pub fn skip_to(&mut self, term: &str) -> Result<Option<TermEntry>> {
        self.cursor.skip_to(term)?;
        self.current()
    }

    /// Term frequency of the current entry.
    pub fn termfreq(&mut self) -> Result<u64> {
        self.cursor.termfreq()
    }

    /// The underlying cursor.
    pub fn cursor_mut(&mut self) -> &mut (dyn TermListCursor + 'a) {
        self.cursor.as_mut()
    }

    fn current(&self) -> Result<Option<TermEntry>> {
        if self.cursor.phase() != CursorPhase::Iterating {
            return Ok(None);
        }
        Ok(Some(TermEntry::new(self.cursor.name()?, self.cursor.wdf()?)))
    }
}

impl Iterator for TermIterator<'_> {
    type Item = Result<TermEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.at_end() {
            return None;
        }
        let step = self.cursor.advance().and_then(|_| self.current());
        match step {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
