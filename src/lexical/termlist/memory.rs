//! Cursor over the bigram terms of a document that is still being built.

use std::collections::btree_map;

use crate::error::{IrisError, Result};
use crate::lexical::expand::ExpandStats;
use crate::lexical::termlist::entry::{TermEntry, is_bigram};
use crate::lexical::termlist::{
    CursorPhase, TermListCursor, ensure_iterating, ensure_not_at_end,
};

/// Term list of an uncommitted document.
///
/// Only bigram terms are visited. The document is not part of any collection
/// yet, so term frequencies are unavailable.
#[derive(Debug, Clone)]
pub struct MemoryTermList<'a> {
    iter: btree_map::Values<'a, String, TermEntry>,
    current: Option<&'a TermEntry>,
    phase: CursorPhase,
    size: u64,
}

impl<'a> MemoryTermList<'a> {
    pub(crate) fn new(entries: btree_map::Values<'a, String, TermEntry>) -> Self {
        let size = entries.clone().filter(|e| is_bigram(&e.term)).count() as u64;
        MemoryTermList {
            iter: entries,
            current: None,
            phase: CursorPhase::Unstarted,
            size,
        }
    }

    fn uncommitted() -> IrisError {
        IrisError::invalid_operation(
            "can't get term frequency from a document term list which is not associated with a database",
        )
    }

    fn current(&self, operation: &str) -> Result<&'a TermEntry> {
        ensure_iterating(self.phase, operation)?;
        self.current
            .ok_or_else(|| IrisError::invalid_operation(format!("{operation} without a current term")))
    }
}

impl TermListCursor for MemoryTermList<'_> {
    fn phase(&self) -> CursorPhase {
        self.phase
    }

    fn approx_size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> Result<&str> {
        Ok(&self.current("name")?.term)
    }

    fn wdf(&self) -> Result<u32> {
        Ok(self.current("wdf")?.wdf)
    }

    fn termfreq(&mut self) -> Result<u64> {
        ensure_iterating(self.phase, "termfreq")?;
        Err(Self::uncommitted())
    }

    fn advance(&mut self) -> Result<()> {
        ensure_not_at_end(self.phase)?;
        self.current = self.iter.by_ref().find(|e| is_bigram(&e.term));
        self.phase = match self.current {
            Some(_) => CursorPhase::Iterating,
            None => CursorPhase::AtEnd,
        };
        Ok(())
    }

    fn skip_to(&mut self, term: &str) -> Result<()> {
        if self.phase == CursorPhase::Unstarted {
            self.advance()?;
        }
        while let Some(entry) = self.current {
            if entry.term.as_str() >= term {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    fn accumulate_stats(&mut self, _stats: &mut ExpandStats) -> Result<()> {
        ensure_iterating(self.phase, "accumulate_stats")?;
        Err(Self::uncommitted())
    }
}
