//! Cursor over a committed document's encoded term list.

use std::sync::Arc;

use log::trace;

use crate::error::{IrisError, Result};
use crate::lexical::expand::ExpandStats;
use crate::lexical::termlist::codec::TermListDecoder;
use crate::lexical::termlist::{
    CursorPhase, TermListCursor, ensure_iterating, ensure_not_at_end,
};
use crate::storage::{TermStore, termlist_key};

/// Term list read from a [`TermStore`].
///
/// The term frequency is not part of the encoded list, so it is fetched from
/// the store the first time it is asked for at each position.
#[derive(Debug)]
pub struct PersistedTermList {
    store: Arc<dyn TermStore>,
    doc_id: u64,
    decoder: TermListDecoder,
    phase: CursorPhase,
    termfreq: Option<u64>,
}

impl PersistedTermList {
    /// Open the term list of `doc_id`.
    ///
    /// Fails with [`IrisError::NotFound`] if the store has no list for it.
    pub fn open(store: Arc<dyn TermStore>, doc_id: u64) -> Result<Self> {
        let data = store
            .get_exact_entry(&termlist_key(doc_id))?
            .ok_or_else(|| IrisError::not_found(format!("no term list for document {doc_id}")))?;
        let decoder = TermListDecoder::new(data)?;

        Ok(PersistedTermList {
            store,
            doc_id,
            decoder,
            phase: CursorPhase::Unstarted,
            termfreq: None,
        })
    }

    pub fn doc_id(&self) -> u64 {
        self.doc_id
    }

    /// Length of the document, as recorded in the list header.
    pub fn doc_length(&self) -> u64 {
        self.decoder.header().doc_length
    }

    /// Fails with the decoding error if the list turned out to be corrupt.
    fn ensure_intact(&self) -> Result<()> {
        match self.decoder.failure() {
            Some(msg) => Err(IrisError::corrupt_data(format!(
                "term list of document {}: {msg}",
                self.doc_id
            ))),
            None => Ok(()),
        }
    }
}

impl TermListCursor for PersistedTermList {
    fn phase(&self) -> CursorPhase {
        self.phase
    }

    fn approx_size(&self) -> u64 {
        self.decoder.header().entry_count
    }

    fn name(&self) -> Result<&str> {
        self.ensure_intact()?;
        ensure_iterating(self.phase, "name")?;
        Ok(self.decoder.current_term())
    }

    fn wdf(&self) -> Result<u32> {
        self.ensure_intact()?;
        ensure_iterating(self.phase, "wdf")?;
        Ok(self.decoder.current_wdf())
    }

    fn termfreq(&mut self) -> Result<u64> {
        self.ensure_intact()?;
        ensure_iterating(self.phase, "termfreq")?;
        if let Some(termfreq) = self.termfreq {
            return Ok(termfreq);
        }

        let term = self.decoder.current_term();
        let termfreq = self.store.term_frequency(term)?;
        if termfreq == 0 {
            return Err(IrisError::consistency(format!(
                "term {term:?} is in the list of document {} but has term frequency 0",
                self.doc_id
            )));
        }
        trace!("resolved termfreq of {term:?}: {termfreq}");
        self.termfreq = Some(termfreq);
        Ok(termfreq)
    }

    fn advance(&mut self) -> Result<()> {
        self.ensure_intact()?;
        ensure_not_at_end(self.phase)?;
        self.termfreq = None;
        match self.decoder.decode_next() {
            Ok(true) => self.phase = CursorPhase::Iterating,
            Ok(false) => self.phase = CursorPhase::AtEnd,
            Err(e) => {
                // A corrupt list has no further entries.
                self.phase = CursorPhase::AtEnd;
                return Err(e);
            }
        }
        Ok(())
    }

    fn skip_to(&mut self, term: &str) -> Result<()> {
        self.ensure_intact()?;
        self.termfreq = None;
        if self.phase == CursorPhase::Unstarted {
            self.advance()?;
        }
        while self.phase == CursorPhase::Iterating && self.decoder.current_term() < term {
            self.advance()?;
        }
        Ok(())
    }

    fn accumulate_stats(&mut self, stats: &mut ExpandStats) -> Result<()> {
        self.ensure_intact()?;
        ensure_iterating(self.phase, "accumulate_stats")?;
        let termfreq = self.termfreq()?;
        stats.accumulate(
            self.decoder.current_wdf(),
            self.doc_length(),
            termfreq,
            self.store.doc_count(),
        );
        Ok(())
    }
}
