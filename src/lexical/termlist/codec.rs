//! Binary encoding of a document's term list.
//!
//! Layout:
//!
//! ```text
//! [doc_length: varint][entry_count: varint] entry*
//!
//! first entry: [term_len: u8][term bytes][wdf: varint]
//! later entry: [reuse: u8][suffix_len: u8][suffix bytes][wdf: varint]?
//! ```
//!
//! Terms are front-coded against the previous term. When
//! `(wdf + 1) * (prev_len + 1) + reuse` fits in a byte the wdf is folded into
//! the reuse byte and the trailing varint is omitted. A reuse byte greater
//! than `prev_len` can only be a packed one, which is how the decoder tells
//! the two forms apart.

use log::trace;

use crate::error::{IrisError, Result};
use crate::lexical::termlist::entry::TermEntry;
use crate::util::varint;

/// Longest term representable in the one-byte length fields.
pub const MAX_TERM_LENGTH: usize = u8::MAX as usize;

/// The fixed fields at the start of an encoded term list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermListHeader {
    /// Length of the document (sum of wdfs).
    pub doc_length: u64,
    /// Number of entries in the list.
    pub entry_count: u64,
}

/// Length of the byte prefix shared by `a` and `b`.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Builds an encoded term list from entries supplied in sorted order.
#[derive(Debug)]
pub struct TermListEncoder {
    doc_length: u64,
    entry_count: u64,
    body: Vec<u8>,
    prev_term: Option<String>,
}

impl TermListEncoder {
    pub fn new(doc_length: u64) -> Self {
        TermListEncoder {
            doc_length,
            entry_count: 0,
            body: Vec::new(),
            prev_term: None,
        }
    }

    /// Append the next entry.
    ///
    /// Terms must be non-empty, at most [`MAX_TERM_LENGTH`] bytes and strictly
    /// greater than the previous term.
    pub fn push(&mut self, term: &str, wdf: u32) -> Result<()> {
        if term.is_empty() {
            return Err(IrisError::invalid_argument("empty term in term list"));
        }
        if term.len() > MAX_TERM_LENGTH {
            return Err(IrisError::invalid_argument(format!(
                "term of {} bytes exceeds the {MAX_TERM_LENGTH} byte limit",
                term.len()
            )));
        }

        match self.prev_term.as_deref() {
            None => {
                self.body.push(term.len() as u8);
                self.body.extend_from_slice(term.as_bytes());
                varint::write_u64(&mut self.body, wdf as u64);
            }
            Some(prev) => {
                if term.as_bytes() <= prev.as_bytes() {
                    return Err(IrisError::invalid_argument(format!(
                        "term list not strictly increasing: {term:?} after {prev:?}"
                    )));
                }

                let reuse = common_prefix_len(prev.as_bytes(), term.as_bytes());
                let divisor = prev.len() as u64 + 1;
                let packed = (wdf as u64 + 1) * divisor + reuse as u64;
                let wdf_in_reuse = packed <= u8::MAX as u64;

                if wdf_in_reuse {
                    self.body.push(packed as u8);
                } else {
                    self.body.push(reuse as u8);
                }
                self.body.push((term.len() - reuse) as u8);
                self.body.extend_from_slice(&term.as_bytes()[reuse..]);
                if !wdf_in_reuse {
                    varint::write_u64(&mut self.body, wdf as u64);
                }
            }
        }

        self.entry_count += 1;
        self.prev_term = Some(term.to_string());
        Ok(())
    }

    /// Finish the list and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 20);
        varint::write_u64(&mut out, self.doc_length);
        varint::write_u64(&mut out, self.entry_count);
        out.extend_from_slice(&self.body);
        out
    }
}

/// Encode a complete term list.
pub fn encode_termlist<'a, I>(doc_length: u64, entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a TermEntry>,
{
    let mut encoder = TermListEncoder::new(doc_length);
    for entry in entries {
        encoder.push(&entry.term, entry.wdf)?;
    }
    Ok(encoder.finish())
}

/// Sequential decoder over an encoded term list.
#[derive(Debug, Clone)]
pub struct TermListDecoder {
    data: Vec<u8>,
    pos: usize,
    header: TermListHeader,
    decoded: u64,
    started: bool,
    current_term: String,
    current_wdf: u32,
    failure: Option<String>,
}

impl TermListDecoder {
    /// Read the header of `data` and position before the first entry.
    ///
    /// An empty buffer is a valid list with no entries and zero length.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let mut pos = 0;
        let mut header = TermListHeader::default();

        if !data.is_empty() {
            let (doc_length, read) = varint::decode_u64(&data)
                .map_err(|e| IrisError::corrupt_data(format!("doc length in term list: {e}")))?;
            pos += read;
            let (entry_count, read) = varint::decode_u64(&data[pos..])
                .map_err(|e| IrisError::corrupt_data(format!("list size in term list: {e}")))?;
            pos += read;
            header = TermListHeader {
                doc_length,
                entry_count,
            };
        }

        Ok(TermListDecoder {
            data,
            pos,
            header,
            decoded: 0,
            started: false,
            current_term: String::new(),
            current_wdf: 0,
            failure: None,
        })
    }

    pub fn header(&self) -> TermListHeader {
        self.header
    }

    /// True once every entry has been decoded.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn current_term(&self) -> &str {
        &self.current_term
    }

    pub fn current_wdf(&self) -> u32 {
        self.current_wdf
    }

    /// Message of the corruption that stopped decoding, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Decode the next entry. Returns false when the list is exhausted.
    ///
    /// Running out of data before `entry_count` entries have been read is
    /// reported as corruption. Once an entry fails to decode, every later
    /// call fails with the same error and the current entry is cleared.
    pub fn decode_next(&mut self) -> Result<bool> {
        if let Some(msg) = &self.failure {
            return Err(IrisError::corrupt_data(msg.clone()));
        }
        self.decode_entry().map_err(|e| {
            let msg = match &e {
                IrisError::CorruptData(msg) => msg.clone(),
                other => other.to_string(),
            };
            self.failure = Some(msg);
            self.current_term.clear();
            self.current_wdf = 0;
            e
        })
    }

    fn decode_entry(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            if self.decoded < self.header.entry_count {
                return Err(IrisError::corrupt_data(format!(
                    "term list ended after {} of {} entries",
                    self.decoded, self.header.entry_count
                )));
            }
            return Ok(false);
        }

        let mut term = std::mem::take(&mut self.current_term).into_bytes();
        let mut wdf_in_reuse = false;

        if self.started {
            let mut reuse = self.read_byte("reuse length")? as usize;
            if reuse > term.len() {
                wdf_in_reuse = true;
                let divisor = term.len() + 1;
                self.current_wdf = (reuse / divisor - 1) as u32;
                reuse %= divisor;
            }
            term.truncate(reuse);
        }

        let append_len = self.read_byte("suffix length")? as usize;
        let end = self.pos + append_len;
        if end > self.data.len() {
            return Err(IrisError::corrupt_data("too little data for term suffix"));
        }
        term.extend_from_slice(&self.data[self.pos..end]);
        self.pos = end;

        if !wdf_in_reuse {
            let (wdf, read) = varint::decode_u32(&self.data[self.pos..])
                .map_err(|e| IrisError::corrupt_data(format!("wdf in term list: {e}")))?;
            self.pos += read;
            self.current_wdf = wdf;
        }

        self.current_term = String::from_utf8(term)
            .map_err(|_| IrisError::corrupt_data("term in term list is not valid UTF-8"))?;
        self.started = true;
        self.decoded += 1;
        trace!(
            "decoded term {:?} wdf={} packed={}",
            self.current_term, self.current_wdf, wdf_in_reuse
        );
        Ok(true)
    }

    fn read_byte(&mut self, what: &str) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| IrisError::corrupt_data(format!("too little data for {what}")))?;
        self.pos += 1;
        Ok(byte)
    }
}

/// Decode a whole encoded list into its header and entries.
pub fn decode_termlist(data: &[u8]) -> Result<(TermListHeader, Vec<TermEntry>)> {
    let mut decoder = TermListDecoder::new(data.to_vec())?;
    let mut entries = Vec::new();
    while decoder.decode_next()? {
        entries.push(TermEntry::new(decoder.current_term(), decoder.current_wdf()));
    }
    Ok((decoder.header(), entries))
}
