//! # Iris term lists
//!
//! Per-document term lists for the Iris search library.
//!
//! ## Features
//!
//! - Compact front-coded encoding of a document's sorted `(term, wdf)` list
//! - Cursors over lists under construction, stored lists and sharded collections
//! - Lazy, cached term frequency lookup
//! - Expansion statistics accumulated from term lists
//! - Unigram language model and BM25 scorers with subscribed statistics

mod error;
pub mod lexical;
pub mod storage;
pub mod util;

// Re-exports for the public API
pub use error::{IrisError, Result};
pub use lexical::expand::ExpandStats;
pub use lexical::termlist::{
    CursorPhase, DocumentTerms, MemoryTermList, PersistedTermList, ShardSet, ShardTermList,
    TermEntry, TermIterator, TermListCursor,
};
pub use lexical::weight::{
    Bm25Params, Bm25Weight, LmParams, LmWeight, QueryTermInfo, SmoothingStrategy, StatsNeeded,
    StatsSource, Weight, WeightConfig, WeightRegistry, WeightStats, score_document,
};
pub use storage::{MemoryTermStore, TermStore};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
