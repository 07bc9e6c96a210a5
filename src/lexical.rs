//! Lexical side of the index: per-document term lists and the scorers that
//! consume them.
//!
//! # Module Structure
//!
//! - `termlist`: encoding of a document's term list and cursors over it
//! - `expand`: statistics accumulated from term lists for query expansion
//! - `weight`: scoring functions and the statistics they subscribe to

pub mod expand;
pub mod termlist;
pub mod weight;

// Re-exports
pub use expand::ExpandStats;
pub use termlist::{TermIterator, TermListCursor};
pub use weight::{StatsSource, Weight};
