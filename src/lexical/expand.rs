//! Running totals gathered from term lists during query expansion.

/// Default `k` of the wdf multiplier.
pub const DEFAULT_EXPAND_K: f64 = 1.0;

/// Statistics folded together from every term list that contains a candidate
/// expansion term.
///
/// Document count and term frequency are counted once per shard, so
/// visiting several documents of the same shard does not inflate them.
#[derive(Debug, Clone)]
pub struct ExpandStats {
    /// Number of visited lists containing the term.
    pub rtermfreq: u64,
    /// Sum of the term's wdf over visited lists.
    pub rcollection_freq: u64,
    /// Term frequency, summed over the shards seen.
    pub termfreq: u64,
    /// Document count, summed over the shards seen.
    pub doc_count: u64,
    /// Sum of `(k + 1) * wdf / (k * doclen / avlen + wdf)`.
    pub multiplier: f64,
    average_length: f64,
    expand_k: f64,
    shard_index: usize,
    shards_seen: Vec<bool>,
}

impl ExpandStats {
    /// Create empty totals for a collection whose average document length
    /// is `average_length`.
    pub fn new(average_length: f64) -> Self {
        ExpandStats {
            rtermfreq: 0,
            rcollection_freq: 0,
            termfreq: 0,
            doc_count: 0,
            multiplier: 0.0,
            average_length,
            expand_k: DEFAULT_EXPAND_K,
            shard_index: 0,
            shards_seen: Vec::new(),
        }
    }

    pub fn with_expand_k(mut self, expand_k: f64) -> Self {
        self.expand_k = expand_k;
        self
    }

    /// Shard the following calls to [`accumulate`](Self::accumulate) come from.
    pub fn set_shard(&mut self, shard_index: usize) {
        self.shard_index = shard_index;
    }

    pub fn shard(&self) -> usize {
        self.shard_index
    }

    /// Fold one term list entry into the totals.
    ///
    /// `termfreq` and `doc_count` are the values of the shard the entry came
    /// from; they are only added the first time that shard is seen.
    pub fn accumulate(&mut self, wdf: u32, doc_length: u64, termfreq: u64, doc_count: u64) {
        self.rcollection_freq += u64::from(wdf);
        let wdf = f64::from(wdf.max(1));
        let normalised_length = if self.average_length > 0.0 {
            doc_length as f64 / self.average_length
        } else {
            1.0
        };
        self.multiplier +=
            (self.expand_k + 1.0) * wdf / (self.expand_k * normalised_length + wdf);
        self.rtermfreq += 1;

        if self.shards_seen.len() <= self.shard_index {
            self.shards_seen.resize(self.shard_index + 1, false);
        }
        if !self.shards_seen[self.shard_index] {
            self.shards_seen[self.shard_index] = true;
            self.doc_count += doc_count;
            self.termfreq += termfreq;
        }
    }

    /// Reset the totals for the next candidate term.
    pub fn clear(&mut self) {
        self.rtermfreq = 0;
        self.rcollection_freq = 0;
        self.termfreq = 0;
        self.doc_count = 0;
        self.multiplier = 0.0;
        self.shard_index = 0;
        self.shards_seen.clear();
    }
}
