//! Okapi BM25 scorer.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IrisError, Result};
use crate::lexical::weight::stats::{StatsNeeded, WeightStats};
use crate::lexical::weight::Weight;

const SERIALISED_LEN: usize = 5 * 8;

/// Parameters of [`Bm25Weight`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// wdf saturation.
    pub k1: f64,
    /// Weight of the document length correction.
    pub k2: f64,
    /// wqf saturation.
    pub k3: f64,
    /// Strength of document length normalisation, in `[0, 1]`.
    pub b: f64,
    /// Floor for the normalised document length.
    pub min_normlen: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k1: 1.0,
            k2: 0.0,
            k3: 1.0,
            b: 0.5,
            min_normlen: 0.5,
        }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, k2: f64, k3: f64, b: f64, min_normlen: f64) -> Self {
        Bm25Params {
            k1,
            k2,
            k3,
            b,
            min_normlen,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            ("k1", self.k1),
            ("k2", self.k2),
            ("k3", self.k3),
            ("b", self.b),
            ("min_normlen", self.min_normlen),
        ];
        for (name, value) in values {
            if !(value >= 0.0) {
                return Err(IrisError::invalid_argument(format!(
                    "bm25 parameter {name} must be non-negative, got {value}"
                )));
            }
        }
        if self.b > 1.0 {
            return Err(IrisError::invalid_argument(format!(
                "bm25 parameter b must be at most 1, got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// Probabilistic relevance scorer.
#[derive(Debug, Clone)]
pub struct Bm25Weight {
    params: Bm25Params,
    termweight: f64,
    len_factor: f64,
    query_length: u32,
    doclength_lower_bound: u64,
    wdf_upper_bound: u32,
}

impl Bm25Weight {
    pub const NAME: &'static str = "bm25";

    pub fn new(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Bm25Weight {
            params,
            termweight: 0.0,
            len_factor: 0.0,
            query_length: 0,
            doclength_lower_bound: 0,
            wdf_upper_bound: 0,
        })
    }

    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    fn normalised_length(&self, doc_length: u64) -> f64 {
        (doc_length as f64 * self.len_factor).max(self.params.min_normlen)
    }
}

impl Default for Bm25Weight {
    fn default() -> Self {
        Bm25Weight {
            params: Bm25Params::default(),
            termweight: 0.0,
            len_factor: 0.0,
            query_length: 0,
            doclength_lower_bound: 0,
            wdf_upper_bound: 0,
        }
    }
}

impl Weight for Bm25Weight {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn stats_needed(&self) -> StatsNeeded {
        StatsNeeded::COLLECTION_SIZE
            | StatsNeeded::RSET_SIZE
            | StatsNeeded::TERMFREQ
            | StatsNeeded::RELTERMFREQ
            | StatsNeeded::WDF
            | StatsNeeded::WQF
            | StatsNeeded::WDF_MAX
            | StatsNeeded::DOC_LENGTH
            | StatsNeeded::DOC_LENGTH_MIN
            | StatsNeeded::AVERAGE_LENGTH
            | StatsNeeded::QUERY_LENGTH
    }

    fn init(&mut self, stats: &WeightStats, factor: f64) -> Result<()> {
        let Bm25Params { k1, k2, k3, b, .. } = self.params;

        self.query_length = stats.query_length;
        self.doclength_lower_bound = stats.doclength_lower_bound;
        self.wdf_upper_bound = stats.wdf_upper_bound;
        self.len_factor = if stats.average_length <= 0.0 || (k2 == 0.0 && (b == 0.0 || k1 == 0.0)) {
            0.0
        } else {
            1.0 / stats.average_length
        };

        let n = stats.collection_size as f64;
        let tf = stats.termfreq as f64;
        let mut tw = if stats.rset_size != 0 {
            let r = stats.reltermfreq as f64;
            let rset = stats.rset_size as f64;
            ((r + 0.5) * (n - rset - tf + r + 0.5)) / ((rset - r + 0.5) * (tf - r + 0.5))
        } else {
            (n - tf + 0.5) / (tf + 0.5)
        };
        if !(tw > 0.0) {
            return Err(IrisError::consistency(format!(
                "term weight {tw} from termfreq {} in a collection of {}",
                stats.termfreq, stats.collection_size
            )));
        }
        // Common terms still get a small positive weight.
        if tw < 2.0 {
            tw = tw * 0.5 + 1.0;
        }

        let mut termweight = tw.ln() * factor;
        if k3 != 0.0 {
            let wqf = f64::from(stats.wqf);
            termweight *= (k3 + 1.0) * wqf / (k3 + wqf);
        }
        self.termweight = termweight * (k1 + 1.0);

        debug!(
            "bm25 weight initialised: termweight {}, len_factor {}",
            self.termweight, self.len_factor
        );
        Ok(())
    }

    fn sum_part(&self, wdf: u32, doc_length: u64) -> f64 {
        let Bm25Params { k1, b, .. } = self.params;
        let wdf = f64::from(wdf);
        let normlen = self.normalised_length(doc_length);
        let denom = k1 * (normlen * b + (1.0 - b)) + wdf;
        if denom == 0.0 {
            return 0.0;
        }
        self.termweight * (wdf / denom)
    }

    fn max_part(&self) -> f64 {
        let Bm25Params { k1, b, .. } = self.params;
        let wdf_max = f64::from(self.wdf_upper_bound);
        let mut denom = k1;
        if k1 != 0.0 && b != 0.0 {
            denom *= self.normalised_length(self.doclength_lower_bound) * b + (1.0 - b);
        }
        denom += wdf_max;
        if denom == 0.0 {
            return 0.0;
        }
        self.termweight * (wdf_max / denom)
    }

    fn sum_extra(&self, doc_length: u64) -> f64 {
        let num = 2.0 * self.params.k2 * f64::from(self.query_length);
        num / (1.0 + self.normalised_length(doc_length))
    }

    fn max_extra(&self) -> f64 {
        let num = 2.0 * self.params.k2 * f64::from(self.query_length);
        num / (1.0 + self.params.min_normlen)
    }

    fn serialise(&self) -> Vec<u8> {
        let Bm25Params {
            k1,
            k2,
            k3,
            b,
            min_normlen,
        } = self.params;
        let mut buf = vec![0u8; SERIALISED_LEN];
        LittleEndian::write_f64_into(&[k1, k2, k3, b, min_normlen], &mut buf);
        buf
    }

    fn unserialise(&self, data: &[u8]) -> Result<Box<dyn Weight>> {
        if data.len() != SERIALISED_LEN {
            return Err(IrisError::serialisation(format!(
                "bm25 parameters are {SERIALISED_LEN} bytes, got {}",
                data.len()
            )));
        }
        let mut values = [0f64; 5];
        LittleEndian::read_f64_into(data, &mut values);
        let [k1, k2, k3, b, min_normlen] = values;
        let weight = Bm25Weight::new(Bm25Params::new(k1, k2, k3, b, min_normlen))
            .map_err(|e| IrisError::serialisation(format!("bad bm25 parameters: {e}")))?;
        Ok(Box::new(weight))
    }

    fn clone_box(&self) -> Box<dyn Weight> {
        Box::new(Bm25Weight {
            params: self.params,
            ..Default::default()
        })
    }
}
