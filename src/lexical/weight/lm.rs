//! Unigram language model scorer.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IrisError, Result};
use crate::lexical::weight::stats::{StatsNeeded, WeightStats};
use crate::lexical::weight::Weight;

/// `param1` when nothing else applies.
pub const DEFAULT_PARAM1: f64 = 0.7;
/// `param1` for Jelinek-Mercer and two-stage smoothing of queries of at most
/// two terms.
pub const SHORT_QUERY_PARAM1: f64 = 0.1;
/// `param1` (the prior `mu`) for Dirichlet smoothing.
pub const DIRICHLET_PARAM1: f64 = 2000.0;
/// `param2`, the Dirichlet prior of two-stage smoothing.
pub const DEFAULT_PARAM2: f64 = 2000.0;

const SERIALISED_LEN: usize = 8 + 1 + 8 + 8;

/// How the document model is smoothed with the collection model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingStrategy {
    #[default]
    TwoStage,
    Dirichlet,
    AbsoluteDiscount,
    JelinekMercer,
}

impl SmoothingStrategy {
    fn code(self) -> u8 {
        match self {
            SmoothingStrategy::TwoStage => 1,
            SmoothingStrategy::Dirichlet => 2,
            SmoothingStrategy::AbsoluteDiscount => 3,
            SmoothingStrategy::JelinekMercer => 4,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(SmoothingStrategy::TwoStage),
            2 => Ok(SmoothingStrategy::Dirichlet),
            3 => Ok(SmoothingStrategy::AbsoluteDiscount),
            4 => Ok(SmoothingStrategy::JelinekMercer),
            _ => Err(IrisError::serialisation(format!(
                "unknown smoothing strategy {code}"
            ))),
        }
    }
}

/// Configured parameters of [`LmWeight`].
///
/// `None` means "pick the default when the scorer is initialised", which
/// may depend on the strategy and the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmParams {
    pub log_scale: Option<f64>,
    pub strategy: SmoothingStrategy,
    pub param1: Option<f64>,
    pub param2: Option<f64>,
}

impl LmParams {
    pub fn new(strategy: SmoothingStrategy) -> Self {
        LmParams {
            strategy,
            ..Default::default()
        }
    }

    pub fn with_log_scale(mut self, log_scale: f64) -> Self {
        self.log_scale = Some(log_scale);
        self
    }

    pub fn with_param1(mut self, param1: f64) -> Self {
        self.param1 = Some(param1);
        self
    }

    pub fn with_param2(mut self, param2: f64) -> Self {
        self.param2 = Some(param2);
        self
    }

    /// Resolved `param1` for a query of `query_length` terms.
    fn resolve_param1(&self, query_length: u32) -> f64 {
        match (self.param1, self.strategy) {
            (Some(p), _) => p,
            (None, SmoothingStrategy::JelinekMercer | SmoothingStrategy::TwoStage)
                if query_length <= 2 =>
            {
                SHORT_QUERY_PARAM1
            }
            (None, SmoothingStrategy::Dirichlet) => DIRICHLET_PARAM1,
            (None, _) => DEFAULT_PARAM1,
        }
    }
}

/// Scores a document by the smoothed probability that its language model
/// generates the query term, in the log domain.
///
/// Scores that would be negative are clamped to 0.
#[derive(Debug, Clone)]
pub struct LmWeight {
    params: LmParams,
    log_scale: f64,
    param1: f64,
    param2: f64,
    collection_freq: f64,
    total_collection_terms: f64,
    wdf_upper_bound: u32,
}

impl LmWeight {
    pub const NAME: &'static str = "lm";

    pub fn new(params: LmParams) -> Self {
        LmWeight {
            params,
            log_scale: 0.0,
            param1: 0.0,
            param2: 0.0,
            collection_freq: 0.0,
            total_collection_terms: 0.0,
            wdf_upper_bound: 0,
        }
    }

    /// Parameters as configured, before defaults are filled in.
    pub fn params(&self) -> &LmParams {
        &self.params
    }

    /// `(log_scale, param1, param2)` as resolved by the last `init`.
    pub fn resolved(&self) -> (f64, f64, f64) {
        (self.log_scale, self.param1, self.param2)
    }
}

impl Default for LmWeight {
    fn default() -> Self {
        LmWeight::new(LmParams::default())
    }
}

fn write_param(buf: &mut Vec<u8>, value: Option<f64>) {
    let mut bytes = [0u8; 8];
    LittleEndian::write_f64(&mut bytes, value.unwrap_or(f64::NAN));
    buf.extend_from_slice(&bytes);
}

/// NaN stands for an unset parameter.
fn read_param(bytes: &[u8]) -> Option<f64> {
    let value = LittleEndian::read_f64(bytes);
    (!value.is_nan()).then_some(value)
}

impl Weight for LmWeight {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn stats_needed(&self) -> StatsNeeded {
        let mut needed = StatsNeeded::COLLECTION_SIZE
            | StatsNeeded::AVERAGE_LENGTH
            | StatsNeeded::COLLECTION_FREQ
            | StatsNeeded::WDF
            | StatsNeeded::WDF_MAX
            | StatsNeeded::DOC_LENGTH
            | StatsNeeded::QUERY_LENGTH;
        if self.params.log_scale.is_none() {
            needed |= StatsNeeded::DOC_LENGTH_MAX;
        }
        if self.params.strategy == SmoothingStrategy::AbsoluteDiscount {
            needed |= StatsNeeded::UNIQUE_TERMS;
        }
        needed
    }

    fn init(&mut self, stats: &WeightStats, _factor: f64) -> Result<()> {
        let collection_freq = stats.collection_freq as f64;
        let total_collection_terms = stats.collection_size as f64 * stats.average_length;
        if !(total_collection_terms > 0.0) {
            return Err(IrisError::consistency(format!(
                "collection holds {total_collection_terms} terms"
            )));
        }
        if collection_freq > total_collection_terms {
            return Err(IrisError::consistency(format!(
                "collection frequency {collection_freq} exceeds the {total_collection_terms} terms in the collection"
            )));
        }

        self.collection_freq = collection_freq;
        self.total_collection_terms = total_collection_terms;
        self.wdf_upper_bound = stats.wdf_upper_bound;
        self.log_scale = self
            .params
            .log_scale
            .unwrap_or(stats.doclength_upper_bound as f64);
        self.param1 = self.params.resolve_param1(stats.query_length);
        self.param2 = self.params.param2.unwrap_or(DEFAULT_PARAM2);

        debug!(
            "lm weight initialised: strategy {:?}, log_scale {}, param1 {}, param2 {}",
            self.params.strategy, self.log_scale, self.param1, self.param2
        );
        Ok(())
    }

    fn sum_part(&self, wdf: u32, doc_length: u64) -> f64 {
        self.sum_part_with_unique_terms(wdf, doc_length, 1)
    }

    fn sum_part_with_unique_terms(&self, wdf: u32, doc_length: u64, unique_terms: u64) -> f64 {
        if doc_length == 0 {
            return 0.0;
        }
        let wdf = f64::from(wdf);
        let len = doc_length as f64;
        let p1 = self.param1;
        let p2 = self.param2;
        let weight_collection = self.collection_freq / self.total_collection_terms;
        let weight_document = wdf / len;

        let w = match self.params.strategy {
            SmoothingStrategy::JelinekMercer => {
                p1 * weight_collection + (1.0 - p1) * weight_document
            }
            SmoothingStrategy::Dirichlet => (wdf + p1 * weight_collection) / (len + p1),
            SmoothingStrategy::AbsoluteDiscount => {
                (wdf - p1).max(0.0) / len
                    + p1 * weight_collection * unique_terms as f64 / len
            }
            SmoothingStrategy::TwoStage => {
                (1.0 - p1) * (wdf + p2 * weight_collection) / (len + p2)
                    + p1 * weight_collection
            }
        };

        let score = (w * self.log_scale).ln();
        if score > 0.0 { score } else { 0.0 }
    }

    fn max_part(&self) -> f64 {
        f64::from(self.wdf_upper_bound.max(1))
    }

    fn sum_extra(&self, _doc_length: u64) -> f64 {
        0.0
    }

    fn max_extra(&self) -> f64 {
        0.0
    }

    fn serialise(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SERIALISED_LEN);
        write_param(&mut buf, self.params.log_scale);
        buf.push(self.params.strategy.code());
        write_param(&mut buf, self.params.param1);
        write_param(&mut buf, self.params.param2);
        buf
    }

    fn unserialise(&self, data: &[u8]) -> Result<Box<dyn Weight>> {
        if data.len() != SERIALISED_LEN {
            return Err(IrisError::serialisation(format!(
                "lm parameters are {SERIALISED_LEN} bytes, got {}",
                data.len()
            )));
        }
        let log_scale = read_param(&data[0..8]);
        let strategy = SmoothingStrategy::from_code(data[8])?;
        let param1 = read_param(&data[9..17]);
        let param2 = read_param(&data[17..25]);

        Ok(Box::new(LmWeight::new(LmParams {
            log_scale,
            strategy,
            param1,
            param2,
        })))
    }

    fn clone_box(&self) -> Box<dyn Weight> {
        Box::new(LmWeight::new(self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(query_length: u32) -> WeightStats {
        WeightStats {
            collection_size: 10,
            average_length: 20.0,
            collection_freq: 40,
            doclength_upper_bound: 50,
            wdf_upper_bound: 6,
            query_length,
            ..Default::default()
        }
    }

    fn initialised(params: LmParams) -> LmWeight {
        let mut weight = LmWeight::new(params);
        weight.init(&stats(3), 1.0).unwrap();
        weight
    }

    #[test]
    fn test_defaults_resolved_at_init() {
        let mut weight = LmWeight::default();
        weight.init(&stats(5), 1.0).unwrap();
        assert_eq!(weight.resolved(), (50.0, DEFAULT_PARAM1, DEFAULT_PARAM2));

        weight.init(&stats(2), 1.0).unwrap();
        assert_eq!(weight.resolved().1, SHORT_QUERY_PARAM1);

        let mut weight = LmWeight::new(LmParams::new(SmoothingStrategy::Dirichlet));
        weight.init(&stats(1), 1.0).unwrap();
        assert_eq!(weight.resolved().1, DIRICHLET_PARAM1);

        let mut weight = LmWeight::new(LmParams::new(SmoothingStrategy::AbsoluteDiscount));
        weight.init(&stats(1), 1.0).unwrap();
        assert_eq!(weight.resolved().1, DEFAULT_PARAM1);

        let mut weight = LmWeight::new(
            LmParams::new(SmoothingStrategy::JelinekMercer)
                .with_param1(0.7)
                .with_log_scale(3.0),
        );
        weight.init(&stats(1), 1.0).unwrap();
        assert_eq!(weight.resolved(), (3.0, 0.7, DEFAULT_PARAM2));
    }

    #[test]
    fn test_init_rejects_inconsistent_statistics() {
        let mut weight = LmWeight::default();
        let empty = WeightStats::default();
        assert!(matches!(
            weight.init(&empty, 1.0),
            Err(IrisError::Consistency(_))
        ));

        let too_frequent = WeightStats {
            collection_freq: 201,
            ..stats(1)
        };
        assert!(matches!(
            weight.init(&too_frequent, 1.0),
            Err(IrisError::Consistency(_))
        ));
    }

    #[test]
    fn test_two_stage_matches_jelinek_mercer() {
        let two_stage = initialised(
            LmParams::new(SmoothingStrategy::TwoStage)
                .with_param1(1.0)
                .with_param2(0.0),
        );
        let jelinek_mercer = initialised(
            LmParams::new(SmoothingStrategy::JelinekMercer)
                .with_param1(1.0)
                .with_param2(0.0),
        );
        for doc_length in 1..30u64 {
            for wdf in 0..=doc_length as u32 {
                assert_eq!(
                    two_stage.sum_part(wdf, doc_length),
                    jelinek_mercer.sum_part(wdf, doc_length)
                );
            }
        }
    }

    #[test]
    fn test_zero_smoothing_collapses_strategies() {
        let weights: Vec<LmWeight> = [
            SmoothingStrategy::TwoStage,
            SmoothingStrategy::Dirichlet,
            SmoothingStrategy::AbsoluteDiscount,
            SmoothingStrategy::JelinekMercer,
        ]
        .into_iter()
        .map(|s| initialised(LmParams::new(s).with_param1(0.0).with_param2(0.0)))
        .collect();

        for doc_length in 1..30u64 {
            for wdf in 0..=doc_length as u32 {
                let expected = ((f64::from(wdf) / doc_length as f64) * 50.0).ln().max(0.0);
                for weight in &weights {
                    assert_eq!(weight.sum_part(wdf, doc_length), expected);
                }
            }
        }
    }

    #[test]
    fn test_two_argument_form_uses_one_unique_term() {
        let weight = initialised(LmParams::new(SmoothingStrategy::AbsoluteDiscount));
        assert_eq!(
            weight.sum_part(2, 10),
            weight.sum_part_with_unique_terms(2, 10, 1)
        );
        assert!(weight.sum_part_with_unique_terms(0, 10, 8) > weight.sum_part(0, 10));
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let weight = initialised(LmParams::new(SmoothingStrategy::JelinekMercer).with_log_scale(1.0));
        // Probabilities are below 1 so the log is negative.
        assert_eq!(weight.sum_part(1, 10), 0.0);
        assert_eq!(weight.sum_part(3, 0), 0.0);
    }

    #[test]
    fn test_bounds() {
        let weight = initialised(LmParams::default());
        assert_eq!(weight.max_part(), 6.0);
        assert_eq!(weight.sum_extra(10), 0.0);
        assert_eq!(weight.max_extra(), 0.0);

        let mut weight = LmWeight::default();
        weight
            .init(
                &WeightStats {
                    wdf_upper_bound: 0,
                    ..stats(1)
                },
                1.0,
            )
            .unwrap();
        assert_eq!(weight.max_part(), 1.0);
    }

    #[test]
    fn test_serialise_round_trip() {
        let params = LmParams::new(SmoothingStrategy::Dirichlet).with_param2(3.5);
        let weight = LmWeight::new(params);
        let data = weight.serialise();
        assert_eq!(data.len(), SERIALISED_LEN);
        assert_eq!(data[8], 2);

        let restored = weight.unserialise(&data).unwrap();
        assert_eq!(restored.name(), LmWeight::NAME);
        assert_eq!(restored.serialise(), data);
    }

    #[test]
    fn test_unserialise_rejects_junk() {
        let weight = LmWeight::default();
        let mut data = weight.serialise();
        data.push(0);
        assert!(matches!(
            weight.unserialise(&data),
            Err(IrisError::Serialisation(_))
        ));
        assert!(matches!(
            weight.unserialise(&data[..10]),
            Err(IrisError::Serialisation(_))
        ));

        let mut data = weight.serialise();
        data[8] = 9;
        assert!(matches!(
            weight.unserialise(&data),
            Err(IrisError::Serialisation(_))
        ));
    }

    #[test]
    fn test_clone_box_keeps_unresolved_params() {
        let mut weight = LmWeight::default();
        weight.init(&stats(1), 1.0).unwrap();
        let clone = weight.clone_box();
        assert_eq!(clone.serialise(), LmWeight::default().serialise());
    }
}
