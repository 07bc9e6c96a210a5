//! Scorer configuration and lookup by name.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrisError, Result};
use crate::lexical::weight::Weight;
use crate::lexical::weight::bm25::{Bm25Params, Bm25Weight};
use crate::lexical::weight::lm::{LmParams, LmWeight};

/// Scorer choice and parameters, as read from a configuration file.
///
/// ```json
/// { "type": "lm", "options": { "strategy": "dirichlet", "param1": 1500.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum WeightConfig {
    /// Unigram language model.
    Lm(LmParams),
    /// Okapi BM25.
    Bm25(Bm25Params),
}

impl Default for WeightConfig {
    fn default() -> Self {
        WeightConfig::Bm25(Bm25Params::default())
    }
}

impl WeightConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Create an uninitialised scorer.
    pub fn build(&self) -> Result<Box<dyn Weight>> {
        match self {
            WeightConfig::Lm(params) => Ok(Box::new(LmWeight::new(*params))),
            WeightConfig::Bm25(params) => Ok(Box::new(Bm25Weight::new(*params)?)),
        }
    }
}

/// Scorer prototypes by name, used to rebuild a scorer from its name and
/// serialised parameters.
#[derive(Debug, Default)]
pub struct WeightRegistry {
    prototypes: AHashMap<&'static str, Box<dyn Weight>>,
}

impl WeightRegistry {
    /// Registry with no scorers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry knowing the scorers of this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LmWeight::default()));
        registry.register(Box::new(Bm25Weight::default()));
        registry
    }

    /// Add `prototype` under its name, replacing any earlier one.
    pub fn register(&mut self, prototype: Box<dyn Weight>) {
        self.prototypes.insert(prototype.name(), prototype);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Weight> {
        self.prototypes.get(name).map(|w| w.as_ref())
    }

    /// Rebuild the scorer called `name` from `data`.
    pub fn unserialise(&self, name: &str, data: &[u8]) -> Result<Box<dyn Weight>> {
        let prototype = self
            .get(name)
            .ok_or_else(|| IrisError::not_found(format!("unknown weighting scheme {name:?}")))?;
        prototype.unserialise(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::weight::lm::SmoothingStrategy;

    #[test]
    fn test_config_from_json() {
        let config = WeightConfig::from_json(
            r#"{"type": "lm", "options": {"strategy": "dirichlet", "param1": 1500.0}}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            WeightConfig::Lm(LmParams::new(SmoothingStrategy::Dirichlet).with_param1(1500.0))
        );
        assert_eq!(config.build().unwrap().name(), LmWeight::NAME);

        let config = WeightConfig::from_json(r#"{"type": "bm25", "options": {"k1": 1.2}}"#).unwrap();
        let WeightConfig::Bm25(params) = &config else {
            panic!("expected bm25, got {config:?}");
        };
        assert_eq!(params.k1, 1.2);
        assert_eq!(params.b, 0.5);

        let json = config.to_json().unwrap();
        assert_eq!(WeightConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            WeightConfig::from_json(r#"{"type": "tfidf", "options": {}}"#),
            Err(IrisError::Json(_))
        ));
        let bad = WeightConfig::Bm25(Bm25Params::new(1.0, 0.0, 1.0, 2.0, 0.5));
        assert!(matches!(bad.build(), Err(IrisError::InvalidArgument(_))));
    }

    #[test]
    fn test_registry_round_trip() {
        let registry = WeightRegistry::with_builtin();
        let weight = WeightConfig::Lm(LmParams::new(SmoothingStrategy::JelinekMercer).with_param1(0.4))
            .build()
            .unwrap();
        let restored = registry.unserialise(weight.name(), &weight.serialise()).unwrap();
        assert_eq!(restored.serialise(), weight.serialise());

        assert!(matches!(
            registry.unserialise("tfidf", &[]),
            Err(IrisError::NotFound(_))
        ));
        assert!(WeightRegistry::new().get(Bm25Weight::NAME).is_none());
    }
}
