// File: src/config.rs
use crate::core::policy::CorrectionPolicy;
use crate::core::symbols::{SymbolModel, SymbolTables};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Correction prices, budget rule and symbol tables for a
/// [`FuzzyMap`](crate::FuzzyMap), loadable from JSON.
///
/// ```json
/// {
///   "policy": {
///     "price": { "transposition": 0.1, "deletion": 0.2, "substitution": 0.3, "insertion": 1.0 },
///     "max_corrections_relative": 0.66
///   },
///   "symbols": {
///     "probabilities": { "a": 1.0, "b": 0.5 },
///     "distances": [["a", "b", 0.3]]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FuzzyConfig {
    pub policy: CorrectionPolicy,
    pub symbols: SymbolModel,
}

/// On-disk shape; symbol tables are validated after parsing so range errors
/// surface as configuration errors rather than parse errors.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    policy: CorrectionPolicy,
    symbols: SymbolTables,
}

impl FuzzyConfig {
    pub fn new(policy: CorrectionPolicy, symbols: SymbolModel) -> Result<Self> {
        let config = Self { policy, symbols };
        config.validate()?;
        Ok(config)
    }

    /// A built [`SymbolModel`] is always valid, so only the policy needs
    /// checking.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Self::new(file.policy, file.symbols.into_model()?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FuzzyError;

    #[test]
    fn empty_document_gives_defaults() {
        let config = FuzzyConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FuzzyConfig::default());
        assert_eq!(config.policy.price().insertion, 1.0);
        assert_eq!(config.symbols.default_probability(), 1e-5);
    }

    #[test]
    fn reads_full_document() {
        let json = r#"{
            "policy": {
                "price": { "transposition": 0.1, "deletion": 0.2, "substitution": 0.3, "insertion": 1.0 },
                "max_corrections": 2,
                "max_corrections_relative": 0.5
            },
            "symbols": {
                "probabilities": { "a": 1.0, "b": 0.5 },
                "default_probability": 0.01,
                "distances": [["a", "b", 0.3]]
            }
        }"#;
        let config = FuzzyConfig::from_json_str(json).unwrap();
        assert_eq!(config.policy.price().deletion, 0.2);
        assert_eq!(config.policy.budget(6), 3);
        assert_eq!(config.symbols.probability('b'), 0.5);
        assert_eq!(config.symbols.probability('q'), 0.01);
        assert_eq!(config.symbols.distance('b', 'a'), 0.3);
    }

    #[test]
    fn out_of_range_price_is_invalid_configuration() {
        let json = r#"{ "policy": { "price": { "deletion": 4.0 } } }"#;
        assert!(matches!(
            FuzzyConfig::from_json_str(json),
            Err(FuzzyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn out_of_range_probability_is_invalid_configuration() {
        let json = r#"{ "symbols": { "probabilities": { "a": 2.0 } } }"#;
        assert!(matches!(
            FuzzyConfig::from_json_str(json),
            Err(FuzzyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            FuzzyConfig::from_json_str("{ policy"),
            Err(FuzzyError::ConfigParse(_))
        ));
    }
}
