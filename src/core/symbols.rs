// File: src/core/symbols.rs
use crate::core::policy::check_unit;
use crate::error::{FuzzyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SYMBOL_PROBABILITY: f64 = 1e-5;
pub const DEFAULT_SYMBOL_DISTANCE: f64 = 1.0;

/// Per-character probabilities and pairwise character distances.
///
/// Distances are stored under the ordered pair `(min, max)`, so the lookup is
/// symmetric by construction; `distance(c, c)` is always zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SymbolTables", into = "SymbolTables")]
pub struct SymbolModel {
    probabilities: BTreeMap<char, f64>,
    default_probability: f64,
    distances: BTreeMap<(char, char), f64>,
    default_distance: f64,
}

impl Default for SymbolModel {
    fn default() -> Self {
        Self {
            probabilities: BTreeMap::new(),
            default_probability: DEFAULT_SYMBOL_PROBABILITY,
            distances: BTreeMap::new(),
            default_distance: DEFAULT_SYMBOL_DISTANCE,
        }
    }
}

fn ordered(a: char, b: char) -> (char, char) {
    if a <= b { (a, b) } else { (b, a) }
}

impl SymbolModel {
    pub fn builder() -> SymbolModelBuilder {
        SymbolModelBuilder::default()
    }

    pub fn probability(&self, c: char) -> f64 {
        self.probabilities.get(&c).copied().unwrap_or(self.default_probability)
    }

    pub fn distance(&self, a: char, b: char) -> f64 {
        if a == b {
            return 0.0;
        }
        self.distances.get(&ordered(a, b)).copied().unwrap_or(self.default_distance)
    }

    /// Natural log of the product of the probabilities of `key`'s characters.
    pub fn log_probability(&self, key: &str) -> f64 {
        key.chars().map(|c| self.probability(c).ln()).sum()
    }

    pub fn default_probability(&self) -> f64 {
        self.default_probability
    }

    pub fn default_distance(&self) -> f64 {
        self.default_distance
    }
}

/// Flat, serde-friendly form of a [`SymbolModel`]. Every path into a model
/// goes through [`SymbolTables::into_model`], which validates the ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SymbolTables {
    probabilities: BTreeMap<char, f64>,
    default_probability: f64,
    distances: Vec<DistanceEntry>,
    default_distance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DistanceEntry(char, char, f64);

impl Default for SymbolTables {
    fn default() -> Self {
        Self {
            probabilities: BTreeMap::new(),
            default_probability: DEFAULT_SYMBOL_PROBABILITY,
            distances: Vec::new(),
            default_distance: DEFAULT_SYMBOL_DISTANCE,
        }
    }
}

impl SymbolTables {
    pub(crate) fn into_model(self) -> Result<SymbolModel> {
        check_unit("default symbol probability", self.default_probability)?;
        check_unit("default symbol distance", self.default_distance)?;
        for (c, p) in &self.probabilities {
            check_unit(&format!("probability of {c:?}"), *p)?;
        }

        let mut distances = BTreeMap::new();
        for DistanceEntry(a, b, d) in self.distances {
            check_unit(&format!("distance between {a:?} and {b:?}"), d)?;
            if a == b {
                continue;
            }
            match distances.insert(ordered(a, b), d) {
                Some(previous) if previous != d => {
                    return Err(FuzzyError::invalid(format!(
                        "distance between {a:?} and {b:?} given twice ({previous} and {d})"
                    )));
                }
                _ => {}
            }
        }

        Ok(SymbolModel {
            probabilities: self.probabilities,
            default_probability: self.default_probability,
            distances,
            default_distance: self.default_distance,
        })
    }
}

impl TryFrom<SymbolTables> for SymbolModel {
    type Error = FuzzyError;

    fn try_from(tables: SymbolTables) -> Result<Self> {
        tables.into_model()
    }
}

impl From<SymbolModel> for SymbolTables {
    fn from(model: SymbolModel) -> Self {
        Self {
            probabilities: model.probabilities,
            default_probability: model.default_probability,
            distances: model
                .distances
                .into_iter()
                .map(|((a, b), d)| DistanceEntry(a, b, d))
                .collect(),
            default_distance: model.default_distance,
        }
    }
}

/// Collects symbol tables and validates them on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct SymbolModelBuilder {
    tables: SymbolTables,
}

impl SymbolModelBuilder {
    pub fn probability(mut self, c: char, p: f64) -> Self {
        self.tables.probabilities.insert(c, p);
        self
    }

    pub fn probabilities(mut self, table: impl IntoIterator<Item = (char, f64)>) -> Self {
        self.tables.probabilities.extend(table);
        self
    }

    pub fn default_probability(mut self, p: f64) -> Self {
        self.tables.default_probability = p;
        self
    }

    pub fn distance(mut self, a: char, b: char, d: f64) -> Self {
        self.tables.distances.push(DistanceEntry(a, b, d));
        self
    }

    pub fn distances(mut self, table: impl IntoIterator<Item = ((char, char), f64)>) -> Self {
        self.tables
            .distances
            .extend(table.into_iter().map(|((a, b), d)| DistanceEntry(a, b, d)));
        self
    }

    pub fn default_distance(mut self, d: f64) -> Self {
        self.tables.default_distance = d;
        self
    }

    pub fn build(self) -> Result<SymbolModel> {
        self.tables.into_model()
    }
}
