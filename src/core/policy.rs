// File: src/core/policy.rs
use crate::core::symbols::SymbolModel;
use crate::error::{FuzzyError, Result};
use serde::{Deserialize, Serialize};

/// Slack used when comparing accumulated float costs against integer budgets.
pub(crate) const COST_EPSILON: f64 = 1e-9;

/// Checks that `value` is a finite number in `[0, 1]`.
pub(crate) fn check_unit(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FuzzyError::invalid(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

/// Price of each edit operation, every one in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionPrice {
    pub transposition: f64,
    pub deletion: f64,
    pub substitution: f64,
    pub insertion: f64,
}

impl Default for CorrectionPrice {
    fn default() -> Self {
        Self { transposition: 1.0, deletion: 1.0, substitution: 1.0, insertion: 1.0 }
    }
}

impl CorrectionPrice {
    pub fn new(transposition: f64, deletion: f64, substitution: f64, insertion: f64) -> Self {
        Self { transposition, deletion, substitution, insertion }
    }

    /// Same price for all four operations.
    pub fn uniform(price: f64) -> Self {
        Self::new(price, price, price, price)
    }

    fn validate(&self) -> Result<()> {
        check_unit("transposition price", self.transposition)?;
        check_unit("deletion price", self.deletion)?;
        check_unit("substitution price", self.substitution)?;
        check_unit("insertion price", self.insertion)
    }
}

/// Resolves the correction budget for a query of `query_len` characters.
/// A relative cap, when present, wins over the absolute one and is rounded
/// to the nearest integer (halves away from zero).
pub(crate) fn resolve_budget(absolute: u32, relative: Option<f64>, query_len: usize) -> u32 {
    match relative {
        Some(fraction) => (fraction * query_len as f64).round() as u32,
        None => absolute,
    }
}

pub(crate) fn check_relative(fraction: f64) -> Result<()> {
    check_unit("relative correction budget", fraction)
}

/// Edit prices plus the rule that turns a query length into a budget.
///
/// Substitution and transposition prices are scaled by the symbol distance
/// between the characters involved unless `weight_by_distance` is switched
/// off, in which case every substitution pays the full price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionPolicy {
    price: CorrectionPrice,
    max_corrections: u32,
    max_corrections_relative: Option<f64>,
    weight_by_distance: bool,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            price: CorrectionPrice::default(),
            max_corrections: 0,
            max_corrections_relative: None,
            weight_by_distance: true,
        }
    }
}

impl CorrectionPolicy {
    /// Policy with the given prices and an absolute budget of zero.
    pub fn new(price: CorrectionPrice) -> Result<Self> {
        price.validate()?;
        Ok(Self { price, ..Self::default() })
    }

    pub fn with_max_corrections(mut self, max_corrections: u32) -> Self {
        self.max_corrections = max_corrections;
        self
    }

    pub fn with_max_corrections_relative(mut self, fraction: f64) -> Result<Self> {
        check_relative(fraction)?;
        self.max_corrections_relative = Some(fraction);
        Ok(self)
    }

    pub fn with_distance_weighting(mut self, enabled: bool) -> Self {
        self.weight_by_distance = enabled;
        self
    }

    /// Re-checks every range. Used after deserialization.
    pub fn validate(&self) -> Result<()> {
        self.price.validate()?;
        if let Some(fraction) = self.max_corrections_relative {
            check_relative(fraction)?;
        }
        Ok(())
    }

    pub fn price(&self) -> &CorrectionPrice {
        &self.price
    }

    pub fn max_corrections(&self) -> u32 {
        self.max_corrections
    }

    pub fn max_corrections_relative(&self) -> Option<f64> {
        self.max_corrections_relative
    }

    pub fn weights_by_distance(&self) -> bool {
        self.weight_by_distance
    }

    /// Budget for a query of `query_len` characters.
    pub fn budget(&self, query_len: usize) -> u32 {
        resolve_budget(self.max_corrections, self.max_corrections_relative, query_len)
    }

    pub fn deletion_cost(&self) -> f64 {
        self.price.deletion
    }

    pub fn insertion_cost(&self) -> f64 {
        self.price.insertion
    }

    /// Cost of reading `found` in the tree where the query has `typed`.
    pub fn substitution_cost(&self, symbols: &SymbolModel, typed: char, found: char) -> f64 {
        if self.weight_by_distance {
            self.price.substitution * symbols.distance(typed, found)
        } else {
            self.price.substitution
        }
    }

    /// Cost of swapping the adjacent query characters `a` and `b`.
    pub fn transposition_cost(&self, symbols: &SymbolModel, a: char, b: char) -> f64 {
        if self.weight_by_distance {
            self.price.transposition * symbols.distance(a, b)
        } else {
            self.price.transposition
        }
    }
}
