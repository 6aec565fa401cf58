// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside the prefix tree arena.
pub type NodeId = usize;

/// The edit operation a [`Correction`] applied to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionKind {
    /// The query had `typed` where the key has `found`.
    Substitution { typed: char, found: char },
    /// The query carried an extra `symbol`.
    Deletion { symbol: char },
    /// The query was missing `symbol`.
    Insertion { symbol: char },
    /// The query had `first` and `second` swapped.
    Transposition { first: char, second: char },
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionKind::Substitution { typed, found } => {
                write!(f, "substitution \"{typed}\" for \"{found}\"")
            }
            CorrectionKind::Deletion { symbol } => write!(f, "deletion of \"{symbol}\""),
            CorrectionKind::Insertion { symbol } => write!(f, "insertion of \"{symbol}\""),
            CorrectionKind::Transposition { first, second } => {
                write!(f, "transposition of \"{first}{second}\"")
            }
        }
    }
}

/// One edit applied while reconciling a query with a stored key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub kind: CorrectionKind,
    /// Character offset in the query where the edit applies.
    pub position: usize,
    pub cost: f64,
}

impl Correction {
    pub fn description(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)
    }
}

/// A stored key matched by a query, with the corrections it took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match<'a, V> {
    pub value: &'a V,
    pub key: String,
    pub corrections: Vec<Correction>,
    pub cost: f64,
}

/// A value returned by prefix search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<'a, V> {
    pub value: &'a V,
    pub key: String,
    /// Corrections applied to the query to reach the anchor prefix.
    pub corrections: Vec<Correction>,
    pub cost: f64,
    /// True when the key extends beyond the matched prefix.
    pub is_leaf: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_are_readable() {
        let sub = Correction {
            kind: CorrectionKind::Substitution { typed: 'p', found: 't' },
            position: 2,
            cost: 1.0,
        };
        assert_eq!(sub.description(), "substitution \"p\" for \"t\"");
        assert_eq!(sub.to_string(), "substitution \"p\" for \"t\" at 2");
        assert_eq!(
            CorrectionKind::Transposition { first: 'a', second: 'b' }.to_string(),
            "transposition of \"ab\""
        );
    }
}
