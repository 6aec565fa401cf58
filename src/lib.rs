// src/lib.rs

//! Fuzzy multi-dictionary: string keys in a prefix tree, looked up with a
//! budget of character-level corrections.
//!
//! ```
//! use fuzzy_core::{CorrectionPolicy, FuzzyMap, GetOptions};
//!
//! let mut dict = FuzzyMap::new();
//! dict.set_policy(CorrectionPolicy::default().with_max_corrections(1)).unwrap();
//! dict.insert("first", 1).unwrap();
//! dict.insert("second", 2).unwrap();
//!
//! assert_eq!(*dict.lookup("frst").unwrap().value, 1);
//! let found = dict.get("secnd", &GetOptions::new()).unwrap();
//! assert_eq!(found[0].key, "second");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod merge;
pub mod persistence;

pub use crate::config::FuzzyConfig;
pub use crate::core::engine::{FuzzyMap, GetOptions};
pub use crate::core::policy::{CorrectionPolicy, CorrectionPrice};
pub use crate::core::ranking::{CandidateOrder, CostThenProbability, RankedCandidate};
pub use crate::core::symbols::{SymbolModel, SymbolModelBuilder};
pub use crate::core::types::{Correction, CorrectionKind, Match, SearchHit};
pub use crate::error::{BoxError, FuzzyError, Result};
pub use crate::merge::{MergeFn, Replace};
