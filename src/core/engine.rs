use crate::config::FuzzyConfig;
use crate::core::policy::{check_relative, resolve_budget, CorrectionPolicy};
use crate::core::ranking::{CandidateOrder, CostThenProbability, RankedCandidate, ResultRanker};
use crate::core::symbols::SymbolModel;
use crate::core::trie::PrefixTree;
use crate::core::types::{Match, SearchHit};
use crate::error::{FuzzyError, Result};
use crate::fuzzy::corrector::{correct, Candidate, MatchMode};
use crate::merge::{MergeFn, Replace};
use std::fmt;

/// Per-call knobs for [`FuzzyMap::get`].
///
/// A budget given here replaces the policy's for this call only; the relative
/// form wins when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GetOptions {
    pub max_corrections: Option<u32>,
    pub max_corrections_relative: Option<f64>,
    /// Return every candidate within budget instead of the cheapest tier.
    pub extract_all: bool,
    pub topn: Option<usize>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_corrections(mut self, n: u32) -> Self {
        self.max_corrections = Some(n);
        self
    }

    pub fn max_corrections_relative(mut self, fraction: f64) -> Self {
        self.max_corrections_relative = Some(fraction);
        self
    }

    pub fn extract_all(mut self, all: bool) -> Self {
        self.extract_all = all;
        self
    }

    pub fn topn(mut self, n: usize) -> Self {
        self.topn = Some(n);
        self
    }
}

/// A dictionary keyed by strings that tolerates typos in lookups.
///
/// Values live in a prefix tree. A query matches a key when the summed price
/// of the substitutions, deletions, insertions and transpositions needed to
/// turn one into the other fits the correction budget.
pub struct FuzzyMap<V> {
    pub(crate) tree: PrefixTree<V>,
    pub(crate) policy: CorrectionPolicy,
    pub(crate) symbols: SymbolModel,
    merge: Box<dyn MergeFn<V>>,
    order: Box<dyn CandidateOrder>,
}

impl<V> fmt::Debug for FuzzyMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyMap")
            .field("len", &self.tree.len())
            .field("nodes", &self.tree.node_count())
            .field("policy", &self.policy)
            .field("symbols", &self.symbols)
            .finish_non_exhaustive()
    }
}

impl<V> Default for FuzzyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FuzzyMap<V> {
    /// Empty map with default prices, a zero budget and replace-on-write.
    pub fn new() -> Self {
        Self::with_config(FuzzyConfig::default())
    }

    pub fn with_config(config: FuzzyConfig) -> Self {
        Self {
            tree: PrefixTree::new(),
            policy: config.policy,
            symbols: config.symbols,
            merge: Box::new(Replace),
            order: Box::new(CostThenProbability),
        }
    }

    pub fn with_merge(mut self, merge: impl MergeFn<V> + 'static) -> Self {
        self.merge = Box::new(merge);
        self
    }

    pub fn with_order(mut self, order: impl CandidateOrder + 'static) -> Self {
        self.order = Box::new(order);
        self
    }

    pub fn set_merge(&mut self, merge: impl MergeFn<V> + 'static) {
        self.merge = Box::new(merge);
    }

    pub fn set_order(&mut self, order: impl CandidateOrder + 'static) {
        self.order = Box::new(order);
    }

    pub fn set_policy(&mut self, policy: CorrectionPolicy) -> Result<()> {
        policy.validate()?;
        self.policy = policy;
        Ok(())
    }

    pub fn set_symbol_model(&mut self, symbols: SymbolModel) {
        self.symbols = symbols;
    }

    /// Replaces policy and symbol model together.
    pub fn configure(&mut self, config: FuzzyConfig) -> Result<()> {
        config.validate()?;
        self.policy = config.policy;
        self.symbols = config.symbols;
        Ok(())
    }

    pub fn policy(&self) -> &CorrectionPolicy {
        &self.policy
    }

    pub fn symbol_model(&self) -> &SymbolModel {
        &self.symbols
    }

    pub fn symbol_probability(&self, c: char) -> f64 {
        self.symbols.probability(c)
    }

    pub fn symbol_distance(&self, a: char, b: char) -> f64 {
        self.symbols.distance(a, b)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Stores `value` under `key`, merged with any value already there.
    pub fn insert(&mut self, key: &str, value: V) -> Result<()> {
        self.tree.insert(key, value, self.merge.as_ref())?;
        Ok(())
    }

    /// Value stored under exactly `key`, no corrections applied.
    pub fn get_exact(&self, key: &str) -> Option<&V> {
        self.tree.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.tree.get(key).is_some()
    }

    /// Keys matching `query` within budget, best first.
    ///
    /// Fails with [`FuzzyError::NoMatch`] when nothing is in reach.
    pub fn get(&self, query: &str, options: &GetOptions) -> Result<Vec<Match<'_, V>>> {
        let budget = self.budget_for(query, options)?;
        let candidates = self.candidates(query, budget, MatchMode::Keys);
        let ranked = self
            .ranker()
            .select(candidates, options.extract_all, options.topn);

        let matches: Vec<Match<'_, V>> = ranked
            .into_iter()
            .filter_map(|c| self.to_match(c))
            .collect();
        if matches.is_empty() {
            return Err(FuzzyError::NoMatch { query: query.to_string() });
        }
        Ok(matches)
    }

    /// Best match for `query` under the configured budget.
    pub fn lookup(&self, query: &str) -> Result<Match<'_, V>> {
        let mut matches = self.get(query, &GetOptions::new().topn(1))?;
        matches
            .pop()
            .ok_or_else(|| FuzzyError::NoMatch { query: query.to_string() })
    }

    /// Prefix search: matches `query` as the start of a key and gathers up to
    /// `topn` stored values at or below the matched prefixes.
    pub fn search(&self, query: &str, topn: usize) -> Vec<SearchHit<'_, V>> {
        let budget = self.policy.budget(query.chars().count());
        let anchors = self.candidates(query, budget, MatchMode::Prefixes);
        self.ranker()
            .prefix_entries(&self.tree, anchors, topn)
            .into_iter()
            .filter_map(|entry| {
                let c = entry.candidate;
                self.tree.value(c.node).map(|value| SearchHit {
                    value,
                    key: c.key,
                    corrections: c.corrections,
                    cost: c.cost,
                    is_leaf: entry.is_leaf,
                })
            })
            .collect()
    }

    fn budget_for(&self, query: &str, options: &GetOptions) -> Result<u32> {
        let query_len = query.chars().count();
        if let Some(fraction) = options.max_corrections_relative {
            check_relative(fraction)?;
            return Ok(resolve_budget(0, Some(fraction), query_len));
        }
        Ok(options
            .max_corrections
            .unwrap_or_else(|| self.policy.budget(query_len)))
    }

    fn candidates(&self, query: &str, budget: u32, mode: MatchMode) -> Vec<Candidate> {
        correct(&self.tree, &self.policy, &self.symbols, query, budget, mode)
    }

    fn ranker(&self) -> ResultRanker<'_> {
        ResultRanker::new(&self.symbols, self.order.as_ref())
    }

    fn to_match(&self, c: RankedCandidate) -> Option<Match<'_, V>> {
        self.tree.value(c.node).map(|value| Match {
            value,
            key: c.key,
            corrections: c.corrections,
            cost: c.cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::CorrectionPrice;
    use crate::core::types::CorrectionKind;

    fn words(budget: u32) -> FuzzyMap<i32> {
        let policy = CorrectionPolicy::default().with_max_corrections(budget);
        let mut map = FuzzyMap::with_config(FuzzyConfig::new(policy, SymbolModel::default()).unwrap());
        map.insert("first", 1).unwrap();
        map.insert("second", 2).unwrap();
        map.insert("third", 3).unwrap();
        map
    }

    #[test]
    fn lookup_tolerates_typos() {
        let map = words(3);
        for query in ["first", "frst", "forst", "fiirst", "frsd", "tirsf", "rsd"] {
            assert_eq!(*map.lookup(query).unwrap().value, 1, "query {query}");
        }
    }

    #[test]
    fn get_returns_alternatives_in_extract_all_mode() {
        let map = words(3);
        let found = map.get("fird", &GetOptions::new().extract_all(true)).unwrap();
        let values: Vec<i32> = found.iter().map(|m| *m.value).collect();
        assert!(values.contains(&1));
        assert!(values.contains(&3));
    }

    #[test]
    fn accessors_reflect_configuration() {
        let mut map = words(1);
        assert!(map.contains_key("second"));
        assert!(!map.contains_key("sec"));
        assert!(map.policy().weights_by_distance());

        let symbols = SymbolModel::builder()
            .probability('e', 0.1)
            .distance('e', 'i', 0.4)
            .build()
            .unwrap();
        map.set_symbol_model(symbols);
        assert_eq!(map.symbol_probability('e'), 0.1);
        assert_eq!(map.symbol_probability('z'), 1e-5);
        assert_eq!(map.symbol_distance('i', 'e'), 0.4);
        assert_eq!(map.symbol_distance('e', 'e'), 0.0);

        map.set_policy(CorrectionPolicy::default().with_distance_weighting(false)).unwrap();
        assert!(!map.policy().weights_by_distance());
    }

    #[test]
    fn far_query_is_no_match() {
        let mut map = words(3);
        map.set_policy(CorrectionPolicy::default().with_max_corrections(1)).unwrap();
        assert!(matches!(map.get("xyzzy", &GetOptions::new()), Err(FuzzyError::NoMatch { .. })));
        assert!(matches!(map.lookup("xyzzy"), Err(FuzzyError::NoMatch { .. })));
    }

    #[test]
    fn options_override_policy_budget() {
        let map = words(0);
        assert!(map.get("frst", &GetOptions::new()).is_err());
        assert!(map.get("frst", &GetOptions::new().max_corrections(1)).is_ok());
        // round(0.25 * 4) = 1
        assert!(map.get("frst", &GetOptions::new().max_corrections_relative(0.25)).is_ok());
        assert!(matches!(
            map.get("frst", &GetOptions::new().max_corrections_relative(2.0)),
            Err(FuzzyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn corrections_report_positions() {
        let map = words(2);
        let best = map.lookup("secnod").unwrap();
        assert_eq!(best.key, "second");
        assert_eq!(best.corrections.len(), 1);
        assert_eq!(
            best.corrections[0].kind,
            CorrectionKind::Transposition { first: 'n', second: 'o' }
        );
        assert_eq!(best.corrections[0].position, 3);
    }

    #[test]
    fn merge_strategy_combines_values() {
        let mut map: FuzzyMap<Vec<&str>> = FuzzyMap::new().with_merge(
            |existing: Option<&Vec<&'static str>>,
             incoming: Vec<&'static str>|
             -> std::result::Result<Vec<&'static str>, crate::BoxError> {
                let mut merged = existing.cloned().unwrap_or_default();
                merged.extend(incoming);
                Ok(merged)
            },
        );
        map.insert("k", vec!["a"]).unwrap();
        map.insert("k", vec!["b"]).unwrap();
        assert_eq!(map.get_exact("k"), Some(&vec!["a", "b"]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn custom_order_reverses_ranking() {
        let policy = CorrectionPolicy::new(CorrectionPrice::uniform(1.0))
            .unwrap()
            .with_max_corrections(2);
        let mut map: FuzzyMap<&str> = FuzzyMap::new();
        map.set_policy(policy).unwrap();
        map.insert("cat", "feline").unwrap();
        map.insert("cut", "trim").unwrap();
        map.set_order(|a: &RankedCandidate, b: &RankedCandidate| b.cost.total_cmp(&a.cost));

        let found = map.get("cap", &GetOptions::new().extract_all(true)).unwrap();
        let values: Vec<&str> = found.iter().map(|m| *m.value).collect();
        assert_eq!(values, ["trim", "feline"]);
    }

    #[test]
    fn search_collects_completions() {
        let policy = CorrectionPolicy::default()
            .with_max_corrections_relative(2.0 / 3.0)
            .unwrap();
        let mut map: FuzzyMap<String> = FuzzyMap::new();
        map.set_policy(policy).unwrap();
        for key in ["apple", "apple red delicious", "apple fuji", "apple granny smith", "banana"] {
            map.insert(key, key.to_string()).unwrap();
        }

        let hits = map.search("apl", 3);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.key.starts_with("apple")));
        assert_eq!(hits[0].key, "apple");
        assert!(hits.iter().all(|h| h.is_leaf));
        assert!(map.search("apl", 0).is_empty());

        let exact = map.search("apple", 10);
        assert_eq!(exact[0].key, "apple");
        assert!(!exact[0].is_leaf);
        assert_eq!(exact.len(), 4);
    }
}
