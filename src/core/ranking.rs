// File: src/core/ranking.rs
use crate::core::policy::COST_EPSILON;
use crate::core::symbols::SymbolModel;
use crate::core::trie::PrefixTree;
use crate::core::types::{Correction, NodeId};
use crate::fuzzy::corrector::Candidate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A candidate with the scores the ordering strategies look at.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub key: String,
    pub cost: f64,
    /// Sum of `ln p(c)` over the characters of `key`.
    pub log_probability: f64,
    pub corrections: Vec<Correction>,
    pub(crate) node: NodeId,
}

/// Total order used to rank candidates, best first.
pub trait CandidateOrder {
    fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering;
}

impl<F> CandidateOrder for F
where
    F: Fn(&RankedCandidate, &RankedCandidate) -> Ordering,
{
    fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
        self(a, b)
    }
}

/// Default order: cheaper first, then keys made of more probable symbols,
/// then key text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostThenProbability;

impl CandidateOrder for CostThenProbability {
    fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
        a.cost
            .total_cmp(&b.cost)
            .then_with(|| b.log_probability.total_cmp(&a.log_probability))
            .then_with(|| a.key.cmp(&b.key))
    }
}

/// One row of prefix-search output before values are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixEntry {
    pub candidate: RankedCandidate,
    pub is_leaf: bool,
}

/// Scores, sorts and trims candidate sets.
pub struct ResultRanker<'a> {
    symbols: &'a SymbolModel,
    order: &'a dyn CandidateOrder,
}

impl<'a> ResultRanker<'a> {
    pub fn new(symbols: &'a SymbolModel, order: &'a dyn CandidateOrder) -> Self {
        Self { symbols, order }
    }

    fn score(&self, node: NodeId, key: String, cost: f64, corrections: Vec<Correction>) -> RankedCandidate {
        RankedCandidate {
            log_probability: self.symbols.log_probability(&key),
            key,
            cost,
            corrections,
            node,
        }
    }

    /// Sorts best first. Input is put in key order beforehand so that a
    /// strategy with ties still yields the same output on every run.
    fn sort(&self, ranked: &mut [RankedCandidate]) {
        ranked.sort_by(|a, b| a.key.cmp(&b.key));
        ranked.sort_by(|a, b| self.order.compare(a, b));
    }

    pub fn rank(&self, candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|c| self.score(c.node, c.key, c.cost, c.corrections))
            .collect();
        self.sort(&mut ranked);
        ranked
    }

    /// Ranks and trims. Unless `extract_all` is set only the cheapest tier
    /// survives, ties included; `topn` then caps the length.
    pub fn select(&self, candidates: Vec<Candidate>, extract_all: bool, topn: Option<usize>) -> Vec<RankedCandidate> {
        let mut ranked = self.rank(candidates);
        if !extract_all {
            let cheapest = ranked.iter().map(|c| c.cost).fold(f64::INFINITY, f64::min);
            ranked.retain(|c| c.cost <= cheapest + COST_EPSILON);
        }
        if let Some(n) = topn {
            ranked.truncate(n);
        }
        ranked
    }

    /// Builds prefix-search output from anchor nodes: anchors that hold a
    /// value come first, then up to `topn` terminals below each anchor,
    /// scored on their own key with the anchor's cost. Keys appear once.
    pub fn prefix_entries<V>(&self, tree: &PrefixTree<V>, anchors: Vec<Candidate>, topn: usize) -> Vec<PrefixEntry> {
        let anchors = self.rank(anchors);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for anchor in anchors.iter().filter(|a| tree.is_terminal(a.node)) {
            if entries.len() >= topn {
                return entries;
            }
            if seen.insert(anchor.key.clone()) {
                entries.push(PrefixEntry { candidate: anchor.clone(), is_leaf: false });
            }
        }

        let mut leaves: Vec<RankedCandidate> = anchors
            .iter()
            .flat_map(|anchor| {
                tree.terminals_below(anchor.node, &anchor.key, topn)
                    .into_iter()
                    .map(move |(key, node)| (anchor, key, node))
            })
            .map(|(anchor, key, node)| self.score(node, key, anchor.cost, anchor.corrections.clone()))
            .collect();
        self.sort(&mut leaves);

        for leaf in leaves {
            if entries.len() >= topn {
                break;
            }
            if seen.insert(leaf.key.clone()) {
                entries.push(PrefixEntry { candidate: leaf, is_leaf: true });
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::Replace;

    fn candidate(node: NodeId, key: &str, cost: f64) -> Candidate {
        Candidate { node, key: key.to_string(), corrections: Vec::new(), cost }
    }

    fn keys(ranked: &[RankedCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn cost_then_probability_then_key() {
        let symbols = SymbolModel::builder()
            .probability('a', 0.9)
            .probability('b', 0.1)
            .build()
            .unwrap();
        let ranker = ResultRanker::new(&symbols, &CostThenProbability);
        let ranked = ranker.rank(vec![
            candidate(1, "bb", 1.0),
            candidate(2, "aa", 1.0),
            candidate(3, "zz", 0.5),
            candidate(4, "ab", 1.0),
        ]);
        assert_eq!(keys(&ranked), ["zz", "aa", "ab", "bb"]);
    }

    #[test]
    fn select_keeps_cheapest_tier_unless_extracting_all() {
        let symbols = SymbolModel::default();
        let ranker = ResultRanker::new(&symbols, &CostThenProbability);
        let input = || {
            vec![
                candidate(1, "x", 1.0),
                candidate(2, "y", 2.0),
                candidate(3, "w", 1.0),
            ]
        };
        assert_eq!(keys(&ranker.select(input(), false, None)), ["w", "x"]);
        assert_eq!(keys(&ranker.select(input(), true, None)), ["w", "x", "y"]);
        assert_eq!(keys(&ranker.select(input(), true, Some(1))), ["w"]);
        assert!(ranker.select(Vec::new(), false, None).is_empty());
    }

    #[test]
    fn custom_order_with_ties_is_stable_by_key() {
        let symbols = SymbolModel::default();
        let everything_equal = |_: &RankedCandidate, _: &RankedCandidate| Ordering::Equal;
        let ranker = ResultRanker::new(&symbols, &everything_equal);
        let ranked = ranker.rank(vec![candidate(1, "c", 0.0), candidate(2, "a", 2.0), candidate(3, "b", 1.0)]);
        assert_eq!(keys(&ranked), ["a", "b", "c"]);
    }

    #[test]
    fn prefix_entries_put_anchors_before_leaves() {
        let mut tree = PrefixTree::new();
        for key in ["apple", "apple fuji", "apple pink lady", "apricot"] {
            tree.insert(key, (), &Replace).unwrap();
        }
        let symbols = SymbolModel::default();
        let ranker = ResultRanker::new(&symbols, &CostThenProbability);

        let apple = tree.find("apple").unwrap();
        let ap = tree.find("ap").unwrap();
        let entries = ranker.prefix_entries(
            &tree,
            vec![candidate(apple, "apple", 0.0), candidate(ap, "ap", 1.0)],
            10,
        );
        let rows: Vec<(&str, bool)> = entries
            .iter()
            .map(|e| (e.candidate.key.as_str(), e.is_leaf))
            .collect();
        assert_eq!(
            rows,
            [
                ("apple", false),
                ("apple fuji", true),
                ("apple pink lady", true),
                ("apricot", true),
            ]
        );

        let capped = ranker.prefix_entries(&tree, vec![candidate(ap, "ap", 1.0)], 2);
        assert_eq!(capped.len(), 2);
    }
}
