// File: src/fuzzy/corrector.rs
use crate::core::policy::{CorrectionPolicy, COST_EPSILON};
use crate::core::symbols::SymbolModel;
use crate::core::trie::PrefixTree;
use crate::core::types::{Correction, CorrectionKind, NodeId};
use std::collections::{BTreeMap, HashMap};

/// What counts as a hit once the whole query has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Only terminal nodes, i.e. complete keys.
    Keys,
    /// Any node: the query is treated as a prefix. Insertions past the end
    /// of the query are not tried, the leaf walk covers continuations.
    Prefixes,
}

/// A node reached by the search with the whole query consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub key: String,
    pub corrections: Vec<Correction>,
    pub cost: f64,
}

/// Per-call, read-only inputs of a search.
struct SearchContext<'a, V> {
    tree: &'a PrefixTree<V>,
    policy: &'a CorrectionPolicy,
    symbols: &'a SymbolModel,
    query: Vec<char>,
    budget: f64,
    mode: MatchMode,
}

/// Mutable bookkeeping shared by every step of the walk.
#[derive(Default)]
struct SearchState {
    /// Cheapest cost at which each (node, query offset) pair was expanded.
    visited: HashMap<(NodeId, usize), f64>,
    found: BTreeMap<NodeId, Candidate>,
    key: String,
    log: Vec<Correction>,
    expanded: usize,
}

impl SearchState {
    /// Records a visit; false when the pair was already expanded at a cost
    /// no worse than `cost`.
    fn visit(&mut self, node: NodeId, pos: usize, cost: f64) -> bool {
        match self.visited.get(&(node, pos)) {
            Some(&previous) if previous <= cost + COST_EPSILON => false,
            _ => {
                self.visited.insert((node, pos), cost);
                true
            }
        }
    }
}

/// Budgeted branch-and-bound search of `tree` against `query`.
///
/// Walks the cross product of tree nodes and query offsets, trying at every
/// state the exact edge first and then substitution, deletion, insertion and
/// transposition. A branch is cut as soon as its cost would exceed `budget`.
/// Returns the cheapest way found to each matching node.
pub fn correct<V>(
    tree: &PrefixTree<V>,
    policy: &CorrectionPolicy,
    symbols: &SymbolModel,
    query: &str,
    budget: u32,
    mode: MatchMode,
) -> Vec<Candidate> {
    let ctx = SearchContext {
        tree,
        policy,
        symbols,
        query: query.chars().collect(),
        budget: budget as f64,
        mode,
    };
    let mut state = SearchState::default();
    ctx.run(&mut state);

    tracing::debug!(
        query,
        budget,
        expanded = state.expanded,
        candidates = state.found.len(),
        "correction search finished"
    );
    state.found.into_values().collect()
}

/// A pending move to `(node, pos)`. `key_len` and `log_len` are the lengths
/// of the key and log at the state that produced it.
struct Frame {
    node: NodeId,
    pos: usize,
    cost: f64,
    key_len: usize,
    log_len: usize,
    spelled: [char; 2],
    spelled_len: usize,
    correction: Option<Correction>,
}

impl<'a, V> SearchContext<'a, V> {
    /// Depth-first walk over an explicit work list. Moves of one state are
    /// pushed in reverse so they pop in the order they were generated.
    fn run(&self, state: &mut SearchState) {
        let mut pending = vec![Frame {
            node: self.tree.root(),
            pos: 0,
            cost: 0.0,
            key_len: 0,
            log_len: 0,
            spelled: ['\0'; 2],
            spelled_len: 0,
            correction: None,
        }];
        let mut moves = Vec::new();

        while let Some(frame) = pending.pop() {
            // keys and logs only grow along a path, so the producing state's
            // key is still a prefix of whatever was spelled last
            state.key.truncate(frame.key_len);
            state.key.extend(&frame.spelled[..frame.spelled_len]);
            state.log.truncate(frame.log_len);
            state.log.extend(frame.correction);

            self.expand(state, frame.node, frame.pos, frame.cost, &mut moves);
            pending.extend(moves.drain(..).rev());
        }
    }

    fn expand(
        &self,
        state: &mut SearchState,
        node: NodeId,
        pos: usize,
        cost: f64,
        moves: &mut Vec<Frame>,
    ) {
        if !state.visit(node, pos, cost) {
            return;
        }
        state.expanded += 1;

        let len = self.query.len();
        if pos == len && self.accepts(node) {
            state.found.insert(
                node,
                Candidate {
                    node,
                    key: state.key.clone(),
                    corrections: state.log.clone(),
                    cost,
                },
            );
        }

        // queues a move spelling `symbols` and logging `correction`, unless
        // it would exceed the budget
        let mut step = |node: NodeId,
                        pos: usize,
                        symbols: &[char],
                        correction: Option<(CorrectionKind, f64, usize)>| {
            let price = correction.map_or(0.0, |(_, price, _)| price);
            let next_cost = cost + price;
            if next_cost > self.budget + COST_EPSILON {
                return;
            }
            let mut spelled = ['\0'; 2];
            spelled[..symbols.len()].copy_from_slice(symbols);
            moves.push(Frame {
                node,
                pos,
                cost: next_cost,
                key_len: state.key.len(),
                log_len: state.log.len(),
                spelled,
                spelled_len: symbols.len(),
                correction: correction.map(|(kind, price, position)| Correction {
                    kind,
                    position,
                    cost: price,
                }),
            });
        };

        if pos < len {
            let typed = self.query[pos];

            if let Some(child) = self.tree.child(node, typed) {
                step(child, pos + 1, &[typed], None);
            }

            for (found, child) in self.substitutes(node, typed) {
                let kind = CorrectionKind::Substitution { typed, found };
                let price = self.policy.substitution_cost(self.symbols, typed, found);
                step(child, pos + 1, &[found], Some((kind, price, pos)));
            }

            let kind = CorrectionKind::Deletion { symbol: typed };
            step(node, pos + 1, &[], Some((kind, self.policy.deletion_cost(), pos)));
        }

        if pos < len || self.mode == MatchMode::Keys {
            for (symbol, child) in self.tree.children(node) {
                let kind = CorrectionKind::Insertion { symbol };
                step(child, pos, &[symbol], Some((kind, self.policy.insertion_cost(), pos)));
            }
        }

        if pos + 1 < len {
            let (first, second) = (self.query[pos], self.query[pos + 1]);
            if first != second {
                let swapped = self
                    .tree
                    .child(node, second)
                    .and_then(|mid| self.tree.child(mid, first));
                if let Some(child) = swapped {
                    let kind = CorrectionKind::Transposition { first, second };
                    let price = self.policy.transposition_cost(self.symbols, first, second);
                    step(child, pos + 2, &[second, first], Some((kind, price, pos)));
                }
            }
        }
    }

    /// Outgoing edges other than `typed`, closest symbols first.
    fn substitutes(&self, node: NodeId, typed: char) -> Vec<(char, NodeId)> {
        let mut edges: Vec<(char, NodeId)> = self
            .tree
            .children(node)
            .filter(|&(c, _)| c != typed)
            .collect();
        // children() is already in character order and the sort is stable
        edges.sort_by(|a, b| {
            self.symbols
                .distance(typed, a.0)
                .total_cmp(&self.symbols.distance(typed, b.0))
        });
        edges
    }

    fn accepts(&self, node: NodeId) -> bool {
        match self.mode {
            MatchMode::Keys => self.tree.is_terminal(node),
            MatchMode::Prefixes => true,
        }
    }
}
