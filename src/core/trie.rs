// --- File: src/core/trie.rs
use crate::core::types::NodeId;
use crate::error::{FuzzyError, Result};
use crate::merge::MergeFn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode<V> {
    children: BTreeMap<char, NodeId>,
    value: Option<V>,
}

impl<V> TreeNode<V> {
    fn new() -> Self {
        Self { children: BTreeMap::new(), value: None }
    }
}

/// Arena-backed prefix tree. Node `0` is the root; a node is terminal exactly
/// when it holds a value. Nodes are only ever added.
///
/// Children are kept in a `BTreeMap` so every traversal visits edges in
/// character order, which keeps search output reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixTree<V> {
    nodes: Vec<TreeNode<V>>,
    len: usize,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixTree<V> {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self { nodes: vec![TreeNode::new()], len: 0 }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn child(&self, node: NodeId, c: char) -> Option<NodeId> {
        self.nodes[node].children.get(&c).copied()
    }

    /// Outgoing edges of `node` in character order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (char, NodeId)> + '_ {
        self.nodes[node].children.iter().map(|(&c, &id)| (c, id))
    }

    pub fn value(&self, node: NodeId) -> Option<&V> {
        self.nodes[node].value.as_ref()
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.nodes[node].value.is_some()
    }

    /// Node spelled by `key` from the root, if the path exists.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        key.chars().try_fold(Self::ROOT, |node, c| self.child(node, c))
    }

    /// Value stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.find(key).and_then(|node| self.value(node))
    }

    /// Stores `value` under `key`, combining it with any existing value via
    /// `merge`. The path is created first; the value slot is only written
    /// once the merge succeeded.
    /// O(k) complexity where k is key length, plus the merge itself.
    pub fn insert<M>(&mut self, key: &str, value: V, merge: &M) -> Result<NodeId>
    where
        M: MergeFn<V> + ?Sized,
    {
        if key.is_empty() {
            return Err(FuzzyError::EmptyKey);
        }

        let mut node_idx = Self::ROOT;
        for c in key.chars() {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&c) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(TreeNode::new());
                self.nodes[node_idx].children.insert(c, new_node_id);
                new_node_id
            };
            node_idx = next_idx;
        }

        let merged = merge
            .merge(self.nodes[node_idx].value.as_ref(), value)
            .map_err(FuzzyError::MergeFailure)?;

        let slot = &mut self.nodes[node_idx].value;
        if slot.is_none() {
            self.len += 1;
        }
        *slot = Some(merged);
        Ok(node_idx)
    }

    /// Terminal nodes strictly below `anchor`, in depth-first character
    /// order, stopping after `limit` of them. Keys are spelled starting from
    /// `prefix`, the key of `anchor` itself.
    pub fn terminals_below(&self, anchor: NodeId, prefix: &str, limit: usize) -> Vec<(String, NodeId)> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }

        let mut stack = vec![(anchor, prefix.to_string())];
        while let Some((node, key)) = stack.pop() {
            for (c, child) in self.nodes[node].children.iter().rev() {
                let mut child_key = key.clone();
                child_key.push(*c);
                stack.push((*child, child_key));
            }
            if node == anchor {
                continue;
            }
            if self.is_terminal(node) {
                found.push((key, node));
                if found.len() >= limit {
                    break;
                }
            }
        }
        found
    }

    /// Checks the arena is a tree rooted at node `0`: every child id is in
    /// range, nothing points at the root, no node has two parents, every
    /// node is reachable and the key count matches the stored values.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(FuzzyError::corrupt("prefix tree has no root"));
        }

        let mut has_parent = vec![false; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            for (&c, &child) in &node.children {
                if child == Self::ROOT || child >= self.nodes.len() {
                    return Err(FuzzyError::corrupt(format!(
                        "node {id} has edge {c:?} to invalid node {child}"
                    )));
                }
                if std::mem::replace(&mut has_parent[child], true) {
                    return Err(FuzzyError::corrupt(format!("node {child} has two parents")));
                }
            }
        }

        let mut reached = 0;
        let mut stack = vec![Self::ROOT];
        while let Some(node) = stack.pop() {
            reached += 1;
            stack.extend(self.nodes[node].children.values().copied());
        }
        if reached != self.nodes.len() {
            return Err(FuzzyError::corrupt(format!(
                "{} of {} nodes unreachable from the root",
                self.nodes.len() - reached,
                self.nodes.len()
            )));
        }

        let stored = self.nodes.iter().filter(|n| n.value.is_some()).count();
        if stored != self.len {
            return Err(FuzzyError::corrupt(format!(
                "key count {} does not match {stored} stored values",
                self.len
            )));
        }
        if self.nodes[Self::ROOT].value.is_some() {
            return Err(FuzzyError::corrupt("root node carries a value"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::Replace;

    fn tree(keys: &[(&str, i32)]) -> PrefixTree<i32> {
        let mut tree = PrefixTree::new();
        for (key, value) in keys {
            tree.insert(key, *value, &Replace).unwrap();
        }
        tree
    }

    #[test]
    fn insert_shares_prefixes() {
        let tree = tree(&[("cat", 1), ("car", 2), ("cart", 3)]);
        assert_eq!(tree.len(), 3);
        // root, c, a, t, r, t
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.get("car"), Some(&2));
        assert_eq!(tree.get("ca"), None);
        assert!(tree.find("ca").is_some());
        assert!(tree.find("cb").is_none());
    }

    #[test]
    fn reinsert_replaces_without_growing() {
        let mut tree = tree(&[("dog", 1)]);
        tree.insert("dog", 7, &Replace).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("dog"), Some(&7));
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut tree: PrefixTree<i32> = PrefixTree::new();
        assert!(matches!(tree.insert("", 1, &Replace), Err(FuzzyError::EmptyKey)));
    }

    #[test]
    fn failed_merge_keeps_slot_empty() {
        let mut tree: PrefixTree<i32> = PrefixTree::new();
        let failing = |_: Option<&i32>, _: i32| -> std::result::Result<i32, crate::BoxError> {
            Err("nope".into())
        };
        assert!(matches!(tree.insert("ab", 1, &failing), Err(FuzzyError::MergeFailure(_))));
        assert_eq!(tree.len(), 0);
        assert!(tree.find("ab").is_some());
        assert!(!tree.is_terminal(tree.find("ab").unwrap()));
        tree.validate().unwrap();
    }

    #[test]
    fn terminals_below_walks_in_character_order() {
        let tree = tree(&[("ab", 1), ("abd", 2), ("abc", 3), ("abce", 4), ("b", 5)]);
        let anchor = tree.find("ab").unwrap();
        let keys: Vec<String> = tree
            .terminals_below(anchor, "ab", 10)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, ["abc", "abce", "abd"]);

        let limited = tree.terminals_below(anchor, "ab", 2);
        assert_eq!(limited.len(), 2);
        assert!(tree.terminals_below(anchor, "ab", 0).is_empty());
    }

    #[test]
    fn validate_accepts_built_trees() {
        tree(&[("one", 1), ("two", 2), ("three", 3)]).validate().unwrap();
    }

    #[test]
    fn validate_rejects_shared_children() {
        let mut tree = tree(&[("a", 1), ("b", 2)]);
        let a = tree.find("a").unwrap();
        tree.nodes[PrefixTree::<i32>::ROOT].children.insert('c', a);
        assert!(tree.validate().is_err());
    }

    #[test]
    fn validate_rejects_dangling_edges() {
        let mut tree = tree(&[("a", 1)]);
        tree.nodes[0].children.insert('z', 99);
        assert!(tree.validate().is_err());
    }
}
