use rustc_hash::FxHashMap;
use std::collections::HashSet;

use crate::ir::{NodeId, Tree};

/// A one-to-one relation between nodes of two trees (conventionally called "left"/"base"
/// and "right"/"other").
#[derive(Debug, Clone)]
pub struct Matching<'tree> {
    left: &'tree Tree,
    right: &'tree Tree,
    left_to_right: FxHashMap<NodeId, NodeId>,
    right_to_left: FxHashMap<NodeId, NodeId>,
}

impl<'tree> Matching<'tree> {
    /// Creates an empty matching between `left` and `right`.
    pub fn new(left: &'tree Tree, right: &'tree Tree) -> Self {
        Self {
            left,
            right,
            left_to_right: FxHashMap::default(),
            right_to_left: FxHashMap::default(),
        }
    }

    pub fn left_tree(&self) -> &'tree Tree {
        self.left
    }

    pub fn right_tree(&self) -> &'tree Tree {
        self.right
    }

    /// Gets the match associated with a node from the left hand tree.
    pub fn get_from_left(&self, from: NodeId) -> Option<NodeId> {
        self.left_to_right.get(&from).copied()
    }

    /// Gets the match associated with a node from the right hand tree.
    pub fn get_from_right(&self, from: NodeId) -> Option<NodeId> {
        self.right_to_left.get(&from).copied()
    }

    /// Does the matching contain this pair?
    pub fn are_matched(&self, from: NodeId, to: NodeId) -> bool {
        self.get_from_left(from) == Some(to)
    }

    /// Is it possible to add this pair while keeping the matching consistent?
    pub fn can_be_matched(&self, from: NodeId, to: NodeId) -> bool {
        let left_node = self.left.get(from);
        let right_node = self.right.get(to);
        left_node.kind == right_node.kind
            && !self.left_to_right.contains_key(&from)
            && !self.right_to_left.contains_key(&to)
            && (!left_node.is_leaf() || !right_node.is_leaf() || left_node.label == right_node.label)
    }

    /// Set of left node ids matched to any node on the right.
    pub fn left_matched(&self) -> HashSet<NodeId> {
        self.left_to_right.keys().copied().collect()
    }

    /// Set of right node ids matched to any node on the left.
    pub fn right_matched(&self) -> HashSet<NodeId> {
        self.right_to_left.keys().copied().collect()
    }

    /// Adds a match between two nodes (in both directions), displacing any conflicting
    /// existing match first.
    pub fn add(&mut self, from: NodeId, to: NodeId) {
        self.remove(from, to);
        self.left_to_right.insert(from, to);
        self.right_to_left.insert(to, from);
    }

    /// Removes matches involving either element (in both directions).
    pub fn remove(&mut self, from: NodeId, to: NodeId) {
        if let Some(other_right) = self.left_to_right.get(&from).copied() {
            self.right_to_left.remove(&other_right);
            self.left_to_right.remove(&from);
        }
        if let Some(other_left) = self.right_to_left.get(&to).copied() {
            self.left_to_right.remove(&other_left);
            self.right_to_left.remove(&to);
        }
    }

    /// Adds every pair from another matching over the same trees.
    pub fn add_matching(&mut self, other: &Matching<'tree>) {
        for (&right, &left) in &other.right_to_left {
            self.add(left, right);
        }
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    /// Reverses the direction of the matching (left becomes right and vice versa).
    pub fn into_reversed(self) -> Matching<'tree> {
        Matching {
            left: self.right,
            right: self.left,
            left_to_right: self.right_to_left,
            right_to_left: self.left_to_right,
        }
    }

    /// Composes this matching (left -> mid) with another (mid -> right), producing a
    /// matching from this matching's left tree to `other`'s right tree.
    pub fn compose(&self, other: &Matching<'tree>) -> Matching<'tree> {
        let mut result = Matching::new(self.left, other.right);
        for (&source, &mid) in &self.left_to_right {
            if let Some(target) = other.get_from_left(mid) {
                result.add(source, target);
            }
        }
        result
    }

    /// Assuming the matches in this matching are only between isomorphic nodes, extends it
    /// with a recursive match of all their descendants (in tree order).
    pub fn add_submatches(&self) -> Matching<'tree> {
        let mut result = Matching::new(self.left, self.right);
        for (&left_root, &right_root) in &self.left_to_right {
            let left_nodes = self.left.subtree(left_root);
            let right_nodes = self.right.subtree(right_root);
            for (l, r) in left_nodes.into_iter().zip(right_nodes) {
                result.add(l, r);
            }
        }
        result
    }

    /// Retrieves matched pairs as raw node ids.
    pub fn as_ids(&self) -> Vec<(NodeId, NodeId)> {
        self.left_to_right.iter().map(|(&s, &t)| (s, t)).collect()
    }

    /// Computes the Dice coefficient of two subtrees according to this matching: twice the
    /// number of matched descendant pairs over the sum of both subtrees' sizes.
    pub fn dice(&self, left: NodeId, right: NodeId) -> f32 {
        let left_nodes = self.left.subtree(left);
        let right_nodes: HashSet<NodeId> = self.right.subtree(right).into_iter().collect();

        let size_left = left_nodes.len();
        let size_right = right_nodes.len();

        let common = left_nodes
            .iter()
            .filter_map(|&n| self.get_from_left(n))
            .filter(|mapped| right_nodes.contains(mapped))
            .count();

        2.0_f32 * (common as f32) / ((size_left + size_right) as f32)
    }

    /// Iterates over the matches, from right to left.
    pub fn iter_right_to_left(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.right_to_left.iter().map(|(&r, &l)| (r, l))
    }

    /// Iterates over the matches, from left to right.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.left_to_right.iter().map(|(&l, &r)| (l, r))
    }
}
