use std::cmp::{min, Ordering};
use std::fmt;
use std::time::Instant;

use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashSet;
use tree_edit_distance::{diff, Edit};

use crate::ir::{NodeId, Tree};
use crate::matching::Matching;
use crate::multimap::MultiMap;
use crate::priority_list::PriorityList;

/// Implements the two-phase `GumTree` matching algorithm: an exact top-down pass over
/// isomorphic subtrees, followed by a bottom-up "container" pass that pairs up
/// structurally similar but non-identical subtrees and, where affordable, recovers
/// additional matches within them via tree edit distance.
#[derive(Debug, Clone, Copy)]
pub struct TreeMatcher {
    /// The minimum height of subtrees considered in the top-down phase.
    pub min_height: u32,
    /// The minimum Dice coefficient required to match two subtrees in the bottom-up phase.
    pub min_dice: f32,
    /// The maximum combined size of two subtrees to run tree edit distance recovery on;
    /// larger pairs fall back to a cheaper linear matcher.
    pub max_size: usize,
}

impl Default for TreeMatcher {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_dice: 0.3,
            max_size: 100,
        }
    }
}

/// A matching annotated with which phase produced each pair, useful for debugging and
/// for `--debug`-style introspection of why two nodes were (or weren't) matched.
pub struct DetailedMatching<'t> {
    /// The union of `exact`, `container` and `recovery`.
    pub full: Matching<'t>,
    /// Pairs of roots of isomorphic subtrees found in the top-down phase.
    pub exact: Matching<'t>,
    /// Pairs of similar-but-not-identical containers found in the bottom-up phase.
    pub container: Matching<'t>,
    /// Additional matches recovered within containers via tree edit distance (or the
    /// linear fallback).
    pub recovery: Matching<'t>,
}

impl TreeMatcher {
    pub fn match_trees<'t>(&self, left: &'t Tree, right: &'t Tree) -> DetailedMatching<'t> {
        let start = Instant::now();

        let exact = self.top_down_pass(left, right);
        debug!("top-down phase yielded {} matches", exact.len());

        let mut working = exact.clone();
        let mut container = Matching::new(left, right);
        let mut recovery = Matching::new(left, right);
        self.bottom_up_pass(left, right, &mut working, &mut container, &mut recovery);
        debug!("matching took {:?}", start.elapsed());

        let mut full = exact.clone();
        full.add_matching(&container);
        full.add_matching(&recovery);

        DetailedMatching {
            full,
            exact,
            container,
            recovery,
        }
    }

    /// Top-down phase: greedily matches roots of isomorphic subtrees, processing both
    /// trees' nodes in descending order of height, then resolves ambiguous (duplicate
    /// hash) candidates by preferring the pair whose parents have the highest Dice
    /// similarity.
    fn top_down_pass<'t>(&self, left: &'t Tree, right: &'t Tree) -> Matching<'t> {
        let mut exact = Matching::new(left, right);
        let mut ambiguous: Vec<(NodeId, NodeId)> = Vec::new();

        let mut l1 = PriorityList::new(left);
        let mut l2 = PriorityList::new(right);
        l1.push(left.root());
        l2.push(right.root());

        loop {
            let (Some(h1), Some(h2)) = (l1.peek_max(), l2.peek_max()) else {
                break;
            };
            if min(h1, h2) < self.min_height {
                break;
            }
            match h1.cmp(&h2) {
                Ordering::Greater => {
                    for t in l1.pop() {
                        l1.open(t);
                    }
                }
                Ordering::Less => {
                    for t in l2.pop() {
                        l2.open(t);
                    }
                }
                Ordering::Equal => {
                    let batch_left = l1.pop();
                    let batch_right = l2.pop();
                    let dups_left: FxHashSet<u64> = batch_left
                        .iter()
                        .map(|&n| left.get(n).hash())
                        .duplicates()
                        .collect();
                    let dups_right: FxHashSet<u64> = batch_right
                        .iter()
                        .map(|&n| right.get(n).hash())
                        .duplicates()
                        .collect();

                    let mut matched_left = FxHashSet::default();
                    let mut matched_right = FxHashSet::default();

                    for &t1 in &batch_left {
                        for &t2 in &batch_right {
                            if !isomorphic(left, right, t1, t2) {
                                continue;
                            }
                            let hash = left.get(t1).hash();
                            if dups_left.contains(&hash) || dups_right.contains(&right.get(t2).hash()) {
                                ambiguous.push((t1, t2));
                            } else if exact.can_be_matched(t1, t2) {
                                matched_left.insert(t1);
                                matched_right.insert(t2);
                                match_isomorphic_subtrees(left, right, t1, t2, &mut exact);
                            }
                        }
                    }

                    for &t in &batch_left {
                        if !matched_left.contains(&t) {
                            l1.open(t);
                        }
                    }
                    for &t in &batch_right {
                        if !matched_right.contains(&t) {
                            l2.open(t);
                        }
                    }
                }
            }
        }

        ambiguous.sort_by(|a, b| {
            dice_of_parents(left, right, &exact, *b)
                .partial_cmp(&dice_of_parents(left, right, &exact, *a))
                .unwrap_or(Ordering::Equal)
        });

        for (t1, t2) in ambiguous {
            if exact.get_from_left(t1).is_none() && exact.get_from_right(t2).is_none() {
                match_isomorphic_subtrees(left, right, t1, t2, &mut exact);
            }
        }

        exact
    }

    /// Bottom-up phase: for each unmatched node of `left`, in post-order, finds the best
    /// unmatched candidate container in `right` among the ancestors of already-matched
    /// descendants, and if its Dice similarity clears `min_dice` (or it is the root pair,
    /// which is always matched), attempts to recover further matches within it.
    fn bottom_up_pass<'t>(
        &self,
        left: &'t Tree,
        right: &'t Tree,
        matching: &mut Matching<'t>,
        container: &mut Matching<'t>,
        recovery: &mut Matching<'t>,
    ) {
        for left_node in left.postorder(left.root()) {
            let is_root = left_node == left.root();
            if !is_root {
                if matching.get_from_left(left_node).is_some() || left.get(left_node).is_leaf() {
                    continue;
                }
            }

            let winner = if is_root {
                Some(right.root())
            } else {
                let candidates = self.find_candidates(left, right, left_node, matching);
                let mut best = None;
                let mut best_dice = -1.0_f32;
                for candidate in candidates {
                    let sim = matching.dice(left_node, candidate);
                    if sim > best_dice {
                        if sim > self.min_dice {
                            best_dice = sim;
                            best = Some(candidate);
                        } else if sim > self.min_dice * 0.75 {
                            debug!(
                                "discarding candidate match with similarity {sim}, close to threshold {}",
                                self.min_dice
                            );
                        }
                    }
                }
                best
            };

            if let Some(winner) = winner {
                if matching.get_from_right(winner).is_some() && !is_root {
                    continue;
                }
                self.last_chance_match(left, right, left_node, winner, matching, container, recovery);
            }
        }
    }

    fn find_candidates<'t>(
        &self,
        left: &'t Tree,
        right: &'t Tree,
        left_node: NodeId,
        matching: &Matching<'t>,
    ) -> Vec<NodeId> {
        let mut seen_ancestors = FxHashSet::default();
        let mut candidates = Vec::new();
        let left_kind = &left.get(left_node).kind;

        for descendant in left.descendants(left_node) {
            let Some(matched) = matching.get_from_left(descendant) else {
                continue;
            };
            for ancestor in right.ancestors(matched).into_iter().skip(1) {
                if ancestor == right.root() {
                    break;
                }
                if !seen_ancestors.insert(ancestor) {
                    continue;
                }
                if &right.get(ancestor).kind == left_kind && matching.get_from_right(ancestor).is_none() {
                    candidates.push(ancestor);
                }
            }
        }
        candidates
    }

    /// Matches `left_node`/`right_node` as a container pair, then attempts to recover
    /// additional matches among their unmatched descendants, via tree edit distance when
    /// affordable, otherwise via a cheaper linear matcher.
    fn last_chance_match<'t>(
        &self,
        left: &'t Tree,
        right: &'t Tree,
        left_node: NodeId,
        right_node: NodeId,
        matching: &mut Matching<'t>,
        container: &mut Matching<'t>,
        recovery: &mut Matching<'t>,
    ) {
        let left_stripped = strip_matched_subtrees(left, left_node, matching, true);
        let right_stripped = strip_matched_subtrees(right, right_node, matching, false);

        if left_stripped.size + right_stripped.size > self.max_size {
            debug!(
                "falling back on linear recovery from {} because stripped size is {} + {}",
                left.get(left_node).kind,
                left_stripped.size,
                right_stripped.size
            );
            self.match_subtrees_linearly(left, right, left_node, right_node, true, matching, recovery);
        } else {
            let (edits, _cost) = diff(&left_stripped, &right_stripped);
            convert_tree_edits_to_matches(&[left_stripped], &[right_stripped], &edits, matching, recovery);
        }

        matching.add(left_node, right_node);
        container.add(left_node, right_node);
    }

    /// A cheaper, linear-complexity stand-in for tree edit distance recovery: pairs up
    /// children that are the unique child of their kind on both sides.
    fn match_subtrees_linearly<'t>(
        &self,
        left: &'t Tree,
        right: &'t Tree,
        left_node: NodeId,
        right_node: NodeId,
        recursive: bool,
        matching: &mut Matching<'t>,
        recovery: &mut Matching<'t>,
    ) {
        let left_children: MultiMap<&str, NodeId> = left
            .get(left_node)
            .children
            .iter()
            .map(|&c| (left.get(c).kind.as_str(), c))
            .collect();
        let right_children: MultiMap<&str, NodeId> = right
            .get(right_node)
            .children
            .iter()
            .map(|&c| (right.get(c).kind.as_str(), c))
            .collect();

        for kind in left_children.keys() {
            let siblings_left = left_children.get(kind);
            if siblings_left.len() != 1 {
                continue;
            }
            let siblings_right = right_children.get(kind);
            if siblings_right.len() != 1 {
                continue;
            }
            let child_left = *siblings_left.iter().next().expect("checked len above");
            let child_right = *siblings_right.iter().next().expect("checked len above");
            if matching.can_be_matched(child_left, child_right) {
                if recursive {
                    self.match_subtrees_linearly(
                        left,
                        right,
                        child_left,
                        child_right,
                        recursive,
                        matching,
                        recovery,
                    );
                }
                matching.add(child_left, child_right);
                recovery.add(child_left, child_right);
            }
        }
    }
}

fn isomorphic(left: &Tree, right: &Tree, t1: NodeId, t2: NodeId) -> bool {
    left.get(t1).hash() == right.get(t2).hash()
}

/// Matches every pair of corresponding nodes in two isomorphic subtrees, relying on
/// pre-order traversal producing the same shape for both (true by construction when
/// the subtree hashes are equal).
fn match_isomorphic_subtrees(left: &Tree, right: &Tree, t1: NodeId, t2: NodeId, matching: &mut Matching) {
    for (n1, n2) in left.subtree(t1).into_iter().zip(right.subtree(t2)) {
        matching.add(n1, n2);
    }
}

fn dice_of_parents(left: &Tree, right: &Tree, matching: &Matching, pair: (NodeId, NodeId)) -> f32 {
    let (t1, t2) = pair;
    match (left.get(t1).parent, right.get(t2).parent) {
        (Some(p1), Some(p2)) => matching.dice(p1, p2),
        _ => matching.dice(t1, t2),
    }
}

/// A tree over already-matched/unmatched subtrees, stripped of their matched parts, for
/// interfacing with the `tree-edit-distance` crate.
struct TEDTree<'t> {
    kind: &'t str,
    /// The leaf's label, so that two leaves of the same kind but different content are
    /// never equated by the edit-distance algorithm.
    leaf_label: Option<&'t str>,
    matched_to_id: Option<NodeId>,
    node_id: NodeId,
    children: Vec<TEDTree<'t>>,
    weight: u64,
    size: usize,
}

fn strip_matched_subtrees<'t>(tree: &'t Tree, id: NodeId, matching: &Matching, left_side: bool) -> TEDTree<'t> {
    let node = tree.get(id);
    let matched = if left_side {
        matching.get_from_left(id)
    } else {
        matching.get_from_right(id)
    };

    let mut children = Vec::new();
    if matched.is_none() {
        for &child in &node.children {
            children.push(strip_matched_subtrees(tree, child, matching, left_side));
        }
    }
    let size = children.iter().map(|c| c.size).sum::<usize>() + 1;
    let weight = matched.map_or(1, |_| size as u64);

    TEDTree {
        kind: &node.kind,
        leaf_label: if children.is_empty() {
            node.label.as_deref()
        } else {
            None
        },
        matched_to_id: matched,
        node_id: id,
        children,
        weight,
        size,
    }
}

fn convert_tree_edits_to_matches<'t>(
    left_nodes: &[TEDTree<'t>],
    right_nodes: &[TEDTree<'t>],
    edits: &[Edit],
    matching: &mut Matching<'t>,
    recovery: &mut Matching<'t>,
) {
    let mut left_iter = left_nodes.iter();
    let mut right_iter = right_nodes.iter();
    let mut left_cursor = left_iter.next();
    let mut right_cursor = right_iter.next();

    for edit in edits {
        match edit {
            Edit::Replace(child_edits) => {
                let (Some(l), Some(r)) = (left_cursor, right_cursor) else {
                    break;
                };
                if matching.can_be_matched(l.node_id, r.node_id) {
                    matching.add(l.node_id, r.node_id);
                    recovery.add(l.node_id, r.node_id);
                    convert_tree_edits_to_matches(&l.children, &r.children, child_edits, matching, recovery);
                }
                left_cursor = left_iter.next();
                right_cursor = right_iter.next();
            }
            Edit::Insert => right_cursor = right_iter.next(),
            Edit::Remove => left_cursor = left_iter.next(),
        }
    }
}

impl tree_edit_distance::Node for TEDTree<'_> {
    type Kind = (String, Option<String>, Option<NodeId>);

    fn kind(&self) -> Self::Kind {
        (
            self.kind.to_string(),
            self.leaf_label.map(str::to_string),
            self.matched_to_id,
        )
    }

    type Weight = u64;
    fn weight(&self) -> Self::Weight {
        self.weight
    }
}

impl tree_edit_distance::Tree for TEDTree<'_> {
    type Children<'c>
        = std::slice::Iter<'c, Self>
    where
        Self: 'c;

    fn children(&self) -> Self::Children<'_> {
        self.children.iter()
    }
}

impl fmt::Debug for TEDTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TEDTree({}, {} children)", self.kind, self.children.len())
    }
}
