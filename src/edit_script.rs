use rustc_hash::FxHashMap;

use crate::ir::{NodeId, Range, Tree};
use crate::matching::Matching;

/// A single atomic edit between two trees: a node present only in `other` (`Insert`), a
/// node present only in `base` (`Delete`), or a matched pair whose display name differs
/// between the two (`Rename`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Insert(NodeId),
    Delete(NodeId),
    Rename(NodeId, NodeId),
}

impl Change {
    pub fn base_node(&self) -> Option<NodeId> {
        match self {
            Self::Delete(n) | Self::Rename(n, _) => Some(*n),
            Self::Insert(_) => None,
        }
    }

    pub fn other_node(&self) -> Option<NodeId> {
        match self {
            Self::Insert(n) | Self::Rename(_, n) => Some(*n),
            Self::Delete(_) => None,
        }
    }

    /// A representative source range for sorting/display purposes.
    fn source_range<'t>(&self, base: &'t Tree, other: &'t Tree) -> Option<&'t Range> {
        if let Some(n) = self.base_node() {
            if let Some(range) = base.get(n).source_range.as_ref() {
                return Some(range);
            }
        }
        self.other_node()
            .and_then(|n| other.get(n).source_range.as_ref())
    }
}

/// Derives the edit script between `base` and `other` from a node matching: every
/// unmatched base node is a `Delete`, every unmatched other node is an `Insert`, and
/// every matched pair whose names differ is a `Rename`.
pub fn derive(base: &Tree, other: &Tree, matching: &Matching) -> Vec<Change> {
    let mut changes = Vec::new();

    for id in base.all_nodes() {
        match matching.get_from_left(id) {
            None => changes.push(Change::Delete(id)),
            Some(mapped) => {
                if base.get(id).name() != other.get(mapped).name() {
                    changes.push(Change::Rename(id, mapped));
                }
            }
        }
    }
    for id in other.all_nodes() {
        if matching.get_from_right(id).is_none() {
            changes.push(Change::Insert(id));
        }
    }

    changes
}

/// Sorts changes by the file/line/column of their representative node, for stable
/// display.
pub fn sort_by_location(changes: &mut [Change], base: &Tree, other: &Tree) {
    changes.sort_by(|a, b| {
        let ra = a.source_range(base, other).map(|r| &r.start);
        let rb = b.source_range(base, other).map(|r| &r.start);
        ra.cmp(&rb)
    });
}

/// Splits every `Rename` into a `Delete` + `Insert` pair, for consumers that only want
/// to reason about presence/absence rather than identity-preserving renames.
pub fn as_insert_delete_only(changes: &[Change]) -> Vec<Change> {
    changes
        .iter()
        .flat_map(|c| match c {
            Change::Rename(b, o) => vec![Change::Delete(*b), Change::Insert(*o)],
            other => vec![*other],
        })
        .collect()
}

/// Looks up the [`Change`] (if any) affecting a given node, indexed separately for the
/// base and other side since a node id is only meaningful within its own tree's arena.
#[derive(Debug, Default)]
pub struct ChangesByNode {
    base: FxHashMap<NodeId, Change>,
    other: FxHashMap<NodeId, Change>,
}

impl ChangesByNode {
    pub fn build(changes: &[Change]) -> Self {
        let mut base = FxHashMap::default();
        let mut other = FxHashMap::default();
        for &change in changes {
            if let Some(n) = change.base_node() {
                base.insert(n, change);
            }
            if let Some(n) = change.other_node() {
                other.insert(n, change);
            }
        }
        Self { base, other }
    }

    pub fn get_base(&self, id: NodeId) -> Option<&Change> {
        self.base.get(&id)
    }

    pub fn get_other(&self, id: NodeId) -> Option<&Change> {
        self.other.get(&id)
    }
}

/// Applies the write-once `mapping`/`is_changed` tags to every node touched by `matching`
/// or `changes`. Panics in debug builds (via [`crate::error::InternalError`]) if a node's
/// mapping is written twice with different targets.
pub fn tag_nodes(base: &Tree, other: &Tree, matching: &Matching, changes: &[Change]) {
    for (l, r) in matching.iter() {
        base.get(l).set_mapping(r);
        other.get(r).set_mapping(l);
    }
    for change in changes {
        if let Some(n) = change.base_node() {
            base.get(n).mark_changed();
        }
        if let Some(n) = change.other_node() {
            other.get(n).mark_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::sexpr;
    use crate::tree_matcher::TreeMatcher;

    fn matcher() -> TreeMatcher {
        TreeMatcher {
            min_height: 1,
            min_dice: 0.3,
            max_size: 100,
        }
    }

    #[test]
    fn identical_trees_yield_no_changes() {
        let base = sexpr::parse("fn[f](stmt[a])").unwrap();
        let other = sexpr::parse("fn[f](stmt[a])").unwrap();
        let matching = matcher().match_trees(&base, &other).full;

        let changes = derive(&base, &other, &matching);
        assert!(changes.is_empty());
    }

    #[test]
    fn renamed_node_yields_a_rename_change() {
        let base = sexpr::parse("fn[old](stmt[a])").unwrap();
        let other = sexpr::parse("fn[new](stmt[a])").unwrap();
        let matching = matcher().match_trees(&base, &other).full;

        let changes = derive(&base, &other, &matching);
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], Change::Rename(_, _)));
    }

    #[test]
    fn inserted_node_yields_an_insert_change() {
        let base = sexpr::parse("list(a[1])").unwrap();
        let other = sexpr::parse("list(a[1] a[2])").unwrap();
        let matching = matcher().match_trees(&base, &other).full;

        let changes = derive(&base, &other, &matching);
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], Change::Insert(_)));
    }

    #[test]
    fn changes_by_node_indexes_both_sides() {
        let base = sexpr::parse("list(a[1])").unwrap();
        let other = sexpr::parse("list(a[1] a[2])").unwrap();
        let matching = matcher().match_trees(&base, &other).full;
        let changes = derive(&base, &other, &matching);
        let by_node = ChangesByNode::build(&changes);

        let inserted = other.get(other.root()).children[1];
        assert!(by_node.get_other(inserted).is_some());
        assert!(by_node.get_base(base.root()).is_none());
    }

    #[test]
    fn as_insert_delete_only_splits_renames() {
        let changes = vec![Change::Rename(
            crate::ir::sexpr::parse("a").unwrap().root(),
            crate::ir::sexpr::parse("b").unwrap().root(),
        )];
        let split = as_insert_delete_only(&changes);
        assert_eq!(split.len(), 2);
        assert!(matches!(split[0], Change::Delete(_)));
        assert!(matches!(split[1], Change::Insert(_)));
    }
}
