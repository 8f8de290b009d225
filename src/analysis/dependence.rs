//! Flags memory/control dependencies that were each left intact on one side of a merge
//! but whose target was changed on the other, the same way a human reviewer would worry
//! about "base changed the thing this line in other still relies on".

use std::collections::HashSet;

use log::debug;
use rustc_hash::FxHashSet;

use super::optimizer::optimize_change_sets;
use super::{Analysis, AnalysisResult, Tag};
use crate::diff::MergeDiffResult;
use crate::edit_script::Change;
use crate::ir::NodeId;

/// For every memory-operation node on either side of the merge, crosses to its ancestor
/// counterpart and looks at that counterpart's full dependency cone (things it depends
/// on, and things that depend on it). If both sides touched some node in that cone, the
/// two sets of changes are reported as a conflict candidate: neither side saw what the
/// other did to a node they both implicitly relied on.
pub struct DependenceAnalysis;

impl Analysis for DependenceAnalysis {
    fn key(&self) -> &'static str {
        "dependence"
    }

    fn description(&self) -> &'static str {
        "flags memory dependencies changed on one side while their dependents moved on the other"
    }

    fn run<'t>(&self, merge: &MergeDiffResult<'t>) -> Vec<AnalysisResult> {
        let ancestor = merge.ancestor();
        let base_changes = merge.base_vs_ancestor.changes_by_node();
        let other_changes = merge.other_vs_ancestor.changes_by_node();

        let mut candidates: Vec<HashSet<Change>> = Vec::new();
        let mut seen_anchors: FxHashSet<NodeId> = FxHashSet::default();

        let sides = [
            (merge.base_vs_ancestor.base, &merge.base_vs_ancestor.mapping),
            (merge.other_vs_ancestor.base, &merge.other_vs_ancestor.mapping),
        ];

        for (side, mapping) in sides {
            for n in side.all_nodes() {
                if !side.get(n).is_memory_operation() {
                    continue;
                }
                let Some(anchor) = mapping.get_from_left(n) else {
                    continue;
                };
                if !seen_anchors.insert(anchor) {
                    continue;
                }

                let mut cone: FxHashSet<NodeId> = ancestor.recursive_dependencies(anchor, true);
                cone.extend(ancestor.recursive_reverse_dependencies(anchor, true));
                cone.insert(anchor);

                let mut base_set: HashSet<Change> = HashSet::new();
                let mut other_set: HashSet<Change> = HashSet::new();
                for &cn in &cone {
                    if let Some(&change) = base_changes.get_other(cn) {
                        base_set.insert(change);
                    }
                    if let Some(&change) = other_changes.get_other(cn) {
                        other_set.insert(change);
                    }
                }

                if base_set.is_empty() || other_set.is_empty() {
                    continue;
                }

                let mut combined = base_set;
                combined.extend(other_set);
                candidates.push(combined);
            }
        }

        debug!(
            "{} candidate conflict sets before optimization",
            candidates.len()
        );
        let optimized = optimize_change_sets(candidates, |a, b| descends_from(ancestor, *a, *b));

        optimized
            .into_iter()
            .map(|changes| {
                let base_nodes = changes.iter().filter_map(Change::base_node).collect();
                let other_nodes = changes.iter().filter_map(Change::other_node).collect();
                AnalysisResult {
                    tag: Tag::MemoryDependenceConflict,
                    severity: Tag::MemoryDependenceConflict.default_severity(),
                    base_nodes,
                    other_nodes,
                }
            })
            .collect()
    }
}

/// Whether the ancestor node touched by `a` is a descendant of the ancestor node touched
/// by `b`. Changes with no ancestor counterpart (pure insertions) never descend from
/// anything.
fn descends_from(ancestor: &crate::ir::Tree, a: Change, b: Change) -> bool {
    let (Some(a_node), Some(b_node)) = (ancestor_node_of(a), ancestor_node_of(b)) else {
        return false;
    };
    a_node != b_node && ancestor.ancestors(a_node).contains(&b_node)
}

fn ancestor_node_of(change: Change) -> Option<NodeId> {
    match change {
        Change::Insert(n) => Some(n),
        Change::Rename(_, n) => Some(n),
        Change::Delete(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{self, MergeDiffResult};
    use crate::ir::builder::TreeBuilder;
    use crate::ir::{DependencyKind, Tree};
    use crate::tree_matcher::TreeMatcher;

    fn matcher() -> TreeMatcher {
        TreeMatcher {
            min_height: 1,
            min_dice: 0.3,
            max_size: 100,
        }
    }

    /// `block(write[label] read[label])`, with `read` depending on `write` via a `Flow`
    /// edge, same as a real front-end would wire up for a variable read/write pair. Every
    /// tree in a merge carries its own dependency edges, so this is built per revision
    /// rather than shared: memory operations are a property of the revision's own tree.
    fn write_read_block(write_label: &str, read_label: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let write = b.node("write", Some(write_label.into()), None, None, vec![]);
        let read = b.node("read", Some(read_label.into()), None, None, vec![]);
        b.add_dependency(read, write, DependencyKind::Flow);
        let root = b.node("block", None, None, None, vec![write, read]);
        b.finish(root)
    }

    #[test]
    fn flags_dependency_changed_on_one_side_while_dependent_moved_on_the_other() {
        let ancestor = write_read_block("x", "x");
        let base = write_read_block("y", "x");
        let other = write_read_block("x", "z");

        let base_vs_ancestor = diff::diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff::diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        let results = DependenceAnalysis.run(&merged);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tag, Tag::MemoryDependenceConflict);
    }

    #[test]
    fn unrelated_changes_do_not_conflict() {
        let ancestor = write_read_block("x", "x");
        let other = write_read_block("x", "x");

        let mut b = TreeBuilder::new();
        let write = b.node("write", Some("x".into()), None, None, vec![]);
        let read = b.node("read", Some("x".into()), None, None, vec![]);
        b.add_dependency(read, write, DependencyKind::Flow);
        let unrelated = b.node("stmt", Some("unrelated".into()), None, None, vec![]);
        let root = b.node("block", None, None, None, vec![write, read, unrelated]);
        let base = b.finish(root);

        let base_vs_ancestor = diff::diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff::diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        let results = DependenceAnalysis.run(&merged);
        assert!(results.is_empty());
    }

    /// Mirrors an assignment whose right-hand side changes on one side while a node that
    /// reads the assigned variable changes on the other. `assign` has no dependency edge
    /// of its own into its right-hand side, only the mirrored `Flow` edge from `read`, so
    /// the right-hand side is pulled into the cone only via the memory-operation
    /// child-expansion in `Tree::recursive_dependencies`.
    fn assign_read_block(rhs_label: &str, read_label: &str) -> Tree {
        let mut b = TreeBuilder::new();
        let rhs = b.node("lit", Some(rhs_label.into()), None, None, vec![]);
        let assign = b.node("assign", Some("c".into()), None, None, vec![rhs]);
        let read = b.node("read", Some(read_label.into()), None, None, vec![]);
        b.add_dependency(read, assign, DependencyKind::Flow);
        let root = b.node("block", None, None, None, vec![assign, read]);
        b.finish(root)
    }

    #[test]
    fn flags_rhs_change_pulled_in_through_memory_op_children() {
        let ancestor = assign_read_block("1", "c");
        let base = assign_read_block("2", "c");
        let other = assign_read_block("1", "c2");

        let base_vs_ancestor = diff::diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff::diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        let results = DependenceAnalysis.run(&merged);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tag, Tag::MemoryDependenceConflict);
    }
}
