//! Flags references left untouched on one side of a merge to a definition that the other
//! side renamed or deleted, the same way a human reviewer would worry about "does this
//! usage still resolve to anything sensible after the merge".

use super::{Analysis, AnalysisResult, Tag};
use crate::diff::MergeDiffResult;
use crate::edit_script::Change;
use crate::ir::{DependencyKind, NodeId};

pub struct ReferenceAnalysis;

impl Analysis for ReferenceAnalysis {
    fn key(&self) -> &'static str {
        "reference"
    }

    fn description(&self) -> &'static str {
        "flags references left unchanged on one side to a definition renamed or deleted on the other"
    }

    fn run<'t>(&self, merge: &MergeDiffResult<'t>) -> Vec<AnalysisResult> {
        let ancestor = merge.ancestor();
        let base_changes = merge.base_vs_ancestor.changes_by_node();
        let other_changes = merge.other_vs_ancestor.changes_by_node();

        let mut results = Vec::new();

        for def in ancestor.all_nodes() {
            if !ancestor.get(def).is_definition() {
                continue;
            }

            let referrers: Vec<NodeId> = ancestor
                .get(def)
                .rdeps
                .iter()
                .filter(|d| d.kind == DependencyKind::Reference)
                .map(|d| d.target)
                .collect();
            if referrers.is_empty() {
                continue;
            }

            check_side(def, &referrers, base_changes, other_changes, &mut results);
            check_side(def, &referrers, other_changes, base_changes, &mut results);
        }

        results
    }
}

/// Checks whether `changer` renamed/deleted `def` while `holder`'s side left at least one
/// referrer untouched, and if so records a conflict. `base_nodes`/`other_nodes` on the
/// resulting [`AnalysisResult`] are populated from the diff each change actually came
/// from, so the direction of `changer` vs `holder` doesn't need to be tracked by the caller.
fn check_side(
    def: NodeId,
    referrers: &[NodeId],
    changer: &crate::edit_script::ChangesByNode,
    holder: &crate::edit_script::ChangesByNode,
    results: &mut Vec<AnalysisResult>,
) {
    let Some(&def_change) = changer.get_other(def) else {
        return;
    };

    let stale_referrers: Vec<NodeId> = referrers
        .iter()
        .copied()
        .filter(|&r| holder.get_other(r).is_none())
        .collect();
    if stale_referrers.is_empty() {
        return;
    }

    let tag = match def_change {
        Change::Insert(_) => Tag::DeletedReferenceConflict,
        Change::Rename(_, _) => Tag::RenamedReferenceConflict,
        Change::Delete(_) => return,
    };

    let mut changer_nodes = vec![def_change];
    for &r in &stale_referrers {
        changer_nodes.extend(changer.get_other(r).copied());
    }

    results.push(AnalysisResult {
        tag,
        severity: tag.default_severity(),
        base_nodes: changer_nodes.iter().filter_map(Change::base_node).collect(),
        other_nodes: changer_nodes.iter().filter_map(Change::other_node).collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{self, MergeDiffResult};
    use crate::ir::builder::TreeBuilder;
    use crate::ir::sexpr;
    use crate::tree_matcher::TreeMatcher;

    fn matcher() -> TreeMatcher {
        TreeMatcher {
            min_height: 1,
            min_dice: 0.3,
            max_size: 100,
        }
    }

    fn ancestor_with_reference() -> crate::ir::Tree {
        let mut b = TreeBuilder::new();
        let def = b.node("def", Some("f".into()), None, None, vec![]);
        let call = b.node("call", Some("f".into()), None, None, vec![]);
        b.add_dependency(call, def, DependencyKind::Reference);
        let root = b.node("module", None, None, None, vec![def, call]);
        b.finish(root)
    }

    #[test]
    fn flags_rename_of_a_definition_still_referenced_unchanged_elsewhere() {
        let ancestor = ancestor_with_reference();
        let base = sexpr::parse("module(def[g] call[f])").unwrap();
        let other = sexpr::parse("module(def[f] call[f])").unwrap();

        let base_vs_ancestor = diff::diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff::diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        let results = ReferenceAnalysis.run(&merged);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tag, Tag::RenamedReferenceConflict);
    }

    #[test]
    fn no_conflict_when_both_sides_leave_the_definition_untouched() {
        let ancestor = ancestor_with_reference();
        let base = sexpr::parse("module(def[f] call[f])").unwrap();
        let other = sexpr::parse("module(def[f] call[f])").unwrap();

        let base_vs_ancestor = diff::diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff::diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        let results = ReferenceAnalysis.run(&merged);
        assert!(results.is_empty());
    }
}
