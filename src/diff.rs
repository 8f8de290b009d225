use std::cell::OnceCell;
use std::time::Instant;

use log::debug;

use crate::edit_script::{self, Change, ChangesByNode};
use crate::ir::Tree;
use crate::matching::Matching;
use crate::tree_matcher::TreeMatcher;

/// The result of diffing two trees: their node matching, and (lazily, since many
/// analyses only need the per-node index) the derived edit script.
pub struct DiffResult<'t> {
    pub base: &'t Tree,
    pub other: &'t Tree,
    pub mapping: Matching<'t>,
    changes: OnceCell<Vec<Change>>,
    changes_by_node: OnceCell<ChangesByNode>,
}

impl<'t> DiffResult<'t> {
    pub fn changes(&self) -> &[Change] {
        self.changes
            .get_or_init(|| {
                let mut changes = edit_script::derive(self.base, self.other, &self.mapping);
                edit_script::sort_by_location(&mut changes, self.base, self.other);
                edit_script::tag_nodes(self.base, self.other, &self.mapping, &changes);
                changes
            })
            .as_slice()
    }

    pub fn changes_by_node(&self) -> &ChangesByNode {
        self.changes_by_node
            .get_or_init(|| ChangesByNode::build(self.changes()))
    }
}

/// Diffs `base` against `other`, producing their node matching and (on demand) edit
/// script.
pub fn diff<'t>(base: &'t Tree, other: &'t Tree, matcher: &TreeMatcher) -> DiffResult<'t> {
    let start = Instant::now();
    let mapping = matcher.match_trees(base, other).full;
    debug!("diff(base, other) took {:?}", start.elapsed());
    DiffResult {
        base,
        other,
        mapping,
        changes: OnceCell::new(),
        changes_by_node: OnceCell::new(),
    }
}

/// Composes two matchings that share a middle tree (the common ancestor), producing the
/// base-to-other matching implied by going through it: `base -> ancestor -> other`.
pub fn combine<'t>(to_ancestor: &Matching<'t>, from_ancestor: &Matching<'t>) -> Matching<'t> {
    to_ancestor.compose(from_ancestor)
}

/// The result of a three-way diff: base-vs-other (`base_vs_other`), plus the two
/// ancestor-relative diffs it was derived from.
pub struct MergeDiffResult<'t> {
    pub base_vs_ancestor: DiffResult<'t>,
    pub other_vs_ancestor: DiffResult<'t>,
    /// The base-to-other matching: `combine(base_vs_ancestor, other_vs_ancestor)`,
    /// extended with any additional pairs found by diffing base against other directly
    /// (seeded with the combined matching) that don't conflict with it.
    pub base_vs_other: Matching<'t>,
}

impl<'t> MergeDiffResult<'t> {
    pub fn ancestor(&self) -> &'t Tree {
        self.base_vs_ancestor.other
    }

    pub fn new(
        base_vs_ancestor: DiffResult<'t>,
        other_vs_ancestor: DiffResult<'t>,
        matcher: &TreeMatcher,
    ) -> Self {
        let combined = combine(
            &base_vs_ancestor.mapping,
            &other_vs_ancestor.mapping.clone().into_reversed(),
        );

        let direct = matcher.match_trees(base_vs_ancestor.base, other_vs_ancestor.base).full;
        let mut base_vs_other = combined;
        for (l, r) in direct.iter() {
            if base_vs_other.get_from_left(l).is_none() && base_vs_other.get_from_right(r).is_none() {
                base_vs_other.add(l, r);
            }
        }

        Self {
            base_vs_ancestor,
            other_vs_ancestor,
            base_vs_other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::sexpr;

    fn matcher() -> TreeMatcher {
        TreeMatcher {
            min_height: 1,
            min_dice: 0.3,
            max_size: 100,
        }
    }

    #[test]
    fn diff_of_identical_trees_has_no_changes() {
        let base = sexpr::parse("fn[f](stmt[a])").unwrap();
        let other = sexpr::parse("fn[f](stmt[a])").unwrap();
        let result = diff(&base, &other, &matcher());
        assert!(result.changes().is_empty());
    }

    #[test]
    fn merge_diff_result_combines_through_ancestor() {
        let ancestor = sexpr::parse("fn[f](stmt[a])").unwrap();
        let base = sexpr::parse("fn[f](stmt[a] stmt[b])").unwrap();
        let other = sexpr::parse("fn[g](stmt[a])").unwrap();

        let base_vs_ancestor = diff(&base, &ancestor, &matcher());
        let other_vs_ancestor = diff(&other, &ancestor, &matcher());
        let merged = MergeDiffResult::new(base_vs_ancestor, other_vs_ancestor, &matcher());

        // the shared `stmt[a]` node should be matched across base and other
        let base_stmt_a = base.get(base.root()).children[0];
        let other_stmt_a = other.get(other.root()).children[0];
        assert_eq!(merged.base_vs_other.get_from_left(base_stmt_a), Some(other_stmt_a));
    }
}
