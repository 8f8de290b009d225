//! Analyses run over a [`crate::diff::MergeDiffResult`] to surface semantic merge
//! conflicts that a textual or purely structural merge would miss.

pub mod dependence;
pub mod optimizer;
pub mod reference;
pub mod registry;

use rustc_hash::FxHashSet;

use crate::diff::MergeDiffResult;
use crate::ir::{NodeId, Range, Tree};

/// The kind of conflict an [`AnalysisResult`] reports, used both for display and as the
/// grouping key for [`crate::report::Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    MemoryDependenceConflict,
    RenamedReferenceConflict,
    DeletedReferenceConflict,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Self::MemoryDependenceConflict => "memory_dependence",
            Self::RenamedReferenceConflict => "renamed_reference",
            Self::DeletedReferenceConflict => "deleted_reference",
        }
    }

    pub fn default_severity(self) -> f64 {
        match self {
            Self::MemoryDependenceConflict => 1.0,
            Self::RenamedReferenceConflict => 2.0,
            Self::DeletedReferenceConflict => 1.5,
        }
    }
}

/// A single conflict found by an [`Analysis`]: a tagged set of nodes on each side that
/// jointly explain why the merge is unsafe.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub tag: Tag,
    pub severity: f64,
    pub base_nodes: FxHashSet<NodeId>,
    pub other_nodes: FxHashSet<NodeId>,
}

impl AnalysisResult {
    /// Source ranges on the base side. When `loose` is set, overlapping/adjacent node
    /// ranges are merged into a minimal span set; otherwise every node's exact range is
    /// kept separate.
    pub fn base_locations(&self, base: &Tree, loose: bool) -> Vec<Range> {
        Self::locations(&self.base_nodes, base, loose)
    }

    pub fn other_locations(&self, other: &Tree, loose: bool) -> Vec<Range> {
        Self::locations(&self.other_nodes, other, loose)
    }

    fn locations(nodes: &FxHashSet<NodeId>, tree: &Tree, loose: bool) -> Vec<Range> {
        let mut ranges: Vec<Range> = nodes
            .iter()
            .filter_map(|&n| tree.get(n).source_range.clone())
            .collect();
        if loose {
            Range::compress(ranges)
        } else {
            ranges.sort_by(|a, b| a.start.cmp(&b.start));
            ranges
        }
    }
}

/// A pluggable conflict-detection pass.
pub trait Analysis {
    /// The key used to select this analysis from the CLI / [`registry::Registry`].
    fn key(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn run<'t>(&self, merge: &MergeDiffResult<'t>) -> Vec<AnalysisResult>;
}
