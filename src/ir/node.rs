use std::cell::Cell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A location referring to a whole line rather than a specific column.
    pub fn is_line(&self) -> bool {
        self.column == 0
    }

    /// Parses `file:line:column`. An empty string has no location at all. Anything else
    /// must split into exactly three `:`-separated parts.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let parts: Vec<&str> = text.split(':').collect();
        assert_eq!(parts.len(), 3, "malformed location '{text}', expected file:line:column");
        let line = parts[1].parse().expect("location line must be an integer");
        let column = parts[2].parse().expect("location column must be an integer");
        Some(Self::new(parts[0], line, column))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.file.is_empty() || other.file.is_empty() {
            (self.line, self.column).cmp(&(other.line, other.column))
        } else {
            (&self.file, self.line, self.column).cmp(&(&other.file, other.line, other.column))
        }
    }
}

/// A contiguous span of source, from `start` to `end`, both in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

impl Range {
    pub fn new(start: Location, end: Location) -> Self {
        assert_eq!(start.file, end.file, "a range cannot span multiple files");
        Self { start, end }
    }

    /// Half-open overlap: `[start, end)` against `[other.start, other.end)`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.file == other.start.file && self.start < other.end && other.start < self.end
    }

    pub fn contains_location(&self, loc: &Location) -> bool {
        self.start.file == loc.file && self.start <= *loc && *loc < self.end
    }

    pub fn contains_range(&self, other: &Self) -> bool {
        self.start.file == other.start.file && self.start <= other.start && other.end <= self.end
    }

    /// Merges overlapping ranges in `ranges`, returning a minimal sorted set of disjoint ranges.
    pub fn compress(mut ranges: Vec<Range>) -> Vec<Range> {
        ranges.sort_by(|a, b| a.start.cmp(&b.start));
        let mut result: Vec<Range> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match result.last_mut() {
                Some(last) if last.overlaps(&range) => {
                    if range.end > last.end {
                        last.end = range.end;
                    }
                }
                _ => result.push(range),
            }
        }
        result
    }
}

/// The kind of edge a [`Dependency`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Control,
    Flow,
    Anti,
    Output,
    Input,
    Reference,
    Argument,
    Other,
}

impl DependencyKind {
    /// Whether this kind represents a dependency through shared memory/state,
    /// as opposed to control flow or symbolic reference.
    pub fn is_memory(self) -> bool {
        matches!(
            self,
            Self::Flow | Self::Anti | Self::Input | Self::Output
        )
    }
}

/// A directed edge from one node to another in the dependency graph overlaid on the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: NodeId,
    pub kind: DependencyKind,
    /// Whether this edge was synthesized as the mirror of one installed in the other direction.
    pub reverse: bool,
}

/// An index into a [`Tree`]'s arena. Only meaningful relative to the `Tree` it was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A node in the intermediate representation.
///
/// Structural fields (`kind`, `label`, `reference`, `children`, `parent`, `source_range`,
/// `deps`, `rdeps`, `height`, `hash`) are frozen once the owning [`Tree`] is built.
/// `mapping` and `is_changed` are write-once tags applied during diffing.
#[derive(Debug)]
pub struct Node {
    pub kind: String,
    pub label: Option<String>,
    pub reference: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub source_range: Option<Range>,
    is_memory_operation_override: Option<bool>,
    pub deps: Vec<Dependency>,
    pub rdeps: Vec<Dependency>,
    pub(crate) mapping: Cell<Option<NodeId>>,
    pub(crate) is_changed: Cell<bool>,
    pub(crate) height: u32,
    pub(crate) hash: u64,
}

impl Node {
    pub(crate) fn new(
        kind: String,
        label: Option<String>,
        reference: Option<String>,
        source_range: Option<Range>,
        children: Vec<NodeId>,
        is_memory_operation_override: Option<bool>,
        height: u32,
        hash: u64,
    ) -> Self {
        Self {
            kind,
            label,
            reference,
            children,
            parent: None,
            source_range,
            is_memory_operation_override,
            deps: Vec::new(),
            rdeps: Vec::new(),
            mapping: Cell::new(None),
            is_changed: Cell::new(false),
            height,
            hash,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// A memory operation reads from or writes to shared state (as opposed to only
    /// operating on values passed through control/data flow). Nodes can override the
    /// default (derived from which dependency kinds they participate in) explicitly.
    pub fn is_memory_operation(&self) -> bool {
        if let Some(explicit) = self.is_memory_operation_override {
            return explicit;
        }
        self.deps.iter().any(|d| d.kind.is_memory())
            || self.rdeps.iter().any(|d| d.kind.is_memory())
    }

    /// A node that other nodes can refer to by reference (i.e. has incoming `Reference` edges).
    pub fn is_definition(&self) -> bool {
        self.rdeps
            .iter()
            .any(|d| d.kind == DependencyKind::Reference)
    }

    pub fn mapping(&self) -> Option<NodeId> {
        self.mapping.get()
    }

    pub fn is_changed(&self) -> bool {
        self.is_changed.get()
    }

    /// Sets the cross-tree mapping for this node. Panics in debug builds if already set
    /// to a different value, per the write-once invariant.
    pub(crate) fn set_mapping(&self, target: NodeId) {
        if let Some(existing) = self.mapping.get() {
            if existing != target {
                crate::error::InternalError::debug_panic(Err::<(), _>(
                    crate::error::CheckMergeError::InternalInconsistency(format!(
                        "node mapping written twice with different targets ({existing:?} then {target:?})"
                    )),
                ))
                .ok();
            }
            return;
        }
        self.mapping.set(Some(target));
    }

    pub(crate) fn mark_changed(&self) {
        self.is_changed.set(true);
    }

    /// A human-readable name for this node, used for display and as the basis of
    /// edit-script change descriptions: `kind:label` if labeled, else just `kind`.
    pub fn name(&self) -> String {
        match &self.label {
            Some(label) => format!("{}:{}", self.kind, label),
            None => self.kind.clone(),
        }
    }
}

/// Computes the canonical isomorphism hash for a node from its kind/label and the
/// already-computed hashes of its children, as `"{kind@label|child_hash,child_hash,...}"`.
pub(crate) fn compute_hash(kind: &str, label: Option<&str>, child_hashes: &[u64]) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    label.hash(&mut hasher);
    for h in child_hashes {
        h.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_string_has_no_location() {
        assert_eq!(Location::parse(""), None);
    }

    #[test]
    fn parse_splits_file_line_column() {
        assert_eq!(Location::parse("foo.c:12:4"), Some(Location::new("foo.c", 12, 4)));
    }

    #[test]
    #[should_panic]
    fn parse_rejects_wrong_arity() {
        Location::parse("foo.c:12");
    }

    #[test]
    fn ranges_touching_at_a_boundary_do_not_overlap() {
        let file = "foo.c";
        let first = Range::new(Location::new(file, 1, 0), Location::new(file, 1, 5));
        let second = Range::new(Location::new(file, 1, 5), Location::new(file, 1, 10));
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn contains_location_excludes_the_end() {
        let file = "foo.c";
        let range = Range::new(Location::new(file, 1, 0), Location::new(file, 1, 5));
        assert!(range.contains_location(&Location::new(file, 1, 0)));
        assert!(range.contains_location(&Location::new(file, 1, 4)));
        assert!(!range.contains_location(&Location::new(file, 1, 5)));
    }

    #[test]
    fn compress_keeps_touching_ranges_separate_but_merges_overlapping_ones() {
        let file = "foo.c";
        let a = Range::new(Location::new(file, 1, 0), Location::new(file, 1, 5));
        let b = Range::new(Location::new(file, 1, 5), Location::new(file, 1, 10));
        let c = Range::new(Location::new(file, 1, 8), Location::new(file, 1, 12));

        let compressed = Range::compress(vec![a.clone(), b.clone()]);
        assert_eq!(compressed, vec![a, b.clone()]);

        let compressed = Range::compress(vec![b.clone(), c]);
        assert_eq!(compressed, vec![Range::new(Location::new(file, 1, 5), Location::new(file, 1, 12))]);
    }
}
