use super::node::{compute_hash, Node};
use super::{Dependency, DependencyKind, NodeId, Range, Tree};

/// Constructs a [`Tree`] bottom-up: children must be built (and their [`NodeId`]s known)
/// before the parent node that references them. This mirrors how a real front-end walks
/// a source AST post-order, and lets height/hash be computed eagerly as each node is
/// added rather than in a separate pass.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node with the given already-built `children`, returning its id.
    pub fn node(
        &mut self,
        kind: impl Into<String>,
        label: Option<String>,
        reference: Option<String>,
        source_range: Option<Range>,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.node_with_override(kind, label, reference, source_range, children, None)
    }

    /// As [`TreeBuilder::node`], explicitly overriding [`super::Node::is_memory_operation`]
    /// instead of deriving it from dependency kinds.
    pub fn node_with_override(
        &mut self,
        kind: impl Into<String>,
        label: Option<String>,
        reference: Option<String>,
        source_range: Option<Range>,
        children: Vec<NodeId>,
        is_memory_operation_override: Option<bool>,
    ) -> NodeId {
        let kind = kind.into();
        let child_hashes: Vec<u64> = children.iter().map(|&c| self.nodes[c.0].hash()).collect();
        let height = children
            .iter()
            .map(|&c| self.nodes[c.0].height())
            .max()
            .map_or(0, |m| m + 1);
        let hash = compute_hash(&kind, label.as_deref(), &child_hashes);

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(
            kind,
            label,
            reference,
            source_range,
            children.clone(),
            is_memory_operation_override,
            height,
            hash,
        ));
        for child in children {
            self.nodes[child.0].parent = Some(id);
        }
        id
    }

    /// Installs a dependency edge `from -> to`. Unless `reverse` is set, a mirrored
    /// reverse edge is also installed on `to`, matching the original IR's
    /// `add_dependencies` contract (forward and reverse edges kept in sync).
    pub fn add_dependency(&mut self, from: NodeId, to: NodeId, kind: DependencyKind) {
        self.nodes[from.0].deps.push(Dependency {
            target: to,
            kind,
            reverse: false,
        });
        self.nodes[to.0].rdeps.push(Dependency {
            target: from,
            kind,
            reverse: true,
        });
    }

    pub fn finish(self, root: NodeId) -> Tree {
        Tree {
            nodes: self.nodes,
            root,
        }
    }
}
