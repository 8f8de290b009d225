//! A plain-text tree dump, used for `--debug` introspection of a [`Tree`]. Generalized
//! from the teacher's `ascii_tree` debug printer to show diff tags (`changed`, `mapped`)
//! instead of a tree-sitter grammar name.

use std::fmt::Write as _;

use super::{NodeId, Tree};

pub fn ascii_tree(tree: &Tree) -> String {
    let mut out = String::new();
    write_node(tree, tree.root(), 0, &mut out);
    out
}

fn write_node(tree: &Tree, id: NodeId, depth: usize, out: &mut String) {
    let node = tree.get(id);
    let indent = "  ".repeat(depth);
    let mut tags = Vec::new();
    if node.is_changed() {
        tags.push("changed".to_string());
    }
    if node.mapping().is_some() {
        tags.push("mapped".to_string());
    }
    let tag_suffix = if tags.is_empty() {
        String::new()
    } else {
        format!(" <{}>", tags.join(", "))
    };
    let _ = writeln!(out, "{indent}{}{tag_suffix}", node.name());
    for &child in &node.children {
        write_node(tree, child, depth + 1, out);
    }
}
