use std::{cmp::Ordering, collections::BinaryHeap};

use crate::ir::{NodeId, Tree};

/// A priority queue which indexes nodes by their height.
/// This follows the "indexed priority list" of
/// [Fine-grained and accurate source code differencing](https://hal.science/hal-01054552), Falleri et al. 2014.
pub struct PriorityList<'tree> {
    tree: &'tree Tree,
    heap: BinaryHeap<Entry>,
}

#[derive(PartialEq, Eq)]
struct Entry {
    height: u32,
    id: NodeId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.height, self.id).cmp(&(other.height, other.id))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'tree> PriorityList<'tree> {
    /// Creates an empty priority list over `tree`.
    pub fn new(tree: &'tree Tree) -> Self {
        Self {
            tree,
            heap: BinaryHeap::new(),
        }
    }

    /// Adds a new node to the priority list.
    pub fn push(&mut self, id: NodeId) {
        let height = self.tree.get(id).height();
        self.heap.push(Entry { height, id });
    }

    /// Returns the maximum height of the nodes in the list.
    pub fn peek_max(&self) -> Option<u32> {
        self.heap.peek().map(|entry| entry.height)
    }

    /// Returns the list of all nodes with maximum height.
    pub fn pop(&mut self) -> Vec<NodeId> {
        let desired_height = self.peek_max();
        let mut results = Vec::new();
        while desired_height.is_some() && desired_height == self.peek_max() {
            results.push(self.heap.pop().unwrap().id);
        }
        results
    }

    /// Adds all of the direct children of a node into the queue.
    pub fn open(&mut self, id: NodeId) {
        let children = self.tree.get(id).children.clone();
        for child in children {
            self.push(child);
        }
    }

    /// Adds the direct children of every node in `ids` into the queue.
    pub fn open_all(&mut self, ids: &[NodeId]) {
        for &id in ids {
            self.open(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::sexpr;

    #[test]
    fn empty() {
        let tree = sexpr::parse("leaf").unwrap();
        let mut priority_list = PriorityList::new(&tree);

        assert_eq!(priority_list.peek_max(), None);
        assert_eq!(priority_list.pop().len(), 0);
    }

    #[test]
    fn one_element() {
        let tree = sexpr::parse("leaf").unwrap();
        let mut priority_list = PriorityList::new(&tree);

        priority_list.push(tree.root());

        assert_eq!(priority_list.peek_max(), Some(0));
        assert_eq!(priority_list.pop(), vec![tree.root()]);
    }

    #[test]
    fn two_elements_same_height() {
        let tree = sexpr::parse("root(a(x) b(y))").unwrap();
        let mut priority_list = PriorityList::new(&tree);
        let children = tree.get(tree.root()).children.clone();

        for &child in &children {
            priority_list.push(child);
        }

        assert_eq!(priority_list.peek_max(), Some(1));
        let popped = priority_list.pop();
        assert_eq!(popped.len(), 2);
        assert!(priority_list.pop().is_empty());
    }

    #[test]
    fn two_elements_increasing_height() {
        let short = sexpr::parse("root(a(x) b)").unwrap();
        let mut priority_list = PriorityList::new(&short);
        let children = short.get(short.root()).children.clone();
        for &child in &children {
            priority_list.push(child);
        }

        // `a(x)` has height 1, `b` has height 0: only the taller one is popped first.
        assert_eq!(priority_list.peek_max(), Some(1));
        let popped = priority_list.pop();
        assert_eq!(popped.len(), 1);
        assert_eq!(priority_list.peek_max(), Some(0));
    }

    #[test]
    fn open_pushes_direct_children() {
        let tree = sexpr::parse("root(a(x) b(y))").unwrap();
        let mut priority_list = PriorityList::new(&tree);

        priority_list.open(tree.root());

        assert_eq!(priority_list.peek_max(), Some(1));
        assert_eq!(priority_list.pop().len(), 2);
    }

    #[test]
    fn open_all_pushes_children_of_every_node() {
        let tree = sexpr::parse("root(a(x y) b(z))").unwrap();
        let mut priority_list = PriorityList::new(&tree);
        let children = tree.get(tree.root()).children.clone();

        priority_list.open_all(&children);

        // `a`'s two leaf children plus `b`'s one leaf child: three height-0 nodes.
        assert_eq!(priority_list.peek_max(), Some(0));
        assert_eq!(priority_list.pop().len(), 3);
    }
}
