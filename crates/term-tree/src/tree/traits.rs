//! Navigation over the loaded part of a term hierarchy

use crate::tree::{Node, NodeId};

/// A hierarchical tree of keyed nodes
///
/// Only loaded nodes are visible through this trait: a folder whose
/// children have not been fetched reports none.
pub trait Tree {
    type NodeData;

    /// The invisible root, parent of the top-level terms
    fn root(&self) -> NodeId;

    /// `None` for invalid ids
    fn get(&self, id: NodeId) -> Option<&Node<Self::NodeData>>;

    /// `None` for the root
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Loaded children in display order
    fn children(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_>;

    /// Loaded nodes, the root included
    fn node_count(&self) -> usize;

    fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.is_leaf())
    }

    fn is_folder(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.is_folder())
    }

    fn key(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.key.as_str())
    }

    fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Ancestors from the parent up to the root
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.parent(id), |&ancestor| self.parent(ancestor)).collect()
    }

    /// Number of ancestors; top-level terms sit at depth 1
    fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// Keys from the top-level term down to `id`, each prefixed with `/`
    /// (`/2/3/7`). Empty for the root.
    fn key_path(&self, id: NodeId) -> String {
        let mut path: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&node| node != self.root())
            .filter_map(|node| self.key(node))
            .collect();
        path.reverse();
        path.iter().map(|key| format!("/{key}")).collect()
    }
}

/// Pre-order walks, implemented for every [`Tree`]
pub trait TreeTraversal: Tree + Sized {
    /// Every loaded node, the root first
    fn walk(&self) -> SubtreeWalker<'_, Self> {
        self.walk_from(self.root())
    }

    /// `start` and its loaded descendants, parents before children
    fn walk_from(&self, start: NodeId) -> SubtreeWalker<'_, Self> {
        SubtreeWalker {
            tree: self,
            pending: vec![start],
        }
    }
}

impl<T: Tree> TreeTraversal for T {}

/// Pre-order iterator over a subtree
pub struct SubtreeWalker<'a, T> {
    tree: &'a T,
    pending: Vec<NodeId>,
}

impl<T: Tree> Iterator for SubtreeWalker<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.pending.pop()?;
        let children: Vec<_> = self.tree.children(current).collect();
        // Reversed so the first child is popped next
        self.pending.extend(children.into_iter().rev());
        Some(current)
    }
}
