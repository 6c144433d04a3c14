//! Core tree abstraction for the term hierarchy
//!
//! A generic tree trait with traversal helpers, and the lazily loaded term
//! tree that backs each selector instance.

mod lazy;
mod node;
mod traits;

pub use lazy::{ChildrenState, LazyTree};
pub use node::{Node, NodeDescriptor, NodeId, NodeKind, TermData};
pub use traits::{SubtreeWalker, Tree, TreeTraversal};

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        ChildrenState, LazyTree, Node, NodeDescriptor, NodeId, NodeKind, TermData, Tree,
        TreeTraversal,
    };
}
