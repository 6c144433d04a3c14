//! Core node types for the term tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in the tree's arena storage
///
/// Ids are only meaningful for the tree that issued them. Loaded nodes are
/// never removed, so an id stays valid for the lifetime of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The invisible root that holds the top-level nodes
    pub const ROOT: NodeId = NodeId(0);

    pub const fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(id: usize) -> Self {
        NodeId(id)
    }
}

/// Whether a node may own children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A vocabulary or a term with child terms
    Folder,
    /// A term without children
    Leaf,
}

impl NodeKind {
    pub const fn is_folder(self) -> bool {
        matches!(self, NodeKind::Folder)
    }

    pub const fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Leaf)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Folder => write!(f, "Folder"),
            NodeKind::Leaf => write!(f, "Leaf"),
        }
    }
}

/// Extra data carried by every node and echoed back when fetching children
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermData {
    /// Set on vocabulary (container) nodes; the child endpoint uses it to
    /// tell a vocabulary id from a term id.
    #[serde(default)]
    pub vocab: bool,
}

/// A single node in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node<D> {
    /// Unique key within the tree (term id or vocabulary id)
    pub key: String,
    /// Display label
    pub title: String,
    pub kind: NodeKind,
    pub data: D,
}

impl<D> Node<D> {
    pub fn new(key: impl Into<String>, title: impl Into<String>, kind: NodeKind, data: D) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            kind,
            data,
        }
    }

    pub fn folder(key: impl Into<String>, title: impl Into<String>, data: D) -> Self {
        Self::new(key, title, NodeKind::Folder, data)
    }

    pub fn leaf(key: impl Into<String>, title: impl Into<String>, data: D) -> Self {
        Self::new(key, title, NodeKind::Leaf, data)
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }
}

impl<D> fmt::Display for Node<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.title, self.key, self.kind)
    }
}

/// Node as it travels over the wire, both in the initial source payload and
/// in child fetch responses
///
/// Nested `children` are only expected in the initial source. A `lazy`
/// folder without children gets its children from the node source when it
/// is first expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub key: String,
    #[serde(alias = "label")]
    pub title: String,
    #[serde(default)]
    pub folder: bool,
    #[serde(default)]
    pub lazy: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub data: TermData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeDescriptor>>,
}

impl NodeDescriptor {
    /// A term without children
    pub fn term(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// A term whose children are fetched on first expand
    pub fn lazy_term(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            folder: true,
            lazy: true,
            ..Self::term(key, title)
        }
    }

    /// A vocabulary container whose root terms are fetched on first expand
    pub fn vocabulary(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            data: TermData { vocab: true },
            ..Self::lazy_term(key, title)
        }
    }

    pub fn with_children(mut self, children: Vec<NodeDescriptor>) -> Self {
        self.folder = true;
        self.children = Some(children);
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn kind(&self) -> NodeKind {
        if self.folder || self.lazy || self.children.is_some() {
            NodeKind::Folder
        } else {
            NodeKind::Leaf
        }
    }

    pub(crate) fn to_node(&self) -> Node<TermData> {
        Node::new(
            self.key.clone(),
            self.title.clone(),
            self.kind(),
            self.data.clone(),
        )
    }
}
