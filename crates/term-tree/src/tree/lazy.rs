//! Term tree with lazy loading and checkbox state

use crate::tree::{Node, NodeDescriptor, NodeId, NodeKind, TermData, Tree, TreeTraversal};
use anyhow::{anyhow, bail, Result};
use log::{trace, warn};
use std::collections::HashMap;

/// State of a node's children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenState {
    /// Children have not been fetched yet
    NotLoaded,
    /// A fetch is in flight
    Loading,
    /// Children are in the tree, in display order
    Loaded(Vec<NodeId>),
    /// The last fetch failed; no children were applied
    Error(String),
}

/// Internal node storage with loading, expansion and selection state
#[derive(Debug, Clone)]
struct TermNode {
    node: Node<TermData>,
    parent: Option<NodeId>,
    children: ChildrenState,
    expanded: bool,
    selected: bool,
}

/// A term tree whose folders fetch their children on demand
///
/// The tree owns only what has been loaded so far. Fetching itself happens
/// outside (see [`crate::TreeController::expand`]); this type records the
/// outcome with [`LazyTree::begin_load`], [`LazyTree::insert_children`] and
/// [`LazyTree::fail_load`].
#[derive(Debug, Clone)]
pub struct LazyTree {
    /// Arena storage for nodes; index 0 is the invisible root
    nodes: Vec<TermNode>,
    /// Key -> NodeId for quick lookups
    key_index: HashMap<String, NodeId>,
}

impl Default for LazyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LazyTree {
    /// Create a tree holding only the invisible root
    pub fn new() -> Self {
        let root = TermNode {
            node: Node::folder("", "root", TermData::default()),
            parent: None,
            children: ChildrenState::NotLoaded,
            expanded: true,
            selected: false,
        };

        Self {
            nodes: vec![root],
            key_index: HashMap::new(),
        }
    }

    /// Build a tree from the initial source payload
    ///
    /// Nested children in the payload are loaded immediately; lazy folders
    /// without children stay unloaded.
    pub fn from_source(source: Vec<NodeDescriptor>) -> Self {
        let mut tree = Self::new();
        // The root is fresh and unloaded, so this cannot fail.
        if let Err(e) = tree.insert_children(NodeId::ROOT, source) {
            warn!("Failed to load initial source: {e}");
        }
        tree
    }

    /// Look up a loaded node by key
    pub fn node_by_key(&self, key: &str) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    /// Current children state of a node
    pub fn load_state(&self, id: NodeId) -> Option<&ChildrenState> {
        self.nodes.get(id.get()).map(|n| &n.children)
    }

    pub fn is_loaded(&self, id: NodeId) -> bool {
        matches!(self.load_state(id), Some(ChildrenState::Loaded(_)))
    }

    /// Whether expanding this node requires a fetch first
    ///
    /// True for folders that were never loaded or whose last fetch failed.
    pub fn needs_load(&self, id: NodeId) -> bool {
        self.is_folder(id)
            && matches!(
                self.load_state(id),
                Some(ChildrenState::NotLoaded | ChildrenState::Error(_))
            )
    }

    /// Mark a node as having a fetch in flight
    pub fn begin_load(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        node.children = ChildrenState::Loading;
        Ok(())
    }

    /// Record a failed fetch: the node keeps no children and collapses
    pub fn fail_load(&mut self, id: NodeId, message: impl Into<String>) -> Result<()> {
        let node = self.node_mut(id)?;
        node.children = ChildrenState::Error(message.into());
        node.expanded = false;
        Ok(())
    }

    /// Commit a batch of children under `parent`
    ///
    /// Descriptors with nested `children` are committed recursively. The
    /// parent must not already hold loaded children. Keys are unique within
    /// the tree: a descriptor whose key is already present is skipped along
    /// with its nested children.
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        batch: Vec<NodeDescriptor>,
    ) -> Result<Vec<NodeId>> {
        if self.is_loaded(parent) {
            bail!("{parent} already has loaded children");
        }
        self.node_mut(parent)?;

        let mut child_ids = Vec::with_capacity(batch.len());
        for mut descriptor in batch {
            if let Some(&existing) = self.key_index.get(&descriptor.key) {
                warn!(
                    "Skipping duplicate key {:?} under {parent}, already loaded as {existing}",
                    descriptor.key
                );
                continue;
            }
            let node = descriptor.to_node();
            let kind = node.kind;
            let nested = descriptor.children.take();
            let children = match (kind, nested.is_some(), descriptor.lazy) {
                (NodeKind::Folder, false, true) => ChildrenState::NotLoaded,
                _ => ChildrenState::Loaded(Vec::new()),
            };

            let node_id = NodeId::new(self.nodes.len());
            self.nodes.push(TermNode {
                node,
                parent: Some(parent),
                children,
                expanded: false,
                selected: descriptor.selected,
            });
            self.key_index.insert(descriptor.key.clone(), node_id);
            trace!("Inserted {} under {}", self.nodes[node_id.get()].node, parent);

            if let Some(nested) = nested {
                // Reset so the recursive call sees an unloaded parent
                self.nodes[node_id.get()].children = ChildrenState::NotLoaded;
                self.insert_children(node_id, nested)?;
            }
            // Expanded state only sticks on nodes whose children are present
            if descriptor.expanded && self.is_loaded(node_id) && kind.is_folder() {
                self.nodes[node_id.get()].expanded = true;
            }
            child_ids.push(node_id);
        }

        self.nodes[parent.get()].children = ChildrenState::Loaded(child_ids.clone());
        Ok(child_ids)
    }

    /// Expand or collapse a node
    ///
    /// Expanding requires loaded children. Returns whether the state changed;
    /// expanding an expanded node is a no-op.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        if expanded && !self.is_loaded(id) {
            bail!("Cannot expand {id} before its children are loaded");
        }
        if id == NodeId::ROOT || (expanded && self.is_leaf(id)) {
            return Ok(false);
        }
        let node = self.node_mut(id)?;
        let changed = node.expanded != expanded;
        node.expanded = expanded;
        Ok(changed)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.nodes.get(id.get()).map(|n| n.expanded).unwrap_or(false)
    }

    /// Whether a node can be seen without expanding anything further
    pub fn is_visible(&self, id: NodeId) -> bool {
        id.get() < self.nodes.len()
            && self
                .ancestors(id)
                .into_iter()
                .all(|ancestor| self.is_expanded(ancestor))
    }

    /// Check or uncheck a node. Returns whether the state changed.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<bool> {
        if id == NodeId::ROOT {
            bail!("The root node cannot be selected");
        }
        let node = self.node_mut(id)?;
        let changed = node.selected != selected;
        node.selected = selected;
        Ok(changed)
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.nodes.get(id.get()).map(|n| n.selected).unwrap_or(false)
    }

    /// Ids of all checked nodes, in pre-order
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.walk()
            .filter(|&id| self.is_selected(id))
            .collect()
    }

    /// Keys of all checked nodes, in pre-order
    pub fn selected_keys(&self) -> Vec<String> {
        self.selected_nodes()
            .into_iter()
            .filter_map(|id| self.key(id).map(str::to_string))
            .collect()
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TermNode> {
        self.nodes
            .get_mut(id.get())
            .ok_or_else(|| anyhow!("Invalid node ID {id}"))
    }
}

impl Tree for LazyTree {
    type NodeData = TermData;

    fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn get(&self, id: NodeId) -> Option<&Node<TermData>> {
        self.nodes.get(id.get()).map(|n| &n.node)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.get())?.parent
    }

    fn children(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        if let Some(node) = self.nodes.get(id.get()) {
            if let ChildrenState::Loaded(ref children) = node.children {
                return Box::new(children.iter().copied());
            }
        }

        Box::new(std::iter::empty())
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
