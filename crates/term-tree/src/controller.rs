//! One tree selector instance: the tree, its node source and its form field.

use crate::config::{PersistedSelection, SelectMode, TreeConfig, TreeOptions};
use crate::expand::{expand_all, ExpansionQueue, ExpansionReport};
use crate::preselect::annotate_nested;
use crate::source::{ChildRequest, NodeSource};
use crate::sync::{FormState, SelectionSync};
use crate::tree::{ChildrenState, LazyTree, NodeId, Tree, TreeTraversal};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared "still active" flag of a tree instance
///
/// Clones observe the same flag. Once torn down, pending continuations of
/// the instance stop before touching the tree or the form.
#[derive(Debug, Clone)]
pub struct Lifecycle(Rc<Cell<bool>>);

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle(Rc::new(Cell::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    pub fn teardown(&self) {
        self.0.set(false);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one tree: lazy loading, preselection, checkbox events and the
/// startup expansion, keeping the form field in sync throughout.
///
/// # Example
///
/// ```ignore
/// let form = Rc::new(RefCell::new(FormState::new()));
/// let mut controller = TreeController::new(config, source, form.clone(), TreeOptions::default());
/// block_on(controller.start());
/// println!("{:?}", form.borrow().values(controller.field_name()));
/// ```
pub struct TreeController<S> {
    id: String,
    options: TreeOptions,
    tree: LazyTree,
    source: S,
    defaults: Vec<PersistedSelection>,
    pending: ExpansionQueue,
    selection_sync: SelectionSync,
    form: Rc<RefCell<FormState>>,
    lifecycle: Lifecycle,
    deferring_sync: bool,
    sync_count: usize,
}

impl<S: NodeSource> TreeController<S> {
    /// Build the instance from its configuration
    ///
    /// The initial source is preselected against the persisted values before
    /// it enters the tree. The expansion list is queued for [`Self::start`].
    pub fn new(
        config: TreeConfig,
        source: S,
        form: Rc<RefCell<FormState>>,
        options: TreeOptions,
    ) -> Self {
        let TreeConfig {
            id,
            name,
            source: mut initial,
            default_values,
            expanded,
        } = config;

        let marked = annotate_nested(&mut initial, &default_values);
        let tree = LazyTree::from_source(initial);
        let pending = ExpansionQueue::new(&expanded, &options.root_sentinel);
        debug!(
            "Tree {id}: {} initial node(s), {marked} preselected, {} queued for expansion",
            tree.node_count() - 1,
            pending.len()
        );

        Self {
            id,
            tree,
            source,
            defaults: default_values,
            pending,
            selection_sync: SelectionSync::new(format!("{name}[]")),
            form,
            lifecycle: Lifecycle::new(),
            options,
            deferring_sync: false,
            sync_count: 0,
        }
    }

    /// Id of the element the tree is attached to
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field_name(&self) -> &str {
        self.selection_sync.field_name()
    }

    pub fn tree(&self) -> &LazyTree {
        &self.tree
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn teardown(&self) {
        info!("Tearing down tree {}", self.id);
        self.lifecycle.teardown();
    }

    /// Times the form field has been written
    pub fn sync_count(&self) -> usize {
        self.sync_count
    }

    /// Selections still queued for the startup expansion
    pub fn pending_expansion(&self) -> &ExpansionQueue {
        &self.pending
    }

    /// Run the startup expansion, then write the form field once
    ///
    /// Per-batch syncs are held back during the pass. Nothing is written if
    /// the instance is torn down before the pass completes.
    pub async fn start(&mut self) -> ExpansionReport {
        let queue = std::mem::take(&mut self.pending);
        self.deferring_sync = true;
        let report = expand_all(self, queue).await;
        self.deferring_sync = false;

        if report.cancelled {
            debug!("Tree {} torn down during startup, skipping sync", self.id);
        } else {
            self.sync();
        }
        report
    }

    /// Expand a node, fetching its children first if they are not loaded
    ///
    /// Fetched batches, nested levels included, are preselected before they
    /// are committed. Expanding an expanded node or a leaf does nothing. On a
    /// failed fetch the node is left collapsed in the error state and the
    /// error is returned.
    pub async fn expand(&mut self, id: NodeId) -> Result<()> {
        self.ensure_active()?;
        let key = self
            .tree
            .key(id)
            .ok_or_else(|| anyhow!("Invalid node ID {id}"))?
            .to_string();

        // `expand` borrows the controller exclusively, so a node still loading
        // here belongs to a call that was dropped before its fetch settled.
        let interrupted = self.tree.load_state(id) == Some(&ChildrenState::Loading);
        if interrupted {
            debug!("Restarting the interrupted load of {key}");
        }

        if interrupted || self.tree.needs_load(id) {
            let request = self.child_request(id)?;
            self.tree.begin_load(id)?;

            let fetched = self.source.fetch_children(&request).await;
            self.ensure_active()?;

            match fetched {
                Ok(mut batch) => {
                    let marked = annotate_nested(&mut batch, &self.defaults);
                    let children = self.tree.insert_children(id, batch)?;
                    debug!("Loaded {} child(ren) of {key}", children.len());
                    if marked > 0 {
                        self.selection_changed();
                    }
                }
                Err(e) => {
                    warn!("Failed to load children of {key}: {e:#}");
                    self.tree.fail_load(id, format!("{e:#}"))?;
                    return Err(e.context(format!("Failed to load children of {key}")));
                }
            }
        }

        self.tree.set_expanded(id, true)?;
        Ok(())
    }

    pub fn collapse(&mut self, id: NodeId) -> Result<()> {
        self.ensure_active()?;
        self.tree.set_expanded(id, false)?;
        Ok(())
    }

    /// Check or uncheck a node, as a checkbox click does
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<()> {
        self.ensure_active()?;
        self.apply_selection(id, selected)?;
        self.selection_changed();
        Ok(())
    }

    pub fn toggle_selected(&mut self, id: NodeId) -> Result<()> {
        let selected = !self.tree.is_selected(id);
        self.set_selected(id, selected)
    }

    /// Flip a node and overwrite its whole loaded subtree with the new state
    ///
    /// Descendants take the node's new state whatever theirs was. In
    /// single-select mode only the node itself changes. Returns the new state.
    pub fn cascade_select(&mut self, id: NodeId) -> Result<bool> {
        self.ensure_active()?;
        if id == self.tree.root() {
            bail!("Cannot cascade from the root node");
        }
        let selected = !self.tree.is_selected(id);

        match self.options.select_mode {
            SelectMode::Single => self.apply_selection(id, selected)?,
            SelectMode::Multi => {
                let subtree: Vec<_> = self.tree.walk_from(id).collect();
                debug!(
                    "Cascading {} to {} node(s) under {}",
                    selected,
                    subtree.len(),
                    self.tree.key_path(id)
                );
                for node in subtree {
                    self.tree.set_selected(node, selected)?;
                }
            }
        }

        self.selection_changed();
        Ok(selected)
    }

    /// Double-click on a node: cascade when enabled
    pub fn double_click(&mut self, id: NodeId) -> Result<()> {
        if self.options.cascade_on_double_click {
            self.cascade_select(id)?;
        }
        Ok(())
    }

    /// Write the current selection into the form field
    pub fn sync(&mut self) {
        if !self.is_active() {
            return;
        }
        self.selection_sync
            .sync(&self.tree, &mut self.form.borrow_mut());
        self.sync_count += 1;
    }

    fn selection_changed(&mut self) {
        if !self.deferring_sync {
            self.sync();
        }
    }

    fn apply_selection(&mut self, id: NodeId, selected: bool) -> Result<()> {
        if selected && self.options.select_mode == SelectMode::Single {
            for other in self.tree.selected_nodes() {
                if other != id {
                    self.tree.set_selected(other, false)?;
                }
            }
        }
        self.tree.set_selected(id, selected)?;
        Ok(())
    }

    fn child_request(&self, id: NodeId) -> Result<ChildRequest> {
        let node = self
            .tree
            .get(id)
            .with_context(|| format!("Invalid node ID {id}"))?;
        Ok(ChildRequest::new(node.key.clone(), node.data.vocab))
    }

    fn ensure_active(&self) -> Result<()> {
        if !self.is_active() {
            bail!("Tree {} was torn down", self.id);
        }
        Ok(())
    }
}
