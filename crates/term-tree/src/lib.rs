//! Term Tree
//!
//! A checkbox tree selector for taxonomy term reference fields: the tree
//! loads terms lazily, level by level, marks previously saved values as
//! selected as they arrive, expands the ancestors of saved values on load
//! and keeps the form field in sync with every checkbox change.
//!
//! # Core Concepts
//!
//! - **LazyTree**: loaded part of the term hierarchy with expansion and
//!   selection state
//! - **NodeSource**: fetches a node's children on demand
//! - **TreeController**: one selector instance wiring the pieces together
//! - **Attacher**: builds controllers from the host's settings, once per
//!   target
//!
//! # Example
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use term_tree::prelude::*;
//!
//! let settings = AttachSettings::from_json(r#"{"term_reference_fancytree": {}}"#).unwrap();
//! let form = Rc::new(RefCell::new(FormState::new()));
//! let mut attacher = Attacher::new(TreeOptions::default());
//!
//! let mut controllers = attacher.attach(&settings, &form, |_| StaticSource::new());
//! futures::executor::block_on(start_all(&mut controllers));
//! ```

pub mod attach;
pub mod config;
pub mod controller;
pub mod expand;
pub mod preselect;
pub mod source;
pub mod sync;
pub mod tree;

pub use attach::{start_all, Attacher};
pub use config::{
    AttachSettings, FieldSettings, ParentRef, PersistedSelection, SelectMode, TreeConfig,
    TreeOptions, ROOT_SENTINEL,
};
pub use controller::{Lifecycle, TreeController};
pub use expand::{
    expand_all, AbandonReason, Abandoned, Anchor, ExpansionEntry, ExpansionQueue, ExpansionReport,
    StepState,
};
pub use source::{ChildRequest, FixtureEntry, NodeSource, StaticSource};
pub use sync::{FormState, SelectionSync};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::tree::prelude::*;
    pub use crate::{
        start_all, AttachSettings, Attacher, ChildRequest, ExpansionReport, FormState, NodeSource,
        PersistedSelection, StaticSource, TreeConfig, TreeController, TreeOptions,
    };
}
