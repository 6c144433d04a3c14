//! Turns the host's settings payload into tree instances, once per target.

use crate::config::{AttachSettings, TreeConfig, TreeOptions};
use crate::controller::TreeController;
use crate::expand::ExpansionReport;
use crate::source::NodeSource;
use crate::sync::FormState;
use futures::future::join_all;
use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Registry of initialized targets
///
/// The host may attach any number of times per page; a target id gets a
/// controller only the first time it is seen, until it is detached.
#[derive(Debug, Default)]
pub struct Attacher {
    options: TreeOptions,
    attached: HashSet<String>,
}

impl Attacher {
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            attached: HashSet::new(),
        }
    }

    /// Create controllers for every configured tree not attached yet
    ///
    /// `make_source` is called once per new tree. The returned controllers
    /// still have to be started (see [`start_all`]).
    pub fn attach<S, F>(
        &mut self,
        settings: &AttachSettings,
        form: &Rc<RefCell<FormState>>,
        mut make_source: F,
    ) -> Vec<TreeController<S>>
    where
        S: NodeSource,
        F: FnMut(&TreeConfig) -> S,
    {
        let mut controllers = Vec::new();
        for config in settings.trees() {
            if !self.attached.insert(config.id.clone()) {
                debug!("Tree {} is already attached", config.id);
                continue;
            }
            info!("Attaching tree {} for field {}", config.id, config.field_name());
            let source = make_source(config);
            controllers.push(TreeController::new(
                config.clone(),
                source,
                Rc::clone(form),
                self.options.clone(),
            ));
        }
        controllers
    }

    pub fn is_attached(&self, id: &str) -> bool {
        self.attached.contains(id)
    }

    /// Tear a controller down and free its target for a later attach
    pub fn detach<S: NodeSource>(&mut self, controller: &TreeController<S>) -> bool {
        controller.teardown();
        self.attached.remove(controller.id())
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

/// Start every controller, interleaving their expansions on the current
/// thread
pub async fn start_all<S: NodeSource>(
    controllers: &mut [TreeController<S>],
) -> Vec<ExpansionReport> {
    join_all(controllers.iter_mut().map(|controller| controller.start())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use crate::tree::NodeDescriptor;
    use pretty_assertions::assert_eq;

    fn settings() -> AttachSettings {
        AttachSettings::single(
            "field_tags",
            vec![
                TreeConfig::new("tree-a", "field_a").source(vec![NodeDescriptor::term("1", "One")]),
                TreeConfig::new("tree-b", "field_b").source(vec![NodeDescriptor::term("2", "Two")]),
            ],
        )
    }

    #[test]
    fn test_attach_is_idempotent() {
        let form = Rc::new(RefCell::new(FormState::new()));
        let mut attacher = Attacher::default();
        let mut made = Vec::new();

        let first = attacher.attach(&settings(), &form, |config| {
            made.push(config.id.clone());
            StaticSource::new()
        });
        let second = attacher.attach(&settings(), &form, |_| StaticSource::new());

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(made, vec!["tree-a", "tree-b"]);
        assert_eq!(attacher.attached_count(), 2);
        assert!(attacher.is_attached("tree-a"));
    }

    #[test]
    fn test_detach_frees_target() {
        let form = Rc::new(RefCell::new(FormState::new()));
        let mut attacher = Attacher::default();
        let controllers = attacher.attach(&settings(), &form, |_| StaticSource::new());

        assert!(attacher.detach(&controllers[0]));
        assert!(!controllers[0].is_active());
        assert!(!attacher.is_attached("tree-a"));

        let again = attacher.attach(&settings(), &form, |_| StaticSource::new());
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id(), "tree-a");
    }
}
