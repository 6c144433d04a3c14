//! Marks persisted selections on freshly fetched nodes before they enter the
//! tree.

use crate::config::PersistedSelection;
use crate::tree::NodeDescriptor;
use log::trace;

/// Mark every node of `batch` whose key is a persisted `target_id` as
/// selected.
///
/// Each default scans the batch once and stops at its first match; keys are
/// unique within a batch. Defaults with no match are left for a later batch.
/// Nested children are not visited. Returns the number of nodes marked.
pub fn annotate(batch: &mut [NodeDescriptor], defaults: &[PersistedSelection]) -> usize {
    let mut marked = 0;
    for default in defaults {
        if let Some(node) = batch.iter_mut().find(|n| n.key == default.target_id) {
            trace!("Preselecting {}", node.key);
            node.selected = true;
            marked += 1;
        }
    }
    marked
}

/// [`annotate`] applied to every level of a nested payload
pub fn annotate_nested(batch: &mut [NodeDescriptor], defaults: &[PersistedSelection]) -> usize {
    let mut marked = annotate(batch, defaults);
    for node in batch.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            marked += annotate_nested(children, defaults);
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn default(target: &str) -> PersistedSelection {
        PersistedSelection::new(target, vec!["0"], "2")
    }

    #[test]
    fn test_marks_matching_keys_only() {
        let mut batch = vec![
            NodeDescriptor::term("3", "Fruit"),
            NodeDescriptor::term("4", "Nuts"),
            NodeDescriptor::term("5", "Grains"),
        ];

        let marked = annotate(&mut batch, &[default("4"), default("99")]);

        assert_eq!(marked, 1);
        let selected: Vec<_> = batch.iter().map(|n| n.selected).collect();
        assert_eq!(selected, vec![false, true, false]);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let mut batch = vec![NodeDescriptor::term("abc", "Lower")];
        assert_eq!(annotate(&mut batch, &[default("ABC")]), 0);
        assert!(!batch[0].selected);
    }

    #[test]
    fn test_keeps_existing_selection() {
        let mut batch = vec![NodeDescriptor::term("3", "Fruit").selected(true)];
        annotate(&mut batch, &[]);
        assert!(batch[0].selected);
    }

    #[test]
    fn test_nested() {
        let mut batch = vec![NodeDescriptor::term("3", "Fruit")
            .with_children(vec![NodeDescriptor::term("7", "Apple")])];

        assert_eq!(annotate(&mut batch.clone(), &[default("7")]), 0);
        assert_eq!(annotate_nested(&mut batch, &[default("7")]), 1);
        assert!(batch[0].children.as_ref().unwrap()[0].selected);
    }

    proptest! {
        #[test]
        fn selected_iff_key_in_defaults(
            keys in prop::collection::hash_set("[a-cA-C0-9]{1,3}", 0..12),
            targets in prop::collection::vec("[a-cA-C0-9]{1,3}", 0..8),
            reverse in any::<bool>(),
        ) {
            let mut batch: Vec<_> = keys.iter().map(|k| NodeDescriptor::term(k.as_str(), "t")).collect();
            if reverse {
                batch.reverse();
            }
            let defaults: Vec<_> = targets.iter().map(|t| default(t)).collect();
            let wanted: HashSet<&str> = targets.iter().map(String::as_str).collect();

            annotate(&mut batch, &defaults);

            for node in &batch {
                prop_assert_eq!(node.selected, wanted.contains(node.key.as_str()));
            }
        }
    }
}
