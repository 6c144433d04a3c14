use futures::executor::block_on;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use term_tree::prelude::*;

fn controller(source: Vec<NodeDescriptor>) -> (TreeController<StaticSource>, Rc<RefCell<FormState>>) {
    let form = Rc::new(RefCell::new(FormState::new()));
    let config = TreeConfig::new("tree-colors", "field_colors").source(source);
    (
        TreeController::new(config, StaticSource::new(), form.clone(), TreeOptions::default()),
        form,
    )
}

fn colors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::term("1", "Warm").with_children(vec![
            NodeDescriptor::term("12", "Red"),
            NodeDescriptor::term("13", "Orange").with_children(vec![
                NodeDescriptor::term("131", "Amber").selected(true),
            ]),
        ]),
        NodeDescriptor::term("45", "Blue"),
    ]
}

#[test]
fn test_check_and_uncheck_updates_field() {
    let (mut controller, form) = controller(colors());
    let red = controller.tree().node_by_key("12").unwrap();
    let blue = controller.tree().node_by_key("45").unwrap();
    let amber = controller.tree().node_by_key("131").unwrap();
    controller.set_selected(amber, false).unwrap();

    controller.set_selected(red, true).unwrap();
    controller.set_selected(blue, true).unwrap();
    assert_eq!(form.borrow().values("field_colors[]"), ["12", "45"]);

    controller.set_selected(red, false).unwrap();
    assert_eq!(form.borrow().values("field_colors[]"), ["45"]);
}

#[test]
fn test_cascade_overwrites_subtree() {
    let (mut controller, form) = controller(colors());
    let warm = controller.tree().node_by_key("1").unwrap();

    // Warm is unchecked, so everything below becomes checked, Amber included
    assert!(controller.cascade_select(warm).unwrap());
    assert_eq!(form.borrow().values("field_colors[]"), ["1", "12", "13", "131"]);
    assert_eq!(controller.sync_count(), 1);

    assert!(!controller.cascade_select(warm).unwrap());
    assert!(form.borrow().values("field_colors[]").is_empty());
}

#[test]
fn test_double_click_cascades() {
    let (mut controller, form) = controller(colors());
    let orange = controller.tree().node_by_key("13").unwrap();

    controller.double_click(orange).unwrap();

    assert_eq!(form.borrow().values("field_colors[]"), ["13", "131"]);
}

#[test]
fn test_cascade_on_root_is_refused() {
    let (mut controller, _) = controller(colors());
    let root = controller.tree().root();

    assert!(controller.cascade_select(root).is_err());
}

#[test]
fn test_start_without_expansion_writes_initial_selection() {
    let (mut controller, form) = controller(colors());

    let report = block_on(controller.start());

    assert_eq!(report, ExpansionReport::default());
    assert_eq!(form.borrow().values("field_colors[]"), ["131"]);

    let before = form.borrow().render_hidden_inputs("field_colors[]");
    controller.sync();
    assert_eq!(form.borrow().render_hidden_inputs("field_colors[]"), before);
}

/// Nested payload from a list of parent picks: node i hangs under node
/// `parents[i]` (or the top level when the pick is i itself)
fn nested(parents: &[usize], selected: &[bool]) -> Vec<NodeDescriptor> {
    fn build(parent: Option<usize>, parents: &[usize], selected: &[bool]) -> Vec<NodeDescriptor> {
        (0..parents.len())
            .filter(|&i| {
                let p = parents[i];
                match parent {
                    None => p == i,
                    Some(parent) => p != i && p == parent,
                }
            })
            .map(|i| {
                let children = build(Some(i), parents, selected);
                let node = NodeDescriptor::term(i.to_string(), format!("Term {i}")).selected(selected[i]);
                if children.is_empty() {
                    node
                } else {
                    node.with_children(children)
                }
            })
            .collect()
    }
    build(None, parents, selected)
}

proptest! {
    #[test]
    fn cascade_negates_whole_subtree(
        picks in prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 1..16),
        target in any::<prop::sample::Index>(),
    ) {
        // parents[i] <= i keeps the structure acyclic
        let parents: Vec<usize> = picks.iter().enumerate().map(|(i, (pick, _))| pick.index(i + 1)).collect();
        let selected: Vec<bool> = picks.iter().map(|(_, s)| *s).collect();
        let (mut controller, form) = controller(nested(&parents, &selected));

        let id = controller.tree().node_by_key(&target.index(parents.len()).to_string()).unwrap();
        let before = controller.tree().is_selected(id);
        let subtree: Vec<_> = controller.tree().walk_from(id).collect();

        let after = controller.cascade_select(id).unwrap();

        prop_assert_eq!(after, !before);
        for node in subtree {
            prop_assert_eq!(controller.tree().is_selected(node), !before);
        }
        prop_assert_eq!(form.borrow().values("field_colors[]").to_vec(), controller.tree().selected_keys());
    }

    #[test]
    fn field_matches_checked_set(toggles in prop::collection::vec(0usize..6, 0..30)) {
        let source = (0..6).map(|i| NodeDescriptor::term(i.to_string(), format!("Term {i}"))).collect();
        let (mut controller, form) = controller(source);
        let mut model = BTreeSet::new();

        for i in toggles {
            let id = controller.tree().node_by_key(&i.to_string()).unwrap();
            controller.toggle_selected(id).unwrap();
            if !model.insert(i.to_string()) {
                model.remove(&i.to_string());
            }

            let field: BTreeSet<String> = form.borrow().values("field_colors[]").iter().cloned().collect();
            prop_assert_eq!(field.len(), form.borrow().values("field_colors[]").len());
            prop_assert_eq!(&field, &model);
        }
    }
}
