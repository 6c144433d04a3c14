//! Plain-text rendering of a term tree, the way a user would see it

use std::fmt::Write;
use term_tree::prelude::*;

/// Render every visible node, one per line, indented by depth
///
/// Collapsed folders hide their children. `[x]` marks checked nodes and a
/// trailing `(!)` marks a folder whose last fetch failed.
pub fn render_tree(tree: &LazyTree) -> String {
    let mut out = String::new();
    render_children(tree, tree.root(), &mut out);
    out
}

fn render_children(tree: &LazyTree, id: NodeId, out: &mut String) {
    for child in tree.children(id) {
        let Some(node) = tree.get(child) else {
            continue;
        };
        let indent = "  ".repeat(tree.depth(child) - 1);
        let checkbox = if tree.is_selected(child) { "[x]" } else { "[ ]" };
        let marker = match node.kind {
            NodeKind::Folder if tree.is_expanded(child) => "▾",
            NodeKind::Folder => "▸",
            NodeKind::Leaf => " ",
        };
        let error = match tree.load_state(child) {
            Some(ChildrenState::Error(_)) => " (!)",
            _ => "",
        };
        let _ = writeln!(
            out,
            "{indent}{marker} {checkbox} {} [{}]{error}",
            node.title, node.key
        );

        if tree.is_expanded(child) {
            render_children(tree, child, out);
        }
    }
}
