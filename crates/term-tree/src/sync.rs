//! Form-side representation of the tree's checkbox state

use crate::tree::LazyTree;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Submitted values of the host form, by field name
///
/// Shared by every tree on the page; each tree writes only its own field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole value list of `field`
    pub fn set_values(&mut self, field: &str, values: Vec<String>) {
        self.fields.insert(field.to_string(), values);
    }

    /// Values of `field`, empty if it was never written
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// One hidden input per value, the way the field is submitted
    pub fn render_hidden_inputs(&self, field: &str) -> String {
        let mut html = String::new();
        for value in self.values(field) {
            let _ = writeln!(
                html,
                r#"<input type="hidden" name="{}" value="{}">"#,
                escape_attribute(field),
                escape_attribute(value)
            );
        }
        html
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes a tree's full selection into its form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSync {
    field: String,
}

impl SelectionSync {
    /// `field` is the already suffixed field name (`field_tags[]`)
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    /// Overwrite the field with every checked key, in tree order
    pub fn sync(&self, tree: &LazyTree, form: &mut FormState) {
        let keys = tree.selected_keys();
        debug!("Syncing {} selected value(s) into {}", keys.len(), self.field);
        form.set_values(&self.field, keys);
    }
}
