//! Host configuration payloads and tree options.
//!
//! The host hands over one settings tree per page load. It is deserialized
//! into typed structs here; ids that arrive as JSON integers are normalized
//! to strings, and the loosely shaped fields (`source`, `expanded`, `tree`)
//! accept every shape the host is known to emit.

use crate::tree::NodeDescriptor;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Parent id meaning "this term sits at the root of its vocabulary"
pub const ROOT_SENTINEL: &str = "0";

/// A reference to one ancestor of a persisted selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(deserialize_with = "deserialize_id")]
    pub target_id: String,
}

/// A value saved in the form field, with the ancestry needed to reveal it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSelection {
    #[serde(deserialize_with = "deserialize_id")]
    pub target_id: String,
    /// Ancestors from the immediate parent towards the root
    #[serde(default)]
    pub parents: Vec<ParentRef>,
    /// Vocabulary (root container) the target belongs to
    #[serde(default, deserialize_with = "deserialize_id")]
    pub vid: String,
}

impl PersistedSelection {
    pub fn new<I, S>(target_id: impl Into<String>, parents: I, vid: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_id: target_id.into(),
            parents: parents
                .into_iter()
                .map(|p| ParentRef {
                    target_id: p.into(),
                })
                .collect(),
            vid: vid.into(),
        }
    }
}

/// Configuration of one tree instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Id of the element the tree attaches to
    pub id: String,
    /// Base name of the form field
    pub name: String,
    /// Initial nodes
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Vec<NodeDescriptor>,
    #[serde(default)]
    pub default_values: Vec<PersistedSelection>,
    /// Selections whose ancestors are expanded on load
    #[serde(default, deserialize_with = "deserialize_expanded")]
    pub expanded: Vec<PersistedSelection>,
}

impl TreeConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: Vec::new(),
            default_values: Vec::new(),
            expanded: Vec::new(),
        }
    }

    pub fn source(mut self, source: Vec<NodeDescriptor>) -> Self {
        self.source = source;
        self
    }

    /// Persisted values, also used as the expansion list
    pub fn defaults(mut self, defaults: Vec<PersistedSelection>) -> Self {
        self.expanded = defaults.clone();
        self.default_values = defaults;
        self
    }

    pub fn expanded(mut self, expanded: Vec<PersistedSelection>) -> Self {
        self.expanded = expanded;
        self
    }

    /// Array-style name of the submitted field
    pub fn field_name(&self) -> String {
        format!("{}[]", self.name)
    }
}

/// Trees configured for one form field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    #[serde(default, deserialize_with = "deserialize_tree_list")]
    pub tree: Vec<TreeConfig>,
}

/// The part of the host settings tree this crate reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachSettings {
    #[serde(rename = "term_reference_fancytree", default)]
    pub fields: IndexMap<String, FieldSettings>,
}

impl AttachSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse tree settings")
    }

    /// Settings holding a single field with the given trees
    pub fn single(field: impl Into<String>, trees: Vec<TreeConfig>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(field.into(), FieldSettings { tree: trees });
        Self { fields }
    }

    /// All tree configurations, field by field in payload order
    pub fn trees(&self) -> impl Iterator<Item = &TreeConfig> {
        self.fields.values().flat_map(|field| field.tree.iter())
    }
}

/// How many nodes may be checked at once
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    /// Checking a node unchecks every other node
    Single,
    /// Nodes are checked independently
    #[default]
    Multi,
}

/// Behavior options for a tree instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Parent id that anchors an ancestor chain to its vocabulary
    pub root_sentinel: String,

    pub select_mode: SelectMode,

    /// Whether double-clicking a node applies its new state to the whole
    /// subtree.
    pub cascade_on_double_click: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            root_sentinel: ROOT_SENTINEL.to_string(),
            select_mode: SelectMode::default(),
            cascade_on_double_click: true,
        }
    }
}

impl TreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.root_sentinel = sentinel.into();
        self
    }

    pub fn select_mode(mut self, mode: SelectMode) -> Self {
        self.select_mode = mode;
        self
    }

    pub fn cascade_on_double_click(mut self, enabled: bool) -> Self {
        self.cascade_on_double_click = enabled;
        self
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

fn deserialize_source<'de, D>(deserializer: D) -> std::result::Result<Vec<NodeDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        List(Vec<NodeDescriptor>),
        Root(Box<NodeDescriptor>),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::List(nodes) => nodes,
        Source::Root(node) => vec![*node],
    })
}

// Keyed lists may arrive as JSON objects; keep their order.
fn deserialize_expanded<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<PersistedSelection>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expanded {
        List(Vec<PersistedSelection>),
        Map(IndexMap<String, PersistedSelection>),
    }

    Ok(match Expanded::deserialize(deserializer)? {
        Expanded::List(list) => list,
        Expanded::Map(map) => map.into_values().collect(),
    })
}

// Anything but a list means "no trees" for that field.
fn deserialize_tree_list<'de, D>(deserializer: D) -> std::result::Result<Vec<TreeConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()
            .map_err(de::Error::custom),
        other => {
            debug!("Ignoring tree settings that are not a list: {other}");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETTINGS: &str = r#"{
        "path": {"baseUrl": "/"},
        "term_reference_fancytree": {
            "field_tags": {
                "tree": [{
                    "id": "tree-field-tags",
                    "name": "field_tags",
                    "source": [{"title": "Tags", "key": "2", "lazy": true, "folder": true, "data": {"vocab": true}}],
                    "default_values": [{"target_id": 7, "parents": [{"target_id": "3"}], "vid": "2"}],
                    "expanded": {"7": {"target_id": "7", "parents": [{"target_id": 3}], "vid": "2"}}
                }]
            },
            "field_broken": {"tree": "nope"}
        }
    }"#;

    #[test]
    fn test_parse_settings() {
        let settings = AttachSettings::from_json(SETTINGS).unwrap();
        let trees: Vec<_> = settings.trees().collect();

        assert_eq!(trees.len(), 1);
        let tree = trees[0];
        assert_eq!(tree.id, "tree-field-tags");
        assert_eq!(tree.field_name(), "field_tags[]");
        assert_eq!(tree.source.len(), 1);
        assert!(tree.source[0].data.vocab);

        let expected = PersistedSelection::new("7", ["3"], "2");
        assert_eq!(tree.default_values, vec![expected.clone()]);
        assert_eq!(tree.expanded, vec![expected]);
        assert!(settings.fields["field_broken"].tree.is_empty());
    }

    #[test]
    fn test_single_root_source() {
        let json = r#"{"id": "t", "name": "f", "source": {"title": "Tags", "key": "2"}}"#;
        let tree: TreeConfig = serde_json::from_str(json).unwrap();

        assert_eq!(tree.source, vec![NodeDescriptor::term("2", "Tags")]);
        assert!(tree.default_values.is_empty());
        assert!(tree.expanded.is_empty());
    }

    #[test]
    fn test_expanded_map_keeps_order() {
        let json = r#"{"id": "t", "name": "f", "expanded": {
            "9": {"target_id": "9", "vid": "2"},
            "4": {"target_id": "4", "vid": "2"}
        }}"#;
        let tree: TreeConfig = serde_json::from_str(json).unwrap();
        let order: Vec<_> = tree.expanded.iter().map(|e| e.target_id.as_str()).collect();

        assert_eq!(order, vec!["9", "4"]);
    }

    #[test]
    fn test_options() {
        let options: TreeOptions = serde_json::from_str(r#"{"select_mode": "single"}"#).unwrap();
        assert_eq!(options.select_mode, SelectMode::Single);
        assert_eq!(options.root_sentinel, "0");
        assert!(options.cascade_on_double_click);

        let options = TreeOptions::new()
            .root_sentinel("root")
            .cascade_on_double_click(false);
        assert_eq!(options.root_sentinel, "root");
        assert!(!options.cascade_on_double_click);
    }
}
