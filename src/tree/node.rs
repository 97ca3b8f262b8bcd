//! Tree node types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A table of named child nodes.
pub type Table = BTreeMap<String, ConfigNode>;

/// A node in the configuration tree: a string leaf or a nested table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Leaf(String),
    Table(Table),
}

impl ConfigNode {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ConfigNode::Leaf(value) => Some(value),
            ConfigNode::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            ConfigNode::Table(table) => Some(table),
            ConfigNode::Leaf(_) => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, ConfigNode::Table(_))
    }
}

impl From<String> for ConfigNode {
    fn from(value: String) -> Self {
        ConfigNode::Leaf(value)
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        ConfigNode::Leaf(value.to_string())
    }
}

impl From<Table> for ConfigNode {
    fn from(table: Table) -> Self {
        ConfigNode::Table(table)
    }
}

/// Flatten nested tables into dotted keys, e.g. `{a: {b: "1"}}` → `a.b=1`.
pub fn flatten(table: &Table) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    flatten_into(table, None, &mut out);
    out
}

fn flatten_into(table: &Table, prefix: Option<&str>, out: &mut BTreeMap<String, String>) {
    for (key, node) in table {
        let full = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match node {
            ConfigNode::Leaf(value) => {
                out.insert(full, value.clone());
            }
            ConfigNode::Table(child) => flatten_into(child, Some(&full), out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let leaf = ConfigNode::from("x");
        assert_eq!(leaf.as_leaf(), Some("x"));
        assert!(leaf.as_table().is_none());

        let table = ConfigNode::from(Table::new());
        assert!(table.is_table());
        assert!(table.as_leaf().is_none());
    }

    #[test]
    fn test_flatten() {
        let mut inner = Table::new();
        inner.insert("port".into(), "5432".into());
        let mut root = Table::new();
        root.insert("db".into(), inner.into());
        root.insert("name".into(), "app".into());

        let flat = flatten(&root);
        assert_eq!(flat.get("db.port").map(String::as_str), Some("5432"));
        assert_eq!(flat.get("name").map(String::as_str), Some("app"));
        assert_eq!(flat.len(), 2);
    }
}
