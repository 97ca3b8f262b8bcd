//! Dotted key parsing and tree navigation.

use std::fmt;

use crate::error::{ConfigError, Result};
use crate::tree::node::{ConfigNode, Table};

/// Segment separator for nested keys.
pub const NESTED_SEPARATOR: char = '.';

/// A parsed dotted key. Always holds at least one non-empty segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedKey {
    raw: String,
    segments: Vec<String>,
}

impl NestedKey {
    /// Parse `key`, rejecting blank keys and empty segments (`a..b`, `.a`, `a.`).
    pub fn parse(key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        let segments: Vec<String> = key.split(NESTED_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        Ok(Self {
            raw: key.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// The segment naming the addressed entry inside its parent table.
    pub fn leaf_segment(&self) -> &str {
        // parse guarantees at least one segment
        &self.segments[self.segments.len() - 1]
    }

    fn parents(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Read path: follow every segment from `root`.
    ///
    /// Returns `None` when a segment is missing or a leaf sits where a table
    /// was expected.
    pub fn lookup<'t>(&self, root: &'t Table) -> Option<&'t ConfigNode> {
        let mut current = root;
        for segment in self.parents() {
            current = current.get(segment)?.as_table()?;
        }
        current.get(self.leaf_segment())
    }

    /// Write path: the table that holds the final segment, creating missing
    /// intermediate tables.
    ///
    /// Existing tables are reused, so resolving the same key twice yields the
    /// same table. An intermediate leaf fails with `InvalidPath`; it is always
    /// met before anything is created, so a failed call leaves `root` intact.
    pub fn resolve_parent_mut<'t>(&self, root: &'t mut Table) -> Result<&'t mut Table> {
        let mut current = root;
        for segment in self.parents() {
            let node = current
                .entry(segment.clone())
                .or_insert_with(|| ConfigNode::Table(Table::new()));
            current = match node {
                ConfigNode::Table(table) => table,
                ConfigNode::Leaf(_) => {
                    return Err(ConfigError::InvalidPath {
                        key: self.raw.clone(),
                        segment: segment.clone(),
                    })
                }
            };
        }
        Ok(current)
    }

    /// Write `node` at this key, creating intermediate tables as needed.
    pub fn insert(&self, root: &mut Table, node: ConfigNode) -> Result<()> {
        let parent = self.resolve_parent_mut(root)?;
        parent.insert(self.leaf_segment().to_string(), node);
        Ok(())
    }
}

impl fmt::Display for NestedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut password = Table::new();
        password.insert("jms".into(), "secret".into());
        let mut development = Table::new();
        development.insert("adapter".into(), "mysql".into());
        development.insert("password".into(), password.into());
        let mut root = Table::new();
        root.insert("development".into(), development.into());
        root.insert("hello".into(), "world".into());
        root
    }

    #[test]
    fn test_parse() {
        let key = NestedKey::parse("a.b.c").unwrap();
        assert_eq!(key.segments(), ["a", "b", "c"]);
        assert_eq!(key.leaf_segment(), "c");
        assert!(key.is_nested());
        assert!(!NestedKey::parse("single").unwrap().is_nested());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "   ", "a..b", ".a", "a."] {
            let err = NestedKey::parse(bad).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidKey(_)), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_lookup() {
        let root = sample();
        let adapter = NestedKey::parse("development.adapter").unwrap();
        assert_eq!(adapter.lookup(&root).and_then(ConfigNode::as_leaf), Some("mysql"));

        let single = NestedKey::parse("hello").unwrap();
        assert_eq!(single.lookup(&root).and_then(ConfigNode::as_leaf), Some("world"));

        // Missing sibling and a leaf used as a table both read as absent.
        assert!(NestedKey::parse("development.missing").unwrap().lookup(&root).is_none());
        assert!(NestedKey::parse("hello.world").unwrap().lookup(&root).is_none());
        assert!(NestedKey::parse("development.password.jms.x").unwrap().lookup(&root).is_none());
    }

    #[test]
    fn test_insert_creates_intermediates() {
        let mut root = Table::new();
        NestedKey::parse("x.y.z1").unwrap().insert(&mut root, "1".into()).unwrap();
        NestedKey::parse("x.y.z2").unwrap().insert(&mut root, "2".into()).unwrap();

        let y = NestedKey::parse("x.y")
            .unwrap()
            .lookup(&root)
            .and_then(ConfigNode::as_table)
            .unwrap();
        assert_eq!(y.len(), 2);
    }

    #[test]
    fn test_resolve_parent_is_idempotent() {
        let mut root = Table::new();
        let key = NestedKey::parse("a.b.c").unwrap();
        let first = key.resolve_parent_mut(&mut root).unwrap() as *const Table;
        let second = key.resolve_parent_mut(&mut root).unwrap() as *const Table;
        assert_eq!(first, second);
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_leaf_in_path_is_invalid() {
        let mut root = sample();
        let before = root.clone();
        let err = NestedKey::parse("hello.nested.value")
            .unwrap()
            .insert(&mut root, "x".into())
            .unwrap_err();
        match err {
            ConfigError::InvalidPath { key, segment } => {
                assert_eq!(key, "hello.nested.value");
                assert_eq!(segment, "hello");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(root, before);
    }
}
