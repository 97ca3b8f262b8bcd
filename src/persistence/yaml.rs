//! YAML codec.

use serde_yaml::Value;

use crate::error::CodecError;
use crate::persistence::{join_items, Format, PersistenceAdapter};
use crate::tree::{ConfigNode, Table};

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlAdapter;

impl PersistenceAdapter for YamlAdapter {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn decode(&self, input: &str, delimiter: char) -> Result<Table, CodecError> {
        if input.trim().is_empty() {
            return Ok(Table::new());
        }
        let document: Value = serde_yaml::from_str(input)?;
        match document {
            Value::Null => Ok(Table::new()),
            Value::Mapping(mapping) => mapping_to_table(mapping, delimiter),
            other => Err(CodecError::Unsupported(format!(
                "top-level YAML document must be a mapping, found {}",
                kind(&other)
            ))),
        }
    }

    fn encode(&self, table: &Table) -> Result<String, CodecError> {
        Ok(serde_yaml::to_string(table)?)
    }
}

fn mapping_to_table(mapping: serde_yaml::Mapping, delimiter: char) -> Result<Table, CodecError> {
    let mut table = Table::new();
    for (key, value) in mapping {
        let key = scalar_to_string(&key).ok_or_else(|| {
            CodecError::Unsupported(format!(
                "YAML mapping key must be a scalar, found {}",
                kind(&key)
            ))
        })?;
        if let Some(node) = value_to_node(value, delimiter)? {
            table.insert(key, node);
        }
    }
    Ok(table)
}

fn value_to_node(value: Value, delimiter: char) -> Result<Option<ConfigNode>, CodecError> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(mapping) => {
            Ok(Some(ConfigNode::Table(mapping_to_table(mapping, delimiter)?)))
        }
        Value::Sequence(items) => {
            let items = items
                .iter()
                .map(|item| {
                    scalar_to_string(item).ok_or_else(|| {
                        CodecError::Unsupported(format!(
                            "YAML sequence items must be scalars, found {}",
                            kind(item)
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(ConfigNode::Leaf(join_items(items, delimiter))))
        }
        Value::Tagged(tagged) => value_to_node(tagged.value, delimiter),
        scalar => Ok(scalar_to_string(&scalar).map(ConfigNode::Leaf)),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NestedKey;

    const SAMPLE: &str = r#"
hello: world
dateOne: 02/23/2012
retries: 3
enabled: true
list: [1, 2, 3]
nothing: ~
development:
  adapter: mysql
  password:
    jms: secret jms password
    socket:
      - /tmp/a.sock
      - /tmp/b.sock
"#;

    fn nested<'a>(table: &'a Table, key: &str) -> Option<&'a str> {
        NestedKey::parse(key).unwrap().lookup(table).and_then(ConfigNode::as_leaf)
    }

    #[test]
    fn test_decode_sample() {
        let table = YamlAdapter.decode(SAMPLE, ',').unwrap();
        assert_eq!(nested(&table, "hello"), Some("world"));
        assert_eq!(nested(&table, "dateOne"), Some("02/23/2012"));
        assert_eq!(nested(&table, "retries"), Some("3"));
        assert_eq!(nested(&table, "enabled"), Some("true"));
        assert_eq!(nested(&table, "list"), Some("1,2,3"));
        assert_eq!(nested(&table, "development.adapter"), Some("mysql"));
        assert_eq!(
            nested(&table, "development.password.socket"),
            Some("/tmp/a.sock,/tmp/b.sock")
        );
        assert!(!table.contains_key("nothing"));
    }

    #[test]
    fn test_sequence_uses_delimiter() {
        let table = YamlAdapter.decode("list: [a, b]", ';').unwrap();
        assert_eq!(nested(&table, "list"), Some("a;b"));
    }

    #[test]
    fn test_empty_document() {
        assert!(YamlAdapter.decode("", ',').unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_mapping_root() {
        let err = YamlAdapter.decode("- a\n- b\n", ',').unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_sequence_of_mappings() {
        let err = YamlAdapter.decode("servers:\n  - host: a\n", ',').unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(_)));
    }

    #[test]
    fn test_encode_then_decode_preserves_tree() {
        let table = YamlAdapter.decode(SAMPLE, ',').unwrap();
        let text = YamlAdapter.encode(&table).unwrap();
        assert_eq!(YamlAdapter.decode(&text, ',').unwrap(), table);
    }
}
