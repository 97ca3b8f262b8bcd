//! TOML codec.

use ::toml::Value;

use crate::error::CodecError;
use crate::persistence::{join_items, Format, PersistenceAdapter};
use crate::tree::{ConfigNode, Table};

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlAdapter;

impl PersistenceAdapter for TomlAdapter {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn decode(&self, input: &str, delimiter: char) -> Result<Table, CodecError> {
        let document: ::toml::Table = ::toml::from_str(input)?;
        toml_to_table(document, delimiter)
    }

    fn encode(&self, table: &Table) -> Result<String, CodecError> {
        Ok(::toml::to_string_pretty(table)?)
    }
}

fn toml_to_table(document: ::toml::Table, delimiter: char) -> Result<Table, CodecError> {
    let mut table = Table::new();
    for (key, value) in document {
        let node = match value {
            Value::Table(child) => ConfigNode::Table(toml_to_table(child, delimiter)?),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or_else(|| {
                            CodecError::Unsupported(format!(
                                "array '{}' must contain only scalars",
                                key
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ConfigNode::Leaf(join_items(items, delimiter))
            }
            scalar => match scalar_to_string(&scalar) {
                Some(s) => ConfigNode::Leaf(s),
                None => continue,
            },
        };
        table.insert(key, node);
    }
    Ok(table)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "Ada"
retries = 3
ratio = 0.5

[listener]
bind_address = "0.0.0.0:8080"
ports = [80, 443]
"#;

    #[test]
    fn test_decode_sample() {
        let table = TomlAdapter.decode(SAMPLE, ',').unwrap();
        assert_eq!(table.get("name").and_then(ConfigNode::as_leaf), Some("Ada"));
        assert_eq!(table.get("retries").and_then(ConfigNode::as_leaf), Some("3"));
        assert_eq!(table.get("ratio").and_then(ConfigNode::as_leaf), Some("0.5"));

        let listener = table.get("listener").and_then(ConfigNode::as_table).unwrap();
        assert_eq!(listener.get("ports").and_then(ConfigNode::as_leaf), Some("80,443"));
    }

    #[test]
    fn test_rejects_array_of_tables() {
        let err = TomlAdapter.decode("[[servers]]\nhost = \"a\"\n", ',').unwrap_err();
        assert!(matches!(err, CodecError::Unsupported(_)));
    }

    #[test]
    fn test_encode_then_decode_preserves_tree() {
        let table = TomlAdapter.decode(SAMPLE, ',').unwrap();
        let text = TomlAdapter.encode(&table).unwrap();
        assert_eq!(TomlAdapter.decode(&text, ',').unwrap(), table);
    }
}
