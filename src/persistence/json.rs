//! JSON codec.

use serde_json::Value;

use crate::error::CodecError;
use crate::persistence::{join_items, Format, PersistenceAdapter};
use crate::tree::{ConfigNode, Table};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonAdapter;

impl PersistenceAdapter for JsonAdapter {
    fn format(&self) -> Format {
        Format::Json
    }

    fn decode(&self, input: &str, delimiter: char) -> Result<Table, CodecError> {
        if input.trim().is_empty() {
            return Ok(Table::new());
        }
        match serde_json::from_str::<Value>(input)? {
            Value::Object(object) => object_to_table(object, delimiter),
            _ => Err(CodecError::Unsupported(
                "top-level JSON document must be an object".to_string(),
            )),
        }
    }

    fn encode(&self, table: &Table) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(table)?)
    }
}

fn object_to_table(
    object: serde_json::Map<String, Value>,
    delimiter: char,
) -> Result<Table, CodecError> {
    let mut table = Table::new();
    for (key, value) in object {
        let node = match value {
            Value::Null => continue,
            Value::Object(child) => ConfigNode::Table(object_to_table(child, delimiter)?),
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
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
