use super::Node;
use crate::error::{ProvenanceError, ProvenanceResult};
use provenance_types::{validate_key, KeyError};
use serde_json::Value;

/// Validate a key and every object key nested inside its value.
pub(crate) fn validate_entry(key: &str, value: &Value) -> Result<(), KeyError> {
    validate_key(key)?;
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    validate_key(k)?;
                    stack.push(v);
                }
            }
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
    Ok(())
}

/// Whether attribute `key` of `node` may still change.
pub(crate) fn check_attribute_mutable(node: &Node, key: &str) -> ProvenanceResult<()> {
    if !node.is_stored() {
        return Ok(());
    }
    if node.sealed {
        return Err(ProvenanceError::ModificationNotAllowed(format!(
            "attributes of sealed node {} are immutable",
            node
        )));
    }
    if !node.node_type.is_updatable_attribute(key) {
        return Err(ProvenanceError::ModificationNotAllowed(format!(
            "attribute `{}` of stored node {} is immutable",
            key, node
        )));
    }
    Ok(())
}
