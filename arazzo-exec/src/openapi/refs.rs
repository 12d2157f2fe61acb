use std::collections::HashSet;

use serde_json::Value;

/// Follows local `$ref` chains (`#/...`) until a non-reference object is reached.
pub(crate) fn resolve_ref<'a>(doc: &'a Value, value: &'a Value) -> Result<&'a Value, RefError> {
    let mut visited = HashSet::new();
    let mut current = value;
    while let Some(r) = current.get("$ref").and_then(Value::as_str) {
        let Some(pointer) = r.strip_prefix('#') else {
            return Err(RefError::ExternalRef(r.to_string()));
        };
        if !visited.insert(r.to_string()) {
            return Err(RefError::Cycle(r.to_string()));
        }
        current = doc
            .pointer(pointer)
            .ok_or_else(|| RefError::NotFound(r.to_string()))?;
    }
    Ok(current)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RefError {
    #[error("unsupported external $ref: {0}")]
    ExternalRef(String),
    #[error("unresolvable $ref: {0}")]
    NotFound(String),
    #[error("cyclic $ref: {0}")]
    Cycle(String),
}
