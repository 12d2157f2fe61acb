use arazzo_core::expressions::{parse_runtime_expr, RuntimeExpr};
use serde_json::Value;

use crate::openapi::model::{OpenApiDoc, OperationLookupError, ResolvedOperation, METHOD_KEYS};
use crate::openapi::shape::describe_operation;

/// Finds an operation by `operationId`, either plain or qualified as
/// `$sourceDescriptions.<name>.<operationId>`.
///
/// A plain id is searched across every document in registration order; the first match wins.
pub fn find_operation_by_id(
    docs: &[OpenApiDoc],
    operation_id_raw: &str,
) -> Result<ResolvedOperation, OperationLookupError> {
    if docs.is_empty() {
        return Err(OperationLookupError::NoSources);
    }
    let trimmed = operation_id_raw.trim();

    if trimmed.starts_with('$') {
        if let Ok(RuntimeExpr::SourceDescriptions(np)) = parse_runtime_expr(trimmed) {
            let doc = docs
                .iter()
                .find(|d| d.name == np.root)
                .ok_or_else(|| OperationLookupError::UnknownSource(np.root.clone()))?;
            let operation_id = np.rest.join(".");
            return locate(doc, &operation_id)
                .ok_or(OperationLookupError::OperationNotFound(operation_id));
        }
    }

    let mut found = docs.iter().filter_map(|doc| locate(doc, trimmed));
    let first = found
        .next()
        .ok_or_else(|| OperationLookupError::OperationNotFound(trimmed.to_string()))?;
    if let Some(other) = found.next() {
        tracing::warn!(
            operation_id = trimmed,
            chosen = %first.source_name,
            also_in = %other.source_name,
            "operationId is declared by more than one source; qualify it with $sourceDescriptions"
        );
    }
    Ok(first)
}

fn locate(doc: &OpenApiDoc, operation_id: &str) -> Option<ResolvedOperation> {
    let paths = doc.raw.get("paths")?.as_object()?;
    for (path, item) in paths {
        for method in METHOD_KEYS {
            let declared = item
                .get(method)
                .and_then(|op| op.get("operationId"))
                .and_then(Value::as_str);
            if declared == Some(operation_id) {
                return describe_operation(&doc.raw, &doc.name, path, method);
            }
        }
    }
    None
}
