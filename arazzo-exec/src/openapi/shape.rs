use serde_json::Value;

use crate::openapi::model::{extract_parameter_obj, merge_params, OpenApiParam, ResolvedOperation, METHOD_KEYS};
use crate::openapi::refs::resolve_ref;

/// Builds the lookup result for `method` at `path`; `None` when the path item has no such method.
pub(crate) fn describe_operation(
    doc: &Value,
    source_name: &str,
    path: &str,
    method: &str,
) -> Option<ResolvedOperation> {
    let path_item = doc.get("paths")?.get(path)?;
    let method = method.to_lowercase();
    if !METHOD_KEYS.contains(&method.as_str()) {
        return None;
    }
    let operation = path_item.get(&method)?;

    let path_params = collect_params(doc, source_name, path_item.get("parameters"));
    let op_params = collect_params(doc, source_name, operation.get("parameters"));

    Some(ResolvedOperation {
        source_name: source_name.to_string(),
        base_url: select_base_url(doc, path_item, operation),
        method: method.to_uppercase(),
        path: path.to_string(),
        operation_id: operation
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string),
        parameters: merge_params(path_params, op_params),
    })
}

/// Prefers operation, then path-item, then document `servers[0].url`.
pub(crate) fn select_base_url(doc: &Value, path_item: &Value, operation: &Value) -> Option<String> {
    servers_first_url(operation)
        .or_else(|| servers_first_url(path_item))
        .or_else(|| servers_first_url(doc))
}

fn servers_first_url(v: &Value) -> Option<String> {
    let servers = v.get("servers")?.as_array()?;
    servers.first()?.get("url")?.as_str().map(str::to_string)
}

fn collect_params(doc: &Value, source_name: &str, parameters: Option<&Value>) -> Vec<OpenApiParam> {
    let Some(items) = parameters.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|p| match resolve_ref(doc, p) {
            Ok(resolved) => extract_parameter_obj(resolved),
            Err(e) => {
                tracing::warn!(source = source_name, error = %e, "skipping unresolvable parameter");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_core::types::ParameterLocation;
    use serde_json::json;

    #[test]
    fn merges_parameters_and_picks_servers() {
        let doc = json!({
            "servers": [{"url": "https://api.example/v1"}],
            "paths": {"/pets/{id}": {
                "parameters": [{"name": "id", "in": "path"}, {"$ref": "#/components/parameters/trace"}],
                "get": {
                    "operationId": "getPet",
                    "servers": [{"url": "https://read.example"}],
                    "parameters": [{"name": "verbose", "in": "query"}]
                }
            }},
            "components": {"parameters": {"trace": {"name": "X-Trace", "in": "header"}}}
        });
        let op = describe_operation(&doc, "pets", "/pets/{id}", "GET").unwrap();
        assert_eq!(op.method, "GET");
        assert_eq!(op.base_url.as_deref(), Some("https://read.example"));
        assert_eq!(op.operation_id.as_deref(), Some("getPet"));
        assert_eq!(op.parameter_location("id"), Some(ParameterLocation::Path));
        assert_eq!(op.parameter_location("X-Trace"), Some(ParameterLocation::Header));
        assert_eq!(op.parameter_location("verbose"), Some(ParameterLocation::Query));
        assert!(op.parameters.iter().find(|p| p.name == "id").unwrap().required);
        assert!(describe_operation(&doc, "pets", "/pets/{id}", "delete").is_none());
    }
}
