use arazzo_core::types::ParameterLocation;
use serde_json::Value;

/// An interface document as loaded, kept as a read-only JSON tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiDoc {
    /// Source description name this document was registered under.
    pub name: String,
    /// URL or file path it was loaded from; relative server URLs are joined onto it.
    pub location: String,
    pub raw: Value,
}

/// An operation located in an interface document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub source_name: String,
    /// `servers[0].url` of the operation, path item or document, if any.
    pub base_url: Option<String>,
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub parameters: Vec<OpenApiParam>,
}

impl ResolvedOperation {
    /// Declared location of a parameter, if the operation declares it.
    pub fn parameter_location(&self, name: &str) -> Option<ParameterLocation> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenApiParam {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationLookupError {
    #[error("no interface documents are loaded")]
    NoSources,
    #[error("unknown source description `{0}`")]
    UnknownSource(String),
    #[error("operationId `{0}` not found in any interface document")]
    OperationNotFound(String),
    #[error("invalid operationPath `{path}`: {reason}")]
    InvalidOperationPath { path: String, reason: String },
    #[error("no `{method}` operation at `{path}` in `{source_name}`")]
    PathNotFound {
        source_name: String,
        path: String,
        method: String,
    },
}

pub(crate) const METHOD_KEYS: [&str; 8] =
    ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

pub(crate) fn location_from_str(s: &str) -> Option<ParameterLocation> {
    match s {
        "path" => Some(ParameterLocation::Path),
        "query" => Some(ParameterLocation::Query),
        "header" => Some(ParameterLocation::Header),
        "cookie" => Some(ParameterLocation::Cookie),
        _ => None,
    }
}

pub(crate) fn extract_parameter_obj(p: &Value) -> Option<OpenApiParam> {
    let name = p.get("name").and_then(Value::as_str)?;
    let location = p
        .get("in")
        .and_then(Value::as_str)
        .and_then(location_from_str)?;
    let required = location == ParameterLocation::Path
        || p.get("required").and_then(Value::as_bool).unwrap_or(false);
    Some(OpenApiParam {
        name: name.to_string(),
        location,
        required,
    })
}

/// Operation-level parameters override path-level ones with the same name and location.
pub(crate) fn merge_params(path_level: Vec<OpenApiParam>, op_level: Vec<OpenApiParam>) -> Vec<OpenApiParam> {
    let mut out: Vec<OpenApiParam> = path_level
        .into_iter()
        .filter(|p| {
            !op_level
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .collect();
    out.extend(op_level);
    out
}
