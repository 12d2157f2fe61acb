use arazzo_core::expressions::unescape_token;

use crate::openapi::model::{OpenApiDoc, OperationLookupError, ResolvedOperation};
use crate::openapi::shape::describe_operation;

/// The parts of an `operationPath` such as
/// `{$sourceDescriptions.petStore.url}#/paths/~1pet~1findByStatus/get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPathRef {
    /// `None` for a bare `#/paths/...` fragment.
    pub source_name: Option<String>,
    pub path: String,
    pub method: String,
}

pub fn parse_operation_path_ref(op_path: &str) -> Result<OperationPathRef, OperationLookupError> {
    let invalid = |reason: &str| OperationLookupError::InvalidOperationPath {
        path: op_path.to_string(),
        reason: reason.to_string(),
    };

    let (before_hash, fragment) = op_path
        .split_once('#')
        .ok_or_else(|| invalid("missing `#/paths/...` fragment"))?;

    let source_name = if before_hash.trim().is_empty() {
        None
    } else {
        Some(
            extract_source_name(before_hash)
                .ok_or_else(|| invalid("expected {$sourceDescriptions.<name>.url} before the fragment"))?,
        )
    };

    let tokens: Vec<&str> = fragment
        .strip_prefix('/')
        .ok_or_else(|| invalid("fragment must be a JSON pointer"))?
        .split('/')
        .collect();
    if tokens.len() != 3 || tokens[0] != "paths" || tokens[1].is_empty() || tokens[2].is_empty() {
        return Err(invalid("pointer must address /paths/<path>/<method>"));
    }
    let path = unescape_token(tokens[1]);

    Ok(OperationPathRef {
        source_name,
        path,
        method: tokens[2].to_lowercase(),
    })
}

/// Resolves an `operationPath`; a bare fragment is looked up in every document in order.
pub fn find_operation_by_path(
    docs: &[OpenApiDoc],
    op_path: &str,
) -> Result<ResolvedOperation, OperationLookupError> {
    let r = parse_operation_path_ref(op_path)?;
    let not_found = |source_name: &str| OperationLookupError::PathNotFound {
        source_name: source_name.to_string(),
        path: r.path.clone(),
        method: r.method.clone(),
    };

    match &r.source_name {
        Some(name) => {
            let doc = docs
                .iter()
                .find(|d| &d.name == name)
                .ok_or_else(|| OperationLookupError::UnknownSource(name.clone()))?;
            describe_operation(&doc.raw, &doc.name, &r.path, &r.method).ok_or_else(|| not_found(name))
        }
        None => {
            if docs.is_empty() {
                return Err(OperationLookupError::NoSources);
            }
            docs.iter()
                .find_map(|d| describe_operation(&d.raw, &d.name, &r.path, &r.method))
                .ok_or_else(|| not_found("*"))
        }
    }
}

fn extract_source_name(s: &str) -> Option<String> {
    const OPEN: &str = "{$sourceDescriptions.";
    let start = s.find(OPEN)? + OPEN.len();
    let (name, rest) = s[start..].split_once('.')?;
    if !rest.starts_with("url}") || name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
