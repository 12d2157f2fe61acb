//! Document-tree parser.
//!
//! Text is first loaded into a `serde_json::Value` (JSON or YAML), then walked one entity
//! kind at a time. Every problem becomes a [`Diagnostic`](crate::diagnostics::Diagnostic);
//! parsing never stops at the first one.

mod actions;
mod criteria;
mod document;
mod node;
mod workflow;

use std::path::Path;

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::error::ParseError;
use crate::types::ArazzoDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Allow `x-oai-`, `x-oas-` and `x-arazzo-` extension keys.
    pub permit_reserved_author: bool,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// `None` only when the root is not an object.
    pub document: Option<ArazzoDocument>,
    pub diagnostics: Diagnostics,
    pub valid: bool,
}

impl ParseOutcome {
    /// The document when it is usable for execution.
    pub fn valid_document(&self) -> Option<&ArazzoDocument> {
        if self.valid {
            self.document.as_ref()
        } else {
            None
        }
    }
}

/// Parses an already-loaded document tree.
pub fn parse(tree: &Value, source_path: Option<&Path>, options: &ParseOptions) -> ParseOutcome {
    let mut cx = node::ParseContext::new(options);
    let mut document = document::parse_document(&mut cx, tree);
    if let Some(doc) = document.as_mut() {
        doc.source_path = source_path.map(Path::to_path_buf);
        crate::validate::validate_into(doc, &mut cx.diagnostics);
    }

    let diagnostics = cx.diagnostics;
    let valid = document.is_some() && diagnostics.is_valid();
    ParseOutcome {
        document,
        diagnostics,
        valid,
    }
}

pub fn parse_str(
    input: &str,
    format: DocumentFormat,
    source_path: Option<&Path>,
    options: &ParseOptions,
) -> Result<ParseOutcome, ParseError> {
    let tree = load_document_str(input, format)?;
    Ok(parse(&tree, source_path, options))
}

/// Loads JSON or YAML text into a JSON tree.
pub fn load_document_str(input: &str, format: DocumentFormat) -> Result<Value, ParseError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(input)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(input)?),
        DocumentFormat::Auto => load_auto(input),
    }
}

fn load_auto(input: &str) -> Result<Value, ParseError> {
    // Heuristic: JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(input) {
            Ok(v) => Ok(v),
            // Flow-style YAML also starts with `{`.
            Err(e) => serde_yaml::from_str::<Value>(input).map_err(|_| ParseError::Json(e)),
        };
    }

    match serde_yaml::from_str::<Value>(input) {
        Ok(v) => Ok(v),
        Err(e) => match serde_json::from_str::<Value>(input) {
            Ok(v) => Ok(v),
            Err(_) => Err(ParseError::Yaml(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "arazzo": "1.0.1",
            "info": {"title": "t", "version": "1"},
            "sourceDescriptions": [{"name": "api", "url": "openapi.json"}],
            "workflows": [{
                "workflowId": "wf",
                "steps": [{"stepId": "s1", "operationId": "getThing"}]
            }]
        })
    }

    #[test]
    fn minimal_document_is_valid() {
        let out = parse(&minimal(), None, &ParseOptions::default());
        assert!(out.valid, "{:?}", out.diagnostics);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn non_object_root_yields_no_document() {
        let out = parse(&json!([1, 2]), None, &ParseOptions::default());
        assert!(out.document.is_none());
        assert!(!out.valid);
    }

    #[test]
    fn parse_is_idempotent() {
        let mut tree = minimal();
        tree["workflows"][0]["bogus"] = json!(true);
        let a = parse(&tree, None, &ParseOptions::default());
        let b = parse(&tree, None, &ParseOptions::default());
        assert_eq!(a.document, b.document);
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn nested_extensions_used_when_no_direct_ones() {
        let mut tree = minimal();
        tree["info"]["extensions"] = json!({"x-team": "payments"});
        let out = parse(&tree, None, &ParseOptions::default());
        let doc = out.document.unwrap();
        assert_eq!(doc.info.extensions.get("x-team"), Some(&json!("payments")));

        tree["info"]["x-direct"] = json!(1);
        let doc = parse(&tree, None, &ParseOptions::default()).document.unwrap();
        assert!(doc.info.extensions.contains_key("x-direct"));
        assert!(!doc.info.extensions.contains_key("x-team"));
    }

    #[test]
    fn reserved_prefix_depends_on_options() {
        let mut tree = minimal();
        tree["x-oai-internal"] = json!(1);
        let out = parse(&tree, None, &ParseOptions::default());
        assert!(!out.valid);
        assert_eq!(
            out.diagnostics.iter().next().unwrap().to_string(),
            "attribute $.x-oai-internal is reserved"
        );

        let permissive = ParseOptions {
            permit_reserved_author: true,
        };
        assert!(parse(&tree, None, &permissive).valid);
    }

    #[test]
    fn auto_detects_yaml() {
        let tree = load_document_str("arazzo: 1.0.0\ninfo:\n  title: t\n", DocumentFormat::Auto).unwrap();
        assert_eq!(tree["info"]["title"], json!("t"));
    }
}
