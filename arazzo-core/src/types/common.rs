use std::collections::BTreeMap;

pub type AnyValue = serde_json::Value;
pub type JsonSchema = serde_json::Value;
pub type RuntimeExpression = String;

/// Specification Extensions (`x-...`) captured from the document.
///
/// The parser collects `x-` keys found directly on an object, or under a nested
/// `extensions` object when the object carries none of its own.
pub type Extensions = BTreeMap<String, serde_json::Value>;
