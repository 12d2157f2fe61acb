use arazzo_core::expressions::{JsonPointer, JsonPointerError};
use serde_json::Value;
use serde_json_path::JsonPath;
use sxd_xpath::nodeset::Node;

use super::resolver::stringify;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("replacement target `{target}`: {source}")]
    Pointer {
        target: String,
        #[source]
        source: JsonPointerError,
    },
    #[error("replacement target `{target}` needs a JSON payload")]
    NotJson { target: String },
    #[error("replacement target `{target}` needs an XML payload")]
    NotXml { target: String },
    #[error("replacement target `{target}` matched nothing")]
    Unmatched { target: String },
    #[error("invalid XML payload: {0}")]
    InvalidXml(String),
    #[error("invalid XPath target `{target}`: {reason}")]
    InvalidXPath { target: String, reason: String },
}

/// Applies resolved `(target, value)` replacements in order.
///
/// `$...` targets are JSONPath, `/...` and `#/...` are JSON pointers, anything else is XPath.
/// Against an XML payload (a string starting with `<`) every non-`$` target is XPath.
pub fn apply_replacements(mut payload: Value, replacements: &[(String, Value)]) -> Result<Value, PayloadError> {
    for (target, value) in replacements {
        let target = target.trim();
        let xml = xml_text(&payload).is_some();
        if target.starts_with('$') {
            replace_json_path(as_json(&mut payload, target)?, target, value)?;
        } else if !xml && (target.starts_with('/') || target.starts_with("#/")) {
            let pointer = JsonPointer::parse(target).map_err(|source| PayloadError::Pointer {
                target: target.to_string(),
                source,
            })?;
            pointer
                .assign(as_json(&mut payload, target)?, value.clone())
                .map_err(|source| PayloadError::Pointer {
                    target: target.to_string(),
                    source,
                })?;
        } else {
            let text = xml_text(&payload).ok_or_else(|| PayloadError::NotXml {
                target: target.to_string(),
            })?;
            payload = Value::String(replace_xpath(text, target, &stringify(value))?);
        }
    }
    Ok(payload)
}

fn xml_text(payload: &Value) -> Option<&str> {
    payload.as_str().filter(|s| s.trim_start().starts_with('<'))
}

/// JSON text payloads are parsed so structured targets can address into them.
fn as_json<'p>(payload: &'p mut Value, target: &str) -> Result<&'p mut Value, PayloadError> {
    if let Value::String(s) = payload {
        match serde_json::from_str::<Value>(s) {
            Ok(parsed) if parsed.is_object() || parsed.is_array() => *payload = parsed,
            _ => {
                return Err(PayloadError::NotJson {
                    target: target.to_string(),
                })
            }
        }
    }
    Ok(payload)
}

fn replace_json_path(payload: &mut Value, target: &str, value: &Value) -> Result<(), PayloadError> {
    let pointers: Vec<String> = match JsonPath::parse(target) {
        Ok(path) => path
            .query_located(payload)
            .locations()
            .map(|loc| loc.to_json_pointer())
            .collect(),
        Err(_) => Vec::new(),
    };

    if pointers.is_empty() {
        // Unmatched dotted paths are created, like a pointer would be.
        let Some(tokens) = dotted_tokens(target) else {
            return Err(PayloadError::Unmatched {
                target: target.to_string(),
            });
        };
        return JsonPointer::from_tokens(&tokens)
            .assign(payload, value.clone())
            .map_err(|source| PayloadError::Pointer {
                target: target.to_string(),
                source,
            });
    }

    for pointer in pointers {
        if let Some(slot) = payload.pointer_mut(&pointer) {
            *slot = value.clone();
        }
    }
    Ok(())
}

fn dotted_tokens(target: &str) -> Option<Vec<String>> {
    let rest = target.strip_prefix("$.")?;
    let tokens: Vec<String> = rest.split('.').map(str::to_string).collect();
    if tokens
        .iter()
        .any(|t| t.is_empty() || t.contains(['[', ']', '*', '?', '(', ')']))
    {
        return None;
    }
    Some(tokens)
}

fn replace_xpath(xml: &str, target: &str, value: &str) -> Result<String, PayloadError> {
    let package = sxd_document::parser::parse(xml).map_err(|e| PayloadError::InvalidXml(format!("{e:?}")))?;
    let document = package.as_document();
    let invalid = |reason: String| PayloadError::InvalidXPath {
        target: target.to_string(),
        reason,
    };

    let selected = sxd_xpath::evaluate_xpath(&document, target).map_err(|e| invalid(e.to_string()))?;
    let sxd_xpath::Value::Nodeset(nodes) = selected else {
        return Err(invalid("expression does not select nodes".to_string()));
    };
    if nodes.size() == 0 {
        return Err(PayloadError::Unmatched {
            target: target.to_string(),
        });
    }
    for node in nodes.document_order() {
        match node {
            Node::Element(e) => {
                for child in e.children() {
                    e.remove_child(child);
                }
                e.set_text(value);
            }
            Node::Attribute(a) => {
                if let Some(parent) = a.parent() {
                    parent.set_attribute_value(a.name(), value);
                }
            }
            Node::Text(t) => t.set_text(value),
            _ => return Err(invalid("only elements, attributes and text can be replaced".to_string())),
        }
    }

    let mut out = Vec::new();
    sxd_document::writer::format_document(&document, &mut out)
        .map_err(|e| PayloadError::InvalidXml(e.to_string()))?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn r(target: &str, value: Value) -> (String, Value) {
        (target.to_string(), value)
    }

    #[test]
    fn pointer_targets_create_missing_members() {
        let out = apply_replacements(
            json!({"pet": {"name": "old"}}),
            &[r("/pet/name", json!("Rex")), r("#/pet/tags/-", json!("new")), r("/owner/id", json!(7))],
        )
        .unwrap();
        assert_eq!(out, json!({"pet": {"name": "Rex", "tags": ["new"]}, "owner": {"id": 7}}));
    }

    #[test]
    fn jsonpath_targets_replace_every_match() {
        let out = apply_replacements(
            json!({"items": [{"qty": 1}, {"qty": 2}]}),
            &[r("$.items[*].qty", json!(0)), r("$.meta.source", json!("test"))],
        )
        .unwrap();
        assert_eq!(out, json!({"items": [{"qty": 0}, {"qty": 0}], "meta": {"source": "test"}}));
    }

    #[test]
    fn unmatched_filter_target_is_an_error() {
        let err = apply_replacements(
            json!({"items": [{"qty": 1}]}),
            &[r("$.items[?@.qty > 5].qty", json!(0))],
        )
        .unwrap_err();
        assert!(matches!(err, PayloadError::Unmatched { ref target } if target == "$.items[?@.qty > 5].qty"));

        let err = apply_replacements(json!("<pet><name>a</name></pet>"), &[r("/pet/age", json!(3))])
            .unwrap_err();
        assert!(matches!(err, PayloadError::Unmatched { .. }));
    }

    #[test]
    fn json_text_payload_is_parsed() {
        let out = apply_replacements(json!("{\"a\": 1}"), &[r("/a", json!(2))]).unwrap();
        assert_eq!(out, json!({"a": 2}));
    }

    #[test]
    fn xpath_targets_on_xml() {
        let out = apply_replacements(
            json!("<pet id=\"1\"><name>old</name></pet>"),
            &[r("/pet/name", json!("Rex")), r("/pet/@id", json!(42))],
        )
        .unwrap();
        let text = out.as_str().unwrap();
        assert!(text.contains("<name>Rex</name>"), "{text}");
        assert!(text.contains("id='42'") || text.contains("id=\"42\""), "{text}");
    }

    #[test]
    fn xpath_target_on_json_is_an_error() {
        let err = apply_replacements(json!({"a": 1}), &[r("pet/name", json!("x"))]).unwrap_err();
        assert!(matches!(err, PayloadError::NotXml { .. }));
    }
}
