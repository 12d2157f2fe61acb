use serde_json::Value;

use crate::parser::node::{item_key, ParseContext};
use crate::types::{
    Criterion, CriterionExpressionLanguage, CriterionExpressionType, CriterionType,
    KnownCriterionType,
};

const CRITERION_KEYS: &[&str] = &["context", "condition", "type"];
const EXPRESSION_TYPE_KEYS: &[&str] = &["type", "version"];

pub(crate) fn parse_criteria(cx: &mut ParseContext<'_>, items: &[Value], location: &str) -> Vec<Criterion> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| parse_criterion(cx, item, location, &item_key(idx)))
        .collect()
}

fn parse_criterion(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<Criterion> {
    let node = cx.object(value, location, key, CRITERION_KEYS, true)?;
    let context = node.optional_str(cx, "context");
    let condition = node.required_str(cx, "condition").unwrap_or_default();

    let r#type = match node.raw("type") {
        None => None,
        Some(Value::String(name)) => match KnownCriterionType::from_name(name) {
            Some(known) => Some(CriterionType::Known(known)),
            None => {
                cx.diagnostics.invalid(
                    &node.location,
                    "type",
                    format!("unknown criterion type `{name}`"),
                );
                None
            }
        },
        Some(obj @ Value::Object(_)) => {
            parse_expression_type(cx, obj, &node.location).map(CriterionType::Custom)
        }
        Some(_) => {
            cx.diagnostics.invalid_type(&node.location, "type", "string", false);
            None
        }
    };

    let extensions = node.finish(cx);
    Some(Criterion {
        context,
        condition,
        r#type,
        extensions,
    })
}

fn parse_expression_type(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
) -> Option<CriterionExpressionType> {
    let node = cx.object(value, location, "type", EXPRESSION_TYPE_KEYS, false)?;
    let language = node.required_str(cx, "type");
    let version = node.version_str(cx, "version").unwrap_or_default();
    let extensions = node.finish(cx);

    let r#type = match language.as_deref() {
        Some("jsonpath") => CriterionExpressionLanguage::Jsonpath,
        Some("xpath") => CriterionExpressionLanguage::Xpath,
        Some(other) => {
            cx.diagnostics.invalid(
                &crate::diagnostics::join_path(location, "type"),
                "type",
                format!("unknown expression language `{other}` (expected jsonpath or xpath)"),
            );
            return None;
        }
        None => return None,
    };
    Some(CriterionExpressionType {
        r#type,
        version,
        extensions,
    })
}
