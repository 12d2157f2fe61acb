use crate::expressions::{parse_runtime_expr, parse_template, validate_value_expressions};
use crate::validate::validator::{Validator, MAP_KEY_RE};

pub(crate) fn validate_map_keys<'a>(
    v: &mut Validator<'_>,
    location: &str,
    keys: impl Iterator<Item = &'a String>,
) {
    for key in keys {
        if !MAP_KEY_RE.is_match(key) {
            v.push(location, key, "map key must match ^[a-zA-Z0-9\\.\\-_]+$");
        }
    }
}

pub(crate) fn validate_runtime_expr(v: &mut Validator<'_>, location: &str, key: &str, expr: &str) {
    if let Err(e) = parse_runtime_expr(expr) {
        v.push(location, key, format!("invalid runtime expression: {e}"));
    }
}

/// Output values may be a bare expression or a template embedding several.
pub(crate) fn validate_expression_or_template(
    v: &mut Validator<'_>,
    location: &str,
    key: &str,
    s: &str,
) {
    let trimmed = s.trim();
    if trimmed.starts_with('$') {
        validate_runtime_expr(v, location, key, trimmed);
    } else if trimmed.starts_with("#/") {
        // pointer into components, checked when resolved
    } else {
        validate_template_string(v, location, key, s);
    }
}

pub(crate) fn validate_template_string(v: &mut Validator<'_>, location: &str, key: &str, s: &str) {
    if let Err(e) = parse_template(s) {
        v.push(location, key, format!("invalid template expression: {e}"));
    }
}

pub(crate) fn validate_value_exprs(
    v: &mut Validator<'_>,
    location: &str,
    key: &str,
    value: &serde_json::Value,
) {
    if let Err(e) = validate_value_expressions(value) {
        v.push(location, key, format!("invalid expression inside value: {e}"));
    }
}
