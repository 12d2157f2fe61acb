use std::cmp::Ordering;

use arazzo_core::expressions::JsonPointer;
use arazzo_core::types::{Criterion, KnownCriterionType};
use regex::Regex;
use serde_json::Value as JsonValue;
use serde_json_path::JsonPath;

use super::context::ExecutionContext;
use super::resolver::{stringify, ResolveError, Resolver};

/// Comparison operators in the order conditions are split on.
const OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriterionError {
    #[error("malformed condition `{condition}`: {reason}")]
    Malformed { condition: String, reason: String },
    #[error("cannot compare {left} with {right} in `{condition}`")]
    Incomparable {
        condition: String,
        left: String,
        right: String,
    },
    #[error("`{kind}` criterion `{condition}` requires a context")]
    MissingContext { kind: &'static str, condition: String },
    #[error("invalid regex `{pattern}`: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("invalid JSONPath `{query}`: {reason}")]
    InvalidJsonPath { query: String, reason: String },
    #[error("invalid XML context for `{condition}`: {reason}")]
    InvalidXml { condition: String, reason: String },
    #[error("invalid XPath `{condition}`: {reason}")]
    InvalidXPath { condition: String, reason: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl CriterionError {
    fn malformed(condition: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            condition: condition.to_string(),
            reason: reason.into(),
        }
    }
}

/// True when every criterion holds; an empty list holds.
pub fn evaluate_all(
    criteria: &[Criterion],
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<bool, CriterionError> {
    for c in criteria {
        if !evaluate(c, resolver, ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn evaluate(
    criterion: &Criterion,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<bool, CriterionError> {
    let condition = criterion.condition.trim();
    let held = match criterion.kind() {
        KnownCriterionType::Simple => evaluate_simple(condition, resolver, ctx)?,
        KnownCriterionType::Regex => {
            let subject = context_value(criterion, "regex", resolver, ctx)?;
            evaluate_regex(condition, &stringify(&subject))?
        }
        KnownCriterionType::Jsonpath => {
            let subject = match context_value(criterion, "jsonpath", resolver, ctx)? {
                JsonValue::String(s) => serde_json::from_str(&s).unwrap_or(JsonValue::String(s)),
                other => other,
            };
            evaluate_jsonpath(condition, &subject, resolver, ctx)?
        }
        KnownCriterionType::Xpath => {
            let subject = context_value(criterion, "xpath", resolver, ctx)?;
            evaluate_xpath(condition, &stringify(&subject))?
        }
    };
    tracing::trace!(condition, kind = ?criterion.kind(), held, "criterion evaluated");
    Ok(held)
}

fn context_value(
    criterion: &Criterion,
    kind: &'static str,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<JsonValue, CriterionError> {
    let expr = criterion
        .context
        .as_deref()
        .ok_or_else(|| CriterionError::MissingContext {
            kind,
            condition: criterion.condition.clone(),
        })?;
    Ok(resolver.resolve(expr, Some(ctx))?.unwrap_or(JsonValue::Null))
}

fn evaluate_simple(
    cond: &str,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<bool, CriterionError> {
    let cond = cond.trim();
    if cond.is_empty() {
        return Err(CriterionError::malformed(cond, "empty condition"));
    }

    let any = split_top_level(cond, "||");
    if any.len() > 1 {
        for part in any {
            if evaluate_simple(part, resolver, ctx)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    let all = split_top_level(cond, "&&");
    if all.len() > 1 {
        for part in all {
            if !evaluate_simple(part, resolver, ctx)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    if let Some(rest) = cond.strip_prefix('!') {
        if !rest.starts_with('=') {
            return Ok(!evaluate_simple(rest, resolver, ctx)?);
        }
    }
    if let Some(inner) = strip_outer_parens(cond) {
        return evaluate_simple(inner, resolver, ctx);
    }

    match find_operator(cond) {
        Some((idx, op)) => {
            let left = operand(&cond[..idx], resolver, ctx)?;
            let right = operand(&cond[idx + op.len()..], resolver, ctx)?;
            compare(cond, &left, &right, op)
        }
        None => match operand(cond, resolver, ctx)? {
            JsonValue::Bool(b) => Ok(b),
            other => Err(CriterionError::malformed(
                cond,
                format!("operand without an operator must be boolean, got {other}"),
            )),
        },
    }
}

/// Resolves `$...` operands and parses literals; quoted text is always a string.
fn operand(
    raw: &str,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<JsonValue, CriterionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CriterionError::malformed(raw, "missing operand"));
    }
    if raw.starts_with('$') || raw.starts_with("#/components") {
        return Ok(resolver.resolve(raw, Some(ctx))?.unwrap_or(JsonValue::Null));
    }
    if let Some(unquoted) = unquote(raw) {
        return Ok(JsonValue::String(unquoted.to_string()));
    }
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string())))
}

fn unquote(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if s.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[s.len() - 1] == bytes[0]
    {
        return Some(&s[1..s.len() - 1]);
    }
    None
}

/// Compares two resolved operands: numerically when both are numeric, otherwise as
/// case-insensitive text.
fn compare(
    cond: &str,
    left: &JsonValue,
    right: &JsonValue,
    op: &str,
) -> Result<bool, CriterionError> {
    let compound = |v: &JsonValue| v.is_array() || v.is_object();
    if compound(left) || compound(right) {
        if compound(left) && compound(right) && (op == "==" || op == "!=") {
            return Ok((left == right) == (op == "=="));
        }
        return Err(CriterionError::Incomparable {
            condition: cond.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
    }

    let ordering = match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(as_text(left).cmp(&as_text(right))),
    };
    let Some(ordering) = ordering else {
        return Ok(op == "!=");
    };
    Ok(match op {
        "==" => ordering == Ordering::Equal,
        "!=" => ordering != Ordering::Equal,
        "<" => ordering == Ordering::Less,
        ">" => ordering == Ordering::Greater,
        "<=" => ordering != Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        _ => false,
    })
}

fn as_number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.to_lowercase(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string().to_lowercase(),
    }
}

fn evaluate_regex(pattern: &str, subject: &str) -> Result<bool, CriterionError> {
    let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| CriterionError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(re.is_match(subject))
}

fn evaluate_jsonpath(
    cond: &str,
    subject: &JsonValue,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<bool, CriterionError> {
    match find_operator(cond) {
        Some((idx, op)) => {
            let Some(actual) = select(cond[..idx].trim(), subject)? else {
                return Ok(false);
            };
            let expected = operand(&cond[idx + op.len()..], resolver, ctx)?;
            compare(cond, &actual, &expected, op)
        }
        None => Ok(select(cond, subject)?.is_some()),
    }
}

/// Picks the first node addressed by a `#/pointer` or a JSONPath query.
fn select(query: &str, subject: &JsonValue) -> Result<Option<JsonValue>, CriterionError> {
    if query.starts_with('#') {
        let pointer = JsonPointer::parse(query).map_err(|e| CriterionError::InvalidJsonPath {
            query: query.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(pointer.resolve(subject).cloned());
    }

    let path = JsonPath::parse(query).map_err(|e| CriterionError::InvalidJsonPath {
        query: query.to_string(),
        reason: e.to_string(),
    })?;
    // Filters select array members, so a lone object is filtered as a one-element array.
    let wrapped;
    let target = if query.starts_with("$[?") && !subject.is_array() {
        wrapped = JsonValue::Array(vec![subject.clone()]);
        &wrapped
    } else {
        subject
    };
    Ok(path.query(target).first().cloned())
}

fn evaluate_xpath(cond: &str, xml: &str) -> Result<bool, CriterionError> {
    let package = sxd_document::parser::parse(xml).map_err(|e| CriterionError::InvalidXml {
        condition: cond.to_string(),
        reason: format!("{e:?}"),
    })?;
    let document = package.as_document();
    let value = sxd_xpath::evaluate_xpath(&document, cond).map_err(|e| {
        CriterionError::InvalidXPath {
            condition: cond.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(value.boolean())
}

/// Splits on `sep` where it appears outside quotes, parentheses and brackets.
fn split_top_level<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut scan = Scanner::default();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if scan.at_top() && bytes[i..].starts_with(sep.as_bytes()) {
            parts.push(&s[start..i]);
            i += sep.len();
            start = i;
            continue;
        }
        scan.feed(bytes[i]);
        i += 1;
    }
    parts.push(&s[start..]);
    parts
}

/// Finds the first operator, in [`OPERATORS`] order, that occurs at the top level.
fn find_operator(s: &str) -> Option<(usize, &'static str)> {
    OPERATORS.iter().find_map(|op| {
        let mut scan = Scanner::default();
        let bytes = s.as_bytes();
        for i in 0..bytes.len() {
            if scan.at_top() && bytes[i..].starts_with(op.as_bytes()) {
                // `<` and `>` must not be the first half of `<=` / `>=`.
                if op.len() == 1 && bytes.get(i + 1) == Some(&b'=') {
                    scan.feed(bytes[i]);
                    continue;
                }
                return Some((i, *op));
            }
            scan.feed(bytes[i]);
        }
        None
    })
}

fn strip_outer_parens(s: &str) -> Option<&str> {
    if !s.starts_with('(') || !s.ends_with(')') {
        return None;
    }
    let mut scan = Scanner::default();
    for (i, b) in s.bytes().enumerate() {
        scan.feed(b);
        if scan.at_top() && i < s.len() - 1 {
            return None;
        }
    }
    Some(&s[1..s.len() - 1])
}

#[derive(Default)]
struct Scanner {
    quote: Option<u8>,
    depth: i32,
}

impl Scanner {
    fn at_top(&self) -> bool {
        self.quote.is_none() && self.depth == 0
    }

    fn feed(&mut self, b: u8) {
        match self.quote {
            Some(q) if b == q => self.quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => self.quote = Some(b),
                b'(' | b'[' => self.depth += 1,
                b')' | b']' => self.depth -= 1,
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::executor::context::HttpExchange;
    use arazzo_core::types::{CriterionExpressionLanguage, CriterionExpressionType, CriterionType};
    use arazzo_core::{parse, ParseOptions};
    use serde_json::json;

    fn resolver() -> Resolver {
        let tree = json!({
            "arazzo": "1.0.1",
            "info": {"title": "t", "version": "1"},
            "sourceDescriptions": [{"name": "api", "url": "https://api.example/openapi.json"}],
            "workflows": [{"workflowId": "w", "steps": [{"stepId": "s", "operationId": "op"}]}]
        });
        Resolver::new(Arc::new(parse(&tree, None, &ParseOptions::default()).document.unwrap()))
    }

    fn ctx(status: u16, body: JsonValue) -> ExecutionContext {
        let mut ctx = ExecutionContext::new("w", json!({"limit": 10, "name": "Rex"}));
        let mut exchange = HttpExchange {
            status,
            response_body: Some(body),
            ..Default::default()
        };
        exchange
            .response_headers
            .insert("Content-Type".into(), "application/json".into());
        ctx.exchange = Some(exchange);
        ctx
    }

    fn typed(condition: &str, context: &str, kind: KnownCriterionType) -> Criterion {
        let mut c = Criterion::simple(condition);
        c.context = Some(context.to_string());
        c.r#type = Some(CriterionType::Known(kind));
        c
    }

    fn holds(c: &Criterion, ctx: &ExecutionContext) -> bool {
        evaluate(c, &mut resolver(), ctx).unwrap()
    }

    #[test]
    fn simple_status_code() {
        let ctx = ctx(200, json!({}));
        assert!(holds(&Criterion::simple("$statusCode == 200"), &ctx));
        assert!(!holds(&Criterion::simple("$statusCode == 404"), &ctx));
        assert!(holds(&Criterion::simple("$statusCode >= 200"), &ctx));
        assert!(holds(&Criterion::simple("$statusCode < 300"), &ctx));
    }

    #[test]
    fn simple_boolean_logic() {
        let ctx = ctx(201, json!({"ok": true, "count": 3}));
        assert!(holds(
            &Criterion::simple("$statusCode == 200 || $statusCode == 201"),
            &ctx
        ));
        assert!(holds(
            &Criterion::simple("($statusCode == 201 && $response.body#/count > 2) || false"),
            &ctx
        ));
        assert!(holds(&Criterion::simple("!($statusCode == 500)"), &ctx));
        assert!(holds(&Criterion::simple("$response.body#/ok"), &ctx));
        assert!(holds(&Criterion::simple("$statusCode != 500"), &ctx));
    }

    #[test]
    fn operators_inside_quotes_are_ignored() {
        let ctx = ctx(200, json!({"msg": "a || b"}));
        assert!(holds(&Criterion::simple("$response.body#/msg == 'a || b'"), &ctx));
    }

    #[test]
    fn string_comparison_is_case_insensitive() {
        let ctx = ctx(200, json!({"status": "Available", "tag": null}));
        assert!(holds(&Criterion::simple("$response.body#/status == 'available'"), &ctx));
        assert!(holds(&Criterion::simple("$response.body#/tag == \"null\""), &ctx));
        assert!(holds(&Criterion::simple("$inputs.name == rex"), &ctx));
    }

    #[test]
    fn numeric_strings_compare_as_numbers() {
        let ctx = ctx(200, json!({"total": "42"}));
        assert!(holds(&Criterion::simple("$response.body#/total > 9"), &ctx));
        assert!(holds(&Criterion::simple("$response.body#/total != $inputs.limit"), &ctx));
    }

    #[test]
    fn array_against_scalar_is_an_error() {
        let ctx = ctx(200, json!({"items": [1, 2]}));
        let err = evaluate(
            &Criterion::simple("$response.body#/items == 2"),
            &mut resolver(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, CriterionError::Incomparable { .. }));
    }

    #[test]
    fn bare_non_boolean_operand_is_malformed() {
        let ctx = ctx(200, json!({}));
        let err = evaluate(&Criterion::simple("$statusCode"), &mut resolver(), &ctx).unwrap_err();
        assert!(matches!(err, CriterionError::Malformed { .. }));
    }

    #[test]
    fn regex_full_match() {
        let ctx = ctx(200, json!({"id": "abc-123"}));
        assert!(holds(
            &typed("[a-z]+-\\d+", "$response.body#/id", KnownCriterionType::Regex),
            &ctx
        ));
        assert!(!holds(
            &typed("\\d+", "$response.body#/id", KnownCriterionType::Regex),
            &ctx
        ));
        assert!(holds(
            &typed("application/.*", "$response.header.content-type", KnownCriterionType::Regex),
            &ctx
        ));
    }

    #[test]
    fn regex_without_context_errors() {
        let ctx = ctx(200, json!({}));
        let mut c = Criterion::simple("^2");
        c.r#type = Some(CriterionType::Known(KnownCriterionType::Regex));
        assert!(matches!(
            evaluate(&c, &mut resolver(), &ctx),
            Err(CriterionError::MissingContext { .. })
        ));
    }

    #[test]
    fn jsonpath_pointer_comparison() {
        let ctx = ctx(200, json!({"status": "OK"}));
        assert!(holds(
            &typed("#/status == \"OK\"", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
    }

    #[test]
    fn jsonpath_query_and_existence() {
        let ctx = ctx(200, json!({"pets": [{"name": "Rex", "age": 3}]}));
        assert!(holds(
            &typed("$.pets[0].age >= 3", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
        assert!(holds(
            &typed("$.pets[0].name == $inputs.name", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
        assert!(holds(
            &typed("$.pets[?@.age > 2]", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
        assert!(!holds(
            &typed("$.pets[?@.age > 5]", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
    }

    #[test]
    fn jsonpath_filter_on_object_context() {
        let ctx = ctx(200, json!({"status": "active"}));
        assert!(holds(
            &typed("$[?@.status == 'active']", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
    }

    #[test]
    fn jsonpath_context_string_is_parsed() {
        let ctx = ctx(200, JsonValue::String("{\"n\": 5}".into()));
        assert!(holds(
            &typed("$.n == 5", "$response.body", KnownCriterionType::Jsonpath),
            &ctx
        ));
    }

    #[test]
    fn jsonpath_dialect_object() {
        let ctx = ctx(200, json!({"ok": true}));
        let mut c = Criterion::simple("$.ok == true");
        c.context = Some("$response.body".into());
        c.r#type = Some(CriterionType::Custom(CriterionExpressionType {
            r#type: CriterionExpressionLanguage::Jsonpath,
            version: "draft-goessner-dispatch-jsonpath-00".into(),
            extensions: Default::default(),
        }));
        assert!(holds(&c, &ctx));
    }

    #[test]
    fn xpath_boolean() {
        let ctx = ctx(200, JsonValue::String("<pet><name>Rex</name><age>3</age></pet>".into()));
        assert!(holds(
            &typed("/pet/name = 'Rex'", "$response.body", KnownCriterionType::Xpath),
            &ctx
        ));
        assert!(!holds(
            &typed("/pet/age > 5", "$response.body", KnownCriterionType::Xpath),
            &ctx
        ));
    }

    #[test]
    fn xpath_rejects_malformed_xml() {
        let ctx = ctx(200, JsonValue::String("<pet>".into()));
        assert!(matches!(
            evaluate(
                &typed("/pet", "$response.body", KnownCriterionType::Xpath),
                &mut resolver(),
                &ctx
            ),
            Err(CriterionError::InvalidXml { .. })
        ));
    }

    #[test]
    fn empty_list_holds() {
        assert!(evaluate_all(&[], &mut resolver(), &ctx(500, json!({}))).unwrap());
    }
}
