use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arazzo_core::expressions::{
    parse_runtime_expr, split_template, BodyAccess, JsonPointer, NamePath, RuntimeExpr,
    RuntimeExprError, Segment, Source, TemplateError,
};
use arazzo_core::types::ArazzoDocument;
use arazzo_core::resolve_parameter;
use serde_json::Value;
use serde_json_path::JsonPath;

use crate::executor::context::{ExecutionContext, HttpExchange};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid runtime expression `{expr}`: {source}")]
    Syntax {
        expr: String,
        #[source]
        source: RuntimeExprError,
    },
    #[error("cannot resolve `{expr}`: {reason}")]
    Missing { expr: String, reason: String },
    #[error("malformed template `{text}`: {source}")]
    Template {
        text: String,
        #[source]
        source: TemplateError,
    },
}

impl ResolveError {
    fn missing(expr: &str, reason: impl Into<String>) -> Self {
        Self::Missing {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}

/// Resolves runtime expressions for one document over one run.
///
/// Holds the published `$steps.<id>.outputs.<name>` and `$workflows.<id>.outputs.<name>`
/// values, and memoizes lookups into scopes that cannot change during a run.
pub struct Resolver {
    document: Arc<ArazzoDocument>,
    tree: Value,
    references: BTreeMap<String, Value>,
    memo: HashMap<String, Value>,
}

impl Resolver {
    pub fn new(document: Arc<ArazzoDocument>) -> Self {
        let tree = serde_json::to_value(document.as_ref()).unwrap_or(Value::Null);
        Self {
            document,
            tree,
            references: BTreeMap::new(),
            memo: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Arc<ArazzoDocument> {
        &self.document
    }

    pub fn publish(&mut self, key: impl Into<String>, value: Value) {
        self.references.insert(key.into(), value);
    }

    pub fn published(&self, key: &str) -> Option<&Value> {
        self.references.get(key)
    }

    /// Resolves a single expression. `Ok(None)` means a document or input lookup found
    /// nothing; header, parameter and body lookups fail instead.
    pub fn resolve(
        &mut self,
        expression: &str,
        ctx: Option<&ExecutionContext>,
    ) -> Result<Option<Value>, ResolveError> {
        let expr = expression.trim();
        if let Some(v) = self.memo.get(expr) {
            return Ok(Some(v.clone()));
        }

        if let Some(pointer) = expr.strip_prefix("#/components") {
            let value = self.components_pointer(pointer);
            self.remember(expr, value.as_ref());
            return Ok(value);
        }

        let parsed = match parse_runtime_expr(expr) {
            Ok(p) => p,
            Err(RuntimeExprError::UnknownExpression(_) | RuntimeExprError::MissingDollarPrefix) => {
                return Ok(Some(Value::String(expr.to_string())));
            }
            Err(source) => {
                return Err(ResolveError::Syntax {
                    expr: expr.to_string(),
                    source,
                })
            }
        };

        match parsed {
            RuntimeExpr::Inputs(np) => Ok(ctx.and_then(|c| walk(&c.inputs, &np))),
            RuntimeExpr::Outputs(np) => {
                Ok(ctx.and_then(|c| c.outputs.get(&np.root).and_then(|v| walk_rest(v, &np))))
            }
            RuntimeExpr::SourceDescriptions(np) => {
                let value = self
                    .document
                    .source_description(&np.root)
                    .and_then(|s| serde_json::to_value(s).ok())
                    .and_then(|v| walk_rest(&v, &np));
                self.remember(expr, value.as_ref());
                Ok(value)
            }
            RuntimeExpr::Workflows(np) => Ok(self.definition_or_output("workflows", &np)),
            RuntimeExpr::Steps(np) => Ok(self.definition_or_output("steps", &np)),
            RuntimeExpr::Components(np) => {
                let value = self
                    .tree
                    .get("components")
                    .and_then(|c| c.get(&np.root))
                    .and_then(|v| walk_rest(v, &np));
                self.remember(expr, value.as_ref());
                Ok(value)
            }
            RuntimeExpr::ComponentsParameters(name) => {
                let components = self.document.components.as_ref();
                let value = components
                    .and_then(|c| c.parameters.get(&name))
                    .and_then(|item| resolve_parameter(components, item).ok())
                    .map(|p| p.value);
                self.remember(expr, value.as_ref());
                Ok(value)
            }
            RuntimeExpr::StatusCode => {
                let ex = exchange(expr, ctx)?;
                Ok(Some(Value::from(ex.status)))
            }
            RuntimeExpr::Url => Ok(Some(Value::String(exchange(expr, ctx)?.url.clone()))),
            RuntimeExpr::Method => Ok(Some(Value::String(exchange(expr, ctx)?.method.clone()))),
            RuntimeExpr::Request(source) => {
                let ex = exchange(expr, ctx)?;
                match source {
                    Source::Header(name) => ex
                        .request_header(&name)
                        .map(|v| Some(Value::String(v.to_string())))
                        .ok_or_else(|| ResolveError::missing(expr, format!("no request header `{name}`"))),
                    Source::Path(name) => ex
                        .path_params
                        .get(&name)
                        .map(|v| Some(Value::String(v.clone())))
                        .ok_or_else(|| ResolveError::missing(expr, format!("no path parameter `{name}`"))),
                    Source::Query(name) => ex
                        .query_params
                        .get(&name)
                        .map(|v| Some(Value::String(v.clone())))
                        .ok_or_else(|| ResolveError::missing(expr, format!("no query parameter `{name}`"))),
                    Source::Body(access) => {
                        let body = ex
                            .request_body
                            .as_ref()
                            .ok_or_else(|| ResolveError::missing(expr, "request has no body"))?;
                        body_access(expr, body, &access).map(Some)
                    }
                }
            }
            RuntimeExpr::Response(source) => {
                let ex = exchange(expr, ctx)?;
                match source {
                    Source::Header(name) => ex
                        .response_header(&name)
                        .map(|v| Some(Value::String(v.to_string())))
                        .ok_or_else(|| ResolveError::missing(expr, format!("no response header `{name}`"))),
                    Source::Body(access) => {
                        let body = ex
                            .response_body
                            .as_ref()
                            .ok_or_else(|| ResolveError::missing(expr, "response has no body"))?;
                        body_access(expr, body, &access).map(Some)
                    }
                    Source::Path(_) | Source::Query(_) => Err(ResolveError::missing(
                        expr,
                        "responses carry no path or query parameters",
                    )),
                }
            }
        }
    }

    /// Replaces every `{$...}` in `text` with its resolved value; missing values render empty.
    pub fn resolve_template(
        &mut self,
        text: &str,
        ctx: Option<&ExecutionContext>,
    ) -> Result<String, ResolveError> {
        let tpl = split_template(text).map_err(|source| ResolveError::Template {
            text: text.to_string(),
            source,
        })?;
        let mut out = String::new();
        for seg in tpl.segments {
            match seg {
                Segment::Literal(l) => out.push_str(&l),
                Segment::Expr(e) => {
                    if let Some(v) = self.resolve(&e, ctx)? {
                        out.push_str(&stringify(&v));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Walks a JSON value, resolving whole-string expressions and embedded templates.
    pub fn resolve_value(
        &mut self,
        value: &Value,
        ctx: Option<&ExecutionContext>,
    ) -> Result<Value, ResolveError> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if is_expression(trimmed) {
                    return Ok(self.resolve(trimmed, ctx)?.unwrap_or(Value::Null));
                }
                if s.contains('{') {
                    return Ok(Value::String(self.resolve_template(s, ctx)?));
                }
                Ok(value.clone())
            }
            Value::Array(items) => items
                .iter()
                .map(|v| self.resolve_value(v, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_value(v, ctx)?);
                }
                Ok(Value::Object(out))
            }
            _ => Ok(value.clone()),
        }
    }

    fn definition_or_output(&self, scope: &str, np: &NamePath) -> Option<Value> {
        if np.rest.first().map(String::as_str) == Some("outputs") {
            let name = np.rest.get(1)?;
            let key = format!("${scope}.{}.outputs.{name}", np.root);
            let published = self.references.get(&key)?;
            let mut cur = published;
            for seg in &np.rest[2..] {
                cur = step_into(cur, seg)?;
            }
            return apply_pointer(cur, np.pointer.as_ref());
        }

        let definition = match scope {
            "workflows" => self
                .document
                .workflow(&np.root)
                .and_then(|w| serde_json::to_value(w).ok()),
            _ => self
                .document
                .find_step(&np.root)
                .and_then(|(_, s)| serde_json::to_value(s).ok()),
        }?;
        walk_rest(&definition, np)
    }

    fn components_pointer(&self, pointer: &str) -> Option<Value> {
        let components = self.tree.get("components")?;
        JsonPointer::parse(pointer).ok()?.resolve(components).cloned()
    }

    fn remember(&mut self, expr: &str, value: Option<&Value>) {
        if let Some(v) = value {
            if v.as_str() != Some(expr) {
                self.memo.insert(expr.to_string(), v.clone());
            }
        }
    }
}

pub(crate) fn is_expression(s: &str) -> bool {
    s.starts_with('$') || s.starts_with("#/components")
}

/// Renders a resolved value for text positions: strings unquoted, null empty.
pub(crate) fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn exchange<'c>(expr: &str, ctx: Option<&'c ExecutionContext>) -> Result<&'c HttpExchange, ResolveError> {
    ctx.and_then(|c| c.exchange.as_ref())
        .ok_or_else(|| ResolveError::missing(expr, "no HTTP exchange has happened yet"))
}

fn walk(root: &Value, np: &NamePath) -> Option<Value> {
    let first = step_into(root, &np.root)?;
    walk_rest(first, np)
}

fn walk_rest(start: &Value, np: &NamePath) -> Option<Value> {
    let mut cur = start;
    for seg in &np.rest {
        cur = step_into(cur, seg)?;
    }
    apply_pointer(cur, np.pointer.as_ref())
}

fn step_into<'v>(cur: &'v Value, seg: &str) -> Option<&'v Value> {
    match cur {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn apply_pointer(v: &Value, pointer: Option<&JsonPointer>) -> Option<Value> {
    match pointer {
        Some(p) => p.resolve(v).cloned(),
        None => Some(v.clone()),
    }
}

fn body_access(expr: &str, body: &Value, access: &BodyAccess) -> Result<Value, ResolveError> {
    let found = match access {
        BodyAccess::Whole => Some(body.clone()),
        BodyAccess::Pointer(p) => p.resolve(body).cloned(),
        BodyAccess::Path(suffix) => {
            let query = format!("${suffix}");
            match JsonPath::parse(&query) {
                Ok(path) => path.query(body).first().cloned(),
                Err(_) => dotted(body, suffix),
            }
        }
    };
    found.ok_or_else(|| ResolveError::missing(expr, "no such item in the body"))
}

/// Fallback for dotted paths JSONPath rejects, such as keys with `-` or spaces.
fn dotted(body: &Value, suffix: &str) -> Option<Value> {
    let mut cur = body;
    for seg in suffix.trim_start_matches('.').split('.') {
        cur = step_into(cur, seg)?;
    }
    Some(cur.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_core::{parse, ParseOptions};
    use serde_json::json;

    fn document() -> Arc<ArazzoDocument> {
        let tree = json!({
            "arazzo": "1.0.1",
            "info": {"title": "t", "version": "1"},
            "sourceDescriptions": [{"name": "petstore", "url": "https://pets.example/openapi.json"}],
            "workflows": [{
                "workflowId": "adopt",
                "steps": [{"stepId": "find", "operationId": "findPets", "outputs": {"id": "$response.body#/0/id"}}]
            }],
            "components": {"parameters": {
                "page": {"name": "page", "in": "query", "value": 2},
                "echo": {"name": "echo", "in": "query", "value": "$components.parameters.echo"}
            }}
        });
        let out = parse(&tree, None, &ParseOptions::default());
        Arc::new(out.document.unwrap())
    }

    fn ctx_with_response() -> ExecutionContext {
        let mut ctx = ExecutionContext::new("adopt", json!({"user": {"name": "ada"}}));
        let mut ex = HttpExchange {
            status: 201,
            url: "https://pets.example/pets".into(),
            method: "POST".into(),
            response_body: Some(json!({"items": [{"id": 7, "tag-name": "cat"}]})),
            ..Default::default()
        };
        ex.response_headers.insert("Location".into(), "/pets/7".into());
        ctx.exchange = Some(ex);
        ctx
    }

    #[test]
    fn resolves_inputs_and_missing_is_none() {
        let mut r = Resolver::new(document());
        let ctx = ctx_with_response();
        assert_eq!(r.resolve("$inputs.user.name", Some(&ctx)).unwrap(), Some(json!("ada")));
        assert_eq!(r.resolve("$inputs.user.age", Some(&ctx)).unwrap(), None);
    }

    #[test]
    fn resolves_response_scopes() {
        let mut r = Resolver::new(document());
        let ctx = ctx_with_response();
        assert_eq!(r.resolve("$statusCode", Some(&ctx)).unwrap(), Some(json!(201)));
        assert_eq!(
            r.resolve("$response.header.location", Some(&ctx)).unwrap(),
            Some(json!("/pets/7"))
        );
        assert_eq!(
            r.resolve("$response.body#/items/0/id", Some(&ctx)).unwrap(),
            Some(json!(7))
        );
        assert_eq!(
            r.resolve("$response.body.items[0].id", Some(&ctx)).unwrap(),
            Some(json!(7))
        );
        assert_eq!(
            r.resolve("$response.body.items.0.tag-name", Some(&ctx)).unwrap(),
            Some(json!("cat"))
        );
    }

    #[test]
    fn missing_header_is_fatal() {
        let mut r = Resolver::new(document());
        let ctx = ctx_with_response();
        let err = r.resolve("$response.header.X-Missing", Some(&ctx)).unwrap_err();
        assert!(matches!(err, ResolveError::Missing { .. }));
        assert!(r.resolve("$request.query.page", Some(&ctx)).is_err());
    }

    #[test]
    fn missing_body_item_is_fatal() {
        let mut r = Resolver::new(document());
        let ctx = ctx_with_response();
        for expr in [
            "$response.body#/tokne",
            "$response.body.items[3].id",
            "$response.body.items.0.tag-color",
        ] {
            let err = r.resolve(expr, Some(&ctx)).unwrap_err();
            assert!(matches!(err, ResolveError::Missing { expr: ref e, .. } if e == expr), "{expr}");
        }
        assert!(r
            .resolve_value(&json!("$response.body#/tokne"), Some(&ctx))
            .is_err());
    }

    #[test]
    fn static_lookups_are_memoized() {
        let mut r = Resolver::new(document());
        assert_eq!(r.resolve("$components.parameters.page", None).unwrap(), Some(json!(2)));
        assert_eq!(r.memo.get("$components.parameters.page"), Some(&json!(2)));
        assert_eq!(r.resolve("$components.parameters.page", None).unwrap(), Some(json!(2)));
        assert_eq!(r.memo.len(), 1);

        let echo = "$components.parameters.echo";
        assert_eq!(r.resolve(echo, None).unwrap(), Some(json!(echo)));
        assert!(!r.memo.contains_key(echo));
    }

    #[test]
    fn unknown_prefix_passes_through() {
        let mut r = Resolver::new(document());
        assert_eq!(r.resolve("$custom.thing", None).unwrap(), Some(json!("$custom.thing")));
        assert_eq!(r.resolve("plain", None).unwrap(), Some(json!("plain")));
    }

    #[test]
    fn static_scopes_resolve_against_document() {
        let mut r = Resolver::new(document());
        assert_eq!(
            r.resolve("$sourceDescriptions.petstore.url", None).unwrap(),
            Some(json!("https://pets.example/openapi.json"))
        );
        assert_eq!(r.resolve("$components.parameters.page", None).unwrap(), Some(json!(2)));
        assert_eq!(
            r.resolve("#/components/parameters/page/name", None).unwrap(),
            Some(json!("page"))
        );
        assert_eq!(
            r.resolve("$steps.find.operationId", None).unwrap(),
            Some(json!("findPets"))
        );
    }

    #[test]
    fn step_outputs_come_from_published_references() {
        let mut r = Resolver::new(document());
        assert_eq!(r.resolve("$steps.find.outputs.id", None).unwrap(), None);
        r.publish("$steps.find.outputs.id", json!({"n": 7}));
        assert_eq!(r.resolve("$steps.find.outputs.id.n", None).unwrap(), Some(json!(7)));
        assert_eq!(r.resolve("$steps.find.outputs.id#/n", None).unwrap(), Some(json!(7)));
    }

    #[test]
    fn templates_and_values() {
        let mut r = Resolver::new(document());
        let ctx = ctx_with_response();
        assert_eq!(
            r.resolve_template("Pet {$response.body#/items/0/id} for {$inputs.user.name}", Some(&ctx))
                .unwrap(),
            "Pet 7 for ada"
        );
        let v = r
            .resolve_value(&json!({"who": "$inputs.user.name", "n": ["{$statusCode}", 1]}), Some(&ctx))
            .unwrap();
        assert_eq!(v, json!({"who": "ada", "n": ["201", 1]}));
        assert!(matches!(
            r.resolve_template("oops {$inputs.user", Some(&ctx)),
            Err(ResolveError::Template { .. })
        ));
    }
}
