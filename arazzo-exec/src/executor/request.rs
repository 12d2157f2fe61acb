use std::collections::BTreeMap;

use arazzo_core::types::{Parameter, ParameterLocation, RequestBody};
use serde_json::{Map, Value};
use url::Url;

use super::context::{ExecutionContext, HttpExchange};
use super::http::HttpRequestParts;
use super::payload::{apply_replacements, PayloadError};
use super::resolver::{stringify, ResolveError, Resolver};
use super::types::ExecutorConfig;
use crate::openapi::ResolvedOperation;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("invalid request url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("path parameter `{0}` has no value")]
    MissingPathParameter(String),
    #[error("cannot encode request body: {0}")]
    Encode(String),
}

/// A request ready to send, plus the request half of the exchange it starts.
pub struct BuiltRequest {
    pub parts: HttpRequestParts,
    pub exchange: HttpExchange,
}

pub fn build_request(
    op: &ResolvedOperation,
    document_location: &str,
    parameters: &[Parameter],
    body: Option<&RequestBody>,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
    config: &ExecutorConfig,
) -> Result<BuiltRequest, RequestError> {
    let mut headers = BTreeMap::<String, String>::new();
    let mut query = Vec::<(String, String)>::new();
    let mut path_params = BTreeMap::<String, String>::new();
    let mut cookies = Vec::<String>::new();
    let mut body_fields = Map::new();

    for p in parameters {
        let location = p
            .r#in
            .or_else(|| op.parameter_location(&p.name))
            .unwrap_or(ParameterLocation::Query);
        let value = resolver.resolve_value(&p.value, Some(ctx))?;
        match location {
            ParameterLocation::Path => {
                path_params.insert(p.name.clone(), stringify(&value));
            }
            ParameterLocation::Query => query.push((p.name.clone(), stringify(&value))),
            ParameterLocation::Header => {
                headers.insert(p.name.clone(), stringify(&value));
            }
            ParameterLocation::Cookie => cookies.push(format!("{}={}", p.name, stringify(&value))),
            ParameterLocation::Body => {
                body_fields.insert(p.name.clone(), value);
            }
        }
    }
    if !cookies.is_empty() {
        headers.insert("Cookie".to_string(), cookies.join("; "));
    }

    let url = build_url(op, document_location, &path_params, &query, config)?;

    let content_type = body
        .and_then(|b| b.content_type.clone())
        .unwrap_or_else(|| config.default_content_type.clone());
    let payload = build_payload(body, body_fields, resolver, ctx)?;
    let bytes = match &payload {
        Some(p) => {
            headers
                .entry("Content-Type".to_string())
                .or_insert_with(|| content_type.clone());
            encode_body(p, &content_type)?
        }
        None => Vec::new(),
    };

    let exchange = HttpExchange {
        method: op.method.clone(),
        url: url.to_string(),
        request_headers: headers.clone(),
        path_params,
        query_params: query.iter().cloned().collect(),
        request_body: payload,
        ..Default::default()
    };
    Ok(BuiltRequest {
        parts: HttpRequestParts {
            method: op.method.clone(),
            url,
            headers,
            body: bytes,
        },
        exchange,
    })
}

fn build_payload(
    body: Option<&RequestBody>,
    body_fields: Map<String, Value>,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<Option<Value>, RequestError> {
    let mut payload = match body.and_then(|b| b.payload.as_ref()) {
        Some(p) => Some(resolver.resolve_value(p, Some(ctx))?),
        None => None,
    };

    if let Some(b) = body {
        if !b.replacements.is_empty() {
            let mut resolved = Vec::with_capacity(b.replacements.len());
            for r in &b.replacements {
                resolved.push((r.target.clone(), resolver.resolve_value(&r.value, Some(ctx))?));
            }
            payload = Some(apply_replacements(payload.unwrap_or(Value::Null), &resolved)?);
        }
    }

    if body_fields.is_empty() {
        return Ok(payload);
    }
    let mut merged = match payload {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            return Err(RequestError::Encode(format!(
                "body parameters need an object payload, found {other}"
            )))
        }
    };
    merged.extend(body_fields);
    Ok(Some(Value::Object(merged)))
}

fn encode_body(payload: &Value, content_type: &str) -> Result<Vec<u8>, RequestError> {
    let mime = content_type.to_ascii_lowercase();
    match payload {
        Value::String(s) if !mime.contains("json") => Ok(s.as_bytes().to_vec()),
        Value::Object(map) if mime.contains("x-www-form-urlencoded") => {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in map {
                form.append_pair(k, &stringify(v));
            }
            Ok(form.finish().into_bytes())
        }
        _ => serde_json::to_vec(payload).map_err(|e| RequestError::Encode(e.to_string())),
    }
}

/// Joins the server url and the operation path, substituting path parameters.
///
/// Relative server urls are joined onto the interface document's url, or onto
/// `http://localhost:<fallback port>` when the document was read from a file.
pub(crate) fn build_url(
    op: &ResolvedOperation,
    document_location: &str,
    path_params: &BTreeMap<String, String>,
    query: &[(String, String)],
    config: &ExecutorConfig,
) -> Result<Url, RequestError> {
    let server = op.base_url.as_deref().unwrap_or("/");
    let invalid = |url: &str, reason: String| RequestError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let mut base = match Url::parse(server) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let anchor = match Url::parse(document_location) {
                Ok(doc_url) if doc_url.scheme().starts_with("http") => doc_url,
                _ => Url::parse(&format!("http://localhost:{}/", config.localhost_fallback_port))
                    .map_err(|e| invalid(server, e.to_string()))?,
            };
            anchor.join(server).map_err(|e| invalid(server, e.to_string()))?
        }
        Err(e) => return Err(invalid(server, e.to_string())),
    };
    if base.host_str() == Some("localhost") && base.port().is_none() {
        base.set_port(Some(config.localhost_fallback_port))
            .map_err(|_| invalid(server, "cannot set port".to_string()))?;
    }

    let mut path = op.path.clone();
    for (k, v) in path_params {
        path = path.replace(&format!("{{{k}}}"), &urlencoding::encode(v));
    }
    if let Some(start) = path.find('{') {
        let name = path[start + 1..].split('}').next().unwrap_or_default();
        return Err(RequestError::MissingPathParameter(name.to_string()));
    }

    let joined = format!("{}/{}", base.path().trim_end_matches('/'), path.trim_start_matches('/'));
    base.set_path(&joined);
    if !query.is_empty() {
        let mut qp = base.query_pairs_mut();
        for (k, v) in query {
            qp.append_pair(k, v);
        }
    }
    Ok(base)
}
