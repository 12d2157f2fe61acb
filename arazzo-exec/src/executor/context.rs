use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Live state of one workflow invocation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub inputs: Value,
    /// Most recent request/response pair; `None` until the first call completes.
    pub exchange: Option<HttpExchange>,
    pub step_outputs: BTreeMap<String, Map<String, Value>>,
    pub outputs: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new(workflow_id: impl Into<String>, inputs: Value) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow_id: workflow_id.into(),
            inputs,
            exchange: None,
            step_outputs: BTreeMap::new(),
            outputs: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpExchange {
    pub method: String,
    pub url: String,
    pub request_headers: BTreeMap<String, String>,
    pub path_params: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
    pub request_body: Option<Value>,
    pub status: u16,
    pub response_headers: BTreeMap<String, String>,
    /// Parsed JSON when the body is JSON, otherwise the raw text.
    pub response_body: Option<Value>,
}

impl HttpExchange {
    pub fn request_header(&self, name: &str) -> Option<&str> {
        header_ci(&self.request_headers, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        header_ci(&self.response_headers, name)
    }
}

pub(crate) fn header_ci<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Decodes a body as JSON when possible, otherwise as text.
pub(crate) fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_slice::<Value>(bytes) {
        return Some(v);
    }
    Some(Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
