use serde_json::{Map, Value};

use crate::diagnostics::{join_path, Diagnostics};
use crate::parser::ParseOptions;
use crate::types::Extensions;

const RESERVED_PREFIXES: [&str; 3] = ["x-oai-", "x-oas-", "x-arazzo-"];

pub(crate) struct ParseContext<'o> {
    pub(crate) diagnostics: Diagnostics,
    options: &'o ParseOptions,
}

impl<'o> ParseContext<'o> {
    pub(crate) fn new(options: &'o ParseOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    /// Opens `value` (found at `location.key`) as an object with the given allow-list.
    /// A wrong kind only invalidates the document when the key is `required`.
    pub(crate) fn object<'a>(
        &mut self,
        value: &'a Value,
        location: &str,
        key: &str,
        allowed: &'static [&'static str],
        required: bool,
    ) -> Option<Node<'a>> {
        match value {
            Value::Object(map) => Some(Node {
                map,
                location: join_path(location, key),
                allowed,
            }),
            _ => {
                self.diagnostics.invalid_type(location, key, "object", required);
                None
            }
        }
    }
}

/// One JSON object of the document tree plus the keys its entity kind accepts.
pub(crate) struct Node<'a> {
    map: &'a Map<String, Value>,
    pub(crate) location: String,
    allowed: &'static [&'static str],
}

impl<'a> Node<'a> {
    pub(crate) fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub(crate) fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub(crate) fn required(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<&'a Value> {
        let v = self.map.get(key);
        if v.is_none() {
            cx.diagnostics.missing(&self.location, key);
        }
        v
    }

    pub(crate) fn required_str(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<String> {
        match self.required(cx, key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "string", true);
                None
            }
        }
    }

    pub(crate) fn optional_str(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<String> {
        match self.map.get(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "string", false);
                None
            }
        }
    }

    /// Like [`Node::required_str`], but YAML authors often write `version: 1.0` unquoted.
    pub(crate) fn version_str(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<String> {
        match self.required(cx, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "string", true);
                None
            }
        }
    }

    pub(crate) fn optional_f64(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<f64> {
        let v = self.map.get(key)?;
        let n = v.as_f64();
        if n.is_none() {
            cx.diagnostics.invalid_type(&self.location, key, "number", false);
        }
        n
    }

    pub(crate) fn optional_u32(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<u32> {
        let v = self.map.get(key)?;
        let n = v.as_u64().and_then(|n| u32::try_from(n).ok());
        if n.is_none() {
            cx.diagnostics.invalid_type(&self.location, key, "integer", false);
        }
        n
    }

    pub(crate) fn required_array(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<&'a Vec<Value>> {
        match self.required(cx, key)? {
            Value::Array(items) => Some(items),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "array", true);
                None
            }
        }
    }

    pub(crate) fn optional_array(&self, cx: &mut ParseContext<'_>, key: &str) -> Option<&'a Vec<Value>> {
        match self.map.get(key)? {
            Value::Array(items) => Some(items),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "array", false);
                None
            }
        }
    }

    pub(crate) fn optional_object(
        &self,
        cx: &mut ParseContext<'_>,
        key: &str,
    ) -> Option<&'a Map<String, Value>> {
        match self.map.get(key)? {
            Value::Object(map) => Some(map),
            _ => {
                cx.diagnostics.invalid_type(&self.location, key, "object", false);
                None
            }
        }
    }

    pub(crate) fn child(&self, key: &str) -> String {
        join_path(&self.location, key)
    }

    /// Flags keys outside the allow-list and collects specification extensions.
    pub(crate) fn finish(self, cx: &mut ParseContext<'_>) -> Extensions {
        let mut extensions = Extensions::new();
        for (key, value) in self.map {
            if self.allowed.contains(&key.as_str()) {
                continue;
            }
            if key.starts_with("x-") {
                if check_reserved(cx, &self.location, key) {
                    extensions.insert(key.clone(), value.clone());
                }
                continue;
            }
            if key == "extensions" {
                continue;
            }
            cx.diagnostics.extra(&self.location, key);
        }

        if extensions.is_empty() {
            if let Some(nested) = self.map.get("extensions") {
                let location = self.child("extensions");
                match nested {
                    Value::Object(map) => {
                        for (key, value) in map {
                            if !key.starts_with("x-") {
                                cx.diagnostics.extra(&location, key);
                            } else if check_reserved(cx, &location, key) {
                                extensions.insert(key.clone(), value.clone());
                            }
                        }
                    }
                    _ => cx.diagnostics.invalid_type(&self.location, "extensions", "object", false),
                }
            }
        }
        extensions
    }
}

/// Returns whether the extension key may be kept.
fn check_reserved(cx: &mut ParseContext<'_>, location: &str, key: &str) -> bool {
    if cx.options.permit_reserved_author {
        return true;
    }
    if RESERVED_PREFIXES.iter().any(|p| key.starts_with(p)) {
        cx.diagnostics.reserved(location, key);
        return false;
    }
    true
}

pub(crate) fn item_key(idx: usize) -> String {
    format!("[{idx}]")
}
