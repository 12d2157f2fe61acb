use crate::types::{AnyValue, Extensions};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PayloadReplacement {
    /// JSON pointer (`/a/b`, `#/a/b`), JSONPath (`$.a.b`), or XPath (`/root/a`) into the payload.
    pub target: String,
    pub value: AnyValue,

    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RequestBody {
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<AnyValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<PayloadReplacement>,

    #[serde(flatten)]
    pub extensions: Extensions,
}
