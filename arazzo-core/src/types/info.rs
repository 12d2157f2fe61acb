use crate::types::Extensions;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Info {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,

    #[serde(flatten)]
    pub extensions: Extensions,
}
