use crate::types::Extensions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDescriptionType {
    #[default]
    Openapi,
    Arazzo,
}

impl SourceDescriptionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "openapi" => Some(Self::Openapi),
            "arazzo" => Some(Self::Arazzo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SourceDescription {
    pub name: String,
    pub url: String,

    #[serde(rename = "type")]
    pub source_type: SourceDescriptionType,

    #[serde(flatten)]
    pub extensions: Extensions,
}
