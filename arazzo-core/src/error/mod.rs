use thiserror::Error;

use crate::diagnostics::Diagnostics;

#[derive(Debug, Error)]
pub enum ArazzoError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Invalid(#[from] InvalidDocument),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to auto-detect document format (neither valid JSON nor valid YAML)")]
    UnknownFormat,
}

/// Raised by callers that treat `valid == false` as fatal.
#[derive(Debug, Error)]
#[error("arazzo document failed validation ({} errors)", .diagnostics.error_count())]
pub struct InvalidDocument {
    pub diagnostics: Diagnostics,
}
