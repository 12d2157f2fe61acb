use crate::types::{Criterion, Extensions, ReusableObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessActionType {
    End,
    Goto,
}

impl SuccessActionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "end" => Some(Self::End),
            "goto" => Some(Self::Goto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SuccessAction {
    pub name: String,

    #[serde(rename = "type")]
    pub action_type: SuccessActionType,

    #[serde(rename = "workflowId", skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(rename = "stepId", skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureActionType {
    End,
    Retry,
    Goto,
}

impl FailureActionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "end" => Some(Self::End),
            "retry" => Some(Self::Retry),
            "goto" => Some(Self::Goto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailureAction {
    pub name: String,

    #[serde(rename = "type")]
    pub action_type: FailureActionType,

    #[serde(rename = "workflowId", skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(rename = "stepId", skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,

    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<f64>,

    #[serde(rename = "retryLimit", skip_serializing_if = "Option::is_none")]
    pub retry_limit: Option<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Criterion>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum SuccessActionOrReusable {
    Action(SuccessAction),
    Reusable(ReusableObject),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FailureActionOrReusable {
    Action(FailureAction),
    Reusable(ReusableObject),
}
