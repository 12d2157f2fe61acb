use std::collections::BTreeMap;

use crate::types::{
    Criterion, Extensions, FailureActionOrReusable, ParameterOrReusable, RequestBody,
    RuntimeExpression, SuccessActionOrReusable,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "stepId")]
    pub step_id: String,

    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(rename = "operationPath", skip_serializing_if = "Option::is_none")]
    pub operation_path: Option<String>,

    #[serde(rename = "workflowId", skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrReusable>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    #[serde(rename = "successCriteria", skip_serializing_if = "Vec::is_empty")]
    pub success_criteria: Vec<Criterion>,

    #[serde(rename = "onSuccess", skip_serializing_if = "Vec::is_empty")]
    pub on_success: Vec<SuccessActionOrReusable>,

    #[serde(rename = "onFailure", skip_serializing_if = "Vec::is_empty")]
    pub on_failure: Vec<FailureActionOrReusable>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, RuntimeExpression>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

/// What a step executes. Only one is meaningful per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTarget<'a> {
    OperationId(&'a str),
    OperationPath(&'a str),
    Workflow(&'a str),
}

impl Step {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            description: None,
            step_id: step_id.into(),
            operation_id: None,
            operation_path: None,
            workflow_id: None,
            parameters: Vec::new(),
            request_body: None,
            success_criteria: Vec::new(),
            on_success: Vec::new(),
            on_failure: Vec::new(),
            outputs: BTreeMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Picks the execution target: `operationId`, then `operationPath`, then `workflowId`.
    pub fn target(&self) -> Option<StepTarget<'_>> {
        if let Some(id) = &self.operation_id {
            return Some(StepTarget::OperationId(id));
        }
        if let Some(path) = &self.operation_path {
            return Some(StepTarget::OperationPath(path));
        }
        self.workflow_id.as_deref().map(StepTarget::Workflow)
    }
}
