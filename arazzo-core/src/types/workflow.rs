use std::collections::BTreeMap;

use crate::types::{
    Extensions, FailureActionOrReusable, JsonSchema, ParameterOrReusable, RuntimeExpression, Step,
    SuccessActionOrReusable,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Workflow {
    #[serde(rename = "workflowId")]
    pub workflow_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<JsonSchema>,

    #[serde(rename = "dependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    pub steps: Vec<Step>,

    #[serde(rename = "successActions", skip_serializing_if = "Vec::is_empty")]
    pub success_actions: Vec<SuccessActionOrReusable>,

    #[serde(rename = "failureActions", skip_serializing_if = "Vec::is_empty")]
    pub failure_actions: Vec<FailureActionOrReusable>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, RuntimeExpression>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrReusable>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Workflow {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.step_id == step_id)
    }
}
