use std::time::Duration;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::criteria::CriterionError;
use super::http::HttpError;
use super::request::RequestError;
use super::resolver::ResolveError;
use crate::openapi::OperationLookupError;
use crate::sources::SourceError;
use arazzo_core::ReferenceError;

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub outputs: Map<String, Value>,
    /// Step executions in order, retries and goto revisits included.
    pub steps: Vec<StepRecord>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub workflow_id: String,
    pub step_id: String,
    pub attempt: u32,
    pub status: Option<u16>,
    pub success: bool,
}

/// What went wrong, independent of where.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionErrorKind {
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error("workflow `{0}` not found")]
    WorkflowNotFound(String),
    #[error("missing required input `{0}`")]
    MissingInput(String),
    #[error("step has no operationId, operationPath or workflowId")]
    NoTarget,
    #[error(transparent)]
    Operation(#[from] OperationLookupError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Criterion(#[from] CriterionError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("step failed (status {status:?}) and no failure action matched")]
    NoMatchingFailureAction { status: Option<u16> },
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("unknown goto target `{0}`")]
    UnknownGotoTarget(String),
    #[error("step execution budget of {0} exceeded")]
    StepBudgetExceeded(usize),
    #[error("workflow deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("workflow dependency cycle: {0}")]
    DependencyCycle(String),
}

/// A failed run, located at the workflow and (when known) step where it happened.
#[derive(Debug, thiserror::Error)]
#[error("workflow `{workflow_id}`{}: {kind}", step_suffix(.step_id))]
pub struct ExecutionError {
    pub workflow_id: String,
    pub step_id: Option<String>,
    #[source]
    pub kind: ExecutionErrorKind,
}

fn step_suffix(step_id: &Option<String>) -> String {
    step_id
        .as_deref()
        .map(|s| format!(" step `{s}`"))
        .unwrap_or_default()
}

impl ExecutionError {
    pub fn new(workflow_id: impl Into<String>, step_id: Option<&str>, kind: impl Into<ExecutionErrorKind>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            step_id: step_id.map(str::to_string),
            kind: kind.into(),
        }
    }
}
