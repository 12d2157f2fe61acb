use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        workflow_id: String,
    },
    RunFinished {
        run_id: Uuid,
        workflow_id: String,
        status: RunStatus,
    },
    StepStarted {
        run_id: Uuid,
        workflow_id: String,
        step_id: String,
    },
    StepSucceeded {
        run_id: Uuid,
        workflow_id: String,
        step_id: String,
    },
    StepFailed {
        run_id: Uuid,
        workflow_id: String,
        step_id: String,
        status: Option<u16>,
    },
    StepRetryScheduled {
        run_id: Uuid,
        workflow_id: String,
        step_id: String,
        attempt: u32,
        delay: Duration,
    },
    Goto {
        run_id: Uuid,
        workflow_id: String,
        from_step: String,
        target: String,
    },
    WorkflowEnded {
        run_id: Uuid,
        workflow_id: String,
        step_id: String,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

#[async_trait]
impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    async fn emit(&self, event: Event) {
        self.as_ref().emit(event).await;
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}

/// Forwards events to `tracing` under the `arazzo::events` target.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        match event {
            Event::RunStarted { run_id, workflow_id } => {
                tracing::info!(target: "arazzo::events", %run_id, %workflow_id, "run started");
            }
            Event::RunFinished { run_id, workflow_id, status } => {
                tracing::info!(target: "arazzo::events", %run_id, %workflow_id, status = status.as_str(), "run finished");
            }
            Event::StepStarted { run_id, workflow_id, step_id } => {
                tracing::debug!(target: "arazzo::events", %run_id, %workflow_id, %step_id, "step started");
            }
            Event::StepSucceeded { run_id, workflow_id, step_id } => {
                tracing::info!(target: "arazzo::events", %run_id, %workflow_id, %step_id, "step succeeded");
            }
            Event::StepFailed { run_id, workflow_id, step_id, status } => {
                tracing::warn!(target: "arazzo::events", %run_id, %workflow_id, %step_id, ?status, "step failed");
            }
            Event::StepRetryScheduled { run_id, workflow_id, step_id, attempt, delay } => {
                tracing::info!(
                    target: "arazzo::events",
                    %run_id,
                    %workflow_id,
                    %step_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "step retry scheduled"
                );
            }
            Event::Goto { run_id, workflow_id, from_step, target } => {
                tracing::info!(target: "arazzo::events", %run_id, %workflow_id, %from_step, goto = %target, "goto");
            }
            Event::WorkflowEnded { run_id, workflow_id, step_id } => {
                tracing::info!(target: "arazzo::events", %run_id, %workflow_id, %step_id, "workflow ended by action");
            }
        }
    }
}
