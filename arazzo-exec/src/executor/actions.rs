use std::time::{Duration, SystemTime};

use arazzo_core::types::{
    Components, FailureAction, FailureActionType, Step, SuccessAction, SuccessActionType, Workflow,
};
use arazzo_core::{resolve_failure_action, resolve_success_action};

use super::context::ExecutionContext;
use super::criteria::evaluate_all;
use super::resolver::Resolver;
use super::result::ExecutionErrorKind;
use crate::retry::retry_delay;

/// What the orchestrator does after a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Next,
    End,
    GotoStep(String),
    GotoWorkflow(String),
    Retry { delay: Duration, limit: u32 },
}

/// First success action whose criteria hold; the step's own list shadows the workflow's.
pub(crate) fn select_success_action(
    step: &Step,
    workflow: &Workflow,
    components: Option<&Components>,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<Option<SuccessAction>, ExecutionErrorKind> {
    let candidates = if step.on_success.is_empty() {
        &workflow.success_actions
    } else {
        &step.on_success
    };
    for item in candidates {
        let action = resolve_success_action(components, item)?;
        if evaluate_all(&action.criteria, resolver, ctx)? {
            return Ok(Some(action));
        }
    }
    Ok(None)
}

pub(crate) fn select_failure_action(
    step: &Step,
    workflow: &Workflow,
    components: Option<&Components>,
    resolver: &mut Resolver,
    ctx: &ExecutionContext,
) -> Result<Option<FailureAction>, ExecutionErrorKind> {
    let candidates = if step.on_failure.is_empty() {
        &workflow.failure_actions
    } else {
        &step.on_failure
    };
    for item in candidates {
        let action = resolve_failure_action(components, item)?;
        if evaluate_all(&action.criteria, resolver, ctx)? {
            return Ok(Some(action));
        }
    }
    Ok(None)
}

pub(crate) fn success_step_action(action: Option<&SuccessAction>) -> StepAction {
    let Some(action) = action else {
        return StepAction::Next;
    };
    match action.action_type {
        SuccessActionType::End => StepAction::End,
        SuccessActionType::Goto => goto(action.step_id.as_deref(), action.workflow_id.as_deref()),
    }
}

pub(crate) fn failure_step_action(
    action: &FailureAction,
    ctx: &ExecutionContext,
    max_retry_delay: Duration,
) -> StepAction {
    match action.action_type {
        FailureActionType::End => StepAction::End,
        FailureActionType::Goto => goto(action.step_id.as_deref(), action.workflow_id.as_deref()),
        FailureActionType::Retry => {
            let headers = ctx.exchange.as_ref().map(|e| &e.response_headers);
            StepAction::Retry {
                delay: retry_delay(action.retry_after_seconds, headers, max_retry_delay, SystemTime::now()),
                limit: action.retry_limit.unwrap_or(1),
            }
        }
    }
}

fn goto(step_id: Option<&str>, workflow_id: Option<&str>) -> StepAction {
    match (step_id, workflow_id) {
        (Some(s), _) => StepAction::GotoStep(s.to_string()),
        (None, Some(w)) => StepAction::GotoWorkflow(w.to_string()),
        // The validator rejects goto actions without a target.
        (None, None) => StepAction::End,
    }
}
