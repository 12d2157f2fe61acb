use arazzo_core::resolve_parameter;
use arazzo_core::types::{Components, Parameter, Step, StepTarget, Workflow};
use serde_json::{Map, Value};
use tracing::Instrument;

use super::actions::{
    failure_step_action, select_failure_action, select_success_action, success_step_action, StepAction,
};
use super::context::{decode_body, ExecutionContext};
use super::criteria::evaluate_all;
use super::events::{Event, EventSink};
use super::http::HttpClient;
use super::request::build_request;
use super::resolver::Resolver;
use super::result::ExecutionErrorKind;
use super::types::ExecutorConfig;
use crate::openapi::{find_operation_by_id, find_operation_by_path};
use crate::sources::SourceRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub success: bool,
    pub action: StepAction,
    /// Response status of the step's HTTP call; `None` for delegated workflows.
    pub status: Option<u16>,
}

/// Runs single operation steps and decides what follows them.
pub struct StepExecutor<'a> {
    pub registry: &'a SourceRegistry,
    pub http: &'a dyn HttpClient,
    pub config: &'a ExecutorConfig,
    pub events: &'a dyn EventSink,
}

impl StepExecutor<'_> {
    /// Issues the step's operation, then evaluates its criteria and actions.
    pub async fn execute(
        &self,
        step: &Step,
        workflow: &Workflow,
        resolver: &mut Resolver,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, ExecutionErrorKind> {
        let docs = self.registry.openapi_docs();
        let op = match step.target() {
            Some(StepTarget::OperationId(id)) => find_operation_by_id(docs, id)?,
            Some(StepTarget::OperationPath(path)) => find_operation_by_path(docs, path)?,
            Some(StepTarget::Workflow(_)) | None => return Err(ExecutionErrorKind::NoTarget),
        };
        let location = self
            .registry
            .openapi_doc(&op.source_name)
            .map(|d| d.location.as_str())
            .unwrap_or_default();

        let components = self.registry.document().components.as_ref();
        let parameters = effective_parameters(step, workflow, components)?;
        let built = build_request(
            &op,
            location,
            &parameters,
            step.request_body.as_ref(),
            resolver,
            ctx,
            self.config,
        )?;

        let span = tracing::debug_span!("http", method = %op.method, url = %built.parts.url);
        let response = self
            .http
            .send(built.parts, self.config.request_timeout, self.config.max_response_bytes)
            .instrument(span)
            .await?;
        tracing::debug!(status = response.status, "response received");

        let mut exchange = built.exchange;
        exchange.status = response.status;
        exchange.response_body = decode_body(&response.body);
        exchange.response_headers = response.headers;
        ctx.exchange = Some(exchange);

        self.conclude(step, workflow, resolver, ctx, Some(response.status)).await
    }

    /// Evaluates success criteria, picks the follow-up action, and publishes outputs on success.
    pub async fn conclude(
        &self,
        step: &Step,
        workflow: &Workflow,
        resolver: &mut Resolver,
        ctx: &mut ExecutionContext,
        status: Option<u16>,
    ) -> Result<StepOutcome, ExecutionErrorKind> {
        let components = self.registry.document().components.as_ref();
        let success = evaluate_all(&step.success_criteria, resolver, ctx)?;

        if !success {
            self.events
                .emit(Event::StepFailed {
                    run_id: ctx.run_id,
                    workflow_id: workflow.workflow_id.clone(),
                    step_id: step.step_id.clone(),
                    status,
                })
                .await;
            let action = select_failure_action(step, workflow, components, resolver, ctx)?
                .ok_or(ExecutionErrorKind::NoMatchingFailureAction { status })?;
            tracing::debug!(action = %action.name, "failure action selected");
            return Ok(StepOutcome {
                success,
                action: failure_step_action(&action, ctx, self.config.max_retry_delay),
                status,
            });
        }

        let action = select_success_action(step, workflow, components, resolver, ctx)?;
        publish_step_outputs(step, resolver, ctx)?;
        self.events
            .emit(Event::StepSucceeded {
                run_id: ctx.run_id,
                workflow_id: workflow.workflow_id.clone(),
                step_id: step.step_id.clone(),
            })
            .await;
        Ok(StepOutcome {
            success,
            action: success_step_action(action.as_ref()),
            status,
        })
    }
}

fn publish_step_outputs(
    step: &Step,
    resolver: &mut Resolver,
    ctx: &mut ExecutionContext,
) -> Result<(), ExecutionErrorKind> {
    let mut outputs = Map::new();
    for (name, expr) in &step.outputs {
        let value = resolver.resolve_value(&Value::String(expr.clone()), Some(ctx))?;
        resolver.publish(format!("$steps.{}.outputs.{name}", step.step_id), value.clone());
        outputs.insert(name.clone(), value);
    }
    ctx.step_outputs.insert(step.step_id.clone(), outputs);
    Ok(())
}

/// Workflow-level parameters followed by the step's own; a step parameter replaces a
/// workflow parameter with the same name and location.
pub(crate) fn effective_parameters(
    step: &Step,
    workflow: &Workflow,
    components: Option<&Components>,
) -> Result<Vec<Parameter>, ExecutionErrorKind> {
    let own = step
        .parameters
        .iter()
        .map(|p| resolve_parameter(components, p))
        .collect::<Result<Vec<_>, _>>()?;
    let mut merged = Vec::with_capacity(workflow.parameters.len() + own.len());
    for item in &workflow.parameters {
        let p = resolve_parameter(components, item)?;
        let shadowed = own
            .iter()
            .any(|o| o.name == p.name && (o.r#in.is_none() || p.r#in.is_none() || o.r#in == p.r#in));
        if !shadowed {
            merged.push(p);
        }
    }
    merged.extend(own);
    Ok(merged)
}
