use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use arazzo_core::expressions::{parse_runtime_expr, RuntimeExpr};
use arazzo_core::types::{ArazzoDocument, Step, StepTarget, Workflow};
use arazzo_core::{parse_component_ref, ComponentPool, ParseOptions, ReferenceError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use super::actions::StepAction;
use super::context::ExecutionContext;
use super::events::{Event, EventSink, NoOpEventSink, RunStatus};
use super::http::HttpClient;
use super::resolver::{is_expression, Resolver};
use super::result::{ExecutionError, ExecutionErrorKind, RunReport, StepRecord};
use super::step_runner::{effective_parameters, StepExecutor, StepOutcome};
use super::types::ExecutorConfig;
use crate::sources::{SourceLoader, SourceOverrides, SourceRegistry};

/// Drives workflows step by step: one HTTP call at a time, no spawning.
pub struct Executor {
    http: Arc<dyn HttpClient>,
    config: ExecutorConfig,
    events: Arc<dyn EventSink>,
    overrides: SourceOverrides,
    parse_options: ParseOptions,
}

/// Identifies a workflow across documents: the document's address plus the workflow id.
type WorkflowKey = (usize, String);

/// Bookkeeping shared by every workflow invocation of one run.
struct RunState {
    run_id: Uuid,
    executions: usize,
    records: Vec<StepRecord>,
    finished_dependencies: HashMap<WorkflowKey, Map<String, Value>>,
    dependency_stack: Vec<WorkflowKey>,
}

/// How a workflow's step loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Completed,
    Ended,
}

impl Executor {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            config: ExecutorConfig::default(),
            events: Arc::new(NoOpEventSink),
            overrides: SourceOverrides::default(),
            parse_options: ParseOptions::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_source_overrides(mut self, overrides: SourceOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Loads the document's source descriptions into a registry.
    pub async fn load_sources(
        &self,
        document: Arc<ArazzoDocument>,
    ) -> Result<SourceRegistry, crate::sources::SourceError> {
        let loader = SourceLoader {
            client: Arc::clone(&self.http),
            overrides: self.overrides.clone(),
            parse_options: self.parse_options.clone(),
            timeout: self.config.request_timeout,
            max_bytes: self.config.max_response_bytes,
        };
        SourceRegistry::load(document, &loader).await
    }

    /// Runs `workflow_id` and returns its outputs.
    pub async fn execute(
        &self,
        document: Arc<ArazzoDocument>,
        workflow_id: &str,
        inputs: Value,
    ) -> Result<Map<String, Value>, ExecutionError> {
        self.run(document, workflow_id, inputs).await.map(|r| r.outputs)
    }

    /// Loads sources, then runs `workflow_id`.
    pub async fn run(
        &self,
        document: Arc<ArazzoDocument>,
        workflow_id: &str,
        inputs: Value,
    ) -> Result<RunReport, ExecutionError> {
        let registry = self
            .load_sources(document)
            .await
            .map_err(|e| ExecutionError::new(workflow_id, None, e))?;
        self.run_with_sources(Arc::new(registry), workflow_id, inputs).await
    }

    /// Runs `workflow_id` against an already loaded registry.
    pub async fn run_with_sources(
        &self,
        registry: Arc<SourceRegistry>,
        workflow_id: &str,
        inputs: Value,
    ) -> Result<RunReport, ExecutionError> {
        let started = Instant::now();
        let mut state = RunState {
            run_id: Uuid::new_v4(),
            executions: 0,
            records: Vec::new(),
            finished_dependencies: HashMap::new(),
            dependency_stack: Vec::new(),
        };
        let run_id = state.run_id;
        self.events
            .emit(Event::RunStarted {
                run_id,
                workflow_id: workflow_id.to_string(),
            })
            .await;

        let span = tracing::info_span!("run", %run_id, workflow_id);
        let work = self
            .run_workflow(registry, workflow_id.to_string(), inputs, &mut state)
            .instrument(span);
        let result = match self.config.workflow_deadline {
            Some(deadline) => tokio::time::timeout(deadline, work).await.unwrap_or_else(|_| {
                Err(ExecutionError::new(
                    workflow_id,
                    None,
                    ExecutionErrorKind::DeadlineExceeded(deadline),
                ))
            }),
            None => work.await,
        };

        let status = match &result {
            Ok(_) => RunStatus::Succeeded,
            Err(e) => {
                tracing::warn!(%run_id, error = %e, "run failed");
                RunStatus::Failed
            }
        };
        self.events
            .emit(Event::RunFinished {
                run_id,
                workflow_id: workflow_id.to_string(),
                status,
            })
            .await;

        Ok(RunReport {
            run_id,
            workflow_id: workflow_id.to_string(),
            outputs: result?,
            steps: state.records,
            elapsed: started.elapsed(),
        })
    }

    fn run_workflow<'a>(
        &'a self,
        registry: Arc<SourceRegistry>,
        workflow_id: String,
        inputs: Value,
        state: &'a mut RunState,
    ) -> BoxFuture<'a, Result<Map<String, Value>, ExecutionError>> {
        let span = tracing::info_span!("workflow", %workflow_id);
        async move {
            let fail = |kind: ExecutionErrorKind| ExecutionError::new(workflow_id.clone(), None, kind);
            let document = Arc::clone(registry.document());
            let workflow = document
                .workflow(&workflow_id)
                .ok_or_else(|| fail(ExecutionErrorKind::WorkflowNotFound(workflow_id.clone())))?;

            let inputs = apply_input_schema(&document, workflow, inputs).map_err(fail)?;
            let mut resolver = Resolver::new(Arc::clone(&document));
            let mut ctx = ExecutionContext::new(workflow_id.clone(), inputs);
            ctx.run_id = state.run_id;

            for dependency in &workflow.depends_on {
                let (target_registry, target_id) = locate_workflow(&registry, dependency).map_err(fail)?;
                let outputs = self
                    .run_dependency(target_registry, target_id.clone(), &workflow_id, state)
                    .await?;
                publish_workflow_outputs(&mut resolver, &target_id, &outputs);
            }

            tracing::info!(steps = workflow.steps.len(), "workflow started");
            let finish = self
                .run_steps(&registry, workflow, &mut resolver, &mut ctx, state)
                .await?;

            let mut outputs = ctx.outputs.clone();
            for (name, expr) in &workflow.outputs {
                let resolved = if is_expression(expr.trim()) {
                    resolver.resolve(expr.trim(), Some(&ctx))
                } else {
                    resolver.resolve_value(&Value::String(expr.clone()), Some(&ctx)).map(Some)
                };
                match (resolved, finish) {
                    (Ok(Some(v)), _) => {
                        outputs.insert(name.clone(), v);
                    }
                    (Ok(None), Finish::Completed) => {
                        outputs.insert(name.clone(), Value::Null);
                    }
                    (Ok(None), Finish::Ended) => {
                        tracing::debug!(output = %name, "skipping unresolved output after end");
                    }
                    (Err(e), Finish::Ended) => {
                        tracing::debug!(output = %name, error = %e, "skipping unresolvable output after end");
                    }
                    (Err(e), Finish::Completed) => return Err(fail(e.into())),
                }
            }
            tracing::info!(outputs = outputs.len(), ?finish, "workflow finished");
            Ok(outputs)
        }
        .instrument(span)
        .boxed()
    }

    /// Runs a `dependsOn` workflow once per run; later dependents reuse its outputs.
    async fn run_dependency(
        &self,
        registry: Arc<SourceRegistry>,
        workflow_id: String,
        dependent: &str,
        state: &mut RunState,
    ) -> Result<Map<String, Value>, ExecutionError> {
        let key: WorkflowKey = (Arc::as_ptr(registry.document()) as usize, workflow_id.clone());
        if let Some(outputs) = state.finished_dependencies.get(&key) {
            return Ok(outputs.clone());
        }
        if state.dependency_stack.contains(&key) {
            let mut chain: Vec<&str> = state.dependency_stack.iter().map(|(_, id)| id.as_str()).collect();
            chain.push(&workflow_id);
            return Err(ExecutionError::new(
                dependent,
                None,
                ExecutionErrorKind::DependencyCycle(chain.join(" -> ")),
            ));
        }

        tracing::info!(dependency = %workflow_id, "running dependency");
        state.dependency_stack.push(key.clone());
        let result = self
            .run_workflow(registry, workflow_id, Value::Object(Map::new()), state)
            .await;
        state.dependency_stack.pop();
        let outputs = result?;
        state.finished_dependencies.insert(key, outputs.clone());
        Ok(outputs)
    }

    async fn run_steps(
        &self,
        registry: &Arc<SourceRegistry>,
        workflow: &Workflow,
        resolver: &mut Resolver,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
    ) -> Result<Finish, ExecutionError> {
        let executor = StepExecutor {
            registry: registry.as_ref(),
            http: self.http.as_ref(),
            config: &self.config,
            events: self.events.as_ref(),
        };
        let mut retries: HashMap<String, u32> = HashMap::new();
        let mut index = 0;

        while let Some(step) = workflow.steps.get(index) {
            let fail = |kind: ExecutionErrorKind| {
                ExecutionError::new(workflow.workflow_id.clone(), Some(&step.step_id), kind)
            };
            state.executions += 1;
            if state.executions > self.config.max_step_executions {
                return Err(fail(ExecutionErrorKind::StepBudgetExceeded(
                    self.config.max_step_executions,
                )));
            }

            let attempt = retries.get(&step.step_id).copied().unwrap_or(0) + 1;
            self.events
                .emit(Event::StepStarted {
                    run_id: ctx.run_id,
                    workflow_id: workflow.workflow_id.clone(),
                    step_id: step.step_id.clone(),
                })
                .await;

            let span = tracing::info_span!("step", step_id = %step.step_id, attempt);
            let outcome = match step.target() {
                Some(StepTarget::Workflow(target)) => {
                    self.delegate(registry, &executor, workflow, step, target, resolver, ctx, state)
                        .instrument(span)
                        .await?
                }
                Some(_) => executor
                    .execute(step, workflow, resolver, ctx)
                    .instrument(span)
                    .await
                    .map_err(fail)?,
                None => return Err(fail(ExecutionErrorKind::NoTarget)),
            };
            state.records.push(StepRecord {
                workflow_id: workflow.workflow_id.clone(),
                step_id: step.step_id.clone(),
                attempt,
                status: outcome.status,
                success: outcome.success,
            });

            match outcome.action {
                StepAction::Next => {
                    retries.remove(&step.step_id);
                    index += 1;
                }
                StepAction::End => {
                    self.events
                        .emit(Event::WorkflowEnded {
                            run_id: ctx.run_id,
                            workflow_id: workflow.workflow_id.clone(),
                            step_id: step.step_id.clone(),
                        })
                        .await;
                    return Ok(Finish::Ended);
                }
                StepAction::GotoStep(target) => {
                    self.emit_goto(ctx, workflow, step, &target).await;
                    index = workflow
                        .step_index(&target)
                        .ok_or_else(|| fail(ExecutionErrorKind::UnknownGotoTarget(target.clone())))?;
                }
                StepAction::GotoWorkflow(target) => {
                    self.emit_goto(ctx, workflow, step, &target).await;
                    let (target_registry, target_id) = locate_workflow(registry, &target)
                        .map_err(|_| fail(ExecutionErrorKind::UnknownGotoTarget(target.clone())))?;
                    let outputs = self
                        .run_workflow(target_registry, target_id.clone(), ctx.inputs.clone(), state)
                        .await?;
                    publish_workflow_outputs(resolver, &target_id, &outputs);
                    ctx.outputs.extend(outputs);
                    return Ok(Finish::Ended);
                }
                StepAction::Retry { delay, limit } => {
                    let done = retries.entry(step.step_id.clone()).or_insert(0);
                    if *done >= limit {
                        return Err(fail(ExecutionErrorKind::RetriesExhausted { attempts: *done + 1 }));
                    }
                    *done += 1;
                    self.events
                        .emit(Event::StepRetryScheduled {
                            run_id: ctx.run_id,
                            workflow_id: workflow.workflow_id.clone(),
                            step_id: step.step_id.clone(),
                            attempt: *done + 1,
                            delay,
                        })
                        .await;
                    tracing::info!(delay_ms = delay.as_millis() as u64, "retrying step");
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Ok(Finish::Completed)
    }

    /// Runs a `workflowId` step: parameters become the target's inputs, its outputs are
    /// merged into the caller's and published under `$workflows.<id>.outputs`.
    #[allow(clippy::too_many_arguments)]
    async fn delegate(
        &self,
        registry: &Arc<SourceRegistry>,
        executor: &StepExecutor<'_>,
        workflow: &Workflow,
        step: &Step,
        target: &str,
        resolver: &mut Resolver,
        ctx: &mut ExecutionContext,
        state: &mut RunState,
    ) -> Result<StepOutcome, ExecutionError> {
        let fail = |kind: ExecutionErrorKind| {
            ExecutionError::new(workflow.workflow_id.clone(), Some(&step.step_id), kind)
        };
        let (target_registry, target_id) = locate_workflow(registry, target).map_err(fail)?;

        let components = registry.document().components.as_ref();
        let mut inputs = Map::new();
        for p in effective_parameters(step, workflow, components).map_err(fail)? {
            let value = resolver
                .resolve_value(&p.value, Some(ctx))
                .map_err(|e| fail(e.into()))?;
            inputs.insert(p.name, value);
        }

        tracing::info!(target = %target_id, "delegating to workflow");
        let outputs = self
            .run_workflow(target_registry, target_id.clone(), Value::Object(inputs), state)
            .await?;
        publish_workflow_outputs(resolver, &target_id, &outputs);
        ctx.outputs.extend(outputs);

        executor
            .conclude(step, workflow, resolver, ctx, None)
            .await
            .map_err(fail)
    }

    async fn emit_goto(&self, ctx: &ExecutionContext, workflow: &Workflow, step: &Step, target: &str) {
        tracing::info!(target = %target, "goto");
        self.events
            .emit(Event::Goto {
                run_id: ctx.run_id,
                workflow_id: workflow.workflow_id.clone(),
                from_step: step.step_id.clone(),
                target: target.to_string(),
            })
            .await;
    }
}

fn publish_workflow_outputs(resolver: &mut Resolver, workflow_id: &str, outputs: &Map<String, Value>) {
    for (name, value) in outputs {
        resolver.publish(format!("$workflows.{workflow_id}.outputs.{name}"), value.clone());
    }
}

/// Finds a workflow by local id or `$sourceDescriptions.<name>.<workflowId>`.
fn locate_workflow(
    registry: &Arc<SourceRegistry>,
    reference: &str,
) -> Result<(Arc<SourceRegistry>, String), ExecutionErrorKind> {
    let not_found = || ExecutionErrorKind::WorkflowNotFound(reference.to_string());
    let (target, id) = match parse_runtime_expr(reference) {
        Ok(RuntimeExpr::SourceDescriptions(np)) => {
            let nested = registry.nested(&np.root).ok_or_else(not_found)?;
            (Arc::clone(nested), np.rest.join("."))
        }
        _ => (Arc::clone(registry), reference.to_string()),
    };
    if target.document().workflow(&id).is_none() {
        return Err(not_found());
    }
    Ok((target, id))
}

/// Fills `default`s from the workflow's input schema and checks `required` inputs.
fn apply_input_schema(
    document: &ArazzoDocument,
    workflow: &Workflow,
    inputs: Value,
) -> Result<Value, ExecutionErrorKind> {
    let Some(mut schema) = workflow.inputs.as_ref() else {
        return Ok(inputs);
    };
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let component = parse_component_ref(reference)?;
        if component.pool != ComponentPool::Inputs {
            return Err(ReferenceError::WrongPool {
                reference: reference.to_string(),
                expected: ComponentPool::Inputs,
            }
            .into());
        }
        schema = document
            .components
            .as_ref()
            .and_then(|c| c.inputs.get(&component.name))
            .ok_or_else(|| ReferenceError::NotFound(reference.to_string()))?;
    }

    let mut map = match inputs {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return Ok(other),
    };
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            if let (false, Some(default)) = (map.contains_key(name), prop.get("default")) {
                map.insert(name.clone(), default.clone());
            }
        }
    }
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        if let Some(missing) = required
            .iter()
            .filter_map(Value::as_str)
            .find(|r| !map.contains_key(*r))
        {
            return Err(ExecutionErrorKind::MissingInput(missing.to_string()));
        }
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arazzo_core::parse;
    use serde_json::json;

    fn doc(workflow: Value, components: Value) -> ArazzoDocument {
        let tree = json!({
            "arazzo": "1.0.1",
            "info": {"title": "t", "version": "1"},
            "sourceDescriptions": [{"name": "api", "url": "https://api.example/openapi.json"}],
            "workflows": [workflow],
            "components": components
        });
        parse(&tree, None, &ParseOptions::default()).document.unwrap()
    }

    #[test]
    fn input_defaults_and_required() {
        let d = doc(
            json!({
                "workflowId": "w",
                "inputs": {"$ref": "#/components/inputs/search"},
                "steps": [{"stepId": "s", "operationId": "op"}]
            }),
            json!({"inputs": {"search": {
                "type": "object",
                "properties": {"limit": {"type": "integer", "default": 10}, "q": {"type": "string"}},
                "required": ["q"]
            }}}),
        );
        let w = d.workflow("w").unwrap();
        let out = apply_input_schema(&d, w, json!({"q": "cats"})).unwrap();
        assert_eq!(out, json!({"q": "cats", "limit": 10}));
        let out = apply_input_schema(&d, w, json!({"q": "cats", "limit": 3})).unwrap();
        assert_eq!(out["limit"], 3);
        assert!(matches!(
            apply_input_schema(&d, w, Value::Null),
            Err(ExecutionErrorKind::MissingInput(name)) if name == "q"
        ));
    }
}
