use std::path::Path;
use std::sync::Arc;

use arazzo_exec::executor::{ExecutionErrorKind, ReqwestHttpClient, StepRecord, TracingEventSink};
use arazzo_exec::{EventSink, Executor, HttpClient};
use serde::Serialize;
use serde_json::{Map, Value};

use super::config::{build_executor_config, build_source_overrides, collect_inputs, load_document, parse_options};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{ExecArgs, InputArgs, OpenApiArgs, OutputArgs, ParseArgs};

#[derive(Serialize)]
struct ExecuteResult {
    run_id: String,
    workflow_id: String,
    status: &'static str,
    outputs: Map<String, Value>,
    steps: Vec<StepRecord>,
    elapsed_ms: u64,
}

#[allow(clippy::too_many_arguments)]
pub async fn execute_cmd(
    path: &Path,
    workflow_id: Option<&str>,
    inputs: &InputArgs,
    openapi: &OpenApiArgs,
    exec: &ExecArgs,
    parse: &ParseArgs,
    output: OutputArgs,
) -> i32 {
    let outcome = match load_document(path, parse, &output) {
        Ok(o) => o,
        Err(code) => return code,
    };
    let Some(document) = outcome.valid_document() else {
        print_error(
            output.format,
            output.quiet,
            &format!(
                "document failed validation ({} errors); run `arazzo validate` for details",
                outcome.diagnostics.error_count()
            ),
        );
        return exit_codes::VALIDATION_FAILED;
    };
    let document = Arc::new(document.clone());

    let workflow_id = match workflow_id.or_else(|| document.workflows.first().map(|w| w.workflow_id.as_str())) {
        Some(id) => id.to_string(),
        None => {
            print_error(output.format, output.quiet, "document has no workflows");
            return exit_codes::VALIDATION_FAILED;
        }
    };
    if document.workflow(&workflow_id).is_none() {
        print_error(
            output.format,
            output.quiet,
            &format!("workflow `{workflow_id}` not found"),
        );
        return exit_codes::VALIDATION_FAILED;
    }

    let inputs = match collect_inputs(inputs, &output) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let overrides = match build_source_overrides(openapi) {
        Ok(o) => o,
        Err(message) => {
            print_error(output.format, output.quiet, &message);
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let http: Arc<dyn HttpClient> = match ReqwestHttpClient::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            print_error(output.format, output.quiet, &format!("http client: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let executor = Executor::new(http)
        .with_config(build_executor_config(exec))
        .with_event_sink(Arc::new(TracingEventSink) as Arc<dyn EventSink>)
        .with_source_overrides(overrides)
        .with_parse_options(parse_options(parse));

    match executor.run(document, &workflow_id, inputs).await {
        Ok(report) => {
            let result = ExecuteResult {
                run_id: report.run_id.to_string(),
                workflow_id: report.workflow_id,
                status: "succeeded",
                outputs: report.outputs,
                steps: report.steps,
                elapsed_ms: report.elapsed.as_millis() as u64,
            };
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!(
                    "ok: workflow `{}` succeeded ({} steps, {} ms)",
                    result.workflow_id,
                    result.steps.len(),
                    result.elapsed_ms
                );
                print_result(output.format, output.quiet, &result.outputs);
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            match e.kind {
                ExecutionErrorKind::Sources(_) => exit_codes::RUNTIME_ERROR,
                _ => exit_codes::RUN_FAILED,
            }
        }
    }
}
