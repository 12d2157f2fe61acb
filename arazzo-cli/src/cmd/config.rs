use std::path::Path;
use std::time::Duration;

use arazzo_core::{parse_str, DocumentFormat, ParseOptions, ParseOutcome};
use arazzo_exec::{ExecutorConfig, SourceOverrides};
use serde_json::{Map, Value};

use crate::exit_codes;
use crate::output::print_error;
use crate::{ExecArgs, InputArgs, OpenApiArgs, OutputArgs, ParseArgs};

pub fn parse_options(parse: &ParseArgs) -> ParseOptions {
    ParseOptions {
        permit_reserved_author: parse.permit_reserved_author,
    }
}

/// Reads and parses a document; the error is the exit code to use.
pub fn load_document(path: &Path, parse: &ParseArgs, output: &OutputArgs) -> Result<ParseOutcome, i32> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        print_error(
            output.format,
            output.quiet,
            &format!("failed to read {}: {e}", path.display()),
        );
        exit_codes::RUNTIME_ERROR
    })?;
    parse_str(&content, DocumentFormat::Auto, Some(path), &parse_options(parse)).map_err(|e| {
        print_error(output.format, output.quiet, &e.to_string());
        exit_codes::VALIDATION_FAILED
    })
}

/// Builds the input object from `--inputs` and `--set`; later `--set` flags win.
pub fn collect_inputs(args: &InputArgs, output: &OutputArgs) -> Result<Value, i32> {
    let mut inputs = match &args.inputs {
        Some(path) => load_inputs(path).map_err(|message| {
            print_error(output.format, output.quiet, &message);
            exit_codes::RUNTIME_ERROR
        })?,
        None => Value::Object(Map::new()),
    };
    merge_set_inputs(&mut inputs, &args.set_inputs).map_err(|message| {
        print_error(output.format, output.quiet, &message);
        exit_codes::RUNTIME_ERROR
    })?;
    Ok(inputs)
}

fn load_inputs(path: &Path) -> Result<Value, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read inputs {}: {e}", path.display()))?;
    if let Ok(v) = serde_json::from_str(&content) {
        return Ok(v);
    }
    serde_yaml::from_str(&content).map_err(|_| "inputs file is neither valid JSON nor YAML".to_string())
}

fn merge_set_inputs(inputs: &mut Value, set_inputs: &[String]) -> Result<(), String> {
    if set_inputs.is_empty() {
        return Ok(());
    }
    let map = inputs
        .as_object_mut()
        .ok_or_else(|| "--set needs the inputs file to hold an object".to_string())?;
    for s in set_inputs {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| format!("--set expects KEY=VALUE, got `{s}`"))?;
        let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string()));
        map.insert(k.to_string(), value);
    }
    Ok(())
}

pub fn build_executor_config(exec: &ExecArgs) -> ExecutorConfig {
    ExecutorConfig {
        request_timeout: Duration::from_millis(exec.timeout),
        workflow_deadline: exec.deadline.map(Duration::from_secs),
        localhost_fallback_port: exec.localhost_port,
        default_content_type: exec.content_type.clone(),
        max_response_bytes: exec.max_response_bytes,
        max_retry_delay: Duration::from_secs(exec.max_retry_delay),
        max_step_executions: exec.max_steps,
    }
}

/// Maps `--openapi NAME=PATH` flags to location overrides with absolute paths.
pub fn build_source_overrides(openapi: &OpenApiArgs) -> Result<SourceOverrides, String> {
    let mut overrides = SourceOverrides::default();
    for s in &openapi.openapi_sources {
        let (name, path) = s
            .split_once('=')
            .ok_or_else(|| format!("--openapi expects NAME=PATH, got `{s}`"))?;
        let path = std::path::absolute(path).map_err(|e| format!("invalid path {path}: {e}"))?;
        overrides
            .locations
            .insert(name.to_string(), path.display().to_string());
    }
    Ok(overrides)
}
