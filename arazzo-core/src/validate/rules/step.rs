use std::collections::HashSet;

use crate::types::Step;
use crate::validate::rules::{
    actions,
    common::{
        validate_expression_or_template, validate_map_keys, validate_runtime_expr,
        validate_template_string, validate_value_exprs,
    },
    criteria, parameters,
};
use crate::validate::validator::Validator;

pub(crate) fn validate_step(v: &mut Validator<'_>, step: &Step, path: &str, step_ids: &HashSet<&str>) {
    let targets = [
        step.operation_id.is_some(),
        step.operation_path.is_some(),
        step.workflow_id.is_some(),
    ]
    .into_iter()
    .filter(|t| *t)
    .count();

    if targets != 1 {
        v.push(
            path,
            "",
            "exactly one of operationId, operationPath, workflowId must be provided",
        );
    }

    if let Some(operation_path) = &step.operation_path {
        if operation_path.trim().starts_with('$') {
            validate_runtime_expr(v, path, "operationPath", operation_path.trim());
        } else {
            validate_template_string(v, path, "operationPath", operation_path);
        }
        if !operation_path.contains("#/paths/") {
            v.push(path, "operationPath", "must point at an operation with #/paths/...");
        }
    }

    if let Some(operation_id) = &step.operation_id {
        if operation_id.trim().starts_with('$') {
            validate_runtime_expr(v, path, "operationId", operation_id.trim());
        }
    }

    let outputs = format!("{path}.outputs");
    validate_map_keys(v, &outputs, step.outputs.keys());
    for (k, expr) in &step.outputs {
        validate_expression_or_template(v, &outputs, k, expr);
    }

    let context = if step.workflow_id.is_some() {
        Some(parameters::ParameterContext::WorkflowStep)
    } else if step.operation_id.is_some() || step.operation_path.is_some() {
        Some(parameters::ParameterContext::OperationStep)
    } else {
        None
    };
    parameters::validate_parameter_list(v, &format!("{path}.parameters"), &step.parameters, context);

    if let Some(rb) = &step.request_body {
        let rb_path = format!("{path}.requestBody");
        if let Some(payload) = &rb.payload {
            validate_value_exprs(v, &rb_path, "payload", payload);
        }
        for (ridx, rep) in rb.replacements.iter().enumerate() {
            let rpath = format!("{rb_path}.replacements[{ridx}]");
            if rep.target.trim().is_empty() {
                v.push(&rpath, "target", "must not be empty");
            }
            validate_value_exprs(v, &rpath, "value", &rep.value);
        }
    }

    criteria::validate_criteria_list(v, &format!("{path}.successCriteria"), &step.success_criteria);
    actions::validate_success_action_list(
        v,
        &format!("{path}.onSuccess"),
        &step.on_success,
        Some(step_ids),
    );
    actions::validate_failure_action_list(
        v,
        &format!("{path}.onFailure"),
        &step.on_failure,
        Some(step_ids),
    );
}
