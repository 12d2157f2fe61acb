use std::collections::HashSet;

use crate::reference::{parse_component_ref, resolve_parameter, ComponentPool};
use crate::types::ParameterOrReusable;
use crate::validate::rules::common::validate_value_exprs;
use crate::validate::validator::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParameterContext {
    WorkflowStep,
    OperationStep,
}

pub(crate) fn validate_parameter_list(
    v: &mut Validator<'_>,
    path: &str,
    params: &[ParameterOrReusable],
    context: Option<ParameterContext>,
) {
    let mut seen = HashSet::<String>::new();
    for (idx, item) in params.iter().enumerate() {
        let key = format!("[{idx}]");
        let ipath = format!("{path}{key}");
        match item {
            ParameterOrReusable::Parameter(p) => {
                if p.name.trim().is_empty() {
                    v.push(&ipath, "name", "must not be empty");
                }
                validate_value_exprs(v, &ipath, "value", &p.value);
                if context == Some(ParameterContext::WorkflowStep) && p.r#in.is_some() {
                    v.warn(
                        &ipath,
                        "in",
                        "ignored: parameters of a workflow step map to the workflow's inputs",
                    );
                }
                if !seen.insert(format!("param:{}:{:?}", p.name, p.r#in)) {
                    v.repeated(path, &key);
                }
            }
            ParameterOrReusable::Reusable(r) => {
                if !seen.insert(format!("ref:{}", r.reference)) {
                    v.repeated(path, &key);
                }
                match parse_component_ref(&r.reference) {
                    Ok(target) if target.pool != ComponentPool::Parameters => v.push(
                        &ipath,
                        "reference",
                        "must reference $components.parameters.*",
                    ),
                    Ok(_) => {
                        if let Err(e) = resolve_parameter(v.components, item) {
                            v.warn(&ipath, "reference", e.to_string());
                        }
                    }
                    Err(e) => v.push(&ipath, "reference", e.to_string()),
                }
                if let Some(value) = &r.value {
                    validate_value_exprs(v, &ipath, "value", value);
                }
            }
        }
    }
}
