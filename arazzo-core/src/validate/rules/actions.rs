use std::collections::HashSet;

use crate::reference::{
    parse_component_ref, resolve_failure_action, resolve_success_action, ComponentPool,
};
use crate::types::{
    FailureActionOrReusable, FailureActionType, ReusableObject, SuccessActionOrReusable,
    SuccessActionType,
};
use crate::validate::rules::common::validate_runtime_expr;
use crate::validate::rules::criteria::validate_criteria_list;
use crate::validate::validator::Validator;

/// Fields shared by both action kinds that the goto/retry rules look at.
struct Target<'a> {
    workflow_id: Option<&'a str>,
    step_id: Option<&'a str>,
}

fn validate_goto(v: &mut Validator<'_>, ipath: &str, t: &Target<'_>, step_ids: Option<&HashSet<&str>>) {
    if t.workflow_id.is_some() == t.step_id.is_some() {
        v.push(ipath, "", "type=goto must specify exactly one of workflowId or stepId");
    }
    validate_target_refs(v, ipath, t, step_ids);
}

fn validate_target_refs(
    v: &mut Validator<'_>,
    ipath: &str,
    t: &Target<'_>,
    step_ids: Option<&HashSet<&str>>,
) {
    if let Some(workflow_id) = t.workflow_id {
        if workflow_id.trim().starts_with('$') {
            validate_runtime_expr(v, ipath, "workflowId", workflow_id.trim());
        }
    }
    if let (Some(step_id), Some(step_ids)) = (t.step_id, step_ids) {
        if !step_ids.contains(step_id) {
            v.push(ipath, "stepId", "must reference a stepId in the current workflow");
        }
    }
}

fn validate_reusable(
    v: &mut Validator<'_>,
    ipath: &str,
    r: &ReusableObject,
    expected: ComponentPool,
    resolve: impl FnOnce(&Validator<'_>) -> Option<String>,
) {
    match parse_component_ref(&r.reference) {
        Ok(target) if target.pool != expected => v.push(
            ipath,
            "reference",
            format!("must reference $components.{expected}.*"),
        ),
        Ok(_) => {
            if let Some(problem) = resolve(&*v) {
                v.warn(ipath, "reference", problem);
            }
        }
        Err(e) => v.push(ipath, "reference", e.to_string()),
    }
}

pub(crate) fn validate_success_action_list(
    v: &mut Validator<'_>,
    path: &str,
    actions: &[SuccessActionOrReusable],
    step_ids: Option<&HashSet<&str>>,
) {
    let mut seen = HashSet::<String>::new();
    for (idx, item) in actions.iter().enumerate() {
        let key = format!("[{idx}]");
        let ipath = format!("{path}{key}");
        match item {
            SuccessActionOrReusable::Action(a) => {
                if a.name.trim().is_empty() {
                    v.push(&ipath, "name", "must not be empty");
                }
                if !seen.insert(format!("name:{}", a.name)) {
                    v.repeated(path, &key);
                }

                let target = Target {
                    workflow_id: a.workflow_id.as_deref(),
                    step_id: a.step_id.as_deref(),
                };
                match a.action_type {
                    SuccessActionType::End => {
                        if target.workflow_id.is_some() || target.step_id.is_some() {
                            v.push(&ipath, "", "type=end must not specify workflowId or stepId");
                        }
                    }
                    SuccessActionType::Goto => validate_goto(v, &ipath, &target, step_ids),
                }

                validate_criteria_list(v, &format!("{ipath}.criteria"), &a.criteria);
            }
            SuccessActionOrReusable::Reusable(r) => {
                if !seen.insert(format!("ref:{}", r.reference)) {
                    v.repeated(path, &key);
                }
                validate_reusable(v, &ipath, r, ComponentPool::SuccessActions, |v| {
                    resolve_success_action(v.components, item).err().map(|e| e.to_string())
                });
            }
        }
    }
}

pub(crate) fn validate_failure_action_list(
    v: &mut Validator<'_>,
    path: &str,
    actions: &[FailureActionOrReusable],
    step_ids: Option<&HashSet<&str>>,
) {
    let mut seen = HashSet::<String>::new();
    for (idx, item) in actions.iter().enumerate() {
        let key = format!("[{idx}]");
        let ipath = format!("{path}{key}");
        match item {
            FailureActionOrReusable::Action(a) => {
                if a.name.trim().is_empty() {
                    v.push(&ipath, "name", "must not be empty");
                }
                if !seen.insert(format!("name:{}", a.name)) {
                    v.repeated(path, &key);
                }

                let target = Target {
                    workflow_id: a.workflow_id.as_deref(),
                    step_id: a.step_id.as_deref(),
                };
                let has_retry_fields = a.retry_after_seconds.is_some() || a.retry_limit.is_some();
                match a.action_type {
                    FailureActionType::End => {
                        if target.workflow_id.is_some() || target.step_id.is_some() || has_retry_fields
                        {
                            v.push(
                                &ipath,
                                "",
                                "type=end must not specify workflowId, stepId, retryAfter or retryLimit",
                            );
                        }
                    }
                    FailureActionType::Goto => {
                        if has_retry_fields {
                            v.push(&ipath, "", "type=goto must not specify retryAfter or retryLimit");
                        }
                        validate_goto(v, &ipath, &target, step_ids);
                    }
                    FailureActionType::Retry => {
                        if a.retry_after_seconds.is_some_and(|secs| secs < 0.0) {
                            v.push(&ipath, "retryAfter", "must be non-negative");
                        }
                        if target.workflow_id.is_some() && target.step_id.is_some() {
                            v.push(&ipath, "", "type=retry must not specify both workflowId and stepId");
                        }
                        validate_target_refs(v, &ipath, &target, step_ids);
                    }
                }

                validate_criteria_list(v, &format!("{ipath}.criteria"), &a.criteria);
            }
            FailureActionOrReusable::Reusable(r) => {
                if !seen.insert(format!("ref:{}", r.reference)) {
                    v.repeated(path, &key);
                }
                validate_reusable(v, &ipath, r, ComponentPool::FailureActions, |v| {
                    resolve_failure_action(v.components, item).err().map(|e| e.to_string())
                });
            }
        }
    }
}
