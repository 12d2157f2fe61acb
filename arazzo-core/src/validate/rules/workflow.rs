use std::collections::HashSet;

use crate::types::Workflow;
use crate::validate::rules::{
    actions,
    common::{validate_expression_or_template, validate_map_keys},
    parameters, step,
};
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_workflow(v: &mut Validator<'_>, wf: &Workflow, path: &str) {
    if wf.steps.is_empty() {
        v.push(path, "steps", "must have at least one entry");
    }

    let outputs = format!("{path}.outputs");
    validate_map_keys(v, &outputs, wf.outputs.keys());
    for (k, expr) in &wf.outputs {
        validate_expression_or_template(v, &outputs, k, expr);
    }

    parameters::validate_parameter_list(v, &format!("{path}.parameters"), &wf.parameters, None);

    let step_ids: HashSet<&str> = wf.steps.iter().map(|s| s.step_id.as_str()).collect();

    actions::validate_success_action_list(
        v,
        &format!("{path}.successActions"),
        &wf.success_actions,
        Some(&step_ids),
    );
    actions::validate_failure_action_list(
        v,
        &format!("{path}.failureActions"),
        &wf.failure_actions,
        Some(&step_ids),
    );

    let mut seen = HashSet::<&str>::new();
    for (idx, s) in wf.steps.iter().enumerate() {
        let spath = format!("{path}.steps[{idx}]");
        if !ID_RE.is_match(&s.step_id) {
            v.push(&spath, "stepId", "must match [A-Za-z0-9_\\-]+");
        }
        if !seen.insert(&s.step_id) {
            v.repeated(&spath, "stepId");
        }

        step::validate_step(v, s, &spath, &step_ids);
    }
}
