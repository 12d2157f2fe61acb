use crate::types::{Components, FailureActionOrReusable, SuccessActionOrReusable};
use crate::validate::rules::actions::{validate_failure_action_list, validate_success_action_list};
use crate::validate::rules::common::validate_map_keys;
use crate::validate::rules::parameters::validate_parameter_list;
use crate::validate::validator::Validator;

pub(crate) fn validate_components(v: &mut Validator<'_>, components: &Components) {
    let path = "$.components";
    validate_map_keys(v, &format!("{path}.inputs"), components.inputs.keys());

    validate_map_keys(v, &format!("{path}.parameters"), components.parameters.keys());
    for (k, p) in &components.parameters {
        validate_parameter_list(
            v,
            &format!("{path}.parameters.{k}"),
            std::slice::from_ref(p),
            None,
        );
    }

    // Pool entries are checked one at a time so that names may repeat across entries;
    // step ids are unknown here, so stepId targets are checked where the action is used.
    validate_map_keys(v, &format!("{path}.successActions"), components.success_actions.keys());
    for (k, a) in &components.success_actions {
        let one: &[SuccessActionOrReusable] = std::slice::from_ref(a);
        validate_success_action_list(v, &format!("{path}.successActions.{k}"), one, None);
    }

    validate_map_keys(v, &format!("{path}.failureActions"), components.failure_actions.keys());
    for (k, a) in &components.failure_actions {
        let one: &[FailureActionOrReusable] = std::slice::from_ref(a);
        validate_failure_action_list(v, &format!("{path}.failureActions.{k}"), one, None);
    }
}
