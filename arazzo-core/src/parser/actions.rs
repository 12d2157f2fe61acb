use serde_json::Value;

use crate::parser::criteria::parse_criteria;
use crate::parser::node::{Node, ParseContext};
use crate::parser::workflow::{is_reusable, parse_reusable};
use crate::types::{
    Criterion, FailureAction, FailureActionOrReusable, FailureActionType, SuccessAction,
    SuccessActionOrReusable, SuccessActionType,
};

const SUCCESS_ACTION_KEYS: &[&str] = &["name", "type", "workflowId", "stepId", "criteria"];
const FAILURE_ACTION_KEYS: &[&str] = &[
    "name",
    "type",
    "workflowId",
    "stepId",
    "retryAfter",
    "retryLimit",
    "criteria",
];

pub(crate) fn parse_success_action_item(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<SuccessActionOrReusable> {
    if is_reusable(value) {
        return parse_reusable(cx, value, location, key).map(SuccessActionOrReusable::Reusable);
    }

    let node = cx.object(value, location, key, SUCCESS_ACTION_KEYS, true)?;
    let name = node.required_str(cx, "name").unwrap_or_default();
    let action_type = action_type(cx, &node, SuccessActionType::from_name, "end or goto");
    let workflow_id = node.optional_str(cx, "workflowId");
    let step_id = node.optional_str(cx, "stepId");
    let criteria = criteria(cx, &node);
    let extensions = node.finish(cx);

    Some(SuccessActionOrReusable::Action(SuccessAction {
        name,
        action_type: action_type?,
        workflow_id,
        step_id,
        criteria,
        extensions,
    }))
}

pub(crate) fn parse_failure_action_item(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<FailureActionOrReusable> {
    if is_reusable(value) {
        return parse_reusable(cx, value, location, key).map(FailureActionOrReusable::Reusable);
    }

    let node = cx.object(value, location, key, FAILURE_ACTION_KEYS, true)?;
    let name = node.required_str(cx, "name").unwrap_or_default();
    let action_type = action_type(cx, &node, FailureActionType::from_name, "end, goto or retry");
    let workflow_id = node.optional_str(cx, "workflowId");
    let step_id = node.optional_str(cx, "stepId");
    let retry_after_seconds = node.optional_f64(cx, "retryAfter");
    let retry_limit = node.optional_u32(cx, "retryLimit");
    let criteria = criteria(cx, &node);
    let extensions = node.finish(cx);

    Some(FailureActionOrReusable::Action(FailureAction {
        name,
        action_type: action_type?,
        workflow_id,
        step_id,
        retry_after_seconds,
        retry_limit,
        criteria,
        extensions,
    }))
}

fn action_type<T>(
    cx: &mut ParseContext<'_>,
    node: &Node<'_>,
    from_name: fn(&str) -> Option<T>,
    expected: &str,
) -> Option<T> {
    let name = node.required_str(cx, "type")?;
    let parsed = from_name(&name);
    if parsed.is_none() {
        cx.diagnostics.invalid(
            &node.location,
            "type",
            format!("unknown action type `{name}` (expected {expected})"),
        );
    }
    parsed
}

fn criteria(cx: &mut ParseContext<'_>, node: &Node<'_>) -> Vec<Criterion> {
    match node.optional_array(cx, "criteria") {
        Some(items) => parse_criteria(cx, items, &node.child("criteria")),
        None => Vec::new(),
    }
}
