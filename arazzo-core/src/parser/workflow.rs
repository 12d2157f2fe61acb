use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::parser::actions::{parse_failure_action_item, parse_success_action_item};
use crate::parser::criteria::parse_criteria;
use crate::parser::node::{item_key, Node, ParseContext};
use crate::types::{
    Parameter, ParameterLocation, ParameterOrReusable, PayloadReplacement, RequestBody,
    ReusableObject, Step, Workflow,
};

const WORKFLOW_KEYS: &[&str] = &[
    "workflowId",
    "summary",
    "description",
    "inputs",
    "dependsOn",
    "steps",
    "successActions",
    "failureActions",
    "outputs",
    "parameters",
];
const STEP_KEYS: &[&str] = &[
    "description",
    "stepId",
    "operationId",
    "operationPath",
    "workflowId",
    "parameters",
    "requestBody",
    "successCriteria",
    "onSuccess",
    "onFailure",
    "outputs",
];
const PARAMETER_KEYS: &[&str] = &["name", "in", "value"];
const REUSABLE_KEYS: &[&str] = &["reference", "value"];
const REQUEST_BODY_KEYS: &[&str] = &["contentType", "payload", "replacements"];
const REPLACEMENT_KEYS: &[&str] = &["target", "value"];

pub(crate) fn parse_workflow(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<Workflow> {
    let node = cx.object(value, location, key, WORKFLOW_KEYS, true)?;

    let workflow_id = node.required_str(cx, "workflowId").unwrap_or_default();
    let summary = node.optional_str(cx, "summary");
    let description = node.optional_str(cx, "description");
    let inputs = node.optional_object(cx, "inputs").cloned().map(Value::Object);
    let depends_on = string_list(cx, &node, "dependsOn");

    let mut steps = Vec::new();
    if let Some(items) = node.required_array(cx, "steps") {
        let steps_location = node.child("steps");
        for (idx, item) in items.iter().enumerate() {
            if let Some(step) = parse_step(cx, item, &steps_location, &item_key(idx)) {
                steps.push(step);
            }
        }
    }

    let success_actions = list(cx, &node, "successActions", parse_success_action_item);
    let failure_actions = list(cx, &node, "failureActions", parse_failure_action_item);
    let outputs = outputs(cx, &node);
    let parameters = list(cx, &node, "parameters", parse_parameter_item);
    let extensions = node.finish(cx);

    Some(Workflow {
        workflow_id,
        summary,
        description,
        inputs,
        depends_on,
        steps,
        success_actions,
        failure_actions,
        outputs,
        parameters,
        extensions,
    })
}

fn parse_step(cx: &mut ParseContext<'_>, value: &Value, location: &str, key: &str) -> Option<Step> {
    let node = cx.object(value, location, key, STEP_KEYS, true)?;

    let mut step = Step::new(node.required_str(cx, "stepId").unwrap_or_default());
    step.description = node.optional_str(cx, "description");
    step.operation_id = node.optional_str(cx, "operationId");
    step.operation_path = node.optional_str(cx, "operationPath");
    step.workflow_id = node.optional_str(cx, "workflowId");
    step.parameters = list(cx, &node, "parameters", parse_parameter_item);
    step.request_body = node
        .raw("requestBody")
        .and_then(|v| parse_request_body(cx, v, &node.location));
    if let Some(items) = node.optional_array(cx, "successCriteria") {
        step.success_criteria = parse_criteria(cx, items, &node.child("successCriteria"));
    }
    step.on_success = list(cx, &node, "onSuccess", parse_success_action_item);
    step.on_failure = list(cx, &node, "onFailure", parse_failure_action_item);
    step.outputs = outputs(cx, &node);
    step.extensions = node.finish(cx);
    Some(step)
}

/// A parameter entry, or a reusable object when the entry carries `reference`.
pub(crate) fn parse_parameter_item(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<ParameterOrReusable> {
    if is_reusable(value) {
        return parse_reusable(cx, value, location, key).map(ParameterOrReusable::Reusable);
    }

    let node = cx.object(value, location, key, PARAMETER_KEYS, true)?;
    let name = node.required_str(cx, "name").unwrap_or_default();
    let r#in = node.optional_str(cx, "in").and_then(|loc| {
        let parsed = ParameterLocation::from_name(&loc);
        if parsed.is_none() {
            cx.diagnostics.invalid(
                &node.location,
                "in",
                format!("unknown parameter location `{loc}`"),
            );
        }
        parsed
    });
    let value = node.required(cx, "value").cloned().unwrap_or(Value::Null);
    let extensions = node.finish(cx);
    Some(ParameterOrReusable::Parameter(Parameter {
        name,
        r#in,
        value,
        extensions,
    }))
}

pub(crate) fn is_reusable(value: &Value) -> bool {
    value.get("reference").is_some()
}

pub(crate) fn parse_reusable(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<ReusableObject> {
    let node = cx.object(value, location, key, REUSABLE_KEYS, true)?;
    let reference = node.required_str(cx, "reference")?;
    let value = node.raw("value").cloned();
    // Reusable objects carry no extensions; finish still flags strays.
    let _ = node.finish(cx);
    Some(ReusableObject { reference, value })
}

fn parse_request_body(cx: &mut ParseContext<'_>, value: &Value, location: &str) -> Option<RequestBody> {
    let node = cx.object(value, location, "requestBody", REQUEST_BODY_KEYS, false)?;
    let content_type = node.optional_str(cx, "contentType");
    let payload = node.raw("payload").cloned();

    let mut replacements = Vec::new();
    if let Some(items) = node.optional_array(cx, "replacements") {
        let rlocation = node.child("replacements");
        for (idx, item) in items.iter().enumerate() {
            let Some(rnode) = cx.object(item, &rlocation, &item_key(idx), REPLACEMENT_KEYS, true) else {
                continue;
            };
            let target = rnode.required_str(cx, "target").unwrap_or_default();
            let value = rnode.required(cx, "value").cloned().unwrap_or(Value::Null);
            let extensions = rnode.finish(cx);
            replacements.push(PayloadReplacement {
                target,
                value,
                extensions,
            });
        }
    }

    let extensions = node.finish(cx);
    Some(RequestBody {
        content_type,
        payload,
        replacements,
        extensions,
    })
}

pub(crate) fn list<T>(
    cx: &mut ParseContext<'_>,
    node: &Node<'_>,
    key: &str,
    parse: fn(&mut ParseContext<'_>, &Value, &str, &str) -> Option<T>,
) -> Vec<T> {
    let Some(items) = node.optional_array(cx, key) else {
        return Vec::new();
    };
    let location = node.child(key);
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| parse(cx, item, &location, &item_key(idx)))
        .collect()
}

fn string_list(cx: &mut ParseContext<'_>, node: &Node<'_>, key: &str) -> Vec<String> {
    let Some(items) = node.optional_array(cx, key) else {
        return Vec::new();
    };
    let location = node.child(key);
    let mut out = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => out.push(s.to_string()),
            None => cx
                .diagnostics
                .invalid_type(&location, &item_key(idx), "string", false),
        }
    }
    out
}

fn outputs(cx: &mut ParseContext<'_>, node: &Node<'_>) -> BTreeMap<String, String> {
    let Some(map) = node.optional_object(cx, "outputs") else {
        return BTreeMap::new();
    };
    string_map(cx, map, &node.child("outputs"))
}

fn string_map(
    cx: &mut ParseContext<'_>,
    map: &Map<String, Value>,
    location: &str,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, v) in map {
        match v.as_str() {
            Some(s) => {
                out.insert(name.clone(), s.to_string());
            }
            None => cx.diagnostics.invalid_type(location, name, "string", false),
        }
    }
    out
}
