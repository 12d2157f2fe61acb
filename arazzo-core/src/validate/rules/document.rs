use std::collections::HashSet;

use crate::types::ArazzoDocument;
use crate::validate::rules::{common::validate_runtime_expr, components, info, workflow};
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_document(v: &mut Validator<'_>, doc: &ArazzoDocument) {
    if !doc.arazzo.is_empty() {
        v.validate_spec_version(&doc.arazzo);
    }

    info::validate_info(v, &doc.info);

    if doc.source_descriptions.is_empty() {
        v.push("$", "sourceDescriptions", "must have at least one entry");
    }

    let mut source_names = HashSet::<&str>::new();
    for (idx, src) in doc.source_descriptions.iter().enumerate() {
        let path = format!("$.sourceDescriptions[{idx}]");
        if !ID_RE.is_match(&src.name) {
            v.push(&path, "name", "must match [A-Za-z0-9_\\-]+");
        }
        if !source_names.insert(&src.name) {
            v.repeated(&path, "name");
        }
        if src.url.trim().is_empty() {
            v.push(&path, "url", "must not be empty");
        }
    }

    if doc.workflows.is_empty() {
        v.push("$", "workflows", "must have at least one entry");
    }

    let mut workflow_ids = HashSet::<&str>::new();
    for (idx, wf) in doc.workflows.iter().enumerate() {
        let path = format!("$.workflows[{idx}]");
        if !ID_RE.is_match(&wf.workflow_id) {
            v.push(&path, "workflowId", "must match [A-Za-z0-9_\\-]+");
        }
        if !workflow_ids.insert(&wf.workflow_id) {
            v.repeated(&path, "workflowId");
        }

        workflow::validate_workflow(v, wf, &path);
    }

    // dependsOn names a local workflow unless it is a $sourceDescriptions expression.
    for (idx, wf) in doc.workflows.iter().enumerate() {
        let path = format!("$.workflows[{idx}].dependsOn");
        for (didx, dep) in wf.depends_on.iter().enumerate() {
            let key = format!("[{didx}]");
            if dep.starts_with("$sourceDescriptions.") {
                validate_runtime_expr(v, &path, &key, dep);
                continue;
            }
            if !workflow_ids.contains(dep.as_str()) {
                v.push(
                    &path,
                    &key,
                    "must name a local workflowId or a $sourceDescriptions.* expression",
                );
            }
        }
    }

    if let Some(c) = &doc.components {
        components::validate_components(v, c);
    }
}
