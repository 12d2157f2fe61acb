use std::collections::BTreeMap;

use serde_json::Value;

use crate::parser::actions::{parse_failure_action_item, parse_success_action_item};
use crate::parser::node::{item_key, ParseContext};
use crate::parser::workflow::{parse_parameter_item, parse_workflow};
use crate::types::{
    ArazzoDocument, Components, Info, SourceDescription, SourceDescriptionType,
};

const DOCUMENT_KEYS: &[&str] = &[
    "arazzo",
    "info",
    "sourceDescriptions",
    "workflows",
    "components",
];
const INFO_KEYS: &[&str] = &["title", "summary", "description", "version"];
const SOURCE_KEYS: &[&str] = &["name", "url", "type"];
const COMPONENTS_KEYS: &[&str] = &["inputs", "parameters", "successActions", "failureActions"];

pub(crate) fn parse_document(cx: &mut ParseContext<'_>, tree: &Value) -> Option<ArazzoDocument> {
    let node = cx.object(tree, "$", "", DOCUMENT_KEYS, true)?;

    let arazzo = node.version_str(cx, "arazzo").unwrap_or_default();

    let info = match node.required(cx, "info") {
        Some(v) => parse_info(cx, v, &node.location),
        None => None,
    }
    .unwrap_or_else(|| Info {
        title: String::new(),
        summary: None,
        description: None,
        version: String::new(),
        extensions: Default::default(),
    });

    let mut source_descriptions = Vec::new();
    if let Some(items) = node.required_array(cx, "sourceDescriptions") {
        let location = node.child("sourceDescriptions");
        for (idx, item) in items.iter().enumerate() {
            if let Some(src) = parse_source_description(cx, item, &location, &item_key(idx)) {
                source_descriptions.push(src);
            }
        }
    }

    let mut workflows = Vec::new();
    if let Some(items) = node.required_array(cx, "workflows") {
        let location = node.child("workflows");
        for (idx, item) in items.iter().enumerate() {
            if let Some(wf) = parse_workflow(cx, item, &location, &item_key(idx)) {
                workflows.push(wf);
            }
        }
    }

    let components = node
        .raw("components")
        .and_then(|v| parse_components(cx, v, &node.location));

    let extensions = node.finish(cx);

    Some(ArazzoDocument {
        arazzo,
        info,
        source_descriptions,
        workflows,
        components,
        extensions,
        source_path: None,
    })
}

fn parse_info(cx: &mut ParseContext<'_>, value: &Value, location: &str) -> Option<Info> {
    let node = cx.object(value, location, "info", INFO_KEYS, true)?;
    let title = node.required_str(cx, "title").unwrap_or_default();
    let summary = node.optional_str(cx, "summary");
    let description = node.optional_str(cx, "description");
    let version = node.version_str(cx, "version").unwrap_or_default();
    let extensions = node.finish(cx);
    Some(Info {
        title,
        summary,
        description,
        version,
        extensions,
    })
}

fn parse_source_description(
    cx: &mut ParseContext<'_>,
    value: &Value,
    location: &str,
    key: &str,
) -> Option<SourceDescription> {
    let node = cx.object(value, location, key, SOURCE_KEYS, true)?;
    let name = node.required_str(cx, "name").unwrap_or_default();
    let url = node.required_str(cx, "url").unwrap_or_default();
    let source_type = match node.optional_str(cx, "type") {
        Some(t) => SourceDescriptionType::from_name(&t).unwrap_or_else(|| {
            cx.diagnostics.invalid(
                &node.location,
                "type",
                format!("unknown source description type `{t}` (expected openapi or arazzo)"),
            );
            SourceDescriptionType::default()
        }),
        None => SourceDescriptionType::default(),
    };
    let extensions = node.finish(cx);
    Some(SourceDescription {
        name,
        url,
        source_type,
        extensions,
    })
}

fn parse_components(cx: &mut ParseContext<'_>, value: &Value, location: &str) -> Option<Components> {
    let node = cx.object(value, location, "components", COMPONENTS_KEYS, false)?;
    let mut components = Components::default();

    if let Some(map) = node.optional_object(cx, "inputs") {
        let pool = node.child("inputs");
        for (name, schema) in map {
            if schema.is_object() {
                components.inputs.insert(name.clone(), schema.clone());
            } else {
                cx.diagnostics.invalid_type(&pool, name, "object", false);
            }
        }
    }

    if let Some(map) = node.optional_object(cx, "parameters") {
        let pool = node.child("parameters");
        components.parameters = collect_pool(map, |name, v| parse_parameter_item(cx, v, &pool, name));
    }
    if let Some(map) = node.optional_object(cx, "successActions") {
        let pool = node.child("successActions");
        components.success_actions =
            collect_pool(map, |name, v| parse_success_action_item(cx, v, &pool, name));
    }
    if let Some(map) = node.optional_object(cx, "failureActions") {
        let pool = node.child("failureActions");
        components.failure_actions =
            collect_pool(map, |name, v| parse_failure_action_item(cx, v, &pool, name));
    }

    components.extensions = node.finish(cx);
    Some(components)
}

fn collect_pool<T>(
    map: &serde_json::Map<String, Value>,
    mut parse: impl FnMut(&str, &Value) -> Option<T>,
) -> BTreeMap<String, T> {
    map.iter()
        .filter_map(|(name, v)| parse(name, v).map(|item| (name.clone(), item)))
        .collect()
}
