use std::path::Path;

use serde::Serialize;

use super::config::load_document;
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{OutputArgs, ParseArgs};

#[derive(Serialize)]
struct WorkflowInfo {
    workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    step_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

#[derive(Serialize)]
struct WorkflowsResult {
    valid: bool,
    workflows: Vec<WorkflowInfo>,
}

pub fn workflows_cmd(path: &Path, parse: &ParseArgs, output: OutputArgs) -> i32 {
    let outcome = match load_document(path, parse, &output) {
        Ok(o) => o,
        Err(code) => return code,
    };
    let Some(document) = outcome.document.as_ref() else {
        print_error(output.format, output.quiet, "document root is not an object");
        return exit_codes::VALIDATION_FAILED;
    };

    let workflows: Vec<WorkflowInfo> = document
        .workflows
        .iter()
        .map(|w| WorkflowInfo {
            workflow_id: w.workflow_id.clone(),
            summary: w.summary.clone(),
            description: w.description.clone(),
            step_count: w.steps.len(),
            depends_on: w.depends_on.clone(),
        })
        .collect();

    let result = WorkflowsResult {
        valid: outcome.valid,
        workflows,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Workflows in {}:", path.display());
        for w in &result.workflows {
            println!("  - {} ({} steps)", w.workflow_id, w.step_count);
            if let Some(s) = &w.summary {
                println!("    {s}");
            }
            if !w.depends_on.is_empty() {
                println!("    depends on: {}", w.depends_on.join(", "));
            }
        }
        if !result.valid {
            eprintln!("warning: document has validation errors; run `arazzo validate` for details");
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
