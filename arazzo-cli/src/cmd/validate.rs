use std::path::Path;

use arazzo_core::{Diagnostic, DiagnosticKind};
use serde::Serialize;

use super::config::load_document;
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::{OutputArgs, ParseArgs};

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<DiagnosticEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<DiagnosticEntry>,
}

#[derive(Serialize)]
struct DiagnosticEntry {
    kind: &'static str,
    path: String,
    message: String,
}

impl From<&Diagnostic> for DiagnosticEntry {
    fn from(d: &Diagnostic) -> Self {
        let message = match &d.kind {
            DiagnosticKind::Warning(reason) => reason.clone(),
            _ => d.to_string(),
        };
        Self {
            kind: d.kind.name(),
            path: d.path(),
            message,
        }
    }
}

pub fn validate_cmd(path: &Path, parse: &ParseArgs, output: OutputArgs) -> i32 {
    let outcome = match load_document(path, parse, &output) {
        Ok(o) => o,
        Err(code) => return code,
    };

    let (errors, warnings): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
        outcome.diagnostics.iter().partition(|d| d.is_error());
    let result = ValidateResult {
        valid: outcome.valid,
        errors: errors.iter().copied().map(DiagnosticEntry::from).collect(),
        warnings: warnings.iter().copied().map(DiagnosticEntry::from).collect(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        for w in &result.warnings {
            eprintln!("warning: {}: {}", w.path, w.message);
        }
        if result.valid {
            println!("ok: valid Arazzo document");
        } else {
            eprintln!("error: validation failed ({} errors)", result.errors.len());
            for e in &result.errors {
                eprintln!("- {}", e.message);
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}
