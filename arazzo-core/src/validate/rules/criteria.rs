use crate::types::{Criterion, CriterionExpressionLanguage, CriterionType, KnownCriterionType};
use crate::validate::rules::common::validate_runtime_expr;
use crate::validate::validator::Validator;

const JSONPATH_VERSIONS: [&str; 1] = ["draft-goessner-dispatch-jsonpath-00"];
const XPATH_VERSIONS: [&str; 3] = ["xpath-30", "xpath-20", "xpath-10"];

pub(crate) fn validate_criteria_list(v: &mut Validator<'_>, path: &str, criteria: &[Criterion]) {
    for (idx, c) in criteria.iter().enumerate() {
        let ipath = format!("{path}[{idx}]");

        if c.condition.trim().is_empty() {
            v.push(&ipath, "condition", "must not be empty");
        }

        let requires_context = c.kind() != KnownCriterionType::Simple;
        if requires_context && c.context.as_deref().map_or(true, |s| s.trim().is_empty()) {
            v.push(&ipath, "context", "must be provided when type is regex, jsonpath or xpath");
        }

        if let Some(ctx) = &c.context {
            validate_runtime_expr(v, &ipath, "context", ctx);
        }

        if let Some(CriterionType::Custom(custom)) = &c.r#type {
            let tpath = format!("{ipath}.type");
            match custom.r#type {
                CriterionExpressionLanguage::Jsonpath => {
                    if !JSONPATH_VERSIONS.contains(&custom.version.as_str()) {
                        v.push(
                            &tpath,
                            "version",
                            "unsupported jsonpath version (expected draft-goessner-dispatch-jsonpath-00)",
                        );
                    }
                }
                CriterionExpressionLanguage::Xpath => {
                    if !XPATH_VERSIONS.contains(&custom.version.as_str()) {
                        v.push(
                            &tpath,
                            "version",
                            "unsupported xpath version (expected xpath-30, xpath-20 or xpath-10)",
                        );
                    }
                }
            }
        }
    }
}
