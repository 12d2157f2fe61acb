//! Semantic rules run after the structural parse.

mod rules;
mod validator;

use crate::diagnostics::Diagnostics;
use crate::types::ArazzoDocument;
use validator::Validator;


/// Checks a parsed document, adding `invalid`, `unique` and `warning` diagnostics to `out`.
pub fn validate_into(doc: &ArazzoDocument, out: &mut Diagnostics) {
    let mut v = Validator::new(out, doc);
    rules::document::validate_document(&mut v, doc);
}

/// Runs the semantic rules alone, for documents built in code.
pub fn validate_document(doc: &ArazzoDocument) -> Diagnostics {
    let mut out = Diagnostics::new();
    validate_into(doc, &mut out);
    out
}
