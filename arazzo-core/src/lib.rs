#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod expressions;
pub mod parser;
pub mod reference;
pub mod types;
pub mod validate;

pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use crate::error::{ArazzoError, InvalidDocument, ParseError};
pub use crate::parser::{
    load_document_str, parse, parse_str, DocumentFormat, ParseOptions, ParseOutcome,
};
pub use crate::reference::{
    parse_component_ref, resolve_failure_action, resolve_parameter, resolve_success_action,
    ComponentPool, ComponentRef, ReferenceError,
};
pub use crate::types::ArazzoDocument;
pub use crate::validate::validate_document;
