#![forbid(unsafe_code)]

//! Runtime engine for executing Arazzo workflows.
//!
//! Parsing and validation live in `arazzo-core`; this crate loads source descriptions,
//! resolves operations and drives workflows over HTTP.

pub mod executor;
pub mod openapi;
pub mod retry;
pub mod sources;

pub use crate::executor::{
    EventSink, ExecutionError, ExecutionErrorKind, Executor, ExecutorConfig, HttpClient,
    ReqwestHttpClient, RunReport,
};
pub use crate::sources::{SourceError, SourceOverrides, SourceRegistry};
