//! Workflow execution: runtime expressions, criteria, requests and the step loop.

mod actions;
mod context;
mod criteria;
pub mod events;
pub mod http;
mod orchestrator;
mod payload;
mod request;
mod resolver;
mod result;
mod step_runner;
mod types;

pub(crate) use context::header_ci;

pub use actions::StepAction;
pub use context::{ExecutionContext, HttpExchange};
pub use criteria::{evaluate, evaluate_all, CriterionError};
pub use events::{Event, EventSink, NoOpEventSink, RunStatus, TracingEventSink};
pub use http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use orchestrator::Executor;
pub use payload::{apply_replacements, PayloadError};
pub use request::RequestError;
pub use resolver::{ResolveError, Resolver};
pub use result::{ExecutionError, ExecutionErrorKind, RunReport, StepRecord};
pub use step_runner::{StepExecutor, StepOutcome};
pub use types::ExecutorConfig;
