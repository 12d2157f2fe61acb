mod actions;
mod common;
mod components;
mod criterion;
mod document;
mod info;
mod parameter;
mod request_body;
mod reusable;
mod source_description;
mod step;
mod workflow;

pub use actions::{
    FailureAction, FailureActionOrReusable, FailureActionType, SuccessAction,
    SuccessActionOrReusable, SuccessActionType,
};
pub use common::{AnyValue, Extensions, JsonSchema, RuntimeExpression};
pub use components::Components;
pub use criterion::{
    Criterion, CriterionExpressionLanguage, CriterionExpressionType, CriterionType,
    KnownCriterionType,
};
pub use document::ArazzoDocument;
pub use info::Info;
pub use parameter::{Parameter, ParameterLocation, ParameterOrReusable};
pub use request_body::{PayloadReplacement, RequestBody};
pub use reusable::ReusableObject;
pub use source_description::{SourceDescription, SourceDescriptionType};
pub use step::{Step, StepTarget};
pub use workflow::Workflow;
