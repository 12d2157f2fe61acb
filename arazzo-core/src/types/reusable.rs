use crate::types::{AnyValue, RuntimeExpression};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReusableObject {
    pub reference: RuntimeExpression,

    /// Overrides the referenced parameter's value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AnyValue>,
}
