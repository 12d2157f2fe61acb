use std::collections::BTreeMap;

use crate::types::{
    Extensions, FailureActionOrReusable, JsonSchema, ParameterOrReusable, SuccessActionOrReusable,
};

/// Reusable pools addressed by `$components.<pool>.<name>` or `#/components/<pool>/<name>`.
///
/// Pool entries may themselves be reusable objects pointing at another entry of the same pool.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Components {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, JsonSchema>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterOrReusable>,

    #[serde(rename = "successActions", skip_serializing_if = "BTreeMap::is_empty")]
    pub success_actions: BTreeMap<String, SuccessActionOrReusable>,

    #[serde(rename = "failureActions", skip_serializing_if = "BTreeMap::is_empty")]
    pub failure_actions: BTreeMap<String, FailureActionOrReusable>,

    #[serde(flatten)]
    pub extensions: Extensions,
}
