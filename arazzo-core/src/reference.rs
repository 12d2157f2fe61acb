//! Reusable-object references into `components`.
//!
//! A reference is either the runtime-expression form `$components.<pool>.<name>` or the
//! pointer form `#/components/<pool>/<name>`. Pool entries may alias other entries of the
//! same pool; chains are followed until a concrete object is found.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::expressions::unescape_token;
use crate::types::{
    Components, FailureAction, FailureActionOrReusable, Parameter, ParameterOrReusable,
    ReusableObject, SuccessAction, SuccessActionOrReusable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentPool {
    Inputs,
    Parameters,
    SuccessActions,
    FailureActions,
}

impl ComponentPool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inputs" => Some(Self::Inputs),
            "parameters" => Some(Self::Parameters),
            "successActions" => Some(Self::SuccessActions),
            "failureActions" => Some(Self::FailureActions),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inputs => "inputs",
            Self::Parameters => "parameters",
            Self::SuccessActions => "successActions",
            Self::FailureActions => "failureActions",
        }
    }
}

impl fmt::Display for ComponentPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    pub pool: ComponentPool,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("`{0}` is not a components reference")]
    Malformed(String),
    #[error("`{reference}` must point into components.{expected}")]
    WrongPool {
        reference: String,
        expected: ComponentPool,
    },
    #[error("`{0}` cannot be resolved: the document has no components")]
    NoComponents(String),
    #[error("`{0}` does not name an existing component")]
    NotFound(String),
    #[error("reference cycle: {0}")]
    Cycle(String),
}

pub fn parse_component_ref(reference: &str) -> Result<ComponentRef, ReferenceError> {
    let reference = reference.trim();
    let (pool, name) = if let Some(rest) = reference.strip_prefix("$components.") {
        rest.split_once('.')
            .map(|(p, n)| (p.to_string(), n.to_string()))
    } else if let Some(rest) = reference.strip_prefix("#/components/") {
        rest.split_once('/')
            .map(|(p, n)| (unescape_token(p), unescape_token(n)))
    } else {
        None
    }
    .ok_or_else(|| ReferenceError::Malformed(reference.to_string()))?;

    let pool = ComponentPool::from_name(&pool)
        .ok_or_else(|| ReferenceError::Malformed(reference.to_string()))?;
    if name.is_empty() || name.contains('/') {
        return Err(ReferenceError::Malformed(reference.to_string()));
    }
    Ok(ComponentRef { pool, name })
}

/// Something a pool entry can be: either the concrete object or an alias to another entry.
trait PoolEntry: Clone {
    type Concrete: Clone;
    fn split(&self) -> Result<&Self::Concrete, &ReusableObject>;
}

impl PoolEntry for ParameterOrReusable {
    type Concrete = Parameter;
    fn split(&self) -> Result<&Parameter, &ReusableObject> {
        match self {
            ParameterOrReusable::Parameter(p) => Ok(p),
            ParameterOrReusable::Reusable(r) => Err(r),
        }
    }
}

impl PoolEntry for SuccessActionOrReusable {
    type Concrete = SuccessAction;
    fn split(&self) -> Result<&SuccessAction, &ReusableObject> {
        match self {
            SuccessActionOrReusable::Action(a) => Ok(a),
            SuccessActionOrReusable::Reusable(r) => Err(r),
        }
    }
}

impl PoolEntry for FailureActionOrReusable {
    type Concrete = FailureAction;
    fn split(&self) -> Result<&FailureAction, &ReusableObject> {
        match self {
            FailureActionOrReusable::Action(a) => Ok(a),
            FailureActionOrReusable::Reusable(r) => Err(r),
        }
    }
}

/// Follows `start` through `pool`, returning the concrete entry and the first `value`
/// override seen along the chain.
fn follow<'c, E: PoolEntry>(
    pool: &'c BTreeMap<String, E>,
    expected: ComponentPool,
    start: &ReusableObject,
) -> Result<(&'c E::Concrete, Option<serde_json::Value>), ReferenceError> {
    let mut visiting = HashSet::new();
    let mut chain = Vec::new();
    let mut current = start;
    let mut override_value = start.value.clone();

    loop {
        let target = parse_component_ref(&current.reference)?;
        if target.pool != expected {
            return Err(ReferenceError::WrongPool {
                reference: current.reference.clone(),
                expected,
            });
        }
        chain.push(target.name.clone());
        if !visiting.insert(target.name.clone()) {
            return Err(ReferenceError::Cycle(chain.join(" -> ")));
        }
        let entry = pool
            .get(&target.name)
            .ok_or_else(|| ReferenceError::NotFound(current.reference.clone()))?;
        match entry.split() {
            Ok(concrete) => return Ok((concrete, override_value)),
            Err(alias) => {
                if override_value.is_none() {
                    override_value = alias.value.clone();
                }
                current = alias;
            }
        }
    }
}

fn components_for<'c>(
    components: Option<&'c Components>,
    reference: &ReusableObject,
) -> Result<&'c Components, ReferenceError> {
    components.ok_or_else(|| ReferenceError::NoComponents(reference.reference.clone()))
}

/// Resolves a parameter entry; a reusable object's `value` replaces the component's value.
pub fn resolve_parameter(
    components: Option<&Components>,
    item: &ParameterOrReusable,
) -> Result<Parameter, ReferenceError> {
    match item {
        ParameterOrReusable::Parameter(p) => Ok(p.clone()),
        ParameterOrReusable::Reusable(r) => {
            let c = components_for(components, r)?;
            let (param, value) = follow(&c.parameters, ComponentPool::Parameters, r)?;
            let mut param = param.clone();
            if let Some(value) = value {
                param.value = value;
            }
            Ok(param)
        }
    }
}

pub fn resolve_success_action(
    components: Option<&Components>,
    item: &SuccessActionOrReusable,
) -> Result<SuccessAction, ReferenceError> {
    match item {
        SuccessActionOrReusable::Action(a) => Ok(a.clone()),
        SuccessActionOrReusable::Reusable(r) => {
            let c = components_for(components, r)?;
            follow(&c.success_actions, ComponentPool::SuccessActions, r).map(|(a, _)| a.clone())
        }
    }
}

pub fn resolve_failure_action(
    components: Option<&Components>,
    item: &FailureActionOrReusable,
) -> Result<FailureAction, ReferenceError> {
    match item {
        FailureActionOrReusable::Action(a) => Ok(a.clone()),
        FailureActionOrReusable::Reusable(r) => {
            let c = components_for(components, r)?;
            follow(&c.failure_actions, ComponentPool::FailureActions, r).map(|(a, _)| a.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reusable(reference: &str, value: Option<serde_json::Value>) -> ReusableObject {
        ReusableObject {
            reference: reference.to_string(),
            value,
        }
    }

    fn param(name: &str, value: serde_json::Value) -> ParameterOrReusable {
        ParameterOrReusable::Parameter(Parameter {
            name: name.to_string(),
            r#in: None,
            value,
            extensions: Default::default(),
        })
    }

    #[test]
    fn both_reference_forms_parse() {
        let a = parse_component_ref("$components.parameters.page").unwrap();
        let b = parse_component_ref("#/components/parameters/page").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pool, ComponentPool::Parameters);
        assert!(parse_component_ref("$inputs.page").is_err());
        assert!(parse_component_ref("$components.widgets.page").is_err());
    }

    #[test]
    fn alias_chain_resolves_with_override() {
        let mut c = Components::default();
        c.parameters.insert("page".into(), param("page", json!(1)));
        c.parameters.insert(
            "firstPage".into(),
            ParameterOrReusable::Reusable(reusable("$components.parameters.page", None)),
        );

        let item = ParameterOrReusable::Reusable(reusable("$components.parameters.firstPage", Some(json!(7))));
        let p = resolve_parameter(Some(&c), &item).unwrap();
        assert_eq!(p.name, "page");
        assert_eq!(p.value, json!(7));
    }

    #[test]
    fn alias_cycle_is_reported() {
        let mut c = Components::default();
        c.parameters.insert(
            "a".into(),
            ParameterOrReusable::Reusable(reusable("$components.parameters.b", None)),
        );
        c.parameters.insert(
            "b".into(),
            ParameterOrReusable::Reusable(reusable("$components.parameters.a", None)),
        );
        let item = ParameterOrReusable::Reusable(reusable("$components.parameters.a", None));
        let err = resolve_parameter(Some(&c), &item).unwrap_err();
        assert_eq!(err, ReferenceError::Cycle("a -> b -> a".into()));
    }

    #[test]
    fn wrong_pool_is_rejected() {
        let c = Components::default();
        let item = SuccessActionOrReusable::Reusable(reusable("$components.parameters.x", None));
        assert!(matches!(
            resolve_success_action(Some(&c), &item),
            Err(ReferenceError::WrongPool { .. })
        ));
    }
}
