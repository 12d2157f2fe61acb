use crate::types::{Extensions, RuntimeExpression};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownCriterionType {
    Simple,
    Regex,
    Jsonpath,
    Xpath,
}

impl KnownCriterionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "simple" => Some(Self::Simple),
            "regex" => Some(Self::Regex),
            "jsonpath" => Some(Self::Jsonpath),
            "xpath" => Some(Self::Xpath),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionExpressionLanguage {
    Jsonpath,
    Xpath,
}

/// `{ type, version }` object form of a criterion type, naming the expression dialect.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CriterionExpressionType {
    pub r#type: CriterionExpressionLanguage,
    pub version: String,

    #[serde(flatten)]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum CriterionType {
    Known(KnownCriterionType),
    Custom(CriterionExpressionType),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Criterion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RuntimeExpression>,

    pub condition: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<CriterionType>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Criterion {
    /// A bare condition evaluated with the simple grammar.
    pub fn simple(condition: impl Into<String>) -> Self {
        Self {
            context: None,
            condition: condition.into(),
            r#type: None,
            extensions: Extensions::new(),
        }
    }

    /// Effective evaluation kind; an absent type means `simple`.
    pub fn kind(&self) -> KnownCriterionType {
        match &self.r#type {
            None => KnownCriterionType::Simple,
            Some(CriterionType::Known(k)) => *k,
            Some(CriterionType::Custom(c)) => match c.r#type {
                CriterionExpressionLanguage::Jsonpath => KnownCriterionType::Jsonpath,
                CriterionExpressionLanguage::Xpath => KnownCriterionType::Xpath,
            },
        }
    }

    pub fn dialect_version(&self) -> Option<&str> {
        match &self.r#type {
            Some(CriterionType::Custom(c)) => Some(c.version.as_str()),
            _ => None,
        }
    }
}
