//! Policy conditions: a flat, ordered list of field/operator/value tests.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::value::DynamicValue;

/// Comparison operator of a condition.
///
/// Operators this engine does not know decode into [`Operator::Unknown`]
/// rather than failing the whole policy; they simply never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    Contains,
    Regex,
    Unknown(String),
}

impl Operator {
    pub fn parse(s: &str) -> Self {
        match s {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "gt" => Operator::Gt,
            "lt" => Operator::Lt,
            "gte" => Operator::Gte,
            "lte" => Operator::Lte,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "regex" => Operator::Regex,
            other => Operator::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::Regex => "regex",
            Operator::Unknown(s) => s,
        }
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Unknown(String::new())
    }
}

impl From<Option<String>> for Operator {
    fn from(s: Option<String>) -> Self {
        s.map_or_else(Operator::default, |s| Operator::parse(&s))
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_owned()
    }
}

/// How a condition's result combines with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl From<Option<String>> for Logic {
    fn from(s: Option<String>) -> Self {
        // Anything but an explicit "or" chains with AND.
        match s.as_deref() {
            Some("or") => Logic::Or,
            _ => Logic::And,
        }
    }
}

impl From<Logic> for &'static str {
    fn from(logic: Logic) -> Self {
        match logic {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

/// One stored test against the request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Fixed context attribute name, or a metadata key.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub field: String,
    /// A missing operator decodes as unknown and never matches.
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: DynamicValue,
    #[serde(default)]
    pub logic: Logic,
    /// Compiled pattern for `regex` conditions with a string value.
    #[serde(skip)]
    pattern: Option<Regex>,
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<DynamicValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            logic: Logic::And,
            pattern: None,
        }
        .prepared()
    }

    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    /// Compile derived state once after decoding.
    ///
    /// An invalid pattern leaves no compiled regex; the condition then never
    /// matches instead of rejecting the policy.
    pub fn prepared(mut self) -> Self {
        self.pattern = match (&self.operator, &self.value) {
            (Operator::Regex, DynamicValue::String(p)) => match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::debug!(field = %self.field, error = %e, "invalid regex pattern in condition");
                    None
                }
            },
            _ => None,
        };
        self
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.operator == other.operator
            && self.value == other.value
            && self.logic == other.logic
    }
}

/// Decode a stored `conditions` blob.
///
/// Empty text and JSON `null` both mean "no conditions" (always matches).
pub fn decode_conditions(raw: &str) -> serde_json::Result<Vec<Condition>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let conditions: Option<Vec<Condition>> = serde_json::from_str(raw)?;
    Ok(conditions
        .unwrap_or_default()
        .into_iter()
        .map(Condition::prepared)
        .collect())
}
