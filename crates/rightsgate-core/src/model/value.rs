//! Dynamic values stored in conditions, effect metadata and request metadata.
//!
//! Stored policies carry heterogeneous JSON values. They are kept as an
//! explicit tagged union so comparisons stay typed where both sides are
//! numbers, and fall back to the string rendering everywhere else.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Untyped value decoded from a stored policy or supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<DynamicValue>),
    Map(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Total ordering used by comparison operators.
    ///
    /// Two numbers compare numerically. Any other pairing (including a
    /// number against a numeric-looking string) compares the string
    /// renderings lexicographically, so `"10" < "9"` still holds there.
    pub fn compare(&self, other: &DynamicValue) -> Ordering {
        if let (DynamicValue::Number(a), DynamicValue::Number(b)) = (self, other) {
            if let Some(ord) = a.partial_cmp(b) {
                return ord;
            }
        }
        self.to_string().cmp(&other.to_string())
    }
}

fn as_integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INT {
        // Exact: magnitude checked above.
        Some(n as i64)
    } else {
        None
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Null => f.write_str("null"),
            DynamicValue::Bool(b) => write!(f, "{b}"),
            DynamicValue::Number(n) => match as_integral(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            DynamicValue::String(s) => f.write_str(s),
            DynamicValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            DynamicValue::Map(map) => {
                f.write_str("map[")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Null => serializer.serialize_unit(),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::Number(n) => match as_integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            DynamicValue::String(s) => serializer.serialize_str(s),
            DynamicValue::List(items) => items.serialize(serializer),
            DynamicValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        DynamicValue::String(v.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        DynamicValue::String(v)
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        DynamicValue::Bool(v)
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Number(v)
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        DynamicValue::Number(v as f64)
    }
}

impl From<u64> for DynamicValue {
    fn from(v: u64) -> Self {
        DynamicValue::Number(v as f64)
    }
}

impl From<u32> for DynamicValue {
    fn from(v: u32) -> Self {
        DynamicValue::Number(f64::from(v))
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(v: Vec<T>) -> Self {
        DynamicValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
