//! Runtime value type shared by coercion and the entity layer.

use serde::{Deserialize, Serialize};

/// A wire value after coercion to a property's declared format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl SpecValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Convert back to the plain JSON shape used on the wire.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(v) => serde_json::json!(v),
            Self::Float(v) => serde_json::json!(v),
            Self::Bool(v) => serde_json::json!(v),
            Self::Str(v) => serde_json::json!(v),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
        }
    }
}

impl std::fmt::Display for SpecValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SpecValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SpecValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SpecValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for SpecValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for SpecValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}
