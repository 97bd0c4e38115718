use std::fmt;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scalar value carried by a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ResponseValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ResponseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResponseValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ResponseValue::Int(value) => Some(*value),
            ResponseValue::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            ResponseValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ResponseValue::Int(value) => Some(*value as f64),
            ResponseValue::Float(value) => Some(*value),
            ResponseValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Equality used when matching a requested value against template candidates.
    ///
    /// Integers and floats compare numerically; every other pairing requires the
    /// same variant.
    pub fn matches(&self, other: &ResponseValue) -> bool {
        match (self, other) {
            (ResponseValue::Int(a), ResponseValue::Float(b))
            | (ResponseValue::Float(b), ResponseValue::Int(a)) => (*a as f64) == *b,
            _ => self == other,
        }
    }

    /// Render the value as a CSV cell.
    pub fn to_csv(&self) -> String {
        match self {
            ResponseValue::Null => String::new(),
            ResponseValue::Bool(value) => value.to_string(),
            ResponseValue::Int(value) => value.to_string(),
            ResponseValue::Float(value) => value.to_string(),
            ResponseValue::Text(value) => value.clone(),
        }
    }
}

impl fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseValue::Null => f.write_str("null"),
            other => f.write_str(&other.to_csv()),
        }
    }
}

impl From<i64> for ResponseValue {
    fn from(value: i64) -> Self {
        ResponseValue::Int(value)
    }
}

impl From<i32> for ResponseValue {
    fn from(value: i32) -> Self {
        ResponseValue::Int(i64::from(value))
    }
}

impl From<f64> for ResponseValue {
    fn from(value: f64) -> Self {
        ResponseValue::Float(value)
    }
}

impl From<bool> for ResponseValue {
    fn from(value: bool) -> Self {
        ResponseValue::Bool(value)
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        ResponseValue::Text(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

/// The response chosen for one variable of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub name: String,
    pub value: ResponseValue,
}

impl Response {
    pub fn new(name: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One synthetic row: variable name to chosen response, in template order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    responses: IndexMap<String, Response>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            responses: IndexMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, variable: &str) -> Option<&Response> {
        self.responses.get(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.responses.contains_key(variable)
    }

    /// Set the response for a variable, returning the previous one.
    pub fn insert(&mut self, variable: impl Into<String>, response: Response) -> Option<Response> {
        self.responses.insert(variable.into(), response)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Response)> {
        self.responses.iter()
    }

    /// Copy of the record holding only the listed variables.
    ///
    /// Variables the record does not carry are skipped.
    pub fn restrict<'a, I>(&self, variables: I) -> Record
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut view = Record::new();
        for variable in variables {
            if let Some(response) = self.responses.get(variable) {
                view.insert(variable.clone(), response.clone());
            }
        }
        view
    }

    /// Finalize the record into its values, dropping response names.
    pub fn into_values(self) -> IndexMap<String, ResponseValue> {
        self.responses
            .into_iter()
            .map(|(variable, response)| (variable, response.value))
            .collect()
    }
}

impl FromIterator<(String, Response)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Response)>>(iter: T) -> Self {
        Self {
            responses: iter.into_iter().collect(),
        }
    }
}

/// Requested change for one variable, as returned by a relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_value: Option<ResponseValue>,
}

impl Modification {
    /// Select the template candidate with this response name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            response_name: Some(name.into()),
            response_value: None,
        }
    }

    /// Select the template candidate with this response value.
    pub fn valued(value: impl Into<ResponseValue>) -> Self {
        Self {
            response_name: None,
            response_value: Some(value.into()),
        }
    }

    /// Use this name and value verbatim, without template lookup.
    pub fn exact(name: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        Self {
            response_name: Some(name.into()),
            response_value: Some(value.into()),
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.response_name, &self.response_value) {
            (Some(name), Some(value)) => write!(f, "{{response_name: {name}, response_value: {value}}}"),
            (Some(name), None) => write!(f, "{{response_name: {name}}}"),
            (None, Some(value)) => write!(f, "{{response_value: {value}}}"),
            (None, None) => f.write_str("{}"),
        }
    }
}

/// Modifications returned by one relationship invocation, keyed by variable.
pub type Modifications = IndexMap<String, Modification>;
