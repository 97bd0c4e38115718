use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cdesynth_core::UdfCall;

use crate::errors::{PlanError, UdfError};

/// Positional and keyword arguments bound to a UDF or relationship call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }

    pub fn keyword(kwargs: Map<String, Value>) -> Self {
        Self {
            args: Vec::new(),
            kwargs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Argument by keyword, falling back to its position. `null` counts as absent.
    pub fn get(&self, index: usize, key: &str) -> Option<&Value> {
        self.kwargs
            .get(key)
            .or_else(|| self.args.get(index))
            .filter(|value| !value.is_null())
    }

    pub fn require(&self, index: usize, key: &str) -> Result<&Value, UdfError> {
        self.get(index, key)
            .ok_or_else(|| UdfError::MissingArgument(key.to_string()))
    }

    pub fn require_i64(&self, index: usize, key: &str) -> Result<i64, UdfError> {
        let value = self.require(index, key)?;
        value.as_i64().ok_or_else(|| UdfError::InvalidArgument {
            name: key.to_string(),
            message: format!("expected integer, got {value}"),
        })
    }

    pub fn i64_or(&self, index: usize, key: &str, default: i64) -> Result<i64, UdfError> {
        match self.get(index, key) {
            Some(_) => self.require_i64(index, key),
            None => Ok(default),
        }
    }

    pub fn require_f64(&self, index: usize, key: &str) -> Result<f64, UdfError> {
        let value = self.require(index, key)?;
        value.as_f64().ok_or_else(|| UdfError::InvalidArgument {
            name: key.to_string(),
            message: format!("expected number, got {value}"),
        })
    }

    pub fn f64_or(&self, index: usize, key: &str, default: f64) -> Result<f64, UdfError> {
        match self.get(index, key) {
            Some(_) => self.require_f64(index, key),
            None => Ok(default),
        }
    }

    /// Deserialize a structured argument.
    pub fn parse<T: DeserializeOwned>(&self, index: usize, key: &str) -> Result<T, UdfError> {
        let value = self.require(index, key)?;
        serde_json::from_value(value.clone()).map_err(|err| UdfError::InvalidArgument {
            name: key.to_string(),
            message: err.to_string(),
        })
    }
}

impl From<&UdfCall> for CallArgs {
    fn from(call: &UdfCall) -> Self {
        Self {
            args: call.args.clone(),
            kwargs: call.kwargs.clone(),
        }
    }
}

/// Reference to a registered relationship plus invocation-time arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSpec {
    pub name: String,
    #[serde(flatten)]
    pub call: CallArgs,
}

impl RelationshipSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call: CallArgs::default(),
        }
    }

    pub fn with_args(name: impl Into<String>, call: CallArgs) -> Self {
        Self {
            name: name.into(),
            call,
        }
    }
}

/// Relationship configuration document.
///
/// ```yaml
/// relationships:
///   - name: no_consent
///   - name: age_associated_diseases
///     kwargs:
///       config: { ... }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(default)]
    pub relationships: Vec<RelationshipSpec>,
    /// Legacy path of the module that defined the relationships. Unused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl RelationshipConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, PlanError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_yaml_path(path: &Path) -> Result<Self, PlanError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

/// Load and concatenate the relationship specs of several files, in order.
pub fn load_relationship_specs(paths: &[PathBuf]) -> Result<Vec<RelationshipSpec>, PlanError> {
    let mut specs = Vec::new();
    for path in paths {
        let config = RelationshipConfig::from_yaml_path(path)?;
        tracing::debug!(
            path = %path.display(),
            relationships = config.relationships.len(),
            "relationship config loaded"
        );
        specs.extend(config.relationships);
    }
    Ok(specs)
}
