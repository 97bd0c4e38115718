use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value::ResponseValue;

/// Generation template: the response candidates of every variable.
///
/// Variables keep the order in which the document declares them; that order
/// becomes the header of the generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    /// Number of records to generate. May be overridden by the caller.
    #[serde(default)]
    pub row_count: Option<u64>,
    /// Output path for the generated dataset.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Seed for the random generator, for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Relationship configuration file(s) used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<RelationshipFiles>,
    /// Variable name to its ordered list of response candidates.
    pub variables: IndexMap<String, Vec<ResponseCandidate>>,
}

impl Template {
    /// Parse a template from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load a template from a YAML file.
    pub fn from_yaml_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Candidates declared for a variable.
    pub fn responses(&self, variable: &str) -> Option<&[ResponseCandidate]> {
        self.variables.get(variable).map(Vec::as_slice)
    }

    /// Variable names in declaration order.
    pub fn header(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }
}

/// One or many relationship configuration paths.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RelationshipFiles {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl RelationshipFiles {
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            RelationshipFiles::One(path) => vec![path.clone()],
            RelationshipFiles::Many(paths) => paths.clone(),
        }
    }
}

/// One possible response of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseCandidate {
    pub response_name: String,
    /// Literal value. Ignored when a generator is configured.
    #[serde(default)]
    pub response_value: ResponseValue,
    /// How to synthesize the value for each draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_value_generator: Option<ValueGenerator>,
    /// Selection weight in [0, 1]. `null` shares the remaining mass evenly.
    #[serde(default)]
    pub frequency: Option<f64>,
}

impl ResponseCandidate {
    pub fn new(
        response_name: impl Into<String>,
        response_value: impl Into<ResponseValue>,
        frequency: Option<f64>,
    ) -> Self {
        Self {
            response_name: response_name.into(),
            response_value: response_value.into(),
            response_value_generator: None,
            frequency,
        }
    }

    pub fn with_generator(mut self, generator: ValueGenerator) -> Self {
        self.response_value_generator = Some(generator);
        self
    }

    /// Generator that will actually be used, if any.
    pub fn generator(&self) -> Option<&ValueGenerator> {
        self.response_value_generator
            .as_ref()
            .filter(|generator| generator.is_configured())
    }
}

/// Value synthesis options. The first configured entry wins, in the order
/// `udf`, `lorem`, `range`, `valid_inputs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValueGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udf: Option<UdfCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lorem: Option<LoremSpec>,
    /// Inclusive integer bounds `[min, max]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_inputs: Option<Vec<ResponseValue>>,
}

/// Resolved generator choice after applying priority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneratorKind<'a> {
    Udf(&'a UdfCall),
    Lorem(&'a LoremSpec),
    Range(&'a [i64]),
    ValidInputs(&'a [ResponseValue]),
}

impl ValueGenerator {
    pub fn kind(&self) -> Option<GeneratorKind<'_>> {
        if let Some(udf) = &self.udf {
            return Some(GeneratorKind::Udf(udf));
        }
        if let Some(lorem) = &self.lorem {
            return Some(GeneratorKind::Lorem(lorem));
        }
        if let Some(range) = self.range.as_deref().filter(|range| !range.is_empty()) {
            return Some(GeneratorKind::Range(range));
        }
        self.valid_inputs
            .as_deref()
            .filter(|inputs| !inputs.is_empty())
            .map(GeneratorKind::ValidInputs)
    }

    pub fn is_configured(&self) -> bool {
        self.kind().is_some()
    }
}

/// Invocation of a registered user-defined function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UdfCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

/// Lorem ipsum text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoremSpec {
    /// Inclusive `[min, max]` number of sentences.
    pub num_sentences: [u32; 2],
    /// Inclusive `[min, max]` words per sentence.
    pub sentence_length: [u32; 2],
}
