use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::EvalError;

/// A `VARIABLE` or `VARIABLE=VALUE` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub variable: String,
    /// Specific cell value; `None` selects every observed value.
    pub value: Option<String>,
}

impl FromStr for FieldSelector {
    type Err = EvalError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (variable, value) = match raw.split_once('=') {
            Some((variable, value)) => (variable, Some(value.to_string())),
            None => (raw, None),
        };
        if variable.is_empty() {
            return Err(EvalError::InvalidSelector(raw.to_string()));
        }
        Ok(Self {
            variable: variable.to_string(),
            value,
        })
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.variable),
            None => f.write_str(&self.variable),
        }
    }
}

/// Occurrences of every cell value, per column, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetCounts {
    pub rows: u64,
    pub columns: IndexMap<String, IndexMap<String, u64>>,
}

impl DatasetCounts {
    pub fn with_header(header: &[String]) -> Self {
        Self {
            rows: 0,
            columns: header
                .iter()
                .map(|variable| (variable.clone(), IndexMap::new()))
                .collect(),
        }
    }

    /// Count one row of `(variable, cell)` pairs.
    pub fn add_row<'a, I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        self.rows += 1;
        for (variable, cell) in cells {
            *self
                .columns
                .entry(variable.to_string())
                .or_default()
                .entry(cell)
                .or_insert(0) += 1;
        }
    }

    pub fn count(&self, variable: &str, value: &str) -> Option<u64> {
        self.columns
            .get(variable)
            .map(|values| values.get(value).copied().unwrap_or(0))
    }
}

/// Observed frequency of one value of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub variable: String,
    pub value: String,
    pub count: u64,
    /// Percentage of rows, rounded up to two decimals.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyReport {
    pub rows: u64,
    pub entries: Vec<FrequencyEntry>,
}
