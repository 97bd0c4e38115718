use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use cdesynth_core::ResponseValue;

/// Options for the generation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Seed for the run. Falls back to the template seed, then to entropy.
    pub seed: Option<u64>,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub rows: u64,
    pub variables: usize,
    /// Relationship names in execution order.
    pub plan: Vec<String>,
    /// Invocations that produced at least one modification, per relationship.
    pub relationship_usage: BTreeMap<String, u64>,
    /// Draws resolved through a generator, per generator kind.
    pub generator_usage: BTreeMap<String, u64>,
    pub modifications_applied: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, rows: u64, variables: usize) -> Self {
        Self {
            run_id,
            seed,
            rows,
            variables,
            plan: Vec::new(),
            relationship_usage: BTreeMap::new(),
            generator_usage: BTreeMap::new(),
            modifications_applied: 0,
            duration_ms: 0,
        }
    }

    pub fn record_relationship_usage(&mut self, name: &str) {
        *self.relationship_usage.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_generator_usage(&mut self, kind: &str) {
        *self.generator_usage.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn record_modifications(&mut self, count: usize) {
        self.modifications_applied += count as u64;
    }
}

/// Output of a generation run: finalized rows in template variable order.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    pub header: Vec<String>,
    pub rows: Vec<IndexMap<String, ResponseValue>>,
    pub report: GenerationReport,
}

impl GeneratedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one variable, in row order.
    pub fn column(&self, variable: &str) -> Vec<&ResponseValue> {
        self.rows
            .iter()
            .filter_map(|row| row.get(variable))
            .collect()
    }
}
