//! Core contracts and helpers for cdesynth.
//!
//! This crate defines the template model, typed response values and records,
//! the variable dependency graph, and template validation shared by the
//! planner, the generation engine and the CLI.

pub mod error;
pub mod graph;
pub mod schema;
pub mod template;
pub mod validation;
pub mod value;

pub use error::{Error, Result};
pub use graph::{DependencyGraph, GraphSummary};
pub use schema::template_json_schema;
pub use template::{
    GeneratorKind, LoremSpec, RelationshipFiles, ResponseCandidate, Template, UdfCall,
    ValueGenerator,
};
pub use validation::{
    FREQUENCY_TOLERANCE, normalize_frequencies, validate_template, validate_template_json,
};
pub use value::{Modification, Modifications, Record, Response, ResponseValue};

/// Current contract version for template documents.
pub const TEMPLATE_VERSION: &str = "0.1";
