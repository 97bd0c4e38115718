//! Record generation for cdesynth.
//!
//! This crate draws weighted responses from a template, applies the planned
//! relationships, and writes the finalized dataset as CSV. It also ships the
//! built-in UDFs and relationship library.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod library;
pub mod model;
pub mod output;
pub mod udfs;

pub use engine::{GenerationEngine, resolve_row_count};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GeneratedDataset, GenerationReport};

use cdesynth_plan::Registry;

/// Registry holding every built-in UDF and relationship.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    udfs::register_builtin(&mut registry);
    library::register_builtin(&mut registry);
    registry
}
