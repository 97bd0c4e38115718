use thiserror::Error;

use cdesynth_plan::PlanError;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("template error: {0}")]
    Core(#[from] cdesynth_core::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("relationship '{relationship}' failed on record {record}: {source}")]
    Relationship {
        relationship: String,
        record: usize,
        #[source]
        source: PlanError,
    },
    #[error(
        "relationship '{relationship}' requested {modification} for variable '{variable}' on record {record}, which matches no response"
    )]
    UnresolvableModification {
        relationship: String,
        variable: String,
        modification: String,
        record: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
