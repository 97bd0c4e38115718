use thiserror::Error;

/// Errors emitted while evaluating a generated dataset.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("variable '{0}' is not a column of the dataset")]
    UnknownVariable(String),
    #[error("invalid field selector '{0}': expected VARIABLE or VARIABLE=VALUE")]
    InvalidSelector(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
