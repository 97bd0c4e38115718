use thiserror::Error;

/// Core error type shared across cdesynth crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The template violates internal invariants (frequencies, generator bounds).
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    /// The template document does not match the template JSON Schema.
    #[error("template schema violation at {path}: {message}")]
    Schema { path: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by cdesynth crates.
pub type Result<T> = std::result::Result<T, Error>;
