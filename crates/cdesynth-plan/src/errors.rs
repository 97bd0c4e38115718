use thiserror::Error;

/// Failure raised by a UDF or relationship function body.
#[derive(Debug, Error)]
pub enum UdfError {
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },
    /// The function read a variable outside its input view.
    #[error("variable '{0}' is not visible in the relationship input")]
    MissingVariable(String),
    /// A stateful function has no values left to hand out.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("{0}")]
    Other(String),
}

/// Errors emitted while registering, planning or invoking relationships.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unknown udf '{0}'")]
    UnknownUdf(String),
    #[error("unknown relationship '{0}'")]
    UnknownRelationship(String),
    #[error("cyclic relationship dependencies between variables: {}", .variables.join(", "))]
    CyclicDependency { variables: Vec<String> },
    #[error(
        "relationship '{relationship}' modified variable '{variable}' which is not in its modifies set"
    )]
    UnauthorizedModification {
        relationship: String,
        variable: String,
    },
    #[error("udf '{name}' failed: {source}")]
    Udf {
        name: String,
        #[source]
        source: UdfError,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PlanError {
    /// True when a stateful UDF ran out of values.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            PlanError::Udf {
                source: UdfError::ResourceExhausted(_),
                ..
            }
        )
    }
}

/// Result type for planning operations.
pub type PlanResult<T> = std::result::Result<T, PlanError>;
