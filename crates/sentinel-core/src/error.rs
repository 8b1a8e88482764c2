//! Error types for the governance engine

/// Result type alias using the engine's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for governance operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller's `ProposedAction` failed schema or type validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An evaluator failed internally; callers absorb this as a neutral score
    #[error("evaluator failure ({evaluator}): {message}")]
    EvaluatorFailure {
        evaluator: String,
        message: String,
    },

    /// A Topology/Incident store lookup failed
    #[error("lookup failure: {0}")]
    LookupFailure(String),

    /// The per-call deadline expired before the verdict could be composed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Audit log or agent registry write failed
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// Startup configuration is invalid
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Surface A admission control rejected the request
    #[error("rate limited")]
    RateLimited,

    /// IO errors surfaced while reading mock-mode store files
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build an `EvaluatorFailure` error
    pub fn evaluator_failure(evaluator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvaluatorFailure {
            evaluator: evaluator.into(),
            message: message.into(),
        }
    }

    /// Build a `LookupFailure` error
    pub fn lookup_failure(msg: impl Into<String>) -> Self {
        Self::LookupFailure(msg.into())
    }

    /// Build a `PersistenceFailure` error
    pub fn persistence_failure(msg: impl Into<String>) -> Self {
        Self::PersistenceFailure(msg.into())
    }

    /// Build a `ConfigError`
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// The evaluator name this failure originated from, if any
    pub fn evaluator_name(&self) -> Option<&str> {
        match self {
            Self::EvaluatorFailure { evaluator, .. } => Some(evaluator),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluator_failure_message_includes_name() {
        let err = Error::evaluator_failure("historical", "store unreachable");
        assert_eq!(err.evaluator_name(), Some("historical"));
        assert!(err.to_string().contains("historical"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = Error::config("weights must sum to 1.0");
        assert_eq!(err.to_string(), "configuration error: weights must sum to 1.0");
    }
}
