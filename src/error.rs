use thiserror::Error;

use crate::pipeline::sanitizer::Rejection;

/// Main error type for the question answering service
#[derive(Error, Debug)]
pub enum OracleError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    // Client input errors
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    // Pipeline errors
    #[error("Text generation failed at {stage}: {reason}")]
    GenerationFailure { stage: String, reason: String },

    #[error("Generated query rejected: {0}")]
    ValidationRejected(#[from] Rejection),

    #[error("Query execution failed: {0}")]
    ExecutionFailure(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for OracleError
pub type Result<T> = std::result::Result<T, OracleError>;

/// Coarse classification used for logging and for the HTTP status class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidQuestion,
    GenerationFailure,
    ValidationRejected,
    ExecutionFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::InvalidQuestion => "invalid_question",
            ErrorKind::GenerationFailure => "generation_failure",
            ErrorKind::ValidationRejected => "validation_rejected",
            ErrorKind::ExecutionFailure => "execution_failure",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl OracleError {
    pub fn generation(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        OracleError::GenerationFailure {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OracleError::Configuration(_) | OracleError::Config(_) => ErrorKind::Configuration,
            OracleError::InvalidQuestion(_) => ErrorKind::InvalidQuestion,
            OracleError::GenerationFailure { .. } | OracleError::Http(_) => {
                ErrorKind::GenerationFailure
            }
            OracleError::ValidationRejected(_) => ErrorKind::ValidationRejected,
            OracleError::ExecutionFailure(_) | OracleError::Database(_) => {
                ErrorKind::ExecutionFailure
            }
            OracleError::Json(_)
            | OracleError::Io(_)
            | OracleError::Internal(_)
            | OracleError::Other(_) => ErrorKind::Internal,
        }
    }

    /// True when the caller sent something unusable, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidQuestion
    }

    /// Message safe to show to an end user.
    ///
    /// Never includes generated SQL, schema text or store error text.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::InvalidQuestion => self.to_string(),
            ErrorKind::Configuration => {
                "The service is not configured to answer questions right now.".to_string()
            }
            ErrorKind::GenerationFailure => {
                "Failed to reach the language model, please try again later.".to_string()
            }
            ErrorKind::ValidationRejected => {
                "Failed to query the database, please ensure your request aligns with our guidelines."
                    .to_string()
            }
            ErrorKind::ExecutionFailure => "Error fetching result.".to_string(),
            ErrorKind::Internal => "Internal error.".to_string(),
        }
    }
}
