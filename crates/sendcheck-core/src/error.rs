//! Error types for SendCheck

/// Result type alias using SendCheck's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SendCheck operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Recipient table or other operator input is unusable
    #[error("input validation error: {0}")]
    InputValidation(String),

    /// Markup could not be reduced to visible text
    #[error("extraction error: {0}")]
    Extraction(String),

    /// A send was attempted while the latest verdict is failing
    #[error("campaign blocked by compliance: {violations} violation(s) outstanding")]
    ComplianceBlocked {
        /// Number of violations on the blocking verdict
        violations: usize,
    },

    /// Translation, analysis or delivery call failed
    #[error("{collaborator} collaborator error: {message}")]
    Collaborator {
        /// Which collaborator failed (delivery, translation, analysis, guidelines)
        collaborator: &'static str,
        /// Failure description
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new input validation error
    pub fn input_validation(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Create a new extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a new collaborator error
    pub fn collaborator(collaborator: &'static str, msg: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: msg.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error must stop the pipeline before any send
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Collaborator { .. })
    }
}
