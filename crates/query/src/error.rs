//! Error types for query building, compilation and relationship loading

/// Result type alias for ORM operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrmError {
    /// Caller supplied input the builder cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error reported by the statement executor
    #[error("Database error: {0}")]
    Database(String),

    /// Relationship declaration or loading failed
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OrmError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        OrmError::InvalidInput(message.into())
    }

    pub fn relationship(message: impl Into<String>) -> Self {
        OrmError::Relationship(message.into())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for OrmError {
    fn from(err: serde_yaml::Error) -> Self {
        OrmError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for OrmError {
    fn from(err: std::io::Error) -> Self {
        OrmError::Configuration(err.to_string())
    }
}

// Host executors are commonly written against anyhow
impl From<anyhow::Error> for OrmError {
    fn from(err: anyhow::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}
