use thiserror::Error;

/// Errors raised by the persistence layer. Callers get no partial writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("simulated error")]
    Simulated,
    #[error("schema with {0} not found")]
    SchemaNotFound(String),
    #[error("question {index} not found in schema {schema_id}")]
    QuestionNotFound { schema_id: String, index: usize },
    #[error("failed to encode stored data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Simulated | StoreError::Io(_))
    }
}
