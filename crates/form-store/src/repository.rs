use async_trait::async_trait;
use form_spec::{QuestionDefinition, Schema};
use serde::Serialize;

use crate::error::StoreError;

/// Result of appending questions to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedQuestions {
    pub schema_id: String,
    /// Index of the last question in the schema after the append, `None`
    /// when the schema is still empty.
    pub last_index: Option<usize>,
}

/// Durable storage of schemas and the draft question.
///
/// Every call is fallible and may be slow; implementations must not leave
/// partial writes behind on failure.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// All stored schemas, `None` when nothing was ever stored.
    async fn get_schemas(&self) -> Result<Option<Vec<Schema>>, StoreError>;

    /// Appends `questions` to `schema_id`, or starts a new schema when no
    /// id is given.
    async fn add_schema(
        &self,
        questions: Vec<QuestionDefinition>,
        schema_id: Option<&str>,
    ) -> Result<AddedQuestions, StoreError>;

    /// Replaces the question at `index` and returns every stored schema.
    async fn update_schema(
        &self,
        question: QuestionDefinition,
        schema_id: &str,
        index: usize,
    ) -> Result<Vec<Schema>, StoreError>;

    /// Removes the question at `index`; later questions shift down by one.
    async fn delete_question(&self, schema_id: &str, index: usize) -> Result<(), StoreError>;

    async fn create_draft(&self, question: QuestionDefinition) -> Result<(), StoreError>;

    async fn get_draft(&self) -> Result<Option<QuestionDefinition>, StoreError>;

    async fn delete_draft(&self) -> Result<(), StoreError>;
}
