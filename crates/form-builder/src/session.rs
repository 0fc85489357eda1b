//! Editing session over the stored schema: the glue between raw form
//! input, the question validators and the repository.

use std::fmt;
use std::sync::Arc;

use form_spec::{
    CompiledFormSchema, ErrorMessages, FieldErrors, FormSubmission, QuestionDefinition,
    RawFieldValues, Schema, SchemaCache, parse_question,
};
use form_store::{KeyValueBackend, SchemaRepository, StoreError, ViewMode, store_view};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const SAVE_FAILED: &str = "Something went wrong while saving data";
pub const ADD_SUCCEEDED: &str = "Question added successfully";
pub const ADD_FAILED: &str = "Something went wrong while adding question";
pub const REMOVE_FAILED: &str = "Something went wrong while removing question";
pub const SUBMIT_SUCCEEDED: &str = "Form submitted successfully";

/// User-facing outcome of a storage operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn success(message: &str) -> Self {
        Notice::Success(message.to_string())
    }

    pub fn error(message: &str) -> Self {
        Notice::Error(message.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unable to load stored data: {0}")]
    Load(#[source] StoreError),
    #[error("there is no schema to preview yet")]
    NoSchema,
    #[error("unable to store the view: {0}")]
    View(#[source] StoreError),
}

/// Outcome of submitting raw input through the builder form.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderOutcome {
    /// Input failed validation; nothing reached the repository.
    Invalid(ErrorMessages),
    /// Input was valid and handed to the repository.
    Stored(Option<Notice>),
}

impl BuilderOutcome {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            BuilderOutcome::Stored(notice) => notice.as_ref(),
            BuilderOutcome::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveSchema {
    id: String,
    questions: Arc<Vec<QuestionDefinition>>,
}

pub struct BuilderSession<R> {
    repository: R,
    active: Option<ActiveSchema>,
    empty: Arc<Vec<QuestionDefinition>>,
    draft: Option<QuestionDefinition>,
    view: ViewMode,
    cache: SchemaCache,
}

impl<R: SchemaRepository> BuilderSession<R> {
    /// Loads the stored schemas and draft. Any failure here is fatal for
    /// the session.
    pub async fn load(repository: R) -> Result<Self, SessionError> {
        let (schemas, draft) = tokio::try_join!(repository.get_schemas(), repository.get_draft())
            .map_err(SessionError::Load)?;

        let mut session = Self {
            repository,
            active: None,
            empty: Arc::new(Vec::new()),
            draft,
            view: ViewMode::default(),
            cache: SchemaCache::new(),
        };
        session.set_schemas(schemas);
        info!(
            questions = session.questions().len(),
            has_draft = session.draft.is_some(),
            "session loaded"
        );
        Ok(session)
    }

    pub fn with_view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn schema_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.id.as_str())
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        match &self.active {
            Some(active) => &active.questions,
            None => &self.empty,
        }
    }

    pub fn draft(&self) -> Option<&QuestionDefinition> {
        self.draft.as_ref()
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    fn set_schemas(&mut self, schemas: Option<Vec<Schema>>) {
        // Only the first stored schema is ever edited or previewed.
        self.active = schemas
            .and_then(|schemas| schemas.into_iter().next())
            .map(|schema| ActiveSchema {
                id: schema.id,
                questions: Arc::new(schema.data),
            });
    }

    async fn refresh(&mut self) -> Result<(), StoreError> {
        let schemas = self.repository.get_schemas().await?;
        self.set_schemas(schemas);
        Ok(())
    }

    /// Persists an edited question.
    ///
    /// With both a schema id and an index the stored question is replaced;
    /// the local schema list is refreshed unless `is_new_entry` is set.
    /// Otherwise a new entry is saved as the draft. Returns a notice only
    /// on failure.
    pub async fn handle_change(
        &mut self,
        definition: QuestionDefinition,
        is_new_entry: bool,
        schema_id: Option<&str>,
        index: Option<usize>,
    ) -> Option<Notice> {
        let result = match (schema_id, index) {
            (Some(schema_id), Some(index)) => {
                match self.repository.update_schema(definition, schema_id, index).await {
                    Ok(schemas) => {
                        if !is_new_entry {
                            self.set_schemas(Some(schemas));
                        }
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            _ if is_new_entry => match self.repository.create_draft(definition.clone()).await {
                Ok(()) => {
                    self.draft = Some(definition);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            _ => Ok(()),
        };

        match result {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "saving question failed");
                Some(Notice::error(SAVE_FAILED))
            }
        }
    }

    /// Appends a question to `schema_id`, or starts a new schema, then
    /// reloads the schemas and discards the draft.
    pub async fn handle_submit(
        &mut self,
        definition: QuestionDefinition,
        schema_id: Option<&str>,
    ) -> Notice {
        let result = async {
            let added = self.repository.add_schema(vec![definition], schema_id).await?;
            let (schemas, ()) = tokio::try_join!(
                self.repository.get_schemas(),
                self.repository.delete_draft()
            )?;
            Ok::<_, StoreError>((added, schemas))
        }
        .await;

        match result {
            Ok((added, schemas)) => {
                info!(schema_id = %added.schema_id, last_index = ?added.last_index, "question added");
                self.set_schemas(schemas);
                self.draft = None;
                Notice::success(ADD_SUCCEEDED)
            }
            Err(err) => {
                warn!(error = %err, "adding question failed");
                Notice::error(ADD_FAILED)
            }
        }
    }

    /// Deletes a question and reloads the schemas. Returns a notice only on
    /// failure.
    pub async fn handle_remove(&mut self, schema_id: &str, index: usize) -> Option<Notice> {
        let result = match self.repository.delete_question(schema_id, index).await {
            Ok(()) => self.refresh().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, index, "removing question failed");
                Some(Notice::error(REMOVE_FAILED))
            }
        }
    }

    /// Validates raw builder input and adds it to the active schema.
    pub async fn submit_question(&mut self, raw: &RawFieldValues) -> BuilderOutcome {
        match parse_question(raw) {
            Ok(definition) => {
                let schema_id = self.schema_id().map(str::to_string);
                let notice = self.handle_submit(definition, schema_id.as_deref()).await;
                BuilderOutcome::Stored(Some(notice))
            }
            Err(messages) => BuilderOutcome::Invalid(messages),
        }
    }

    /// Validates raw builder input and replaces the question at `index`.
    pub async fn update_question(&mut self, index: usize, raw: &RawFieldValues) -> BuilderOutcome {
        match parse_question(raw) {
            Ok(definition) => {
                let schema_id = self.schema_id().map(str::to_string);
                let notice = match schema_id {
                    Some(schema_id) => {
                        self.handle_change(definition, false, Some(&schema_id), Some(index))
                            .await
                    }
                    None => Some(Notice::error(SAVE_FAILED)),
                };
                BuilderOutcome::Stored(notice)
            }
            Err(messages) => BuilderOutcome::Invalid(messages),
        }
    }

    /// Validates raw builder input and keeps it as the draft.
    pub async fn save_draft(&mut self, raw: &RawFieldValues) -> BuilderOutcome {
        match parse_question(raw) {
            Ok(definition) => {
                BuilderOutcome::Stored(self.handle_change(definition, true, None, None).await)
            }
            Err(messages) => BuilderOutcome::Invalid(messages),
        }
    }

    pub async fn discard_draft(&mut self) -> Result<(), StoreError> {
        self.repository.delete_draft().await?;
        self.draft = None;
        Ok(())
    }

    pub async fn remove_question(&mut self, index: usize) -> Option<Notice> {
        let Some(schema_id) = self.schema_id().map(str::to_string) else {
            return Some(Notice::error(REMOVE_FAILED));
        };
        self.handle_remove(&schema_id, index).await
    }

    /// Compiled validator for the active question list, recompiled only
    /// when the list was replaced.
    pub fn compiled_schema(&mut self) -> Arc<CompiledFormSchema> {
        let questions = match &self.active {
            Some(active) => &active.questions,
            None => &self.empty,
        };
        self.cache.get_or_compile(questions)
    }

    pub fn compilations(&self) -> usize {
        self.cache.compilations()
    }

    /// Validates a filled-in form against the active schema.
    pub fn preview_submit(
        &mut self,
        raw: &RawFieldValues,
    ) -> Result<(FormSubmission, Notice), FieldErrors> {
        let submission = self.compiled_schema().validate(raw)?;
        info!(fields = submission.len(), "form submitted");
        Ok((submission, Notice::success(SUBMIT_SUCCEEDED)))
    }

    /// Switches between authoring and preview and persists the choice.
    /// Not available until a schema exists.
    pub fn toggle_view(&mut self, preferences: &dyn KeyValueBackend) -> Result<ViewMode, SessionError> {
        if self.active.is_none() {
            return Err(SessionError::NoSchema);
        }
        let next = self.view.toggled();
        store_view(preferences, next).map_err(SessionError::View)?;
        self.view = next;
        Ok(next)
    }
}
