use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use form_spec::{QuestionDefinition, Schema};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::backend::{DRAFT_KEY, KeyValueBackend, SCHEMA_KEY};
use crate::error::StoreError;
use crate::repository::{AddedQuestions, SchemaRepository};

/// Default artificial delay before every call.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);
/// Default share of calls that fail on purpose.
pub const DEFAULT_FAILURE_PROBABILITY: f64 = 0.1;

type SchemaStorage = BTreeMap<String, Vec<QuestionDefinition>>;

/// Latency and failure injection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApiOptions {
    pub latency: Duration,
    pub failure_probability: f64,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            failure_probability: DEFAULT_FAILURE_PROBABILITY,
        }
    }
}

impl ApiOptions {
    /// No delay and no injected failures.
    pub fn reliable() -> Self {
        Self {
            latency: Duration::ZERO,
            failure_probability: 0.0,
        }
    }
}

/// Repository over a key/value backend that behaves like a flaky remote
/// service: each call sleeps, then may fail before touching storage.
#[derive(Debug)]
pub struct SimulatedApi<B> {
    backend: B,
    options: ApiOptions,
}

impl<B: KeyValueBackend> SimulatedApi<B> {
    pub fn new(backend: B, options: ApiOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> ApiOptions {
        self.options
    }

    async fn gate(&self, operation: &'static str) -> Result<(), StoreError> {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
        let probability = self.options.failure_probability.clamp(0.0, 1.0);
        if rand::random::<f64>() < probability {
            warn!(operation, "simulated storage failure");
            return Err(StoreError::Simulated);
        }
        debug!(operation, "storage call admitted");
        Ok(())
    }

    fn read_storage(&self) -> Result<Option<SchemaStorage>, StoreError> {
        match self.backend.get(SCHEMA_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_storage(&self, storage: &SchemaStorage) -> Result<(), StoreError> {
        let raw = serde_json::to_string(storage)?;
        self.backend.set(SCHEMA_KEY, raw)
    }

    fn existing_storage(&self, schema_id: &str) -> Result<SchemaStorage, StoreError> {
        self.read_storage()?
            .ok_or_else(|| StoreError::SchemaNotFound(schema_id.to_string()))
    }
}

fn to_schemas(storage: SchemaStorage) -> Vec<Schema> {
    storage
        .into_iter()
        .map(|(id, data)| Schema::new(id, data))
        .collect()
}

fn new_schema_id() -> String {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string()
}

#[async_trait]
impl<B: KeyValueBackend> SchemaRepository for SimulatedApi<B> {
    async fn get_schemas(&self) -> Result<Option<Vec<Schema>>, StoreError> {
        self.gate("get_schemas").await?;
        Ok(self.read_storage()?.map(to_schemas))
    }

    async fn add_schema(
        &self,
        questions: Vec<QuestionDefinition>,
        schema_id: Option<&str>,
    ) -> Result<AddedQuestions, StoreError> {
        self.gate("add_schema").await?;

        let Some(schema_id) = schema_id else {
            let schema_id = new_schema_id();
            let count = questions.len();
            // Only one schema is active: a new one replaces whatever was stored.
            let storage = SchemaStorage::from([(schema_id.clone(), questions)]);
            self.write_storage(&storage)?;
            info!(%schema_id, count, "created schema");
            return Ok(AddedQuestions {
                schema_id,
                last_index: count.checked_sub(1),
            });
        };

        let mut storage = self.existing_storage(schema_id)?;
        let list = storage
            .get_mut(schema_id)
            .ok_or_else(|| StoreError::SchemaNotFound(schema_id.to_string()))?;
        list.extend(questions);
        let last_index = list.len().checked_sub(1);
        self.write_storage(&storage)?;
        info!(%schema_id, ?last_index, "appended questions");
        Ok(AddedQuestions {
            schema_id: schema_id.to_string(),
            last_index,
        })
    }

    async fn update_schema(
        &self,
        question: QuestionDefinition,
        schema_id: &str,
        index: usize,
    ) -> Result<Vec<Schema>, StoreError> {
        self.gate("update_schema").await?;

        let mut storage = self.existing_storage(schema_id)?;
        let slot = storage
            .get_mut(schema_id)
            .ok_or_else(|| StoreError::SchemaNotFound(schema_id.to_string()))?
            .get_mut(index)
            .ok_or_else(|| StoreError::QuestionNotFound {
                schema_id: schema_id.to_string(),
                index,
            })?;
        *slot = question;
        self.write_storage(&storage)?;
        debug!(%schema_id, index, "replaced question");
        Ok(to_schemas(storage))
    }

    async fn delete_question(&self, schema_id: &str, index: usize) -> Result<(), StoreError> {
        self.gate("delete_question").await?;

        let mut storage = self.existing_storage(schema_id)?;
        let list = storage
            .get_mut(schema_id)
            .ok_or_else(|| StoreError::SchemaNotFound(schema_id.to_string()))?;
        if index < list.len() {
            list.remove(index);
        }
        self.write_storage(&storage)?;
        info!(%schema_id, index, "deleted question");
        Ok(())
    }

    async fn create_draft(&self, question: QuestionDefinition) -> Result<(), StoreError> {
        self.gate("create_draft").await?;
        let raw = serde_json::to_string(&question)?;
        self.backend.set(DRAFT_KEY, raw)
    }

    async fn get_draft(&self) -> Result<Option<QuestionDefinition>, StoreError> {
        self.gate("get_draft").await?;
        match self.backend.get(DRAFT_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_draft(&self) -> Result<(), StoreError> {
        self.gate("delete_draft").await?;
        self.backend.remove(DRAFT_KEY)
    }
}
