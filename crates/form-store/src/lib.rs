#![allow(missing_docs)]

pub mod api;
pub mod backend;
pub mod error;
pub mod repository;
pub mod view;

pub use api::{ApiOptions, DEFAULT_FAILURE_PROBABILITY, DEFAULT_LATENCY, SimulatedApi};
pub use backend::{DRAFT_KEY, FileBackend, KeyValueBackend, MemoryBackend, SCHEMA_KEY, VIEW_KEY};
pub use error::StoreError;
pub use repository::{AddedQuestions, SchemaRepository};
pub use view::{ViewMode, load_view, store_view};
