use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use form_spec::QuestionDefinition;
use form_store::{
    ApiOptions, FileBackend, KeyValueBackend, MemoryBackend, SCHEMA_KEY, SchemaRepository,
    SimulatedApi, StoreError,
};

fn question(title: &str) -> QuestionDefinition {
    serde_json::from_value(json!({
        "inputType": "text",
        "title": title,
        "description": null,
        "isRequired": false,
        "minLength": 3,
        "maxLength": 255
    }))
    .expect("fixture should deserialize")
}

fn reliable() -> SimulatedApi<Arc<MemoryBackend>> {
    SimulatedApi::new(Arc::new(MemoryBackend::new()), ApiOptions::reliable())
}

fn titles(questions: &[QuestionDefinition]) -> Vec<&str> {
    questions.iter().map(QuestionDefinition::title).collect()
}

#[tokio::test]
async fn empty_storage_has_no_schemas_or_draft() {
    let api = reliable();
    assert_eq!(api.get_schemas().await.unwrap(), None);
    assert_eq!(api.get_draft().await.unwrap(), None);
}

#[tokio::test]
async fn add_then_append_to_schema() {
    let api = reliable();
    let created = api.add_schema(vec![question("First")], None).await.unwrap();
    assert_eq!(created.last_index, Some(0));
    assert!(created.schema_id.parse::<u128>().is_ok());

    let appended = api
        .add_schema(
            vec![question("Second"), question("Third")],
            Some(&created.schema_id),
        )
        .await
        .unwrap();
    assert_eq!(appended.schema_id, created.schema_id);
    assert_eq!(appended.last_index, Some(2));

    let schemas = api.get_schemas().await.unwrap().expect("stored");
    assert_eq!(schemas.len(), 1);
    assert_eq!(titles(&schemas[0].data), vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn creating_a_schema_replaces_previous_storage() {
    let api = reliable();
    api.add_schema(vec![question("Old")], None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let fresh = api.add_schema(vec![question("New")], None).await.unwrap();

    let schemas = api.get_schemas().await.unwrap().expect("stored");
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].id, fresh.schema_id);
    assert_eq!(titles(&schemas[0].data), vec!["New"]);
}

#[tokio::test]
async fn unknown_schema_ids_are_rejected_without_writes() {
    let api = reliable();
    let err = api
        .add_schema(vec![question("Lost")], Some("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SchemaNotFound(ref id) if id == "missing"));
    assert_eq!(api.backend().get(SCHEMA_KEY).unwrap(), None);

    let created = api.add_schema(vec![question("Only")], None).await.unwrap();
    let err = api.delete_question("missing", 0).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaNotFound(_)));

    let err = api
        .update_schema(question("Nope"), &created.schema_id, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::QuestionNotFound { index: 5, .. }));
    let schemas = api.get_schemas().await.unwrap().unwrap();
    assert_eq!(titles(&schemas[0].data), vec!["Only"]);
}

#[tokio::test]
async fn update_replaces_in_place() {
    let api = reliable();
    let created = api
        .add_schema(vec![question("One"), question("Two")], None)
        .await
        .unwrap();
    let schemas = api
        .update_schema(question("Deux"), &created.schema_id, 1)
        .await
        .unwrap();
    assert_eq!(titles(&schemas[0].data), vec!["One", "Deux"]);
}

#[tokio::test]
async fn delete_shifts_later_questions_down() {
    let api = reliable();
    let created = api
        .add_schema(vec![question("A1"), question("B2"), question("C3")], None)
        .await
        .unwrap();
    api.delete_question(&created.schema_id, 0).await.unwrap();
    api.delete_question(&created.schema_id, 10).await.unwrap();

    let schemas = api.get_schemas().await.unwrap().unwrap();
    assert_eq!(titles(&schemas[0].data), vec!["B2", "C3"]);
}

#[tokio::test]
async fn draft_lifecycle() {
    let api = reliable();
    api.create_draft(question("Draft")).await.unwrap();
    assert_eq!(api.get_draft().await.unwrap(), Some(question("Draft")));
    api.delete_draft().await.unwrap();
    assert_eq!(api.get_draft().await.unwrap(), None);
}

#[tokio::test]
async fn certain_failure_never_touches_storage() {
    let api = SimulatedApi::new(
        MemoryBackend::new(),
        ApiOptions {
            latency: Duration::ZERO,
            failure_probability: 1.0,
        },
    );
    let err = api.add_schema(vec![question("Never")], None).await.unwrap_err();
    assert!(matches!(err, StoreError::Simulated));
    assert!(err.is_transient());
    assert_eq!(api.backend().get(SCHEMA_KEY).unwrap(), None);
    assert!(matches!(
        api.create_draft(question("Never")).await,
        Err(StoreError::Simulated)
    ));
}

#[tokio::test(start_paused = true)]
async fn calls_wait_for_the_configured_latency() {
    let api = SimulatedApi::new(
        MemoryBackend::new(),
        ApiOptions {
            latency: Duration::from_millis(100),
            failure_probability: 0.0,
        },
    );
    let started = tokio::time::Instant::now();
    api.get_schemas().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn corrupt_storage_is_a_serialization_error() {
    let api = reliable();
    api.backend().set(SCHEMA_KEY, "not json".into()).unwrap();
    let err = api.get_schemas().await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn file_backend_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let created = SimulatedApi::new(FileBackend::new(dir.path()), ApiOptions::reliable())
        .add_schema(vec![question("Durable")], None)
        .await
        .unwrap();

    let reopened = SimulatedApi::new(FileBackend::new(dir.path()), ApiOptions::reliable());
    let schemas = reopened.get_schemas().await.unwrap().unwrap();
    assert_eq!(schemas[0].id, created.schema_id);
    assert_eq!(titles(&schemas[0].data), vec!["Durable"]);
}
