//! End-to-end workflow tests
//!
//! The in-memory tests always run. The live tests need a MongoDB server:
//! Run: docker run -p 27017:27017 mongo
//! Then: cargo test -p docwalk-mongodb -- --ignored
//! Set MONGODB_URI to point somewhere other than localhost.

use bson::{doc, oid::ObjectId};
use docwalk_mongodb::{
    find_all, find_one, insert_one, Connection, Document, DocumentStore, DocwalkError,
    MemoryStore, Person, WorkflowConfig, WorkflowRunner,
};

fn live_address() -> String {
    std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

/// Fresh collection name so parallel runs never collide
fn scratch_collection() -> String {
    format!("docwalk_{}", ObjectId::new().to_hex())
}

// ============================================================================
// In-memory store
// ============================================================================

#[tokio::test]
async fn test_two_inserts_then_scan_yields_two_documents() {
    let store = MemoryStore::new("baz", "qux");

    let first = insert_one(&store, &doc! { "hello": "world" }).await.unwrap();
    let second = Person::new("Tim", 25).insert_into(&store).await.unwrap();
    assert_ne!(first, second);

    let mut cursor = find_all(&store).await.unwrap();
    let docs = cursor.collect_remaining().await.unwrap();
    assert_eq!(docs.len(), 2);
}

#[tokio::test]
async fn test_lookup_by_name_decodes_person() {
    let store = MemoryStore::new("baz", "qux");
    insert_one(&store, &doc! { "hello": "world" }).await.unwrap();
    Person::new("Tim", 25).insert_into(&store).await.unwrap();

    let found: Person = find_one(&store, doc! { "name": "Tim" }).await.unwrap();
    assert_eq!(found.name, "Tim");
    assert_eq!(found.age, 25);
}

#[tokio::test]
async fn test_lookup_without_match_is_not_found() {
    let store = MemoryStore::new("baz", "qux");
    Person::new("Tim", 25).insert_into(&store).await.unwrap();

    let err = find_one::<_, Person>(&store, doc! { "name": "Nobody" })
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {:?}", err);
}

#[tokio::test]
async fn test_partial_iteration_failure_releases_cursor() {
    let store = MemoryStore::new("baz", "qux");
    Person::new("Tim", 25).insert_into(&store).await.unwrap();
    insert_one(&store, &doc! { "hello": "world" }).await.unwrap();

    async fn people(store: &MemoryStore) -> docwalk_mongodb::Result<Vec<Person>> {
        let mut cursor = find_all(store).await?;
        let mut out = Vec::new();
        while let Some(person) = cursor.decode_next_as::<Person>().await? {
            out.push(person);
        }
        Ok(out)
    }

    // First document decodes, the second does not
    let err = people(&store).await.unwrap_err();
    assert!(matches!(err, DocwalkError::Decode(_)));
    assert_eq!(store.cursor_tracker().open_cursors(), 0);
    assert_eq!(store.cursor_tracker().total_opened(), 1);
}

#[tokio::test]
async fn test_runner_on_memory_store() {
    let store = MemoryStore::new("baz", "qux");
    let runner = WorkflowRunner::new(WorkflowConfig::default());

    let report = runner
        .run_with_store(&store, &mut std::io::sink())
        .await
        .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.found, Person::find_one_in(&store, doc! { "name": "Tim" }).await.unwrap());
}

// ============================================================================
// Live server
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_live_workflow_end_to_end() {
    let config = WorkflowConfig {
        address: live_address(),
        database: "docwalk_test".to_string(),
        collection: scratch_collection(),
        ..WorkflowConfig::default()
    };
    let runner = WorkflowRunner::new(config.clone());

    let mut out = Vec::new();
    let report = runner.run(&mut out).await.unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.found.name, "Tim");
    assert_eq!(report.found.age, 25);
    assert!(String::from_utf8(out).unwrap().starts_with("Connected to MongoDB!"));

    let connection = Connection::new(&config.address).await.unwrap();
    let collection = connection.get_collection(&config.database, &config.collection);
    collection.drop_collection().await.unwrap();
    drop(collection);
    connection.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn test_live_not_found_and_cursor_release() {
    let connection = Connection::new(&live_address()).await.unwrap();
    let collection = connection.get_collection("docwalk_test", &scratch_collection());

    insert_one(&collection, &doc! { "hello": "world" }).await.unwrap();
    Person::new("Tim", 25).insert_into(&collection).await.unwrap();

    let err = find_one::<_, Person>(&collection, doc! { "name": "Nobody" })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    {
        let mut cursor = find_all(&collection).await.unwrap();
        assert!(cursor.decode_next().await.unwrap().is_some());
        assert_eq!(collection.cursor_tracker().open_cursors(), 1);
    }
    assert_eq!(collection.cursor_tracker().open_cursors(), 0);

    collection.drop_collection().await.unwrap();
    drop(collection);
    connection.shutdown().await;
}
