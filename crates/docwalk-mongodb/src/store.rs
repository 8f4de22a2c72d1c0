//! Collection-level operations behind a single async seam
//!
//! `DocumentStore` is implemented by the MongoDB collection reference and by
//! the in-memory store. The free functions in this module are the workflow's
//! CRUD surface (`insert_one`, `find_all`, `find_one`) and work with either.

use std::fmt;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document as BsonDocument};
use docwalk_common::{DocwalkError, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::cursor::{CursorTracker, DocumentCursor};
use crate::query::Filter;
use crate::validation::validate_query;

/// `database.collection` pair identifying a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Opaque identifier the database assigned to an inserted document
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedId(Bson);

impl InsertedId {
    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    /// The id as an ObjectId, when the database generated one
    pub fn as_object_id(&self) -> Option<ObjectId> {
        self.0.as_object_id()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0, Bson::Null | Bson::Undefined)
    }
}

impl From<Bson> for InsertedId {
    fn from(value: Bson) -> Self {
        Self(value)
    }
}

impl fmt::Display for InsertedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::ObjectId(oid) => write!(f, "ObjectId(\"{}\")", oid.to_hex()),
            other => write!(f, "{}", other),
        }
    }
}

/// A single collection that documents can be written to and read from
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The collection this store reads and writes
    fn namespace(&self) -> &Namespace;

    /// Tracker every cursor opened by `find` registers with
    fn cursor_tracker(&self) -> &CursorTracker;

    /// Insert one already-serialized document
    async fn insert_document(&self, doc: BsonDocument) -> Result<InsertedId>;

    /// Open a lazy cursor over every document matching `filter`
    async fn find(&self, filter: BsonDocument) -> Result<DocumentCursor>;

    /// First document matching `filter`, if any
    async fn find_one_document(&self, filter: BsonDocument) -> Result<Option<BsonDocument>>;

    async fn count_documents(&self, filter: BsonDocument) -> Result<u64>;

    /// Remove the collection and all of its documents
    async fn drop_collection(&self) -> Result<()>;
}

/// Serialize `record` to BSON and insert it
pub async fn insert_one<S, T>(store: &S, record: &T) -> Result<InsertedId>
where
    S: DocumentStore + ?Sized,
    T: Serialize + ?Sized,
{
    let doc = bson::to_document(record)?;
    let id = store.insert_document(doc).await?;
    info!(namespace = %store.namespace(), id = %id, "document inserted");
    Ok(id)
}

/// Open a cursor over every document in the collection (empty filter)
pub async fn find_all<S>(store: &S) -> Result<DocumentCursor>
where
    S: DocumentStore + ?Sized,
{
    store.find(Filter::all()).await
}

/// Find the first document matching `filter` and decode it into `T`
///
/// Zero matches is reported as `DocwalkError::NotFound`, never as a query error.
pub async fn find_one<S, T>(store: &S, filter: BsonDocument) -> Result<T>
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned,
{
    let described = filter.to_string();
    find_one_optional(store, filter).await?.ok_or_else(|| {
        DocwalkError::NotFound(format!(
            "no document in {} matches {}",
            store.namespace(),
            described
        ))
    })
}

/// Like `find_one`, but absence is `Ok(None)`
pub async fn find_one_optional<S, T>(store: &S, filter: BsonDocument) -> Result<Option<T>>
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned,
{
    validate_query(&Bson::Document(filter.clone()))?;

    match store.find_one_document(filter).await? {
        Some(doc) => bson::from_document(doc).map(Some).map_err(|e| {
            DocwalkError::Decode(format!("document in {}: {}", store.namespace(), e))
        }),
        None => Ok(None),
    }
}
