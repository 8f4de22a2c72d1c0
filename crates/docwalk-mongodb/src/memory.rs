//! Ephemeral in-process collection
//!
//! Used for dry runs without a server and for tests. Supports top-level
//! equality filters only; numbers compare by value across Int32, Int64 and
//! Double as they do on the server.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document as BsonDocument};
use docwalk_common::{DocwalkError, Result};
use futures::stream;
use parking_lot::RwLock;

use crate::cursor::{CursorTracker, DocumentCursor};
use crate::store::{DocumentStore, InsertedId, Namespace};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    namespace: Namespace,
    documents: Arc<RwLock<Vec<BsonDocument>>>,
    tracker: CursorTracker,
}

impl MemoryStore {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::new(database, collection),
            documents: Arc::new(RwLock::new(Vec::new())),
            tracker: CursorTracker::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn matching(&self, filter: &BsonDocument) -> Result<Vec<BsonDocument>> {
        check_filter(filter)?;
        Ok(self
            .documents
            .read()
            .iter()
            .filter(|doc| matches(doc, filter))
            .cloned()
            .collect())
    }
}

fn check_filter(filter: &BsonDocument) -> Result<()> {
    for key in filter.keys() {
        if key.starts_with('$') {
            return Err(DocwalkError::Query(format!(
                "operator '{}' is not supported by the in-memory store",
                key
            )));
        }
        if key.contains('.') {
            return Err(DocwalkError::Query(format!(
                "dotted path '{}' is not supported by the in-memory store",
                key
            )));
        }
    }
    Ok(())
}

fn matches(doc: &BsonDocument, filter: &BsonDocument) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key).is_some_and(|actual| bson_eq(actual, expected)))
}

/// Server equality: numbers by value, everything else structurally
fn bson_eq(actual: &Bson, expected: &Bson) -> bool {
    match (actual, expected) {
        (Bson::Int32(a), Bson::Int64(b)) => i64::from(*a) == *b,
        (Bson::Int64(a), Bson::Int32(b)) => *a == i64::from(*b),
        (Bson::Double(a), b) => as_f64(b).is_some_and(|b| *a == b),
        (a, Bson::Double(b)) => as_f64(a).is_some_and(|a| a == *b),
        _ => actual == expected,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn cursor_tracker(&self) -> &CursorTracker {
        &self.tracker
    }

    async fn insert_document(&self, doc: BsonDocument) -> Result<InsertedId> {
        // _id goes first, as the server stores it
        let doc = if doc.contains_key("_id") {
            doc
        } else {
            let mut with_id = doc! { "_id": ObjectId::new() };
            with_id.extend(doc);
            with_id
        };

        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);

        let mut documents = self.documents.write();
        if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(DocwalkError::Write(format!(
                "duplicate key in {}: _id {}",
                self.namespace, id
            )));
        }
        documents.push(doc);

        Ok(InsertedId::from(id))
    }

    async fn find(&self, filter: BsonDocument) -> Result<DocumentCursor> {
        let snapshot = self.matching(&filter)?;
        Ok(DocumentCursor::new(
            self.namespace.clone(),
            stream::iter(snapshot.into_iter().map(Ok)),
            &self.tracker,
        ))
    }

    async fn find_one_document(&self, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        Ok(self.matching(&filter)?.into_iter().next())
    }

    async fn count_documents(&self, filter: BsonDocument) -> Result<u64> {
        Ok(self.matching(&filter)?.len() as u64)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.documents.write().clear();
        Ok(())
    }
}
