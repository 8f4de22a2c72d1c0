//! Structured records stored as BSON documents
//!
//! This module provides the `Document` trait for typed records and the
//! `Person` record the workflow writes and reads back.

use std::fmt;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document as BsonDocument};
use docwalk_common::{DocwalkError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::cursor::DocumentCursor;
use crate::store::{self, DocumentStore, InsertedId};

/// Typed record with automatic BSON conversion
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use docwalk_mongodb::Document;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Tag {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<ObjectId>,
///     label: String,
/// }
///
/// impl Document for Tag {
///     fn get_id(&self) -> Option<ObjectId> { self.id }
///     fn set_id(&mut self, id: ObjectId) { self.id = Some(id); }
/// }
/// ```
#[async_trait]
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Get the document's ObjectId (if it has one)
    fn get_id(&self) -> Option<ObjectId> {
        None
    }

    /// Set the document's ObjectId
    fn set_id(&mut self, _id: ObjectId) {
        // Records without an _id field ignore it
    }

    /// Convert document to BSON
    fn to_bson(&self) -> Result<BsonDocument> {
        bson::to_document(self).map_err(|e| DocwalkError::Serialization(e.to_string()))
    }

    /// Create document from BSON
    fn from_bson(doc: BsonDocument) -> Result<Self> {
        bson::from_document(doc).map_err(|e| DocwalkError::Decode(e.to_string()))
    }

    /// Insert this record and remember the ObjectId the database assigned
    async fn insert_into(&mut self, store: &dyn DocumentStore) -> Result<InsertedId> {
        let id = store::insert_one(store, &*self).await?;
        if let Some(oid) = id.as_object_id() {
            self.set_id(oid);
        }
        Ok(id)
    }

    /// First record matching `filter`; `NotFound` when nothing matches
    async fn find_one_in(store: &dyn DocumentStore, filter: BsonDocument) -> Result<Self> {
        store::find_one(store, filter).await
    }

    /// Find a record by its ObjectId
    async fn find_by_id_in(store: &dyn DocumentStore, id: ObjectId) -> Result<Self> {
        Self::find_one_in(store, doc! { "_id": id }).await
    }

    /// Every record in the collection, decoded
    async fn find_all_in(store: &dyn DocumentStore) -> Result<Vec<Self>> {
        let mut cursor: DocumentCursor = store::find_all(store).await?;
        let mut records = Vec::new();
        while let Some(record) = cursor.decode_next_as::<Self>().await? {
            records.push(record);
        }
        Ok(records)
    }

    async fn count_in(store: &dyn DocumentStore, filter: BsonDocument) -> Result<u64> {
        store.count_documents(filter).await
    }
}

/// The structured record: a name and an age
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub age: i32,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
        }
    }
}

impl Document for Person {
    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Name:{} Age:{}}}", self.name, self.age)
    }
}
