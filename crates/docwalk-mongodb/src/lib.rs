//! MongoDB walkthrough for docwalk
//!
//! Connects to a MongoDB deployment, inserts an unstructured map and a typed
//! `Person`, scans the collection and looks the person up again by name.
//!
//! # Features
//! - Typed error taxonomy (connection, write, query, decode, not found)
//! - Cursors released on every exit path, with open-cursor tracking
//! - `DocumentStore` seam with a MongoDB and an in-memory implementation
//! - Serde/TOML configuration with driver pool options
//! - Per-operation deadlines

pub mod config;
pub mod connection;
pub mod cursor;
pub mod document;
pub mod memory;
pub mod query;
pub mod store;
pub mod validation;
pub mod workflow;

pub use config::{ClientConfig, ConfigFile, WorkflowConfig};
pub use connection::{Connection, MongoCollection};
pub use cursor::{CursorTracker, DocumentCursor};
pub use docwalk_common::{DocwalkError, Result};
pub use document::{Document, Person};
pub use memory::MemoryStore;
pub use query::Filter;
pub use store::{find_all, find_one, find_one_optional, insert_one, DocumentStore, InsertedId, Namespace};
pub use validation::{validate_query, ValidatedCollectionName, ValidatedDatabaseName, ValidatedFieldName};
pub use workflow::{WorkflowReport, WorkflowRunner};
