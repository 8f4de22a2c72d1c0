//! The walkthrough itself: connect, insert twice, scan, look one up
//!
//! Steps run strictly in order and the first failure ends the run. Errors are
//! returned typed to the caller, which decides what to do with them.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use bson::Document as BsonDocument;
use docwalk_common::{DocwalkError, Result};
use tracing::{debug, info};

use crate::config::WorkflowConfig;
use crate::connection::Connection;
use crate::document::{Document, Person};
use crate::query::Filter;
use crate::store::{self, DocumentStore, InsertedId};

/// Name and age of the structured record the workflow inserts and looks up
pub const SAMPLE_NAME: &str = "Tim";
pub const SAMPLE_AGE: i32 = 25;

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    /// Id of the `{"hello": "world"}` record
    pub unstructured_id: InsertedId,
    /// Id of the `Person` record
    pub person_id: InsertedId,
    /// Every document the collection scan returned, in cursor order
    pub documents: Vec<BsonDocument>,
    /// Result of the lookup by name
    pub found: Person,
}

/// Runs the walkthrough against a configured MongoDB deployment
#[derive(Debug, Clone)]
pub struct WorkflowRunner {
    config: WorkflowConfig,
}

impl WorkflowRunner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run all six steps against the configured server
    ///
    /// The connection is shut down on every exit path once it exists.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<WorkflowReport> {
        self.config.validate()?;

        let connection = self
            .step(
                "connect",
                Connection::connect(&self.config.address, &self.config.client),
            )
            .await?;

        let outcome = self.run_connected(&connection, out).await;
        connection.shutdown().await;
        outcome
    }

    async fn run_connected<W: Write>(
        &self,
        connection: &Connection,
        out: &mut W,
    ) -> Result<WorkflowReport> {
        writeln!(out, "Connected to MongoDB!")?;

        // Dropped before shutdown, which waits on outstanding handles
        let collection = connection.get_collection(&self.config.database, &self.config.collection);
        self.run_with_store(&collection, out).await
    }

    /// Run the insert, scan and lookup steps against any store
    pub async fn run_with_store<W: Write>(
        &self,
        store: &dyn DocumentStore,
        out: &mut W,
    ) -> Result<WorkflowReport> {
        if self.config.drop_before_run {
            self.step("drop_collection", store.drop_collection()).await?;
            info!(namespace = %store.namespace(), "collection dropped before run");
        }

        let greeting = BTreeMap::from([("hello".to_string(), "world".to_string())]);
        let unstructured_id = self
            .step("insert_one", store::insert_one(store, &greeting))
            .await?;
        writeln!(out, "ID {}", unstructured_id)?;

        let mut person = Person::new(SAMPLE_NAME, SAMPLE_AGE);
        writeln!(out, "{}", person)?;

        let person_id = self.step("insert_one", person.insert_into(store)).await?;
        writeln!(out, "ID {}", person_id)?;

        let documents = self.scan(store, out).await?;

        let filter = Filter::new().eq("name", person.name.as_str()).build()?;
        let found: Person = self
            .step("find_one", Person::find_one_in(store, filter))
            .await?;
        writeln!(out, "Result")?;
        writeln!(out, "{}", found)?;
        info!(namespace = %store.namespace(), name = %found.name, age = found.age, "lookup matched");

        Ok(WorkflowReport {
            unstructured_id,
            person_id,
            documents,
            found,
        })
    }

    /// Iterate the whole collection, printing each document
    async fn scan<W: Write>(&self, store: &dyn DocumentStore, out: &mut W) -> Result<Vec<BsonDocument>> {
        let mut cursor = self.step("find", store::find_all(store)).await?;

        let mut documents = Vec::new();
        while let Some(doc) = self.step("cursor advance", cursor.decode_next()).await? {
            writeln!(out, "{}", doc)?;
            documents.push(doc);
        }
        debug!(namespace = %store.namespace(), count = documents.len(), "collection scanned");

        cursor.close();
        Ok(documents)
    }

    /// Await one database call under the configured deadline
    async fn step<T, F>(&self, name: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| timeout_error(name, limit))?,
            None => fut.await,
        }
    }
}

fn timeout_error(step: &str, limit: Duration) -> DocwalkError {
    DocwalkError::Timeout(format!("{} did not complete within {:?}", step, limit))
}
