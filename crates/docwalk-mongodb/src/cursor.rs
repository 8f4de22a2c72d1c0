//! Forward-only document cursors with guaranteed release
//!
//! A `DocumentCursor` wraps the driver's lazy result stream (or an in-memory
//! snapshot) and registers itself with a `CursorTracker` for as long as it is
//! alive. Release happens in `Drop`, so every exit path (exhaustion, decode
//! failure, early `?` return, panic) closes the cursor exactly once. Dropping
//! the underlying `mongodb::Cursor` makes the driver kill the server-side
//! cursor.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bson::Document as BsonDocument;
use docwalk_common::{DocwalkError, Result};
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::store::Namespace;

/// Counts cursors opened against a collection and how many are still open
#[derive(Debug, Clone, Default)]
pub struct CursorTracker {
    open: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cursors currently alive
    pub fn open_cursors(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Number of cursors ever opened through this tracker
    pub fn total_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lazy, forward-only, single-pass sequence of documents
pub struct DocumentCursor {
    namespace: Namespace,
    stream: BoxStream<'static, Result<BsonDocument>>,
    tracker: CursorTracker,
    position: usize,
    exhausted: bool,
}

impl DocumentCursor {
    /// Wrap a document stream and register it with `tracker`
    pub fn new<S>(namespace: Namespace, stream: S, tracker: &CursorTracker) -> Self
    where
        S: Stream<Item = Result<BsonDocument>> + Send + 'static,
    {
        tracker.acquire();
        debug!(namespace = %namespace, "cursor opened");
        Self {
            namespace,
            stream: stream.boxed(),
            tracker: tracker.clone(),
            position: 0,
            exhausted: false,
        }
    }

    /// Advance one step. `Ok(None)` marks the end of the sequence, after which
    /// every further call also returns `Ok(None)`.
    pub async fn decode_next(&mut self) -> Result<Option<BsonDocument>> {
        if self.exhausted {
            return Ok(None);
        }

        match self.stream.next().await {
            Some(Ok(doc)) => {
                self.position += 1;
                debug!(namespace = %self.namespace, position = self.position, "document decoded");
                Ok(Some(doc))
            }
            Some(Err(e)) => Err(e),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Advance one step and decode the document into `T`
    pub async fn decode_next_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let Some(doc) = self.decode_next().await? else {
            return Ok(None);
        };

        bson::from_document(doc).map(Some).map_err(|e| {
            DocwalkError::Decode(format!(
                "document #{} in {}: {}",
                self.position, self.namespace, e
            ))
        })
    }

    /// Drain the rest of the cursor
    pub async fn collect_remaining(&mut self) -> Result<Vec<BsonDocument>> {
        let mut docs = Vec::new();
        while let Some(doc) = self.decode_next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Number of documents read so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Close the cursor now instead of at end of scope
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for DocumentCursor {
    fn drop(&mut self) {
        self.tracker.release();
        debug!(
            namespace = %self.namespace,
            read = self.position,
            exhausted = self.exhausted,
            "cursor closed"
        );
    }
}

impl fmt::Debug for DocumentCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("namespace", &self.namespace)
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
