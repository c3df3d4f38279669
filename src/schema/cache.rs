//! Process-wide schema graph cache.
//!
//! Written at most once. Concurrent discoverers wait on the single in-flight
//! discovery and share its result; if that discovery fails, the next caller
//! runs its own.

use crate::schema::graph::SchemaGraph;
use crate::types::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Single-writer cache for the discovered schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    cell: OnceCell<Arc<SchemaGraph>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached graph, if discovery already succeeded.
    pub fn try_get(&self) -> Option<Arc<SchemaGraph>> {
        self.cell.get().cloned()
    }

    /// Store `graph` unless a graph is already cached.
    ///
    /// Waits for an in-flight discovery to settle first. Returns whichever
    /// graph ends up cached, which is `graph` only if this call won.
    pub async fn set_if_absent(&self, graph: Arc<SchemaGraph>) -> Arc<SchemaGraph> {
        self.cell.get_or_init(|| async move { graph }).await.clone()
    }

    /// Return the cached graph or run `discover` to produce it.
    ///
    /// `discover` runs at most once across all callers unless it fails.
    ///
    /// # Errors
    ///
    /// Returns the discovery error to the caller whose attempt failed; the
    /// cache stays empty.
    pub async fn get_or_discover<F, Fut>(&self, discover: F) -> Result<Arc<SchemaGraph>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SchemaGraph>>,
    {
        let graph = self
            .cell
            .get_or_try_init(|| async move { discover().await.map(Arc::new) })
            .await?;
        Ok(graph.clone())
    }

    pub fn is_populated(&self) -> bool {
        self.cell.initialized()
    }
}
