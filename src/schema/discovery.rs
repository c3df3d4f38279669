//! One-shot schema discovery: introspect, parse, build.

use crate::otel::{background_span, record_background_metrics, BackgroundJobType};
use crate::schema::facts::parse_schema_payload;
use crate::schema::graph::SchemaGraph;
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Source of raw schema facts.
///
/// Returns text in the payload format described in [`crate::schema::facts`].
/// The text is treated as untrusted and always parsed before use.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn introspect(&self) -> Result<String>;
}

/// Runs introspection and turns the reply into a [`SchemaGraph`].
#[derive(Clone)]
pub struct SchemaDiscovery {
    introspector: Arc<dyn SchemaIntrospector>,
}

impl SchemaDiscovery {
    pub fn new(introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self { introspector }
    }

    /// Discover the schema.
    ///
    /// # Errors
    ///
    /// Propagates introspection failures and returns `AgentError::ParseError`
    /// when the payload is malformed. There is no local recovery: a graph
    /// built from garbage would mislead every later question.
    pub async fn discover(&self) -> Result<SchemaGraph> {
        let span = background_span(BackgroundJobType::SchemaDiscovery, "database");

        async {
            let started = Instant::now();
            tracing::info!("Performing schema discovery...");

            let raw = self.introspector.introspect().await.inspect_err(|e| {
                record_background_metrics(None, None, "failed");
                tracing::error!(error = %e, "Schema introspection failed");
            })?;

            let tables = parse_schema_payload(&raw).inspect_err(|e| {
                record_background_metrics(None, None, "failed");
                tracing::error!(error = %e, "Schema payload could not be parsed");
            })?;

            let graph = SchemaGraph::from_facts(&tables);

            record_background_metrics(
                Some(graph.node_count()),
                Some(started.elapsed().as_millis() as u64),
                "success",
            );
            tracing::info!(
                tables = graph.table_count(),
                columns = graph.column_count(),
                references = graph.reference_edges().len(),
                "Schema discovery complete"
            );

            Ok(graph)
        }
        .instrument(span)
        .await
    }
}
