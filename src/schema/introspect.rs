//! Schema introspection implementations.
//!
//! - [`CatalogIntrospector`]: reads the SQLite catalog directly
//! - [`LlmIntrospector`]: asks a completion model to describe the DDL as JSON facts

use crate::config::Config;
use crate::database::SqliteDatabase;
use crate::llm::{prompts, CompletionModel};
use crate::schema::discovery::SchemaIntrospector;
use crate::types::{AgentError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Introspector backed by `sqlite_master` and the table pragmas.
#[derive(Debug, Clone)]
pub struct CatalogIntrospector {
    db: SqliteDatabase,
}

impl CatalogIntrospector {
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Open the configured database; no provider key is needed.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate_database()?;
        let db = SqliteDatabase::open(&config.database)?.with_max_rows(config.max_rows);
        Ok(Self::new(db))
    }
}

#[async_trait]
impl SchemaIntrospector for CatalogIntrospector {
    async fn introspect(&self) -> Result<String> {
        let facts = self
            .db
            .table_facts()
            .await
            .map_err(|e| AgentError::IntrospectionError(format!("{}: {}", self.db.name(), e)))?;
        Ok(serde_json::to_string(&facts)?)
    }
}

/// Introspector that has a language model turn the DDL into JSON facts.
///
/// The reply is untrusted; [`crate::schema::SchemaDiscovery`] parses it and
/// fails on anything malformed.
#[derive(Clone)]
pub struct LlmIntrospector {
    llm: Arc<dyn CompletionModel>,
    db: SqliteDatabase,
}

impl LlmIntrospector {
    pub fn new(llm: Arc<dyn CompletionModel>, db: SqliteDatabase) -> Self {
        Self { llm, db }
    }
}

#[async_trait]
impl SchemaIntrospector for LlmIntrospector {
    async fn introspect(&self) -> Result<String> {
        let ddl = self
            .db
            .schema_ddl()
            .await
            .map_err(|e| AgentError::IntrospectionError(format!("{}: {}", self.db.name(), e)))?;

        tracing::debug!(model = self.llm.model_name(), ddl_chars = ddl.len(), "Requesting schema facts");
        self.llm
            .complete(prompts::DISCOVERY, &prompts::discovery_input(&ddl))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDiscovery;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, SqliteDatabase) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL REFERENCES customers(id));",
        )
        .unwrap();
        drop(conn);
        let db = SqliteDatabase::open(&path).unwrap();
        (dir, db)
    }

    struct Echo;

    #[async_trait]
    impl CompletionModel for Echo {
        async fn complete(&self, system_prompt: &str, user_input: &str) -> Result<String> {
            assert_eq!(system_prompt, prompts::DISCOVERY);
            assert!(user_input.contains("CREATE TABLE orders"));
            Ok(r#"```json
[{"tableName": "customers", "columns": [{"columnName": "id", "columnType": "INTEGER", "isOptional": false}]}]
```"#
                .to_string())
        }
    }

    #[tokio::test]
    async fn test_catalog_payload_builds_graph() {
        let (_dir, db) = fixture();
        let discovery = SchemaDiscovery::new(Arc::new(CatalogIntrospector::new(db)));
        let graph = discovery.discover().await.unwrap();

        assert_eq!(graph.table_count(), 2);
        assert_eq!(graph.column_count(), 4);
        assert_eq!(graph.reference_edges().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_from_config_without_key() {
        let (dir, _db) = fixture();
        let config = Config::from_lookup(|key| match key {
            "DATABASE" => Some(dir.path().join("shop.db").display().to_string()),
            _ => None,
        })
        .unwrap();
        assert!(config.validate().is_err());

        let introspector = CatalogIntrospector::from_config(&config).unwrap();
        let graph = SchemaDiscovery::new(Arc::new(introspector)).discover().await.unwrap();
        assert_eq!(graph.table_count(), 2);
    }

    #[tokio::test]
    async fn test_llm_introspector_sends_ddl() {
        let (_dir, db) = fixture();
        let introspector = LlmIntrospector::new(Arc::new(Echo), db);
        let raw = introspector.introspect().await.unwrap();
        assert!(raw.contains("customers"));
    }
}
