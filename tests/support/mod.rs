#![allow(dead_code)]

use async_trait::async_trait;
use dbtalk::agents::DataLookup;
use dbtalk::llm::{prompts, CompletionModel};
use dbtalk::schema::{SchemaGraph, SchemaIntrospector};
use dbtalk::{AgentError, Result, SqliteDatabase};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) const SHOP_FACTS: &str = r#"```json
[
  {"tableName": "customers", "columns": [
    {"columnName": "id", "columnType": "INTEGER", "isOptional": false},
    {"columnName": "name", "columnType": "TEXT", "isOptional": true}
  ]},
  {"tableName": "orders", "columns": [
    {"columnName": "id", "columnType": "INTEGER", "isOptional": false},
    {"columnName": "customer_id", "columnType": "INTEGER", "isOptional": false,
     "foreignKeyReference": {"table": "customers", "column": "id"}}
  ]}
]
```"#;

/// Which fixed prompt a system prompt belongs to.
pub(crate) fn role_of(system_prompt: &str) -> &'static str {
    if system_prompt == prompts::CLASSIFIER {
        "classify"
    } else if system_prompt == prompts::PLANNER {
        "plan"
    } else if system_prompt == prompts::CHAT_RESPONSE {
        "chat"
    } else if system_prompt == prompts::DISCOVERY {
        "discover"
    } else if system_prompt.starts_with("You are a response coordinator") {
        "respond"
    } else if system_prompt.starts_with("You are a database inference expert") {
        "sql"
    } else {
        "unknown"
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub role: &'static str,
    pub system: String,
    pub user: String,
}

/// Completion model that answers each fixed prompt from a script.
pub(crate) struct ScriptedModel {
    pub label: Option<String>,
    pub plan: Option<String>,
    pub sql: String,
    pub discovery: String,
    pub fail_response: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedModel {
    pub fn new(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            plan: Some("Inference: count customers\nGeneral: report the count".to_string()),
            sql: "```sql\nSELECT count(*) AS n FROM customers;\n```".to_string(),
            discovery: SHOP_FACTS.to_string(),
            fail_response: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plan(mut self, plan: &str) -> Self {
        self.plan = Some(plan.to_string());
        self
    }

    pub fn with_sql(mut self, sql: &str) -> Self {
        self.sql = sql.to_string();
        self
    }

    pub fn failing_classification(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn failing_planner(mut self) -> Self {
        self.plan = None;
        self
    }

    pub fn failing_response(mut self) -> Self {
        self.fail_response = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, role: &str) -> usize {
        self.calls().iter().filter(|c| c.role == role).count()
    }

    pub fn last_call_to(&self, role: &str) -> Option<Call> {
        self.calls().into_iter().rev().find(|c| c.role == role)
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, system_prompt: &str, user_input: &str) -> Result<String> {
        let role = role_of(system_prompt);
        self.calls.lock().unwrap().push(Call {
            role,
            system: system_prompt.to_string(),
            user: user_input.to_string(),
        });

        match role {
            "classify" => self
                .label
                .clone()
                .ok_or_else(|| AgentError::llm("classifier unavailable")),
            "plan" => self
                .plan
                .clone()
                .ok_or_else(|| AgentError::llm("planner unavailable")),
            "chat" | "respond" if self.fail_response => Err(AgentError::llm("responder unavailable")),
            "chat" => Ok(format!("chat: {}", user_input)),
            "respond" => Ok(format!("answer: {}", user_input)),
            "sql" => Ok(self.sql.clone()),
            "discover" => Ok(self.discovery.clone()),
            _ => Err(AgentError::llm(format!("unexpected prompt: {}", system_prompt))),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Data lookup with a fixed reply that counts calls.
pub(crate) struct CountingLookup {
    reply: std::result::Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    with_graph: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl CountingLookup {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            with_graph: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            ..Self::new("")
        }
    }

    /// Sleep inside every lookup.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that received a schema graph.
    pub fn calls_with_graph(&self) -> usize {
        self.with_graph.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataLookup for CountingLookup {
    async fn execute(&self, query: &str, context: Option<&SchemaGraph>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if context.is_some() {
            self.with_graph.fetch_add(1, Ordering::SeqCst);
        }
        self.queries.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.reply
            .clone()
            .map_err(AgentError::LookupError)
    }
}

/// Introspector with a fixed payload that counts calls.
pub(crate) struct CountingIntrospector {
    payload: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingIntrospector {
    pub fn new(payload: &str) -> Self {
        Self {
            payload: payload.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn shop() -> Self {
        Self::new(SHOP_FACTS)
    }

    /// Hold each introspection open so concurrent callers overlap.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaIntrospector for CountingIntrospector {
    async fn introspect(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.payload.clone())
    }
}

/// On-disk shop database: three customers, three orders.
pub(crate) fn shop_db() -> (TempDir, SqliteDatabase) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("shop.db");
    let conn = Connection::open(&path).expect("create database");
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE orders (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER NOT NULL REFERENCES customers(id),
             total REAL
         );
         INSERT INTO customers (name) VALUES ('Ada'), ('Grace'), ('Edsger');
         INSERT INTO orders (customer_id, total) VALUES (1, 9.5), (1, 3.0), (2, 12.25);",
    )
    .expect("seed database");
    drop(conn);

    let db = SqliteDatabase::open(&path).expect("open database");
    (dir, db)
}
