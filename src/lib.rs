//! dbtalk: conversational question answering over a single SQLite database.
//!
//! A question goes through classification, one-time schema discovery, planning,
//! plan execution and response generation:
//!
//! ```text
//! question ─► QuestionRouter ─► CompletionModel (classify)
//!                 │
//!                 ├─► SchemaCache / SchemaDiscovery ─► SchemaGraph (once per process)
//!                 ├─► PlannerAgent ─► ["Inference: ...", "General: ..."]
//!                 ├─► PlanExecutor ─► DataLookup (InferenceAgent ─► SQLite)
//!                 └─► CompletionModel (respond)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dbtalk::{Config, QuestionRouter};
//!
//! let router = QuestionRouter::from_config(&Config::from_env()?)?;
//! let state = router.respond("How many artists are there?", None).await?;
//! println!("{}", state.response.unwrap_or_default());
//!
//! // Follow-up questions reuse the discovered schema
//! let state = router.respond("Which has the most albums?", Some(state)).await?;
//! ```

pub mod agents;
pub mod config;
pub mod database;
pub mod llm;
pub mod otel;
pub mod router;
pub mod schema;
pub mod types;

pub use agents::{DataLookup, InferenceAgent, PlanExecutor, PlannerAgent};
pub use config::{Config, DiscoveryMode};
pub use database::{QueryOutput, SqliteDatabase};
pub use llm::{CompletionModel, LlmClient};
pub use router::{QuestionRouter, Stage};
pub use schema::{SchemaCache, SchemaGraph, SchemaIntrospector};
pub use types::{AgentError, ConversationState, InputType, Result};
