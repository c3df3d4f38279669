//! Per-question conversation state threaded through the router.
//!
//! Every stage takes the state by value and hands back an updated copy. The
//! `with_*` methods change exactly one field and keep the rest, so a stage
//! can never drop data it did not mean to touch.

use crate::schema::SchemaGraph;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Classification label for an incoming question.
///
/// The model is asked for exactly one of four labels. Anything else is kept
/// verbatim in `Other` and routed like small talk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    /// DATABASE_QUERY - needs data from the database
    DatabaseQuery,
    /// GREETING - hello, how are you
    Greeting,
    /// CHITCHAT - conversation that needs no data
    Chitchat,
    /// FAREWELL - goodbye messages
    Farewell,
    /// Unrecognized label, kept as returned (trimmed)
    Other(String),
}

impl InputType {
    /// Parse a raw model reply into a label.
    ///
    /// Only surrounding whitespace is removed; matching is exact, so a reply
    /// like `"database_query"` or `"DATABASE_QUERY."` becomes `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "DATABASE_QUERY" => Self::DatabaseQuery,
            "GREETING" => Self::Greeting,
            "CHITCHAT" => Self::Chitchat,
            "FAREWELL" => Self::Farewell,
            other => Self::Other(other.to_string()),
        }
    }

    /// Label as sent by the model.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DatabaseQuery => "DATABASE_QUERY",
            Self::Greeting => "GREETING",
            Self::Chitchat => "CHITCHAT",
            Self::Farewell => "FAREWELL",
            Self::Other(label) => label,
        }
    }

    /// Whether the question needs schema discovery and a plan.
    pub fn is_database_query(&self) -> bool {
        matches!(self, Self::DatabaseQuery)
    }

    /// Whether the response should use the small-talk prompt.
    ///
    /// Only the three known conversational labels count. An unrecognized
    /// label is neither a database query nor chat, and gets the
    /// database-style prompt with empty results.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Greeting | Self::Chitchat | Self::Farewell)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working data for one user question.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Correlation id for logs and spans
    pub id: Uuid,

    /// When the question was received
    pub asked_at: DateTime<Utc>,

    /// The user's question (never modified)
    pub question: String,

    /// Latest classification, `None` until ClassifyInput runs
    pub input_type: Option<InputType>,

    /// Plan steps (`"Inference: ..."` / `"General: ..."`)
    pub plan: Vec<String>,

    /// Accumulated plan execution output
    pub db_results: Option<String>,

    /// Final natural-language answer
    pub response: Option<String>,

    /// Discovered schema, set once and shared with the process cache
    pub schema_graph: Option<Arc<SchemaGraph>>,
}

impl ConversationState {
    /// Create a fresh state for a question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asked_at: Utc::now(),
            question: question.into(),
            input_type: None,
            plan: Vec::new(),
            db_results: None,
            response: None,
            schema_graph: None,
        }
    }

    /// Start the next question of a conversation from this state.
    ///
    /// Keeps the plan and the cached schema graph, clears per-answer fields.
    pub fn next_question(self, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asked_at: Utc::now(),
            question: question.into(),
            input_type: None,
            db_results: None,
            response: None,
            ..self
        }
    }

    /// Replace the classification.
    pub fn with_input_type(self, input_type: InputType) -> Self {
        Self {
            input_type: Some(input_type),
            ..self
        }
    }

    /// Replace the plan wholesale.
    pub fn with_plan(self, plan: Vec<String>) -> Self {
        Self { plan, ..self }
    }

    /// Set plan execution output.
    pub fn with_db_results(self, db_results: impl Into<String>) -> Self {
        Self {
            db_results: Some(db_results.into()),
            ..self
        }
    }

    /// Set the final response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            ..self
        }
    }

    /// Offer a schema graph to the state.
    ///
    /// A graph that already holds nodes is never replaced; the offered one is
    /// only taken when the slot is empty or holds an empty graph.
    pub fn with_schema_graph(self, graph: Arc<SchemaGraph>) -> Self {
        match &self.schema_graph {
            Some(existing) if !existing.is_empty() => self,
            _ => Self {
                schema_graph: Some(graph),
                ..self
            },
        }
    }

    /// Whether the question was classified as a database query.
    pub fn is_database_query(&self) -> bool {
        self.input_type
            .as_ref()
            .is_some_and(InputType::is_database_query)
    }

    /// Whether the response should use the small-talk prompt.
    pub fn is_chat(&self) -> bool {
        self.input_type.as_ref().is_some_and(InputType::is_chat)
    }

    /// Cached schema graph, if any.
    pub fn schema_graph(&self) -> Option<&SchemaGraph> {
        self.schema_graph.as_deref()
    }
}
