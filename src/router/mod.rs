//! Question router.
//!
//! Drives one question through a fixed set of stages:
//!
//! ```text
//! ClassifyInput ──DATABASE_QUERY──► DiscoverDatabase ─► CreatePlan ──plan──► ExecutePlan
//!       │                                                   │                    │
//!       └──────────── other labels ─────────┐        empty  │                    │
//!                                            ▼              ▼                    ▼
//!                                         GenerateResponse ◄─────────────────────┘
//!                                                │
//!                                               End
//! ```
//!
//! Transitions live in [`Stage::next`] and depend only on the state, so the
//! routing table can be tested without any capability.

use crate::agents::{DataLookup, InferenceAgent, PlanExecutor, PlannerAgent};
use crate::config::{Config, DiscoveryMode};
use crate::database::SqliteDatabase;
use crate::llm::{prompts, strip_markdown, CompletionModel, LlmClient};
use crate::otel::stage_span;
use crate::schema::{
    CatalogIntrospector, LlmIntrospector, SchemaCache, SchemaDiscovery, SchemaGraph,
    SchemaIntrospector,
};
use crate::types::{ConversationState, InputType, Result};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Router stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ClassifyInput,
    DiscoverDatabase,
    CreatePlan,
    ExecutePlan,
    GenerateResponse,
    End,
}

impl Stage {
    /// Stage that follows `self` given the state it produced.
    pub fn next(self, state: &ConversationState) -> Stage {
        match self {
            Self::ClassifyInput if state.is_database_query() => Self::DiscoverDatabase,
            Self::ClassifyInput => Self::GenerateResponse,
            Self::DiscoverDatabase => Self::CreatePlan,
            Self::CreatePlan if state.plan.is_empty() => Self::GenerateResponse,
            Self::CreatePlan => Self::ExecutePlan,
            Self::ExecutePlan => Self::GenerateResponse,
            Self::GenerateResponse | Self::End => Self::End,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyInput => "classify_input",
            Self::DiscoverDatabase => "discover_database",
            Self::CreatePlan => "create_plan",
            Self::ExecutePlan => "execute_plan",
            Self::GenerateResponse => "generate_response",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers questions about one database.
///
/// The schema cache is shared by every question this router (and any router
/// given the same cache through [`QuestionRouter::with_cache`]) answers.
#[derive(Clone)]
pub struct QuestionRouter {
    llm: Arc<dyn CompletionModel>,
    planner: PlannerAgent,
    executor: PlanExecutor,
    discovery: SchemaDiscovery,
    cache: Arc<SchemaCache>,
}

impl QuestionRouter {
    pub fn new(
        llm: Arc<dyn CompletionModel>,
        lookup: Arc<dyn DataLookup>,
        introspector: Arc<dyn SchemaIntrospector>,
    ) -> Self {
        Self {
            planner: PlannerAgent::new(Arc::clone(&llm)),
            executor: PlanExecutor::new(lookup),
            discovery: SchemaDiscovery::new(introspector),
            cache: Arc::new(SchemaCache::new()),
            llm,
        }
    }

    /// Share an existing schema cache.
    pub fn with_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Build the production wiring: HTTP model, SQLite lookup and the
    /// configured introspector.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::ConfigError` if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let llm: Arc<dyn CompletionModel> = Arc::new(LlmClient::new(
            config.api_key.clone(),
            config.model.clone(),
            config.timeout,
        )?);
        let db = SqliteDatabase::open(&config.database)?.with_max_rows(config.max_rows);

        let lookup = Arc::new(InferenceAgent::new(Arc::clone(&llm), db.clone()));
        let introspector: Arc<dyn SchemaIntrospector> = match config.discovery {
            DiscoveryMode::Catalog => Arc::new(CatalogIntrospector::new(db)),
            DiscoveryMode::Llm => Arc::new(LlmIntrospector::new(Arc::clone(&llm), db)),
        };

        tracing::info!(
            database = %config.database.display(),
            model = %config.model,
            discovery = %config.discovery,
            "Router configured"
        );
        Ok(Self::new(llm, lookup, introspector))
    }

    /// Answer a question.
    ///
    /// `prior_state` carries a conversation forward: its schema graph and
    /// plan survive, per-answer fields are cleared.
    ///
    /// # Errors
    ///
    /// Schema discovery and response generation failures are returned.
    /// Classification, planning and execution failures degrade into the
    /// answer instead.
    pub async fn respond(
        &self,
        question: &str,
        prior_state: Option<ConversationState>,
    ) -> Result<ConversationState> {
        let mut state = match prior_state {
            Some(prior) => prior.next_question(question),
            None => ConversationState::new(question),
        };

        let mut stage = Stage::ClassifyInput;
        while stage != Stage::End {
            let span = stage_span(stage.as_str(), &state.id);
            state = self.run_stage(stage, state).instrument(span).await?;
            stage = stage.next(&state);
        }

        Ok(state)
    }

    async fn run_stage(&self, stage: Stage, state: ConversationState) -> Result<ConversationState> {
        match stage {
            Stage::ClassifyInput => {
                let input_type = self.classify(&state.question).await;
                Ok(state.with_input_type(input_type))
            }
            Stage::DiscoverDatabase => self.discover_database(state).await,
            Stage::CreatePlan => {
                let plan = self.planner.create_plan(&state.question).await;
                Ok(state.with_plan(plan))
            }
            Stage::ExecutePlan => {
                let results = self
                    .executor
                    .execute_plan(&state.plan, state.schema_graph.clone())
                    .await;
                Ok(state.with_db_results(results))
            }
            Stage::GenerateResponse => self.generate_response(state).await,
            Stage::End => Ok(state),
        }
    }

    /// Classify a question.
    ///
    /// A failed model call is logged and treated as `CHITCHAT`, which keeps
    /// the question away from the database.
    pub async fn classify(&self, question: &str) -> InputType {
        match self.llm.complete(prompts::CLASSIFIER, question).await {
            Ok(reply) => {
                let input_type = InputType::from_label(&strip_markdown(&reply));
                tracing::info!(input_type = %input_type, "Input classified");
                input_type
            }
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, treating input as chitchat");
                InputType::Chitchat
            }
        }
    }

    /// Plan a question without executing it.
    pub async fn plan(&self, question: &str) -> Vec<String> {
        self.planner.create_plan(question).await
    }

    /// Cached schema graph, discovering it on first use.
    pub async fn schema(&self) -> Result<Arc<SchemaGraph>> {
        if let Some(graph) = self.cache.try_get() {
            return Ok(graph);
        }

        tracing::info!("Performing one-time database schema discovery...");
        let graph = self
            .cache
            .get_or_discover(|| self.discovery.discover())
            .await?;
        tracing::info!("Schema discovery complete, reused for later questions");
        Ok(graph)
    }

    async fn discover_database(&self, state: ConversationState) -> Result<ConversationState> {
        if state.schema_graph().is_some_and(|graph| !graph.is_empty()) {
            tracing::debug!("Schema graph already present");
            return Ok(state);
        }

        let graph = self.schema().await?;
        Ok(state.with_schema_graph(graph))
    }

    async fn generate_response(&self, state: ConversationState) -> Result<ConversationState> {
        tracing::info!(chat = state.is_chat(), "Generating final response");

        let reply = if state.is_chat() {
            self.llm.complete(prompts::CHAT_RESPONSE, &state.question).await?
        } else {
            let db_results = state.db_results.as_deref().unwrap_or_default();
            let system = prompts::db_response(&state.question, db_results);
            self.llm.complete(&system, &state.question).await?
        };

        Ok(state
            .with_response(reply.trim())
            .with_plan(Vec::new()))
    }
}
