//! Agents driven by the router.
//!
//! - [`PlannerAgent`]: question → ordered `Inference:` / `General:` steps
//! - [`PlanExecutor`]: runs steps in order against a [`DataLookup`]
//! - [`InferenceAgent`]: the SQLite-backed [`DataLookup`]
//! - [`analysis`]: matches question text against the schema graph

pub mod analysis;
pub mod executor;
pub mod inference;
pub mod planner;

pub use analysis::{analyze_question, enhanced_prompt, ColumnMatch, GraphAnalysis, TableMatch};
pub use executor::{PlanExecutor, NO_RESULTS};
pub use inference::{ensure_read_only, extract_sql, InferenceAgent};
pub use planner::{PlanStep, PlannerAgent, StepKind};

use crate::schema::SchemaGraph;
use crate::types::Result;
use async_trait::async_trait;

/// Answers one `Inference:` step.
///
/// `context` is the cached schema graph when discovery has run. Errors are
/// caught per step by [`PlanExecutor`] and never abort the plan.
#[async_trait]
pub trait DataLookup: Send + Sync {
    async fn execute(&self, query: &str, context: Option<&SchemaGraph>) -> Result<String>;
}
