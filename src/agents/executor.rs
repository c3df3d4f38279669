//! Sequential plan execution.

use crate::agents::planner::{PlanStep, StepKind};
use crate::agents::DataLookup;
use crate::otel::{background_span, record_background_metrics, BackgroundJobType};
use crate::schema::SchemaGraph;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Output when no step produced a block.
pub const NO_RESULTS: &str = "No results were generated.";

/// Runs plan steps in order and collects one text block per step.
#[derive(Clone)]
pub struct PlanExecutor {
    lookup: Arc<dyn DataLookup>,
}

impl PlanExecutor {
    pub fn new(lookup: Arc<dyn DataLookup>) -> Self {
        Self { lookup }
    }

    /// Execute `steps` and return the joined result blocks.
    ///
    /// Never fails:
    /// - steps without `:` are skipped
    /// - a failed lookup becomes an `Error: Query failed - ...` block
    /// - a panic inside the loop becomes `Error executing steps: ...`
    ///
    /// Dropping the returned future aborts the remaining steps.
    pub async fn execute_plan(&self, steps: &[String], graph: Option<Arc<SchemaGraph>>) -> String {
        let span = background_span(BackgroundJobType::PlanExecution, "plan");
        let lookup = Arc::clone(&self.lookup);
        let steps = steps.to_vec();

        let mut task = AbortOnDrop(tokio::spawn(
            async move {
                let started = Instant::now();
                let blocks = run_steps(lookup.as_ref(), &steps, graph.as_deref()).await;
                record_background_metrics(
                    Some(blocks.len()),
                    Some(started.elapsed().as_millis() as u64),
                    "success",
                );

                if blocks.is_empty() {
                    NO_RESULTS.to_string()
                } else {
                    blocks.join("\n\n")
                }
            }
            .instrument(span),
        ));

        match (&mut task.0).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Plan execution aborted");
                format!("Error executing steps: {}", e)
            }
        }
    }
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_steps(
    lookup: &dyn DataLookup,
    steps: &[String],
    graph: Option<&SchemaGraph>,
) -> Vec<String> {
    let mut blocks = Vec::with_capacity(steps.len());

    for (index, raw) in steps.iter().enumerate() {
        let Some(step) = PlanStep::parse(raw) else {
            tracing::debug!(index, step = %raw, "Skipping step without separator");
            continue;
        };

        match step.kind {
            StepKind::Inference => match lookup.execute(step.content, graph).await {
                Ok(result) => blocks.push(format!("Step: {}\nResult: {}", raw, result)),
                Err(e) => {
                    tracing::error!(index, error = %e, "Error in inference step");
                    blocks.push(format!("Step: {}\nError: Query failed - {}", raw, e));
                }
            },
            StepKind::General => blocks.push(format!("Step: {}\nResult: {}", raw, step.content)),
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentError, Result};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl DataLookup for Fixed {
        async fn execute(&self, _query: &str, _context: Option<&SchemaGraph>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailsOn(&'static str);

    #[async_trait]
    impl DataLookup for FailsOn {
        async fn execute(&self, query: &str, _context: Option<&SchemaGraph>) -> Result<String> {
            if query == self.0 {
                Err(AgentError::LookupError("no such table: genres".into()))
            } else {
                Ok(format!("ok: {}", query))
            }
        }
    }

    struct Panics;

    #[async_trait]
    impl DataLookup for Panics {
        async fn execute(&self, _query: &str, _context: Option<&SchemaGraph>) -> Result<String> {
            panic!("lookup exploded");
        }
    }

    fn plan(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_inference_and_general_blocks() {
        let executor = PlanExecutor::new(Arc::new(Fixed("5")));
        let out = executor
            .execute_plan(&plan(&["Inference: get count of X", "General: done"]), None)
            .await;
        assert_eq!(
            out,
            "Step: Inference: get count of X\nResult: 5\n\nStep: General: done\nResult: done"
        );
    }

    #[tokio::test]
    async fn test_step_error_does_not_stop_plan() {
        let executor = PlanExecutor::new(Arc::new(FailsOn("list genres")));
        let out = executor
            .execute_plan(
                &plan(&["Inference: list genres", "Inference: list artists"]),
                None,
            )
            .await;
        assert_eq!(
            out,
            "Step: Inference: list genres\nError: Query failed - Lookup failed: no such table: genres\n\n\
             Step: Inference: list artists\nResult: ok: list artists"
        );
    }

    #[tokio::test]
    async fn test_empty_plan_yields_sentinel() {
        let executor = PlanExecutor::new(Arc::new(Fixed("5")));
        assert_eq!(executor.execute_plan(&[], None).await, NO_RESULTS);
        assert_eq!(
            executor.execute_plan(&plan(&["just words"]), None).await,
            NO_RESULTS
        );
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let executor = PlanExecutor::new(Arc::new(Panics));
        let out = executor
            .execute_plan(&plan(&["Inference: anything"]), None)
            .await;
        assert!(out.starts_with("Error executing steps: "));
    }
}
