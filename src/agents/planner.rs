//! Plan creation and plan step parsing.

use crate::llm::{prompts, CompletionModel};
use std::fmt;
use std::sync::Arc;

/// Step returned when the model produced no usable lines.
pub const FALLBACK_STEP: &str =
    "General: I'd love to help you explore the database! What would you like to know?";

/// Kind of plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Needs a data lookup
    Inference,
    /// Content is passed through as the result
    General,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inference => write!(f, "Inference"),
            Self::General => write!(f, "General"),
        }
    }
}

/// A parsed `"<Kind>: <content>"` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep<'a> {
    pub raw: &'a str,
    pub kind: StepKind,
    pub content: &'a str,
}

impl<'a> PlanStep<'a> {
    /// Split a step at its first `:`.
    ///
    /// Returns `None` when there is no separator. Kind matching ignores case
    /// and surrounding whitespace; anything other than `inference` is treated
    /// as [`StepKind::General`].
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (kind, content) = raw.split_once(':')?;
        let kind = if kind.trim().eq_ignore_ascii_case("inference") {
            StepKind::Inference
        } else {
            StepKind::General
        };

        Some(Self {
            raw,
            kind,
            content: content.trim(),
        })
    }
}

/// Split a planner reply into step lines.
///
/// Drops blank lines and a bare `plan:` echo.
pub fn parse_plan_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("plan:"))
        .map(str::to_string)
        .collect()
}

/// Turns a question into a plan.
#[derive(Clone)]
pub struct PlannerAgent {
    llm: Arc<dyn CompletionModel>,
}

impl PlannerAgent {
    pub fn new(llm: Arc<dyn CompletionModel>) -> Self {
        Self { llm }
    }

    /// Create a plan for `question`.
    ///
    /// Never fails. An empty reply yields [`FALLBACK_STEP`]; a model failure
    /// yields a single `General:` step carrying the error.
    pub async fn create_plan(&self, question: &str) -> Vec<String> {
        tracing::info!(question, "Creating plan");

        let reply = match self
            .llm
            .complete(prompts::PLANNER, &prompts::planner_input(question))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Error creating plan");
                return vec![format!("General: Error occurred while creating plan: {}", e)];
            }
        };

        let steps = parse_plan_lines(&reply);
        if steps.is_empty() {
            tracing::warn!("Planner returned no steps, using fallback");
            return vec![FALLBACK_STEP.to_string()];
        }

        log_plan(&steps);
        steps
    }
}

fn log_plan(steps: &[String]) {
    let parsed: Vec<PlanStep<'_>> = steps.iter().filter_map(|s| PlanStep::parse(s)).collect();

    for kind in [StepKind::Inference, StepKind::General] {
        for (n, step) in parsed.iter().filter(|s| s.kind == kind).enumerate() {
            tracing::info!(kind = %kind, n = n + 1, step = step.raw, "Plan step");
        }
    }
}
