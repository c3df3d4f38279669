//! Router stage and model call instrumentation.

use tracing::{field, span, Level, Span};
use uuid::Uuid;

/// Create a span for one router stage.
///
/// # Arguments
///
/// * `stage` - Stage name (`classify_input`, `create_plan`, ...)
/// * `question_id` - Correlation id of the question being answered
pub fn stage_span(stage: &str, question_id: &Uuid) -> Span {
    span!(
        Level::INFO,
        "router.stage",
        otel.name = %format!("router {}", stage),
        otel.kind = "internal",
        router.stage = stage,
        question.id = %question_id,
    )
}

/// Create a span for one language model request.
///
/// # Arguments
///
/// * `model` - Model name (`gen_ai.request.model`)
/// * `provider` - Provider name (`gen_ai.system`)
pub fn llm_span(model: &str, provider: &str) -> Span {
    span!(
        Level::INFO,
        "gen_ai.chat",
        otel.name = %format!("chat {}", model),
        otel.kind = "client",
        gen_ai.system = provider,
        gen_ai.request.model = model,
        gen_ai.response.chars = field::Empty,
        http.response.status_code = field::Empty,
    )
}

/// Record reply size and HTTP status on the current span.
pub fn record_llm_metrics(status_code: u16, response_chars: usize) {
    let span = Span::current();
    span.record("http.response.status_code", status_code);
    span.record("gen_ai.response.chars", response_chars);
}
