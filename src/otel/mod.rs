//! Tracing instrumentation.
//!
//! Spans follow OpenTelemetry semantic conventions so a `tracing-opentelemetry`
//! layer can be added by the host without touching call sites:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//! - https://opentelemetry.io/docs/specs/semconv/gen-ai/
//!
//! # Span kinds
//!
//! - `client`: calls that leave the process (SQLite reads, LLM requests)
//! - `internal`: router stages, schema discovery, plan execution
//!
//! # Example
//!
//! ```rust,ignore
//! use dbtalk::otel::{db_query_span, record_db_metrics};
//!
//! let span = db_query_span("SELECT count(*) FROM artists", "chinook");
//! let _guard = span.entered();
//! record_db_metrics(Some(1), false);
//! ```

pub mod background;
pub mod db;
pub mod router;

pub use background::{background_span, record_background_metrics, BackgroundJobType};
pub use db::{db_query_span, db_span, record_db_metrics, DbOperation};
pub use router::{llm_span, record_llm_metrics, stage_span};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// Filter comes from `RUST_LOG` (default `info`, with HTTP client noise held
/// at `warn`). `json = true` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn,h2=warn"));

    let builder = fmt().with_env_filter(filter).with_target(false);

    // A second init (tests, embedding hosts) keeps the first subscriber.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
