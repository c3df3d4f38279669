//! Language model access: the completion capability, an HTTP client for it,
//! and the fixed prompts the router uses.

pub mod client;
pub mod prompts;

pub use client::{strip_markdown, LlmClient, LlmProvider};

use crate::types::Result;
use async_trait::async_trait;

/// Text completion capability.
///
/// Used for classification, planning, response synthesis and (through the
/// inference agent) SQL generation. Implementations should sample at
/// temperature 0 so classification is repeatable.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a system instruction and user input, return the raw reply text.
    async fn complete(&self, system_prompt: &str, user_input: &str) -> Result<String>;

    /// Model name for logging.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
