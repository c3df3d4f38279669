//! Core data types.
//!
//! - `ConversationState`: per-question working data threaded through the router
//! - `InputType`: classification label
//! - `AgentError` / `Result`: error handling for all operations

pub mod error;
pub mod state;

pub use error::{AgentError, Result};
pub use state::{ConversationState, InputType};
