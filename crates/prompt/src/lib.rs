//! Prompt assembly for Sage.
//!
//! This crate turns retrieved passages and the caller's conversation into
//! the message list sent to the completion API:
//! - A grounding system instruction rendered with Handlebars
//! - Retrieved passages embedded verbatim between `START CONTEXT` / `END CONTEXT`
//! - Conversation history stripped down to `role` and `content`
//!
//! The instruction template can be overridden per workspace with a YAML
//! definition in `.sage/prompts/`.

pub mod builder;
pub mod loader;
pub mod template;
pub mod types;

// Re-export main types
pub use builder::{build_context_block, sanitize_history, PromptAssembler};
pub use loader::{load_prompt, load_prompt_or_default};
pub use template::{default_definition, GROUNDED_PROMPT_ID};
pub use types::{HistoryMessage, PromptDefinition};
