//! Chat-completion integration crate for Sage.
//!
//! This crate provides a provider-agnostic abstraction for calling a hosted
//! chat-completion API, plus the deadline guard every pipeline call goes
//! through.
//!
//! # Providers
//! - **OpenAI-compatible**: any `POST /chat/completions` endpoint with bearer auth
//!
//! # Example
//! ```no_run
//! use sage_llm::{complete_with_deadline, ChatMessage, CompletionRequest, OpenAiCompatClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::new("https://api.example.com/v1", "token");
//! let request = CompletionRequest::new("llama", vec![ChatMessage::user("Hello")], 1000);
//! let answer = complete_with_deadline(&client, &request, Duration::from_secs(30), None).await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod deadline;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatCompletionClient, CompletionError, CompletionRequest};
pub use deadline::complete_with_deadline;
pub use factory::create_client;
pub use providers::OpenAiCompatClient;
pub use types::{ChatMessage, ChatRole};
