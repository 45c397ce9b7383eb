//! # RugbyBot LLM client
//!
//! Chat-completions client implementing [`rugby_core::LanguageModelService`].
//!
//! ```rust,no_run
//! use rugby_client::LlmClient;
//! use rugby_core::{ChatMessage, ChatRequest, LanguageModelService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::builder()
//!         .endpoint("https://gpt.matchsense.dev/api/chat/completions")
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let request = ChatRequest::new(vec![ChatMessage::user("Who won round 3?")]);
//!     println!("{}", client.chat(request).await?);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod models;

pub use client::{LlmClient, LlmClientBuilder};
pub use error::{ClientError, Result};
pub use models::{Choice, ChoiceMessage, CompletionRequest, CompletionResponse};
