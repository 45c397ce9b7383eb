pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod types;

pub use cache::ResponseCache;
pub use config::{
    AppConfig, ChatResponsePrompt, IntentPromptConfig, LlmConfig, PathsConfig, PromptStore, RoutingExample,
    RoutingPrompt,
};
pub use error::{CoreError, Result};
pub use llm::{is_error_response, LanguageModelService, ERROR_SENTINEL};
pub use types::{intents, ChatMessage, ChatRequest, EntitySet, MessageRole, Route};
