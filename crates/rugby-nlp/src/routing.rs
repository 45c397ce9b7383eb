//! Routing classification: "simple" queries are answered here, "complex" ones escalate.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use rugby_core::{
    is_error_response, ChatMessage, ChatRequest, LanguageModelService, Route, RoutingPrompt,
};

const ROUTING_MAX_TOKENS: u32 = 4;

/// Characters stripped from both ends of the first response word.
const STRIP_CHARS: &[char] = &[
    '.', ',', ':', ';', '!', '?', '\'', '"', '-', '_', '/', '\\', '(', ')', '[', ']', '{', '}',
];

/// Few-shot router backed by a language model.
///
/// Never fails: unexpected output and service errors both route to [`Route::Simple`].
pub struct RoutingClassifier {
    service: Arc<dyn LanguageModelService>,
    prompt: RoutingPrompt,
}

impl RoutingClassifier {
    pub fn new(service: Arc<dyn LanguageModelService>, prompt: RoutingPrompt) -> Self {
        Self { service, prompt }
    }

    pub fn prompt(&self) -> &RoutingPrompt {
        &self.prompt
    }

    /// System instruction, then each example as a user/assistant exchange, then the query.
    pub fn build_messages(&self, query: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + self.prompt.examples.len() * 2);
        messages.push(ChatMessage::system(self.prompt.system.clone()));
        for example in &self.prompt.examples {
            messages.push(ChatMessage::user(example.user.clone()));
            messages.push(ChatMessage::assistant(example.route.clone()));
        }
        messages.push(ChatMessage::user(query));
        messages
    }

    pub async fn classify(&self, query: &str) -> Route {
        self.classify_with_model(query, None).await
    }

    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn classify_with_model(&self, query: &str, model: Option<&str>) -> Route {
        let request = ChatRequest::new(self.build_messages(query))
            .with_model(model.map(str::to_string))
            .with_temperature(0.0)
            .with_max_tokens(ROUTING_MAX_TOKENS);

        let raw = match self.service.chat(request).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Routing classification error: {}", e);
                return Route::Simple;
            }
        };

        let normalized = normalize_route(&raw);
        match Route::from_label(&normalized) {
            Some(route) => {
                debug!(route = %route, "Query routed");
                route
            }
            None => {
                warn!(
                    "Unexpected routing response: '{}' -> '{}'. Defaulting to 'simple'.",
                    raw, normalized
                );
                Route::Simple
            }
        }
    }
}

/// Reduces a routing response to a label.
///
/// The first word, stripped of surrounding punctuation and lowercased, is mapped:
/// `simple`/`s` and any number to `simple`, `complex`/`c` to `complex`. Otherwise a
/// response mentioning an error or the service sentinel is `simple`, and anything else
/// passes through unchanged for the caller to reject.
pub fn normalize_route(raw: &str) -> String {
    let response = raw.trim().to_lowercase();
    let first = response
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(STRIP_CHARS);

    match first {
        "simple" | "s" => Route::Simple.as_str().to_string(),
        "complex" | "c" => Route::Complex.as_str().to_string(),
        _ if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) => {
            Route::Simple.as_str().to_string()
        }
        _ if response.contains("error") || is_error_response(&response) => {
            Route::Simple.as_str().to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rugby_core::{CoreError, MessageRole, RoutingExample, ERROR_SENTINEL};
    use std::sync::Mutex;

    /// Returns a fixed reply and records every request.
    struct ScriptedService {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedService {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection refused".to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModelService for ScriptedService {
        async fn chat(&self, request: ChatRequest) -> rugby_core::Result<String> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone().map_err(CoreError::service)
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    fn prompt() -> RoutingPrompt {
        RoutingPrompt {
            system: "route".to_string(),
            examples: vec![
                RoutingExample::new("who is player 7?", "simple"),
                RoutingExample::new("has Lyon improved?", "complex"),
            ],
        }
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("Simple."), "simple");
        assert_eq!(normalize_route("  COMPLEX\n because"), "complex");
        assert_eq!(normalize_route("\"s\""), "simple");
        assert_eq!(normalize_route("(c)"), "complex");
        assert_eq!(normalize_route("42"), "simple");
        assert_eq!(normalize_route(ERROR_SENTINEL), "simple");
        assert_eq!(normalize_route("an error occurred"), "simple");
        assert_eq!(normalize_route("Maybe, it depends"), "maybe");
        assert_eq!(normalize_route(""), "");
    }

    #[test]
    fn test_message_layout() {
        let classifier = RoutingClassifier::new(ScriptedService::replying("simple"), prompt());
        let messages = classifier.build_messages("final score of match 6?");

        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert_eq!(messages[4].content, "complex");
        assert_eq!(messages[5].content, "final score of match 6?");
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let service = ScriptedService::replying("complex");
        let classifier = RoutingClassifier::new(service.clone(), prompt());

        let route = classifier.classify_with_model("trend?", Some("llama3")).await;
        assert_eq!(route, Route::Complex);

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 4);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].model.as_deref(), Some("llama3"));
    }

    #[tokio::test]
    async fn test_unexpected_output_defaults_to_simple() {
        let classifier = RoutingClassifier::new(ScriptedService::replying("perhaps"), prompt());
        assert_eq!(classifier.classify("anything").await, Route::Simple);
    }

    #[tokio::test]
    async fn test_service_failure_defaults_to_simple() {
        let classifier = RoutingClassifier::new(ScriptedService::failing(), prompt());
        assert_eq!(classifier.classify("anything").await, Route::Simple);

        let classifier = RoutingClassifier::new(ScriptedService::replying(ERROR_SENTINEL), prompt());
        assert_eq!(classifier.classify("anything").await, Route::Simple);
    }
}
