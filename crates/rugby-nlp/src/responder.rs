//! Response phrasing: turns a resolved record into a one or two sentence answer.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use rugby_core::{
    is_error_response, ChatMessage, ChatRequest, ChatResponsePrompt, LanguageModelService,
    PromptStore,
};
use rugby_data::ResultRecord;

/// Phrases records through a language model.
///
/// Yields `None` whenever the model cannot produce an answer, so callers can fall back to
/// showing the record itself.
pub struct ResponsePhraser {
    service: Arc<dyn LanguageModelService>,
    prompt: ChatResponsePrompt,
}

impl ResponsePhraser {
    pub fn new(service: Arc<dyn LanguageModelService>, prompt: ChatResponsePrompt) -> Self {
        Self { service, prompt }
    }

    /// Uses the `chat_response` definition from `store`, or the built-in template when it
    /// cannot be loaded.
    pub fn from_store(store: &PromptStore, service: Arc<dyn LanguageModelService>) -> Self {
        let prompt = store.chat_response_prompt().unwrap_or_else(|e| {
            warn!("Using built-in response template: {}", e);
            ChatResponsePrompt::default()
        });
        Self::new(service, prompt)
    }

    pub fn prompt(&self) -> &ChatResponsePrompt {
        &self.prompt
    }

    #[instrument(skip(self, record), fields(query_len = query.len()))]
    pub async fn phrase(&self, query: &str, record: &ResultRecord) -> Option<String> {
        let record = match serde_json::to_string(record) {
            Ok(record) => record,
            Err(e) => {
                warn!("Cannot serialize record for phrasing: {}", e);
                return None;
            }
        };

        let request = ChatRequest::new(vec![ChatMessage::user(self.prompt.render(query, &record))])
            .with_temperature(self.prompt.temperature)
            .with_max_tokens(self.prompt.max_tokens);

        match self.service.chat(request).await {
            Ok(text) if is_error_response(&text) => {
                warn!("Response phrasing returned the service error marker");
                None
            }
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    debug!("Response phrasing returned no text");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                warn!("Response phrasing failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rugby_core::{CoreError, ERROR_SENTINEL};
    use rugby_data::PlayerSummary;
    use std::sync::Mutex;

    struct ScriptedService {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedService {
        fn new(reply: std::result::Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
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

    fn record() -> ResultRecord {
        let player: PlayerSummary = serde_json::from_value(serde_json::json!({
            "player_id": 200,
            "name": "Ben White",
            "jersey_number": 9,
            "position": "scrum-half",
            "team": "RC Toulon",
            "team_type": "away",
            "game_id": 1
        }))
        .unwrap();
        ResultRecord::PlayerInfo(player)
    }

    #[tokio::test]
    async fn test_phrase_sends_rendered_template() {
        let service = ScriptedService::new(Ok("  Ben White wears 9 for Toulon.\n"));
        let phraser = ResponsePhraser::new(service.clone(), ChatResponsePrompt::default());

        let answer = phraser.phrase(" what number is White? ", &record()).await;
        assert_eq!(answer.as_deref(), Some("Ben White wears 9 for Toulon."));

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.3);
        assert_eq!(requests[0].max_tokens, 100);
        let content = &requests[0].messages[0].content;
        assert!(content.contains("Question: what number is White?"));
        assert!(content.contains("\"name\":\"Ben White\""));
    }

    #[tokio::test]
    async fn test_phrase_gives_up_on_service_failure() {
        let sentinel = ResponsePhraser::new(
            ScriptedService::new(Ok(ERROR_SENTINEL)),
            ChatResponsePrompt::default(),
        );
        assert_eq!(sentinel.phrase("who?", &record()).await, None);

        let failing = ResponsePhraser::new(
            ScriptedService::new(Err("connection refused")),
            ChatResponsePrompt::default(),
        );
        assert_eq!(failing.phrase("who?", &record()).await, None);

        let blank = ResponsePhraser::new(ScriptedService::new(Ok("   ")), ChatResponsePrompt::default());
        assert_eq!(blank.phrase("who?", &record()).await, None);
    }

    #[test]
    fn test_missing_definition_uses_builtin_template() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path());
        let phraser = ResponsePhraser::from_store(&store, ScriptedService::new(Ok("ok")));
        assert_eq!(phraser.prompt(), &ChatResponsePrompt::default());
    }
}
