//! Wire payloads for the chat-completions endpoint

use rugby_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Response body; only the fields the pipeline reads
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl CompletionResponse {
    /// Trimmed content of the first choice.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("route"), ChatMessage::user("who?")];
        let request = CompletionRequest {
            model: "phi3:3.8b",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 4,
            stream: false,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "phi3:3.8b",
                "messages": [
                    {"role": "system", "content": "route"},
                    {"role": "user", "content": "who?"}
                ],
                "temperature": 0.0,
                "max_tokens": 4,
                "stream": false
            })
        );
    }

    #[test]
    fn test_first_content_is_trimmed() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  simple\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_content(), Some("simple"));

        let empty: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_content(), None);
    }
}
