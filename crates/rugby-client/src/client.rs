//! Chat-completions client implementation

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use rugby_core::{ChatRequest, LanguageModelService, LlmConfig, ERROR_SENTINEL};

use crate::error::{ClientError, Result};
use crate::models::{CompletionRequest, CompletionResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for an OpenAI-style chat-completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    endpoint: Url,
    api_key: Secret<String>,
    model: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Builder for creating an [`LlmClient`]
#[derive(Default)]
pub struct LlmClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl LlmClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full URL of the completions endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Model used when a request carries no override
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<LlmClient> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| rugby_core::config::DEFAULT_BASE_URL.to_string());
        let endpoint = Url::parse(&endpoint)?;

        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::Config("API key is required".to_string()))?;

        let model = self
            .model
            .unwrap_or_else(|| rugby_core::config::DEFAULT_MODEL.to_string());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(format!("rugby-client/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ClientError::Http)?;

        Ok(LlmClient {
            http,
            endpoint,
            api_key: Secret::new(api_key),
            model,
        })
    }
}

impl LlmClient {
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::builder()
            .endpoint(&config.base_url)
            .api_key(&config.api_key)
            .model(&config.model)
            .timeout(config.timeout())
            .build()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    async fn handle_response(&self, response: Response) -> Result<CompletionResponse> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Sends one non-streaming completion request and returns the trimmed first choice.
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    pub async fn try_chat(&self, request: &ChatRequest) -> Result<String> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = CompletionRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await?;

        let completion = self.handle_response(response).await?;
        let content = completion
            .first_content()
            .ok_or(ClientError::EmptyResponse)?
            .to_string();
        debug!(model = %model, chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[async_trait]
impl LanguageModelService for LlmClient {
    /// Failures come back as [`ERROR_SENTINEL`] rather than `Err`.
    async fn chat(&self, request: ChatRequest) -> rugby_core::Result<String> {
        match self.try_chat(&request).await {
            Ok(content) => Ok(content),
            Err(e) => {
                error!("LLM request failed: {}", e);
                Ok(ERROR_SENTINEL.to_string())
            }
        }
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let client = LlmClient::builder()
            .endpoint("http://localhost:3000/api/chat/completions")
            .api_key("test-key")
            .model("llama3")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:3000/api/chat/completions"
        );
        assert_eq!(client.model(), "llama3");
        assert_eq!(client.default_model(), "llama3");
    }

    #[test]
    fn test_builder_requires_api_key() {
        let err = LlmClient::builder().api_key("  ").build().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = LlmClient::builder()
            .endpoint("not a url")
            .api_key("k")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Url(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = LlmClient::builder().api_key("sk-secret").build().unwrap();
        let printed = format!("{:?}", client);
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("sk-secret"));
    }

    #[test]
    fn test_from_config() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9/v1/chat".to_string(),
            api_key: "k".to_string(),
            model: "phi3:3.8b".to_string(),
            timeout_seconds: 2,
        };
        let client = LlmClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "phi3:3.8b");
        assert_eq!(client.endpoint().path(), "/v1/chat");
    }
}
