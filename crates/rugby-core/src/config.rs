use config::{Config, Environment};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::cache::DEFAULT_MAX_SIZE;
use crate::error::{CoreError, Result};
use crate::types::intents;

/// Default hosted chat-completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://gpt.matchsense.dev/api/chat/completions";

/// Default model for both classifiers
pub const DEFAULT_MODEL: &str = "phi3:3.8b";

/// Legacy variable the deployment exports the API key under
pub const API_KEY_ENV: &str = "OPENWEBUI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub paths: PathsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_env("RUGBY")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.api_key", std::env::var(API_KEY_ENV).unwrap_or_default())?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.timeout_seconds", 60)?
            .set_default("paths.data_dir", "data")?
            .set_default("paths.prompts_dir", "config/prompts")?
            .set_default("paths.shared_dir", "config/shared")?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on settings the pipeline cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(CoreError::configuration(format!(
                "{} environment variable not set",
                API_KEY_ENV
            )));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(CoreError::configuration("llm.base_url must not be empty"));
        }
        Ok(())
    }

    pub fn prompt_store(&self) -> PromptStore {
        PromptStore::new(&self.paths.prompts_dir)
    }
}

/// Language model endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Filesystem locations of the corpus and definition files
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub shared_dir: PathBuf,
}

/// One few-shot routing example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingExample {
    pub user: String,
    pub route: String,
}

impl RoutingExample {
    pub fn new(user: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            route: route.into(),
        }
    }
}

/// Routing classifier definition: system instruction plus few-shot examples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPrompt {
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub examples: Vec<RoutingExample>,
}

impl Default for RoutingPrompt {
    fn default() -> Self {
        Self {
            system: "You route rugby questions. Answer with exactly one word: \
                     'simple' when the question is a direct lookup of a stat, score, roster \
                     or player, 'complex' when it needs multi-step reasoning, trends or \
                     judgement across several games."
                .to_string(),
            examples: vec![
                RoutingExample::new("How many tackles did player 15 make in round 3?", "simple"),
                RoutingExample::new("Compare player 9's stats with player 10.", "simple"),
                RoutingExample::new("What was the final score of match 6?", "simple"),
                RoutingExample::new("Has Lyon improved throughout the season?", "complex"),
                RoutingExample::new("Which team had the most offloads?", "simple"),
                RoutingExample::new(
                    "Was player 12 more efficient than player 13 in the last 5 games?",
                    "complex",
                ),
                RoutingExample::new("What jersey number does Dupont wear?", "simple"),
                RoutingExample::new("How consistent was Toulon across the tournament?", "complex"),
            ],
        }
    }
}

/// Intent classifier definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPromptConfig {
    #[serde(default = "intents::default_labels")]
    pub valid_intents: Vec<String>,
    #[serde(default)]
    pub model_config: ModelConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl Default for IntentPromptConfig {
    fn default() -> Self {
        Self {
            valid_intents: intents::default_labels(),
            model_config: ModelConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub llm_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            llm_model: default_model(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_true")]
    pub enable_caching: bool,
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
    #[serde(default = "default_true")]
    pub log_performance: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            max_cache_size: DEFAULT_MAX_SIZE,
            log_performance: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_cache_size() -> usize {
    DEFAULT_MAX_SIZE
}

/// Template used to phrase a resolved record as a short answer.
///
/// `{query}` and `{record}` are substituted on render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponsePrompt {
    #[serde(default = "default_response_template")]
    pub template: String,
    #[serde(default = "default_response_temperature")]
    pub temperature: f32,
    #[serde(default = "default_response_max_tokens")]
    pub max_tokens: u32,
}

impl ChatResponsePrompt {
    pub fn render(&self, query: &str, record: &str) -> String {
        self.template
            .replace("{query}", query.trim())
            .replace("{record}", record)
    }
}

impl Default for ChatResponsePrompt {
    fn default() -> Self {
        Self {
            template: default_response_template(),
            temperature: default_response_temperature(),
            max_tokens: default_response_max_tokens(),
        }
    }
}

fn default_response_template() -> String {
    "Answer the rugby question in one or two sentences using only this data record. \
     Do not invent numbers.\n\nQuestion: {query}\nRecord: {record}"
        .to_string()
}

fn default_response_temperature() -> f32 {
    0.3
}

fn default_response_max_tokens() -> u32 {
    100
}

/// Loads named YAML definition files from a directory.
///
/// Definitions are opaque mappings; a missing file or a document that is not a mapping
/// is a configuration error.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub const ROUTING: &'static str = "routing_classifier";
    pub const INTENT: &'static str = "intent_classification";
    pub const CHAT_RESPONSE: &'static str = "chat_response";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", name))
    }

    /// Reads `<dir>/<name>.yaml` and checks that it holds a mapping.
    pub fn load_mapping(&self, name: &str) -> Result<serde_yaml::Mapping> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(CoreError::configuration(format!(
                "Prompt file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&content).map_err(|e| {
            CoreError::configuration(format!("Error parsing {}: {}", path.display(), e))
        })?;

        match value {
            serde_yaml::Value::Mapping(mapping) => {
                debug!("Loaded prompt definition {}", path.display());
                Ok(mapping)
            }
            other => Err(CoreError::configuration(format!(
                "Expected mapping in {}, got {}",
                path.display(),
                yaml_kind(&other)
            ))),
        }
    }

    /// Loads a definition into a typed view.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let mapping = self.load_mapping(name)?;
        serde_yaml::from_value(serde_yaml::Value::Mapping(mapping)).map_err(|e| {
            CoreError::configuration(format!("Invalid definition '{}': {}", name, e))
        })
    }

    pub fn routing_prompt(&self) -> Result<RoutingPrompt> {
        self.load(Self::ROUTING)
    }

    pub fn intent_config(&self) -> Result<IntentPromptConfig> {
        self.load(Self::INTENT)
    }

    pub fn chat_response_prompt(&self) -> Result<ChatResponsePrompt> {
        self.load(Self::CHAT_RESPONSE)
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(name: &str, content: &str) -> (tempfile::TempDir, PromptStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}.yaml", name)), content).unwrap();
        let store = PromptStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_prompt_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path());
        let err = store.routing_prompt().unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
        assert!(err.to_string().contains("routing_classifier.yaml"));
    }

    #[test]
    fn test_non_mapping_prompt_file_is_rejected() {
        let (_dir, store) = store_with("routing_classifier", "- just\n- a list\n");
        let err = store.load_mapping("routing_classifier").unwrap_err();
        assert!(err.to_string().contains("Expected mapping"));
        assert!(err.to_string().contains("sequence"));
    }

    #[test]
    fn test_routing_prompt_loads() {
        let (_dir, store) = store_with(
            "routing_classifier",
            "system: route it\nexamples:\n  - user: who is player 7?\n    route: simple\n",
        );
        let prompt = store.routing_prompt().unwrap();
        assert_eq!(prompt.system, "route it");
        assert_eq!(
            prompt.examples,
            vec![RoutingExample::new("who is player 7?", "simple")]
        );
    }

    #[test]
    fn test_intent_config_fills_defaults() {
        let (_dir, store) = store_with(
            "intent_classification",
            "performance:\n  max_cache_size: 8\n",
        );
        let config = store.intent_config().unwrap();
        assert_eq!(config.valid_intents, intents::default_labels());
        assert_eq!(config.model_config.llm_model, DEFAULT_MODEL);
        assert_eq!(config.performance.max_cache_size, 8);
        assert!(config.performance.enable_caching);
    }

    #[test]
    fn test_chat_response_prompt_renders() {
        let (_dir, store) = store_with(
            "chat_response",
            "template: \"Q: {query} | R: {record}\"\n",
        );
        let prompt = store.chat_response_prompt().unwrap();
        assert_eq!(prompt.temperature, 0.3);
        assert_eq!(prompt.max_tokens, 100);
        assert_eq!(
            prompt.render("  who wore 9?  ", "{\"name\":\"White\"}"),
            "Q: who wore 9? | R: {\"name\":\"White\"}"
        );
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = AppConfig {
            llm: LlmConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: "  ".to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout_seconds: 5,
            },
            paths: PathsConfig {
                data_dir: "data".into(),
                prompts_dir: "config/prompts".into(),
                shared_dir: "config/shared".into(),
            },
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
        assert_eq!(config.llm.timeout(), Duration::from_secs(5));
    }
}
