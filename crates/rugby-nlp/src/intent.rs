//! Intent classification module.
//!
//! A language model picks one label from a closed set; its answer is decoded by the
//! [`IntentParser`]. Decoded labels are cached per normalized query.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use rugby_core::{
    intents, is_error_response, ChatMessage, ChatRequest, IntentPromptConfig,
    LanguageModelService, ResponseCache,
};

use crate::error::Result;
use crate::parser::IntentParser;

const INTENT_MAX_TOKENS: u32 = 16;

/// Cache counters as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CacheUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheUsage {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Classifies queries into one of the configured intent labels.
///
/// Owns its cache and counters; calls on one instance must be serialized by the caller.
pub struct IntentClassifier {
    service: Arc<dyn LanguageModelService>,
    parser: IntentParser,
    config: IntentPromptConfig,
    cache: Option<ResponseCache<String>>,
    hits: u64,
    misses: u64,
}

impl IntentClassifier {
    pub fn new(service: Arc<dyn LanguageModelService>, config: IntentPromptConfig) -> Result<Self> {
        let parser = IntentParser::new(config.valid_intents.iter().cloned())?;
        let cache = config
            .performance
            .enable_caching
            .then(|| ResponseCache::new(config.performance.max_cache_size));

        info!(
            model = %config.model_config.llm_model,
            labels = config.valid_intents.len(),
            caching = config.performance.enable_caching,
            "Intent classifier initialized"
        );

        Ok(Self {
            service,
            parser,
            config,
            cache,
            hits: 0,
            misses: 0,
        })
    }

    pub fn valid_intents(&self) -> &[String] {
        self.parser.labels()
    }

    pub fn model(&self) -> &str {
        &self.config.model_config.llm_model
    }

    pub async fn classify(&mut self, query: &str) -> String {
        self.classify_with_model(query, None).await
    }

    /// Classifies `query`, overriding the configured model for this call when given.
    ///
    /// Empty queries and service failures yield the default label; failures are not cached.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn classify_with_model(&mut self, query: &str, model: Option<&str>) -> String {
        let query = query.trim();
        if query.is_empty() {
            return intents::DEFAULT.to_string();
        }

        let key = query.to_lowercase();
        let started = Instant::now();

        if let Some(cache) = self.cache.as_mut() {
            if let Some(intent) = cache.get(&key) {
                self.hits += 1;
                debug!(intent = %intent, "Intent cache hit");
                return intent;
            }
            self.misses += 1;
            debug!("Intent cache miss");
        }

        let Some(intent) = self.classify_with_llm(query, model).await else {
            return intents::DEFAULT.to_string();
        };

        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, intent.clone());
        }

        if self.config.performance.log_performance {
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                hits = self.hits,
                misses = self.misses,
                "Classification finished"
            );
        }

        intent
    }

    /// `None` when the service failed; otherwise the decoded label.
    async fn classify_with_llm(&self, query: &str, model: Option<&str>) -> Option<String> {
        let model = model.unwrap_or(&self.config.model_config.llm_model);
        let request = ChatRequest::new(vec![ChatMessage::user(self.build_prompt(query))])
            .with_model(Some(model.to_string()))
            .with_temperature(0.0)
            .with_max_tokens(INTENT_MAX_TOKENS);

        match self.service.chat(request).await {
            Ok(raw) if is_error_response(&raw) => {
                error!("LLM classification failed: service returned an error response");
                None
            }
            Ok(raw) => {
                debug!(raw = %raw, "LLM response");
                Some(self.parser.parse(&raw))
            }
            Err(e) => {
                error!("LLM classification failed: {}", e);
                None
            }
        }
    }

    /// Label list, strict output format, and short disambiguation hints.
    pub fn build_prompt(&self, query: &str) -> String {
        let labels = self.parser.labels().join(", ");
        format!(
            "You are an intent classifier for rugby queries.\n\
             Choose exactly ONE label from this set:\n\
             {labels}\n\n\
             Return THE INTENT ONLY (no markdown, no code fences, no extra text): {{\"intent\":\"<one of the labels>\"}}\n\
             Classification hints (concise):\n\
             - Phrases like 'how many', 'number of' => get_stats\n\
             - 'who scored the most/best/top' => top_stat_in_game (NOT get_stats)\n\
             - 'compare X with Y' => compare\n\
             - 'roster', 'lineup', 'squad' => get_roster\n\
             - 'final score', 'result' => get_result\n\
             - 'grade', 'grades', 'rating' => get_grades\n\n\
             Query: {query}\n"
        )
    }

    /// Empties the cache and resets both counters.
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
            self.hits = 0;
            self.misses = 0;
            info!("Query cache cleared");
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let Some(cache) = self.cache.as_ref() else {
            return CacheStats {
                enabled: false,
                usage: None,
            };
        };
        let total = self.hits + self.misses;
        CacheStats {
            enabled: true,
            usage: Some(CacheUsage {
                size: cache.len(),
                max_size: cache.max_size(),
                hits: self.hits,
                misses: self.misses,
                hit_rate: if total == 0 {
                    0.0
                } else {
                    self.hits as f64 / total as f64
                },
            }),
        }
    }
}
