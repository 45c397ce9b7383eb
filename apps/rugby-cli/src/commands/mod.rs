//! CLI command implementations

pub mod ask;
pub mod chat;
pub mod classify;
pub mod entities;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use rugby_client::LlmClient;
use rugby_core::{AppConfig, LanguageModelService};
use rugby_nlp::{QueryEngine, ResponsePhraser};

/// Query engine plus the phraser that words its answers
pub struct Session {
    pub engine: QueryEngine,
    pub phraser: ResponsePhraser,
}

/// Loads configuration and wires the HTTP client into a query engine.
pub fn build_engine() -> Result<QueryEngine> {
    let (config, service) = connect()?;
    engine_from(&config, service)
}

/// Like [`build_engine`], with a phraser sharing the same client.
pub fn build_session() -> Result<Session> {
    let (config, service) = connect()?;
    let phraser = ResponsePhraser::from_store(&config.prompt_store(), service.clone());
    Ok(Session {
        engine: engine_from(&config, service)?,
        phraser,
    })
}

fn connect() -> Result<(AppConfig, Arc<dyn LanguageModelService>)> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    let client = LlmClient::from_config(&config.llm).context("Failed to build LLM client")?;
    info!(endpoint = %client.endpoint(), model = %client.model(), "LLM client ready");
    let service: Arc<dyn LanguageModelService> = Arc::new(client);
    Ok((config, service))
}

fn engine_from(config: &AppConfig, service: Arc<dyn LanguageModelService>) -> Result<QueryEngine> {
    QueryEngine::from_config(config, service).context("Failed to initialize query engine")
}
