//! Route and intent diagnostics

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use rugby_core::Route;
use rugby_nlp::{handler_for, CacheStats};

use crate::output::{to_json, OutputFormat};

#[derive(Debug, Serialize)]
struct Classification {
    query: String,
    route: Route,
    intent: String,
    handler: String,
    cache: CacheStats,
}

pub async fn run(query: &str, model: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut engine = super::build_engine()?;

    let route = engine.router().classify_with_model(query, model).await;
    let intent = engine
        .intent_classifier_mut()
        .classify_with_model(query, model)
        .await;

    let classification = Classification {
        query: query.to_string(),
        route,
        handler: handler_for(&intent).to_string(),
        intent,
        cache: engine.intent_classifier().cache_stats(),
    };

    match format {
        OutputFormat::Json => println!("{}", to_json(&classification)?),
        OutputFormat::Text => {
            println!("{}: {}", "Route".bold(), classification.route);
            println!("{}: {}", "Intent".bold(), classification.intent);
            println!("{}: {}", "Handler".bold(), classification.handler);
        }
    }
    Ok(())
}
