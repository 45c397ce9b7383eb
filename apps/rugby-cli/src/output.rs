//! Output formatting

use serde::Serialize;

use rugby_data::{QueryResult, RankedPlayer, ResultRecord};
use rugby_nlp::{QueryOutcome, ResponsePhraser};

pub const NO_RESULTS: &str = "Sorry, I couldn't find any results for that.";
pub const ESCALATED: &str = "That query is a bit complex - Thinking harder...";
pub const NOT_UNDERSTOOD: &str = "I didnt catch that. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Renders a pipeline outcome for display.
pub async fn render_outcome(
    query: &str,
    outcome: &QueryOutcome,
    format: OutputFormat,
    phraser: &ResponsePhraser,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(outcome),
        OutputFormat::Text => match outcome {
            QueryOutcome::Escalated { .. } => Ok(ESCALATED.to_string()),
            QueryOutcome::Resolved(resolved) => render_result(query, &resolved.result, phraser).await,
        },
    }
}

/// Rankings read as a fixed sentence. Otherwise the first record is phrased by the
/// language model, and the records print as JSON when phrasing fails.
pub async fn render_result(
    query: &str,
    result: &QueryResult,
    phraser: &ResponsePhraser,
) -> anyhow::Result<String> {
    let Some(first) = result.data.first().filter(|_| result.success) else {
        return Ok(NO_RESULTS.to_string());
    };

    if let [ResultRecord::Ranking { top_players, .. }] = result.data.as_slice() {
        if let Some(top) = top_players.first() {
            return Ok(ranking_sentence(top));
        }
    }

    match phraser.phrase(query, first).await {
        Some(answer) => Ok(answer),
        None => to_json(&result.data),
    }
}

fn ranking_sentence(top: &RankedPlayer) -> String {
    let player = &top.player;
    let who = match player.jersey_number {
        Some(jersey) => format!("{} ({}, #{})", player.name, player.team, jersey),
        None => format!("{} ({})", player.name, player.team),
    };
    format!("{} had the most with {}.", who, top.count)
}
