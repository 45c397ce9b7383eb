//! Decoding of intent labels from untrusted generated text.
//!
//! The language model is asked for `{"intent": "<label>"}` but may wrap it in fences, add
//! commentary, or ignore the format. [`IntentParser`] tries an ordered list of strategies;
//! each either yields a label from the valid set or passes. When all pass the default
//! label is returned.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use rugby_core::intents;

use crate::error::Result;

lazy_static! {
    static ref FIRST_OBJECT: Regex = Regex::new(r"(?s)\{.*?\}").unwrap();
    static ref INTENT_FIELD: Regex = Regex::new(r#"(?i)"intent"\s*:\s*"([^"]+)""#).unwrap();
}

/// Decoding strategies in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Parse the first `{...}` block as JSON and read its `intent` field.
    JsonObject,
    /// Pull `"intent": "<value>"` out of otherwise malformed text.
    IntentField,
    /// Look for label names as whole words anywhere in the text.
    LabelScan,
}

impl ParseStrategy {
    pub const ORDER: [ParseStrategy; 3] = [Self::JsonObject, Self::IntentField, Self::LabelScan];
}

/// Maps raw model output onto one of a fixed set of labels
#[derive(Debug, Clone)]
pub struct IntentParser {
    labels: Vec<String>,
    label_patterns: Vec<Regex>,
}

impl IntentParser {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let label_patterns = labels
            .iter()
            .map(|label| Regex::new(&format!(r"\b{}\b", regex::escape(label))))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            labels,
            label_patterns,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_valid(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Always returns a label; the default when nothing in `raw` can be trusted.
    pub fn parse(&self, raw: &str) -> String {
        let text = raw.trim();
        ParseStrategy::ORDER
            .iter()
            .find_map(|strategy| {
                let label = self.apply(*strategy, text);
                if let Some(label) = &label {
                    trace!(?strategy, label = %label, "Intent decoded");
                }
                label
            })
            .unwrap_or_else(|| intents::DEFAULT.to_string())
    }

    pub fn apply(&self, strategy: ParseStrategy, text: &str) -> Option<String> {
        match strategy {
            ParseStrategy::JsonObject => self.from_json_object(text),
            ParseStrategy::IntentField => self.from_intent_field(text),
            ParseStrategy::LabelScan => self.from_label_scan(text),
        }
    }

    fn validated(&self, candidate: &str) -> Option<String> {
        let candidate = candidate.trim().to_lowercase();
        self.is_valid(&candidate).then_some(candidate)
    }

    fn from_json_object(&self, text: &str) -> Option<String> {
        let block = FIRST_OBJECT.find(text)?;
        let value: Value = serde_json::from_str(block.as_str()).ok()?;
        match value.get("intent")? {
            Value::String(s) => self.validated(s),
            Value::Null => None,
            other => self.validated(&other.to_string()),
        }
    }

    fn from_intent_field(&self, text: &str) -> Option<String> {
        let captures = INTENT_FIELD.captures(text)?;
        self.validated(captures.get(1)?.as_str())
    }

    /// Labels other than the default win over it; ties go to label order.
    fn from_label_scan(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        let found: Vec<&String> = self
            .labels
            .iter()
            .zip(&self.label_patterns)
            .filter(|(_, pattern)| pattern.is_match(&lower))
            .map(|(label, _)| label)
            .collect();

        found
            .iter()
            .find(|label| label.as_str() != intents::DEFAULT)
            .or_else(|| found.first())
            .map(|label| label.to_string())
    }
}
