//! # RugbyBot NLP
//!
//! Query understanding for the RugbyBot pipeline.
//!
//! ## Features
//!
//! - **Routing**: decides whether a query is answered here ("simple") or escalated ("complex")
//! - **Intent Classification**: picks one label from a closed set, decoding untrusted model output
//! - **Entity Extraction**: pulls players, teams, positions, event types and time references out of the text
//! - **Response Phrasing**: words a resolved record as a short answer
//!
//! ## Example
//!
//! ```rust,no_run
//! use rugby_core::AppConfig;
//! use rugby_nlp::{QueryEngine, QueryOutcome};
//! # use std::sync::Arc;
//! # async fn run(service: Arc<dyn rugby_core::LanguageModelService>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let mut engine = QueryEngine::from_config(&config, service)?;
//!
//! if let QueryOutcome::Resolved(resolved) = engine.process("who scored the most tries for Lyon?").await? {
//!     println!("{}: {:?}", resolved.intent, resolved.result.data);
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotator;
pub mod engine;
pub mod entity;
pub mod error;
pub mod intent;
pub mod parser;
pub mod responder;
pub mod routing;
pub mod vocabulary;

pub use annotator::{
    Annotation, EntityLabel, EntitySpan, PartOfSpeech, RuleAnnotator, TextAnnotator, Token,
};
pub use engine::{handler_for, QueryEngine, QueryOutcome, ResolvedQuery};
pub use entity::EntityExtractor;
pub use error::{NlpError, Result};
pub use intent::{CacheStats, CacheUsage, IntentClassifier};
pub use parser::{IntentParser, ParseStrategy};
pub use responder::ResponsePhraser;
pub use routing::{normalize_route, RoutingClassifier};
pub use vocabulary::{Vocabularies, Vocabulary};
