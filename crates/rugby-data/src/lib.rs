//! Data layer for the RugbyBot query pipeline
//!
//! This crate loads the match corpus (games with rosters, plus per-game event files) and
//! answers classified queries against it: player and team lookups, event statistics,
//! rankings with grade tie-breaks, comparisons and game summaries.

pub mod loader;
pub mod model;
pub mod resolver;
pub mod stats;

// Re-exports
pub use loader::{Corpus, CorpusLoader};
pub use model::{Event, Game, GameId, Player, PlayerId, TeamId, TeamSide};
pub use resolver::{
    DataResolver, GameSummary, PlayerComparison, PlayerSummary, QueryResult, RankedPlayer,
    ResultRecord,
};
pub use stats::{EventStats, GradeAccumulator, GradeSummary, PerformerTally};

use std::path::Path;

/// Error types for corpus operations
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("No game files found in {dir}")]
    NoGames { dir: String },

    #[error("Invalid corpus pattern: {0}")]
    Pattern(String),
}

impl DataError {
    pub fn load(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
