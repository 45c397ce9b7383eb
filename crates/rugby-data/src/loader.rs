//! Corpus discovery and loading.
//!
//! `game*.json` files are parsed as [`Game`] records and `*-events.json` files as arrays of
//! [`Event`] records. Unreadable or malformed files are logged and skipped, as are individual
//! event records that are not JSON objects; a directory that yields no game at all is fatal.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::model::{Event, Game};
use crate::{DataError, Result};

pub const GAME_PATTERN: &str = "game*.json";
pub const EVENTS_PATTERN: &str = "*-events.json";

/// Everything read from a data directory
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub games: Vec<Game>,
    pub events: Vec<Event>,
}

impl Corpus {
    pub fn new(games: Vec<Game>, events: Vec<Event>) -> Self {
        Self { games, events }
    }
}

/// Reads a corpus from a directory of JSON files
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    data_dir: PathBuf,
}

impl CorpusLoader {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn load(&self) -> Result<Corpus> {
        let mut corpus = Corpus::default();

        for path in self.discover(GAME_PATTERN)? {
            if is_events_file(&path) {
                continue;
            }
            info!("Loading game file: {}", path.display());
            match read_json::<Game>(&path) {
                Ok(game) => corpus.games.push(game),
                Err(e) => warn!("Skipping game file {}: {}", path.display(), e),
            }
        }

        if corpus.games.is_empty() {
            return Err(DataError::NoGames {
                dir: self.data_dir.display().to_string(),
            });
        }

        for path in self.discover(EVENTS_PATTERN)? {
            info!("Loading event file: {}", path.display());
            match read_json::<Vec<Value>>(&path) {
                Ok(records) => corpus.events.extend(parse_events(&path, records)),
                Err(e) => warn!("Skipping event file {}: {}", path.display(), e),
            }
        }

        info!(
            games = corpus.games.len(),
            events = corpus.events.len(),
            "Corpus loaded from {}",
            self.data_dir.display()
        );

        Ok(corpus)
    }

    fn discover(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let full = self.data_dir.join(pattern);
        let full = full.to_string_lossy();
        let mut paths: Vec<PathBuf> = glob::glob(&full)
            .map_err(|e| DataError::Pattern(e.to_string()))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Cannot read corpus entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn is_events_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.ends_with("-events"))
        .unwrap_or(false)
}

fn parse_events(path: &Path, records: Vec<Value>) -> Vec<Event> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Event>(record) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping event {} in {}: {}", index, path.display(), e);
                None
            }
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| DataError::load(path, e))?;
    serde_json::from_str(&content).map_err(|e| DataError::load(path, e))
}
