//! Corpus records: games with their rosters, flattened player appearances, and match events.
//!
//! Every field read from corpus files is optional; a missing field never fails a lookup, and a
//! field holding the wrong JSON shape is read as absent rather than rejecting its record.
//! Display-only game fields (`round`, `start_time`, `competition`, `venue`) are kept as raw
//! JSON so that any shape the feed produces is passed through untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Jersey numbers outside this range are dropped at load time.
pub const JERSEY_RANGE: std::ops::RangeInclusive<u32> = 1..=23;

/// Field deserializer that reads any JSON value and keeps it only when it fits `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Sequence deserializer that drops the elements which do not fit `T` and keeps the rest.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed record: {}", e);
                None
            }
        })
        .collect())
}

// Newtype wrappers for type safety

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the fixture a team played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Home,
    Away,
}

/// A game file as published by the feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Game {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<GameId>,
    #[serde(default)]
    pub round: Option<Value>,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub competition: Option<Value>,
    #[serde(default)]
    pub venue: Option<Value>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub home_team: TeamSheet,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub away_team: TeamSheet,
}

impl Game {
    /// One player record per roster entry, home side first.
    pub fn players(&self) -> Vec<Player> {
        let mut players = Vec::with_capacity(self.home_team.roster.len() + self.away_team.roster.len());
        players.extend(self.home_team.players(self.id, TeamSide::Home));
        players.extend(self.away_team.players(self.id, TeamSide::Away));
        players
    }
}

/// One side of a game: team identity plus the match-day roster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSheet {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<TeamId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub roster: Vec<RosterEntry>,
}

impl TeamSheet {
    fn players(&self, game_id: Option<GameId>, side: TeamSide) -> Vec<Player> {
        self.roster
            .iter()
            .filter_map(|entry| {
                let person = entry.player.as_ref();
                let Some(player_id) = person.and_then(|p| p.id) else {
                    warn!(
                        team = ?self.name,
                        "Skipping roster entry without a player id"
                    );
                    return None;
                };

                let jersey_number = entry.jersey_number.and_then(|n| {
                    if JERSEY_RANGE.contains(&n) {
                        Some(n)
                    } else {
                        warn!(player_id = %player_id, jersey = n, "Ignoring out-of-range jersey number");
                        None
                    }
                });

                Some(Player {
                    player_id,
                    game_id,
                    team_id: self.id,
                    team_name: self.name.clone().unwrap_or_default(),
                    team_type: side,
                    jersey_number,
                    position: entry.roster_position.clone(),
                    first_name: person.and_then(|p| p.first_name.clone()),
                    last_name: person.and_then(|p| p.last_name.clone()),
                    country: person.and_then(|p| p.country.clone()),
                    weight: person.and_then(|p| p.weight),
                    height: person.and_then(|p| p.height),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub jersey_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub roster_position: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub player: Option<PersonRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<PlayerId>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<f64>,
}

/// A single game appearance. The same `player_id` appears once per game played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub game_id: Option<GameId>,
    pub team_id: Option<TeamId>,
    pub team_name: String,
    pub team_type: TeamSide,
    pub jersey_number: Option<u32>,
    pub position: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Case-insensitive substring match against the full name or the surname alone.
    pub fn name_matches(&self, reference: &str) -> bool {
        let needle = reference.to_lowercase();
        self.full_name().to_lowercase().contains(&needle)
            || self
                .last_name
                .as_deref()
                .map(|last| last.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }

    /// Case-insensitive substring match of a team reference against this player's team name.
    pub fn plays_for(&self, team_reference: &str) -> bool {
        self.team_name
            .to_lowercase()
            .contains(&team_reference.to_lowercase())
    }

    pub fn plays_for_any(&self, team_references: &[String]) -> bool {
        team_references.iter().any(|team| self.plays_for(team))
    }
}

/// A match event, kept as the feed wrote it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_id: Option<PlayerId>,
    #[serde(default, deserialize_with = "lenient")]
    pub team_id: Option<TeamId>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<EventMetadata>,
    #[serde(default)]
    pub grade: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Event {
    /// Event type as used for filtering; empty when the feed omitted it.
    pub fn kind_or_empty(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    /// Event type as used for grouping counts.
    pub fn kind_or_unknown(&self) -> &str {
        self.kind.as_deref().unwrap_or("unknown")
    }

    /// True when any requested type is a case-insensitive substring of this event's type.
    pub fn matches_any_type(&self, event_types: &[String]) -> bool {
        let kind = self.kind_or_empty().to_lowercase();
        event_types
            .iter()
            .any(|requested| kind.contains(&requested.to_lowercase()))
    }

    /// Grade on this event: `metadata.grade` first, then top-level `grade`.
    /// The first value that coerces to an integer wins.
    pub fn grade(&self) -> Option<i64> {
        let nested = self.metadata.as_ref().and_then(|m| m.grade.as_ref());
        nested
            .and_then(coerce_grade)
            .or_else(|| self.grade.as_ref().and_then(coerce_grade))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub grade: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Integer coercion for grades. Floats truncate toward zero, booleans count as 1 and 0, and
/// strings must hold an integer. Anything else is treated as absent.
pub fn coerce_grade(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
