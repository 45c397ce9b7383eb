//! Intent-driven resolution of extracted entities against the loaded corpus.
//!
//! The resolver is read-only after construction. Every handler returns its records through
//! a [`QueryResult`]; no resolution failure escapes as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use rugby_core::{intents, EntitySet};

use crate::loader::{Corpus, CorpusLoader};
use crate::model::{Event, Game, GameId, Player, PlayerId, TeamId, TeamSide};
use crate::stats::{EventStats, PerformerTally};
use crate::Result;

const NO_PLAYERS: &str = "No matching players found";
const NO_DATA: &str = "No matching data found";
const NO_RANKING: &str = "No ranking data found";
const NO_TEAMS: &str = "No matching teams found";
const NO_COMPARISON: &str = "Insufficient data for comparison";
const NO_GAMES: &str = "No games loaded";

/// Outcome of resolving one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub intent: String,
    pub data: Vec<ResultRecord>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl QueryResult {
    /// Succeeds when any record was produced, otherwise fails with `empty_error`.
    pub fn from_records(intent: &str, data: Vec<ResultRecord>, empty_error: &str) -> Self {
        let success = !data.is_empty();
        Self {
            intent: intent.to_string(),
            data,
            success,
            error: if success {
                None
            } else {
                Some(empty_error.to_string())
            },
            metadata: None,
        }
    }

    pub fn failure(intent: &str, message: impl Into<String>) -> Self {
        Self {
            intent: intent.to_string(),
            data: Vec::new(),
            success: false,
            error: Some(message.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One record of a query result, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultRecord {
    PlayerInfo(PlayerSummary),
    PlayerStats {
        player: PlayerSummary,
        statistics: EventStats,
        event_types: Vec<String>,
    },
    TeamStats {
        team: String,
        team_id: TeamId,
        statistics: EventStats,
        event_types: Vec<String>,
    },
    Ranking {
        top_players: Vec<RankedPlayer>,
        event_types: Vec<String>,
        total_events: usize,
    },
    TeamInfo {
        team_name: String,
        players: Vec<Player>,
    },
    PlayerComparison(PlayerComparison),
    GameSummary(GameSummary),
}

/// Display view of a single player appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub jersey_number: Option<u32>,
    pub position: Option<String>,
    pub team: String,
    pub team_type: TeamSide,
    pub game_id: Option<GameId>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.player_id,
            name: player.full_name(),
            jersey_number: player.jersey_number,
            position: player.position.clone(),
            team: player.team_name.clone(),
            team_type: player.team_type,
            game_id: player.game_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub player: PlayerSummary,
    pub count: usize,
    /// Absent when none of the player's counted events carried a grade.
    pub avg_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComparison {
    pub comparison_data: Vec<ComparedPlayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedPlayer {
    pub player: Player,
    pub statistics: EventStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: Option<GameId>,
    pub round: Option<Value>,
    pub start_time: Option<Value>,
    pub competition: Option<Value>,
    pub venue: Option<Value>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            game_id: game.id,
            round: game.round.clone(),
            start_time: game.start_time.clone(),
            competition: game.competition.clone(),
            venue: game.venue.clone(),
            home_team: game.home_team.name.clone(),
            away_team: game.away_team.name.clone(),
        }
    }
}

/// In-memory index over games, player appearances and events
#[derive(Debug, Clone)]
pub struct DataResolver {
    games: Vec<Game>,
    players: Vec<Player>,
    events: Vec<Event>,
}

impl DataResolver {
    pub fn new(corpus: Corpus) -> Self {
        let players: Vec<Player> = corpus.games.iter().flat_map(Game::players).collect();
        info!(
            games = corpus.games.len(),
            events = corpus.events.len(),
            players = players.len(),
            "Data resolver initialized"
        );
        Self {
            games: corpus.games,
            players,
            events: corpus.events,
        }
    }

    /// Loads the corpus from `data_dir`. Fails when no game can be read.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let corpus = CorpusLoader::new(data_dir).load()?;
        Ok(Self::new(corpus))
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Distinct team names in roster order.
    pub fn team_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.players
            .iter()
            .filter(|p| !p.team_name.is_empty())
            .filter(|p| seen.insert(p.team_name.as_str()))
            .map(|p| p.team_name.clone())
            .collect()
    }

    #[instrument(skip(self, entities))]
    pub fn resolve(&self, entities: &EntitySet, intent: &str) -> QueryResult {
        debug!(?entities, "Resolving query");

        let (data, empty_error) = match intent {
            intents::GET_PLAYER_INFO => (self.player_info(entities), NO_PLAYERS),
            intents::GET_STATS => (self.stats(entities), NO_DATA),
            intents::GET_RANKINGS | intents::TOP_STAT_IN_GAME => {
                (self.rankings(entities), NO_RANKING)
            }
            intents::GET_TEAM_INFO => (self.team_info(entities), NO_TEAMS),
            intents::COMPARE => (self.compare(entities), NO_COMPARISON),
            intents::GET_GAME_INFO => return self.game_info(intent),
            other => return QueryResult::failure(intent, format!("Unknown intent: {}", other)),
        };

        QueryResult::from_records(intent, data, empty_error)
    }

    fn player_info(&self, entities: &EntitySet) -> Vec<ResultRecord> {
        entities
            .players
            .iter()
            .flat_map(|reference| self.find_players(reference, &entities.teams))
            .map(|player| ResultRecord::PlayerInfo(player.into()))
            .collect()
    }

    fn stats(&self, entities: &EntitySet) -> Vec<ResultRecord> {
        let event_types = &entities.event_types;

        if !entities.players.is_empty() {
            return entities
                .players
                .iter()
                .filter_map(|reference| self.find_player(reference, &entities.teams))
                .map(|player| ResultRecord::PlayerStats {
                    player: player.into(),
                    statistics: self.player_stats(player.player_id, event_types),
                    event_types: event_types.clone(),
                })
                .collect();
        }

        let mut records = Vec::new();
        for team in &entities.teams {
            let Some(first) = self.players.iter().find(|p| p.plays_for(team)) else {
                continue;
            };
            let Some(team_id) = first.team_id else {
                warn!(team = %first.team_name, "Skipping team without a team id");
                continue;
            };
            let statistics = EventStats::from_events(
                self.events
                    .iter()
                    .filter(|e| e.team_id == Some(team_id))
                    .filter(|e| type_filter(e, event_types)),
            );
            records.push(ResultRecord::TeamStats {
                team: team.clone(),
                team_id,
                statistics,
                event_types: event_types.clone(),
            });
        }
        records
    }

    fn rankings(&self, entities: &EntitySet) -> Vec<ResultRecord> {
        let event_types = &entities.event_types;
        let team_ids: HashSet<TeamId> = entities
            .teams
            .iter()
            .flat_map(|team| self.players.iter().filter(move |p| p.plays_for(team)))
            .filter_map(|p| p.team_id)
            .collect();

        let relevant: Vec<&Event> = self
            .events
            .iter()
            .filter(|e| type_filter(e, event_types))
            .filter(|e| {
                entities.teams.is_empty() || e.team_id.map_or(false, |id| team_ids.contains(&id))
            })
            .collect();

        // Tallies kept in first-seen order so equal performers resolve to the earliest.
        let mut order: HashMap<PlayerId, usize> = HashMap::new();
        let mut tallies: Vec<(PlayerId, PerformerTally)> = Vec::new();
        for event in &relevant {
            let Some(player_id) = event.player_id else {
                continue;
            };
            let slot = *order.entry(player_id).or_insert_with(|| {
                tallies.push((player_id, PerformerTally::default()));
                tallies.len() - 1
            });
            tallies[slot].1.record(event.grade());
        }

        let top = tallies.iter().fold(None, |best: Option<&(PlayerId, PerformerTally)>, cur| {
            match best {
                Some(b) if !cur.1.outranks(&b.1) => Some(b),
                _ => Some(cur),
            }
        });

        let Some((player_id, tally)) = top else {
            return Vec::new();
        };
        let Some(player) = self.players.iter().find(|p| p.player_id == *player_id) else {
            debug!(player_id = %player_id, "Top performer is not on any loaded roster");
            return Vec::new();
        };

        vec![ResultRecord::Ranking {
            top_players: vec![RankedPlayer {
                player: player.into(),
                count: tally.count,
                avg_grade: tally.grades.average(),
            }],
            event_types: event_types.clone(),
            total_events: relevant.len(),
        }]
    }

    fn team_info(&self, entities: &EntitySet) -> Vec<ResultRecord> {
        entities
            .teams
            .iter()
            .filter_map(|team| {
                let roster: Vec<Player> = self
                    .players
                    .iter()
                    .filter(|p| p.plays_for(team))
                    .cloned()
                    .collect();
                let team_name = roster.first()?.team_name.clone();
                Some(ResultRecord::TeamInfo {
                    team_name,
                    players: roster,
                })
            })
            .collect()
    }

    fn compare(&self, entities: &EntitySet) -> Vec<ResultRecord> {
        if entities.players.len() < 2 {
            return Vec::new();
        }

        let comparison_data: Vec<ComparedPlayer> = entities
            .players
            .iter()
            .filter_map(|reference| self.find_player(reference, &entities.teams))
            .map(|player| ComparedPlayer {
                player: player.clone(),
                statistics: self.player_stats(player.player_id, &[]),
            })
            .collect();

        if comparison_data.len() < 2 {
            return Vec::new();
        }
        vec![ResultRecord::PlayerComparison(PlayerComparison {
            comparison_data,
        })]
    }

    /// Every loaded game, regardless of entities.
    fn game_info(&self, intent: &str) -> QueryResult {
        let data: Vec<ResultRecord> = self
            .games
            .iter()
            .map(|game| ResultRecord::GameSummary(game.into()))
            .collect();
        let games = data.len();
        QueryResult::from_records(intent, data, NO_GAMES)
            .with_metadata(serde_json::json!({ "games": games }))
    }

    /// First appearance matching `reference`.
    pub fn find_player(&self, reference: &str, teams: &[String]) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| matches_reference(p, reference, teams))
    }

    /// Every appearance matching `reference`, in corpus order.
    pub fn find_players<'a>(
        &'a self,
        reference: &'a str,
        teams: &'a [String],
    ) -> impl Iterator<Item = &'a Player> + 'a {
        self.players
            .iter()
            .filter(move |p| matches_reference(p, reference, teams))
    }

    /// Event statistics for one player, optionally narrowed to matching event types.
    pub fn player_stats(&self, player_id: PlayerId, event_types: &[String]) -> EventStats {
        EventStats::from_events(
            self.events
                .iter()
                .filter(|e| e.player_id == Some(player_id))
                .filter(|e| type_filter(e, event_types)),
        )
    }
}

/// A purely numeric reference is a jersey number, narrowed to the named teams when any are
/// given; anything else is a name fragment.
fn matches_reference(player: &Player, reference: &str, teams: &[String]) -> bool {
    match jersey_reference(reference) {
        Some(jersey) => {
            player.jersey_number == Some(jersey) && (teams.is_empty() || player.plays_for_any(teams))
        }
        None if is_numeric(reference) => false,
        None => player.name_matches(reference),
    }
}

fn is_numeric(reference: &str) -> bool {
    !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit())
}

fn jersey_reference(reference: &str) -> Option<u32> {
    if is_numeric(reference) {
        reference.parse().ok()
    } else {
        None
    }
}

fn type_filter(event: &Event, event_types: &[String]) -> bool {
    event_types.is_empty() || event.matches_any_type(event_types)
}
