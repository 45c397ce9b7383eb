use serde::{Deserialize, Serialize};

/// Intent labels understood by the pipeline.
pub mod intents {
    pub const GET_STATS: &str = "get_stats";
    pub const COMPARE: &str = "compare";
    pub const GET_ROSTER: &str = "get_roster";
    pub const GET_RESULT: &str = "get_result";
    pub const GET_PLAYER_INFO: &str = "get_player_info";
    pub const TOP_STAT_IN_GAME: &str = "top_stat_in_game";
    pub const GET_GRADES: &str = "get_grades";

    // Resolver-only labels
    pub const GET_RANKINGS: &str = "get_rankings";
    pub const GET_TEAM_INFO: &str = "get_team_info";
    pub const GET_GAME_INFO: &str = "get_game_info";

    /// Label returned whenever classification cannot do better.
    pub const DEFAULT: &str = GET_STATS;

    /// The classifier label set used when no configuration overrides it.
    pub const DEFAULT_LABELS: [&str; 7] = [
        GET_STATS,
        COMPARE,
        GET_ROSTER,
        GET_RESULT,
        GET_PLAYER_INFO,
        TOP_STAT_IN_GAME,
        GET_GRADES,
    ];

    pub fn default_labels() -> Vec<String> {
        DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
    }
}

/// Handling path chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Simple,
    Complex,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Simple => "simple",
            Route::Complex => "complex",
        }
    }

    /// Parses an exact route label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "simple" => Some(Route::Simple),
            "complex" => Some(Route::Complex),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface-text entities pulled out of a query.
///
/// Values are spans of the query text, not resolved identifiers. Every list keeps
/// first-occurrence order and holds no duplicates after [`EntitySet::dedup`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub time_reference: Vec<String>,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.teams.is_empty()
            && self.positions.is_empty()
            && self.event_types.is_empty()
            && self.time_reference.is_empty()
    }

    /// Removes repeated values from every category, keeping the first occurrence.
    pub fn dedup(&mut self) {
        for list in [
            &mut self.players,
            &mut self.teams,
            &mut self.positions,
            &mut self.event_types,
            &mut self.time_reference,
        ] {
            dedup_in_order(list);
        }
    }

    pub fn with_players<I, S>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.players = players.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_event_types<I, S>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = event_types.into_iter().map(Into::into).collect();
        self
    }
}

fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

// Chat types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A single call to the language model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Model override; `None` lets the service use its own default.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: 0.0,
            max_tokens: 50,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
