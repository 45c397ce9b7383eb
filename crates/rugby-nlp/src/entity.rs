//! Entity extraction module.
//!
//! Rule-based extraction of players, teams, positions, event types and time references
//! from annotated query text. Results are surface spans of the query, deduplicated in
//! first-occurrence order.

use std::sync::Arc;
use tracing::{debug, instrument};

use rugby_core::EntitySet;

use crate::annotator::{Annotation, EntityLabel, PartOfSpeech, TextAnnotator};
use crate::vocabulary::{Vocabularies, Vocabulary};

/// Words that introduce a jersey number.
const PLAYER_CUES: &[&str] = &["player", "number", "no"];

/// Words after which a capitalized proper noun names a team.
const TEAM_INDICATORS: &[&str] = &["from", "for", "against", "versus", "vs", "in", "at"];

/// PERSON spans containing one of these words are clubs, not players.
const TEAM_NAME_WORDS: &[&str] = &["Lyon", "Toulon", "Racing", "Bayonne"];

const NUMBERED_TIME_WORDS: &[&str] = &["round", "match", "game"];
const LAST_TIME_WORDS: &[&str] = &["match", "game", "season"];

/// Range a standalone number must fall in to count as a jersey.
const JERSEY_RANGE: std::ops::RangeInclusive<u32> = 1..=23;

/// Extracts rugby entities from query text.
#[derive(Clone)]
pub struct EntityExtractor {
    annotator: Arc<dyn TextAnnotator>,
    vocabularies: Vocabularies,
}

impl EntityExtractor {
    pub fn new(annotator: Arc<dyn TextAnnotator>, vocabularies: Vocabularies) -> Self {
        Self {
            annotator,
            vocabularies,
        }
    }

    pub fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }

    #[instrument(skip(self), fields(query_len = query.len()))]
    pub fn extract(&self, query: &str) -> EntitySet {
        if query.trim().is_empty() {
            return EntitySet::new();
        }

        let doc = self.annotator.annotate(query);
        let mut entities = EntitySet {
            players: extract_players(&doc),
            teams: extract_teams(&doc),
            positions: match_terms(&doc, &self.vocabularies.positions),
            event_types: match_terms(&doc, &self.vocabularies.events),
            time_reference: extract_time_references(&doc),
        };
        entities.dedup();

        debug!(?entities, "Extracted entities");
        entities
    }
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("positions", &self.vocabularies.positions.len())
            .field("events", &self.vocabularies.events.len())
            .finish()
    }
}

fn extract_players(doc: &Annotation) -> Vec<String> {
    let tokens = &doc.tokens;
    let mut players = Vec::new();

    // "player 7"
    for pair in tokens.windows(2) {
        if pair[0].lower == "player" && pair[1].is_digit {
            players.push(pair[1].text.clone());
        }
    }

    // "number 7", "no 7", "7's"
    for (i, token) in tokens.iter().enumerate() {
        let in_range = token.is_digit
            && token
                .text
                .parse::<u32>()
                .map_or(false, |n| JERSEY_RANGE.contains(&n));
        if !in_range {
            continue;
        }
        let cued = i > 0 && PLAYER_CUES.contains(&tokens[i - 1].lower.as_str());
        let possessive = tokens.get(i + 1).map_or(false, |next| next.is_possessive());
        if cued || possessive {
            players.push(token.text.clone());
        }
    }

    for span in doc.entities.iter().filter(|s| s.label == EntityLabel::Person) {
        let is_club = span
            .text
            .split_whitespace()
            .any(|word| TEAM_NAME_WORDS.contains(&word));
        if !is_club {
            players.push(strip_possessive(&span.text).to_string());
        }
    }

    players
}

fn extract_teams(doc: &Annotation) -> Vec<String> {
    let mut teams: Vec<String> = doc
        .entities
        .iter()
        .filter(|s| s.label.is_team_like())
        .map(|s| strip_possessive(&s.text).to_string())
        .collect();

    for pair in doc.tokens.windows(2) {
        let (cue, next) = (&pair[0], &pair[1]);
        if TEAM_INDICATORS.contains(&cue.lower.as_str())
            && next.starts_uppercase()
            && next.pos == PartOfSpeech::ProperNoun
        {
            teams.push(next.text.clone());
        }
    }

    teams
}

/// Single tokens and two-token phrases found in `vocabulary`, in text order.
fn match_terms(doc: &Annotation, vocabulary: &Vocabulary) -> Vec<String> {
    let tokens = &doc.tokens;
    let mut found = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if vocabulary.contains(&token.lower) {
            found.push(token.text.clone());
        }
        if let Some(next) = tokens.get(i + 1) {
            let phrase = format!("{} {}", token.text, next.text);
            if vocabulary.contains(&phrase) {
                found.push(phrase);
            }
        }
    }
    found
}

fn extract_time_references(doc: &Annotation) -> Vec<String> {
    let mut references = Vec::new();
    for (i, pair) in doc.tokens.windows(2).enumerate() {
        let (first, second) = (&pair[0], &pair[1]);
        let matched = (NUMBERED_TIME_WORDS.contains(&first.lower.as_str()) && second.is_digit)
            || (first.lower == "this" && second.lower == "season")
            || (first.lower == "last" && LAST_TIME_WORDS.contains(&second.lower.as_str()));
        if matched {
            references.push(doc.slice(i, i + 2).to_string());
        }
    }
    references
}

fn strip_possessive(text: &str) -> &str {
    text.strip_suffix("'s")
        .or_else(|| text.strip_suffix("’s"))
        .unwrap_or(text)
}
