//! Linguistic annotation.
//!
//! Entity extraction works from an [`Annotation`]: tokens carrying a lowercase form, a
//! coarse part-of-speech tag and a digit flag, plus labelled entity spans. Any tagger can
//! back the extractor through [`TextAnnotator`]; [`RuleAnnotator`] is the built-in one.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Coarse part-of-speech tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    ProperNoun,
    Word,
    Numeral,
    /// Possessive marker split off its noun
    Particle,
    Punctuation,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProperNoun => "PROPN",
            Self::Word => "WORD",
            Self::Numeral => "NUM",
            Self::Particle => "PART",
            Self::Punctuation => "PUNCT",
        }
    }
}

/// Named-entity labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
    Gpe,
    Loc,
    Misc,
}

impl EntityLabel {
    /// Labels that name a club or a place a club is known by.
    pub fn is_team_like(&self) -> bool {
        matches!(self, Self::Org | Self::Gpe | Self::Loc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    pub text: String,
    pub lower: String,
    pub pos: PartOfSpeech,
    pub is_digit: bool,
    /// Byte offsets into the annotated text.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(index: usize, text: &str, pos: PartOfSpeech, start: usize) -> Self {
        Self {
            index,
            text: text.to_string(),
            lower: text.to_lowercase(),
            pos,
            is_digit: !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()),
            start,
            end: start + text.len(),
        }
    }

    pub fn is_possessive(&self) -> bool {
        is_possessive_marker(&self.text)
    }

    pub fn starts_uppercase(&self) -> bool {
        self.text.chars().next().map_or(false, char::is_uppercase)
    }
}

/// A labelled run of tokens, `start..end` in token indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
}

impl Annotation {
    /// Source text covered by tokens `start..end`, original spacing included.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        match (self.tokens.get(start), end.checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(first), Some(last)) if first.start <= last.end => &self.text[first.start..last.end],
            _ => "",
        }
    }
}

/// Tokenizer, tagger and entity recognizer
pub trait TextAnnotator: Send + Sync {
    fn annotate(&self, text: &str) -> Annotation;
}

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(
        r"['’][sS]\b|\d+|[^\W\d_]+(?:-[^\W\d_]+|['’][^\W\d_]{2,})*|[^\s\w]|_"
    )
    .unwrap();

    /// Words that stay common nouns even when capitalized.
    static ref FUNCTION_WORDS: HashSet<&'static str> = [
        "a", "about", "against", "all", "an", "and", "any", "are", "at", "best", "between",
        "by", "compare", "could", "did", "do", "does", "during", "each", "first", "for", "from",
        "game", "games", "get", "give", "had", "has", "have", "how", "i", "in", "is", "last",
        "list", "made", "make", "many", "match", "matches", "me", "most", "no", "number", "of",
        "on", "or", "player", "players", "please", "round", "score", "scored", "season",
        "second", "show", "stats", "tell", "than", "that", "the", "their", "them", "this",
        "to", "top", "total", "team", "teams", "versus", "vs", "was", "were", "what", "what's",
        "when", "where", "which", "who", "whose", "why", "with",
    ]
    .into_iter()
    .collect();
}

/// Club words recognized without any corpus.
pub const DEFAULT_TEAM_WORDS: &[&str] = &[
    "bayonne", "begles", "bordeaux", "brive", "castres", "clermont", "lyon", "montpellier",
    "pau", "perpignan", "racing", "rochelle", "rochelais", "stade", "toulon", "toulouse",
    "vannes", "oyonnax",
];

fn is_possessive_marker(text: &str) -> bool {
    matches!(text, "'s" | "'S" | "’s" | "’S")
}

/// Deterministic annotator for rugby queries.
///
/// Capitalized words that are not common function words are tagged as proper nouns; a
/// sentence-initial capital only counts when the word is a known team word or the next
/// word is a proper noun too. Runs of proper nouns become spans, labelled `ORG` when any
/// word is in the team gazetteer and `PERSON` otherwise.
#[derive(Debug, Clone)]
pub struct RuleAnnotator {
    team_words: HashSet<String>,
}

impl Default for RuleAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleAnnotator {
    pub fn new() -> Self {
        Self {
            team_words: DEFAULT_TEAM_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Adds every word of the given team names to the gazetteer.
    pub fn with_team_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            for word in TOKEN_PATTERN.find_iter(name.as_ref()) {
                let word = word.as_str();
                if word.chars().next().map_or(false, char::is_alphabetic) {
                    self.team_words.insert(word.to_lowercase());
                }
            }
        }
        self
    }

    pub fn is_team_word(&self, word: &str) -> bool {
        self.team_words.contains(&word.to_lowercase())
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        let raw: Vec<(usize, &str)> = TOKEN_PATTERN
            .find_iter(text)
            .map(|m| (m.start(), m.as_str()))
            .collect();

        let capitalized_candidate = |word: &str| {
            word.chars().next().map_or(false, char::is_uppercase)
                && !FUNCTION_WORDS.contains(word.to_lowercase().as_str())
        };

        let mut sentence_start = true;
        let mut tokens = Vec::with_capacity(raw.len());
        for (index, &(start, word)) in raw.iter().enumerate() {
            let first = word.chars().next().unwrap_or(' ');
            let pos = if is_possessive_marker(word) {
                PartOfSpeech::Particle
            } else if first.is_ascii_digit() {
                PartOfSpeech::Numeral
            } else if first.is_alphabetic() {
                let proper = capitalized_candidate(word)
                    && (!sentence_start
                        || self.is_team_word(word)
                        || raw
                            .get(index + 1)
                            .map_or(false, |&(_, next)| capitalized_candidate(next)));
                if proper {
                    PartOfSpeech::ProperNoun
                } else {
                    PartOfSpeech::Word
                }
            } else {
                PartOfSpeech::Punctuation
            };

            sentence_start = matches!(word, "." | "?" | "!");
            tokens.push(Token::new(index, word, pos, start));
        }
        tokens
    }

    fn spans(&self, text: &str, tokens: &[Token]) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].pos != PartOfSpeech::ProperNoun {
                i += 1;
                continue;
            }
            let start = i;
            while i < tokens.len() && tokens[i].pos == PartOfSpeech::ProperNoun {
                i += 1;
            }
            let run = &tokens[start..i];
            let label = if run.iter().any(|t| self.is_team_word(&t.text)) {
                EntityLabel::Org
            } else {
                EntityLabel::Person
            };
            spans.push(EntitySpan {
                text: text[run[0].start..run[run.len() - 1].end].to_string(),
                label,
                start,
                end: i,
            });
        }
        spans
    }
}

impl TextAnnotator for RuleAnnotator {
    fn annotate(&self, text: &str) -> Annotation {
        let tokens = self.tokenize(text);
        let entities = self.spans(text, &tokens);
        Annotation {
            text: text.to_string(),
            tokens,
            entities,
        }
    }
}
