//! Position and event term vocabularies.
//!
//! Each vocabulary is a flattened, lowercased set of canonical names and their aliases,
//! read from a YAML mapping of `canonical: [alias, ...]` under a named section.

use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{NlpError, Result};

pub const POSITIONS_FILE: &str = "jersey_mappings.yaml";
pub const POSITIONS_SECTION: &str = "aliases";
pub const EVENTS_FILE: &str = "event_mappings.yaml";
pub const EVENTS_SECTION: &str = "event_mappings";

const DEFAULT_POSITIONS: &[&str] = &[
    "prop", "props", "loosehead", "loosehead prop", "tighthead", "tighthead prop", "hooker",
    "hookers", "lock", "locks", "second row", "flanker", "flankers", "number eight",
    "number 8", "scrum half", "scrum-half", "fly half", "fly-half", "centre", "centres",
    "center", "inside centre", "outside centre", "wing", "wings", "winger", "fullback",
    "full back", "full-back",
];

const DEFAULT_EVENTS: &[&str] = &[
    "try", "tries", "tackle", "tackles", "tackler", "missed tackle", "missed tackles",
    "carry", "carries", "offload", "offloads", "turnover", "turnovers", "line break",
    "line breaks", "penalty", "penalties", "yellow card", "yellow cards", "red card",
    "red cards", "conversion", "conversions", "drop goal", "kick", "kicks", "kicker",
    "lineout", "lineouts", "scrum", "scrums", "metres gained", "meters gained",
    "possession", "territory",
];

/// A set of lowercased terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: HashSet<String>,
}

impl Vocabulary {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn default_positions() -> Self {
        Self::from_terms(DEFAULT_POSITIONS)
    }

    pub fn default_events() -> Self {
        Self::from_terms(DEFAULT_EVENTS)
    }

    /// Flattens `section: {canonical: [alias, ...]}` from a YAML document.
    ///
    /// A missing section yields an empty vocabulary; aliases that are not lists are ignored.
    pub fn from_yaml_str(content: &str, section: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| NlpError::configuration(format!("Invalid vocabulary YAML: {}", e)))?;

        let mut terms = Vec::new();
        if let Some(Value::Mapping(entries)) = document.get(section) {
            for (canonical, aliases) in entries {
                if let Some(canonical) = scalar_text(canonical) {
                    terms.push(canonical);
                }
                if let Value::Sequence(aliases) = aliases {
                    terms.extend(aliases.iter().filter_map(scalar_text));
                }
            }
        }
        Ok(Self::from_terms(terms))
    }

    pub fn load(path: &Path, section: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NlpError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content, section)
    }

    /// Loads a vocabulary file, falling back to `fallback` when it is missing or unreadable.
    pub fn load_or(path: &Path, section: &str, fallback: Self) -> Self {
        if !path.exists() {
            warn!("Vocabulary file {} not found, using built-in terms", path.display());
            return fallback;
        }
        match Self::load(path, section) {
            Ok(vocabulary) => {
                debug!(terms = vocabulary.len(), "Loaded vocabulary {}", path.display());
                vocabulary
            }
            Err(e) => {
                warn!("{}; using built-in terms", e);
                fallback
            }
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(&term.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Position and event vocabularies used by the entity extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    pub positions: Vocabulary,
    pub events: Vocabulary,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self {
            positions: Vocabulary::default_positions(),
            events: Vocabulary::default_events(),
        }
    }
}

impl Vocabularies {
    /// Reads both mapping files from the shared definitions directory.
    pub fn load(shared_dir: &Path) -> Self {
        Self {
            positions: Vocabulary::load_or(
                &shared_dir.join(POSITIONS_FILE),
                POSITIONS_SECTION,
                Vocabulary::default_positions(),
            ),
            events: Vocabulary::load_or(
                &shared_dir.join(EVENTS_FILE),
                EVENTS_SECTION,
                Vocabulary::default_events(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_canonical_names_and_aliases() {
        let yaml = "event_mappings:\n  try: [Tries, touchdown]\n  yellow card:\n    - sin bin\n  kick: not-a-list\n";
        let vocabulary = Vocabulary::from_yaml_str(yaml, EVENTS_SECTION).unwrap();

        assert_eq!(vocabulary.len(), 6);
        assert!(vocabulary.contains("try"));
        assert!(vocabulary.contains("tries"));
        assert!(vocabulary.contains("Sin Bin"));
        assert!(vocabulary.contains("kick"));
        assert!(!vocabulary.contains("not-a-list"));
    }

    #[test]
    fn test_numeric_aliases() {
        let yaml = "aliases:\n  fullback: [15, full back]\n";
        let vocabulary = Vocabulary::from_yaml_str(yaml, POSITIONS_SECTION).unwrap();
        assert!(vocabulary.contains("15"));
        assert!(vocabulary.contains("full back"));
    }

    #[test]
    fn test_missing_section_is_empty() {
        let vocabulary = Vocabulary::from_yaml_str("other: {}\n", EVENTS_SECTION).unwrap();
        assert!(vocabulary.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_configuration_error() {
        let err = Vocabulary::from_yaml_str("aliases: [unclosed", POSITIONS_SECTION).unwrap_err();
        assert!(matches!(err, NlpError::Configuration(_)));
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let vocabularies = Vocabularies::load(dir.path());
        assert_eq!(vocabularies, Vocabularies::default());
        assert!(vocabularies.events.contains("tries"));
        assert!(vocabularies.positions.contains("fly half"));
    }

    #[test]
    fn test_files_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(EVENTS_FILE),
            "event_mappings:\n  try: [tries]\n",
        )
        .unwrap();
        let vocabularies = Vocabularies::load(dir.path());
        assert_eq!(vocabularies.events.len(), 2);
        assert!(!vocabularies.events.contains("tackle"));
        assert_eq!(vocabularies.positions, Vocabulary::default_positions());
    }
}
