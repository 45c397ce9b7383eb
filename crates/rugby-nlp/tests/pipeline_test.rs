//! End-to-end tests: configuration on disk, scripted language model, real corpus resolution

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rugby_core::{
    AppConfig, ChatRequest, CoreError, LanguageModelService, LlmConfig, PathsConfig, Route,
    ERROR_SENTINEL,
};
use rugby_data::ResultRecord;
use rugby_nlp::{NlpError, QueryEngine, QueryOutcome};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Routes everything as `route` and answers intent prompts with `intent_reply`.
struct PipelineService {
    route: String,
    intent_reply: String,
    routing_calls: AtomicUsize,
    intent_calls: AtomicUsize,
}

impl PipelineService {
    fn new(route: &str, intent_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            route: route.to_string(),
            intent_reply: intent_reply.to_string(),
            routing_calls: AtomicUsize::new(0),
            intent_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LanguageModelService for PipelineService {
    async fn chat(&self, request: ChatRequest) -> rugby_core::Result<String> {
        let is_routing = request
            .messages
            .first()
            .map_or(false, |m| m.content.starts_with("Route rugby questions"));
        if is_routing {
            self.routing_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.route.clone())
        } else {
            self.intent_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.intent_reply.clone())
        }
    }

    fn default_model(&self) -> &str {
        "pipeline"
    }
}

/// Always fails at the transport level.
struct DownService;

#[async_trait]
impl LanguageModelService for DownService {
    async fn chat(&self, _request: ChatRequest) -> rugby_core::Result<String> {
        Err(CoreError::service("connection refused"))
    }

    fn default_model(&self) -> &str {
        "down"
    }
}

const ROUTING_YAML: &str = r#"
system: Route rugby questions. Reply with one word, simple or complex.
examples:
  - user: How many tackles did player 15 make in round 3?
    route: simple
  - user: Has Lyon improved throughout the season?
    route: complex
"#;

const INTENT_YAML: &str = r#"
valid_intents: [get_stats, compare, get_roster, get_result, get_player_info, top_stat_in_game, get_grades]
model_config:
  llm_model: phi3:3.8b
performance:
  enable_caching: true
  max_cache_size: 16
  log_performance: false
"#;

const EVENTS_YAML: &str = r#"
event_mappings:
  try: [tries, touchdown]
  tackle: [tackles]
"#;

const GAME: &str = r#"{
    "id": 11,
    "round": 4,
    "home_team": {"id": 10, "name": "Lyon OU", "roster": [
        {"jersey_number": 14, "roster_position": "wing",
         "player": {"id": 101, "first_name": "Davit", "last_name": "Niniashvili"}},
        {"jersey_number": 11, "roster_position": "wing",
         "player": {"id": 102, "first_name": "Josaia", "last_name": "Raisuqe"}}
    ]},
    "away_team": {"id": 20, "name": "RC Toulon", "roster": [
        {"jersey_number": 11, "roster_position": "wing",
         "player": {"id": 201, "first_name": "Gabin", "last_name": "Villiere"}}
    ]}
}"#;

const EVENTS: &str = r#"[
    {"type": "tries", "player_id": 102, "team_id": 10},
    {"type": "tries", "player_id": 101, "team_id": 10, "metadata": {"grade": 8}},
    {"type": "tries", "player_id": 201, "team_id": 20},
    {"type": "tries", "player_id": 201, "team_id": 20},
    {"type": "tries", "player_id": 201, "team_id": 20},
    {"type": "tackles", "player_id": 102, "team_id": 10}
]"#;

struct Workspace {
    _root: TempDir,
    config: AppConfig,
}

fn workspace() -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let prompts = root.path().join("prompts");
    let shared = root.path().join("shared");
    let data = root.path().join("data");
    for dir in [&prompts, &shared, &data] {
        fs::create_dir_all(dir).unwrap();
    }

    fs::write(prompts.join("routing_classifier.yaml"), ROUTING_YAML).unwrap();
    fs::write(prompts.join("intent_classification.yaml"), INTENT_YAML).unwrap();
    fs::write(shared.join("event_mappings.yaml"), EVENTS_YAML).unwrap();
    fs::write(data.join("game11.json"), GAME).unwrap();
    fs::write(data.join("game11-events.json"), EVENTS).unwrap();

    let config = config_for(&prompts, &shared, &data);
    Workspace {
        _root: root,
        config,
    }
}

fn config_for(prompts: &Path, shared: &Path, data: &Path) -> AppConfig {
    AppConfig {
        llm: LlmConfig {
            base_url: "http://localhost:9/api/chat/completions".to_string(),
            api_key: "test-key".to_string(),
            model: "phi3:3.8b".to_string(),
            timeout_seconds: 5,
        },
        paths: PathsConfig {
            data_dir: data.to_path_buf(),
            prompts_dir: prompts.to_path_buf(),
            shared_dir: shared.to_path_buf(),
        },
    }
}

#[tokio::test]
async fn test_most_tries_for_lyon_this_season() {
    let ws = workspace();
    let service = PipelineService::new("simple", r#"{"intent":"top_stat_in_game"}"#);
    let mut engine = QueryEngine::from_config(&ws.config, service.clone()).unwrap();

    let outcome = engine
        .process("who scored the most tries for Lyon this season?")
        .await
        .unwrap();

    let QueryOutcome::Resolved(resolved) = outcome else {
        panic!("query should not escalate");
    };
    assert_eq!(resolved.route, Route::Simple);
    assert_eq!(resolved.intent, "top_stat_in_game");
    assert_eq!(resolved.entities.teams, vec!["Lyon"]);
    assert_eq!(resolved.entities.event_types, vec!["tries"]);
    assert_eq!(resolved.entities.time_reference, vec!["this season"]);
    assert!(resolved.entities.players.is_empty());

    assert!(resolved.result.success);
    assert_eq!(resolved.result.data.len(), 1);
    match &resolved.result.data[0] {
        ResultRecord::Ranking { top_players, total_events, .. } => {
            assert_eq!(top_players.len(), 1);
            assert!(top_players[0].count >= 1);
            assert!(top_players[0].player.team.contains("Lyon"));
            // Equal counts; the graded try wins.
            assert_eq!(top_players[0].player.name, "Davit Niniashvili");
            assert_eq!(*total_events, 2);
        }
        other => panic!("expected a ranking, got {:?}", other),
    }

    assert_eq!(service.routing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.intent_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_repeated_query_uses_intent_cache() {
    let ws = workspace();
    let service = PipelineService::new("simple", "I'd say get_roster.");
    let mut engine = QueryEngine::from_config(&ws.config, service.clone()).unwrap();

    for _ in 0..2 {
        let outcome = engine.process("Show me the Toulon squad").await.unwrap();
        let QueryOutcome::Resolved(resolved) = outcome else {
            panic!("query should not escalate");
        };
        assert_eq!(resolved.handler, "get_team_info");
        assert!(resolved.result.success);
    }

    assert_eq!(service.routing_calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.intent_calls.load(Ordering::SeqCst), 1);
    let usage = engine.intent_classifier().cache_stats().usage.unwrap();
    assert_eq!((usage.hits, usage.misses), (1, 1));
}

#[tokio::test]
async fn test_complex_query_is_not_resolved() {
    let ws = workspace();
    let service = PipelineService::new("Complex.", r#"{"intent":"get_stats"}"#);
    let mut engine = QueryEngine::from_config(&ws.config, service.clone()).unwrap();

    let outcome = engine.process("Has Lyon improved throughout the season?").await.unwrap();
    assert!(matches!(outcome, QueryOutcome::Escalated { .. }));
    assert_eq!(service.intent_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_service_outage_degrades_to_defaults() {
    let ws = workspace();
    let mut engine = QueryEngine::from_config(&ws.config, Arc::new(DownService)).unwrap();

    let outcome = engine.process("how many tackles for Lyon?").await.unwrap();
    let QueryOutcome::Resolved(resolved) = outcome else {
        panic!("outage should route as simple");
    };
    assert_eq!(resolved.intent, "get_stats");
    match &resolved.result.data[0] {
        ResultRecord::TeamStats { statistics, .. } => {
            assert_eq!(statistics.total_events, 1);
        }
        other => panic!("expected team stats, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sentinel_reply_is_treated_as_failure() {
    let ws = workspace();
    let service = PipelineService::new(ERROR_SENTINEL, ERROR_SENTINEL);
    let mut engine = QueryEngine::from_config(&ws.config, service.clone()).unwrap();

    for _ in 0..2 {
        let outcome = engine.process("player 11's tries").await.unwrap();
        let QueryOutcome::Resolved(resolved) = outcome else {
            panic!("sentinel should route as simple");
        };
        assert_eq!(resolved.intent, "get_stats");
        assert_eq!(resolved.entities.players, vec!["11"]);
    }
    // Failures are never cached.
    assert_eq!(service.intent_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_prompt_definition_is_fatal() {
    let ws = workspace();
    fs::remove_file(ws.config.paths.prompts_dir.join("intent_classification.yaml")).unwrap();

    let service = PipelineService::new("simple", "get_stats");
    let err = QueryEngine::from_config(&ws.config, service).err().unwrap();
    assert!(matches!(err, NlpError::Configuration(_)));
    assert!(err.to_string().contains("intent_classification.yaml"));
}

#[tokio::test]
async fn test_empty_corpus_is_fatal() {
    let ws = workspace();
    fs::remove_file(ws.config.paths.data_dir.join("game11.json")).unwrap();

    let service = PipelineService::new("simple", "get_stats");
    let err = QueryEngine::from_config(&ws.config, service).err().unwrap();
    assert!(matches!(err, NlpError::Configuration(_)));
}
