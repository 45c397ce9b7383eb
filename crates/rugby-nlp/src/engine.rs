//! Query engine implementation.
//!
//! Runs one query through the whole pipeline: routing, then entity extraction and intent
//! classification, then resolution against the corpus.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use rugby_core::{intents, AppConfig, EntitySet, LanguageModelService, Route};
use rugby_data::{DataResolver, QueryResult};

use crate::annotator::RuleAnnotator;
use crate::entity::EntityExtractor;
use crate::error::{NlpError, Result};
use crate::intent::IntentClassifier;
use crate::routing::RoutingClassifier;
use crate::vocabulary::Vocabularies;

const MAX_QUERY_LEN: usize = 1000;

/// Maps a classifier label onto the resolver handler that answers it.
pub fn handler_for(intent: &str) -> &str {
    match intent {
        intents::GET_ROSTER => intents::GET_TEAM_INFO,
        intents::GET_RESULT => intents::GET_GAME_INFO,
        intents::GET_GRADES => intents::GET_STATS,
        other => other,
    }
}

/// What happened to a query
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Routed as complex; handled elsewhere.
    Escalated { query: String },
    Resolved(ResolvedQuery),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedQuery {
    pub route: Route,
    /// Label chosen by the classifier
    pub intent: String,
    /// Resolver handler the label was dispatched to
    pub handler: String,
    pub entities: EntitySet,
    pub result: QueryResult,
}

/// The query pipeline, built once at startup
pub struct QueryEngine {
    router: RoutingClassifier,
    intent_classifier: IntentClassifier,
    extractor: EntityExtractor,
    resolver: Arc<DataResolver>,
}

impl QueryEngine {
    pub fn new(
        router: RoutingClassifier,
        intent_classifier: IntentClassifier,
        extractor: EntityExtractor,
        resolver: Arc<DataResolver>,
    ) -> Self {
        Self {
            router,
            intent_classifier,
            extractor,
            resolver,
        }
    }

    /// Loads prompt definitions, vocabularies and the corpus named by `config`.
    ///
    /// Missing prompt definitions and an empty corpus are fatal.
    pub fn from_config(config: &AppConfig, service: Arc<dyn LanguageModelService>) -> Result<Self> {
        info!("Initializing query engine");

        let store = config.prompt_store();
        let routing_prompt = store.routing_prompt()?;
        let intent_config = store.intent_config()?;

        let resolver = Arc::new(DataResolver::load(&config.paths.data_dir)?);
        let annotator = RuleAnnotator::new().with_team_names(resolver.team_names());
        let vocabularies = Vocabularies::load(&config.paths.shared_dir);

        Ok(Self::new(
            RoutingClassifier::new(service.clone(), routing_prompt),
            IntentClassifier::new(service, intent_config)?,
            EntityExtractor::new(Arc::new(annotator), vocabularies),
            resolver,
        ))
    }

    pub fn router(&self) -> &RoutingClassifier {
        &self.router
    }

    pub fn intent_classifier(&self) -> &IntentClassifier {
        &self.intent_classifier
    }

    pub fn intent_classifier_mut(&mut self) -> &mut IntentClassifier {
        &mut self.intent_classifier
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn resolver(&self) -> &DataResolver {
        &self.resolver
    }

    fn validate_query(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(NlpError::validation("Query cannot be empty"));
        }
        if query.len() > MAX_QUERY_LEN {
            return Err(NlpError::validation(format!(
                "Query is too long (max {} characters)",
                MAX_QUERY_LEN
            )));
        }
        Ok(())
    }

    fn preprocess_query(&self, query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn process(&mut self, query: &str) -> Result<QueryOutcome> {
        self.validate_query(query)?;
        let query = self.preprocess_query(query);

        let route = self.router.classify(&query).await;
        if route == Route::Complex {
            info!("Query escalated as complex");
            return Ok(QueryOutcome::Escalated { query });
        }

        let entities = self.extractor.extract(&query);
        let intent = self.intent_classifier.classify(&query).await;
        let handler = handler_for(&intent).to_string();
        debug!(intent = %intent, handler = %handler, "Dispatching query");

        let result = self.resolver.resolve(&entities, &handler);

        Ok(QueryOutcome::Resolved(ResolvedQuery {
            route,
            intent,
            handler,
            entities,
            result,
        }))
    }
}
