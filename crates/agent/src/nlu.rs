use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use ledgerline_core::config::NluConfig;
use ledgerline_core::domain::entity::{Entity, EntityMap, ParsedMessage};
use ledgerline_core::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum NluError {
    #[error("nlu request failed: {0}")]
    Transport(String),
    #[error("nlu endpoint returned {0}")]
    Status(u16),
    #[error("failed to decode nlu response: {0}")]
    Decode(String),
}

impl From<NluError> for ApplicationError {
    fn from(value: NluError) -> Self {
        ApplicationError::Integration(value.to_string())
    }
}

#[async_trait]
pub trait NluEngine: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedMessage, NluError>;
}

/// Client for a Rasa-compatible `POST /model/parse` endpoint.
pub struct HttpNluEngine {
    client: Client,
    parse_url: String,
    token: Option<SecretString>,
}

impl HttpNluEngine {
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, NluError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NluError::Transport(error.to_string()))?;
        let parse_url = format!("{}/model/parse", base_url.trim_end_matches('/'));
        Ok(Self { client, parse_url, token })
    }

    pub fn from_config(config: &NluConfig) -> Result<Self, NluError> {
        Self::new(&config.base_url, config.token.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn parse_url(&self) -> &str {
        &self.parse_url
    }
}

#[async_trait]
impl NluEngine for HttpNluEngine {
    async fn parse(&self, text: &str) -> Result<ParsedMessage, NluError> {
        let mut request =
            self.client.post(&self.parse_url).json(&serde_json::json!({ "text": text }));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.expose_secret())]);
        }

        let response = request.send().await.map_err(|error| {
            warn!(event_name = "nlu.request_failed", error = %error, "nlu parse request failed");
            NluError::Transport(error.to_string())
        })?;

        if !response.status().is_success() {
            return Err(NluError::Status(response.status().as_u16()));
        }

        let payload: Value =
            response.json().await.map_err(|error| NluError::Decode(error.to_string()))?;
        let parsed = parsed_message_from_payload(text, payload)?;
        debug!(
            event_name = "nlu.parsed",
            intent = %parsed.intent,
            entity_count = parsed.entities.len(),
            "nlu parse completed"
        );
        Ok(parsed)
    }
}

#[derive(Deserialize)]
struct ParsePayload {
    #[serde(default)]
    intent: Option<IntentPayload>,
    #[serde(default)]
    entities: Vec<EntityPayload>,
}

#[derive(Deserialize)]
struct IntentPayload {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct EntityPayload {
    entity: String,
    #[serde(default)]
    value: Value,
}

/// Reads a parse result. A missing intent name becomes `""`; entity values
/// that are not strings are kept as their JSON text.
pub fn parsed_message_from_payload(text: &str, payload: Value) -> Result<ParsedMessage, NluError> {
    let payload: ParsePayload =
        serde_json::from_value(payload).map_err(|error| NluError::Decode(error.to_string()))?;

    let intent = payload.intent.and_then(|intent| intent.name).unwrap_or_default();
    let entities = payload
        .entities
        .into_iter()
        .map(|entity| {
            let value = match entity.value {
                Value::String(value) => value,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Entity::new(entity.entity, value)
        })
        .collect::<EntityMap>();

    Ok(ParsedMessage::new(text, intent, entities))
}

/// Canned parses keyed by exact message text; unknown text parses to an empty
/// intent with no entities.
#[derive(Clone, Debug, Default)]
pub struct StaticNluEngine {
    parses: HashMap<String, (String, Vec<Entity>)>,
    failure: Option<String>,
}

impl StaticNluEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, intent: &str, entities: &[(&str, &str)]) -> Self {
        let entities =
            entities.iter().map(|(kind, value)| Entity::new(*kind, *value)).collect::<Vec<_>>();
        self.parses.insert(text.to_string(), (intent.to_string(), entities));
        self
    }

    /// Every parse fails as if the engine were unreachable.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::default() }
    }
}

#[async_trait]
impl NluEngine for StaticNluEngine {
    async fn parse(&self, text: &str) -> Result<ParsedMessage, NluError> {
        if let Some(reason) = &self.failure {
            return Err(NluError::Transport(reason.clone()));
        }

        let (intent, entities) = self.parses.get(text).cloned().unwrap_or_default();
        Ok(ParsedMessage::new(text, intent, entities.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use ledgerline_core::domain::entity::{NUMBER, PARTY_NAME};
    use ledgerline_core::errors::ApplicationError;

    use super::{parsed_message_from_payload, HttpNluEngine, NluEngine, NluError, StaticNluEngine};

    #[test]
    fn payload_keeps_entity_order_and_stringifies_values() {
        let payload = json!({
            "intent": { "name": "list_top_customers", "confidence": 0.93 },
            "entities": [
                { "entity": "number", "value": 5 },
                { "entity": "party_name", "value": "Alpha Traders" },
                { "entity": "number", "value": "7" }
            ]
        });

        let parsed = parsed_message_from_payload("top 5 customers", payload).expect("decode");

        assert_eq!(parsed.intent, "list_top_customers");
        assert_eq!(parsed.entities.first(NUMBER), Some("5"));
        assert_eq!(parsed.entities.first(PARTY_NAME), Some("Alpha Traders"));
        assert_eq!(parsed.entities.len(), 3);
    }

    #[test]
    fn missing_intent_name_becomes_empty() {
        let parsed =
            parsed_message_from_payload("hello", json!({ "intent": {}, "entities": [] }))
                .expect("decode");
        assert_eq!(parsed.intent, "");

        let parsed = parsed_message_from_payload("hello", json!({})).expect("decode");
        assert_eq!(parsed.intent, "");
        assert!(parsed.entities.is_empty());
    }

    #[test]
    fn malformed_entities_are_decode_errors() {
        let result = parsed_message_from_payload("x", json!({ "entities": [{ "value": "a" }] }));
        assert!(matches!(result, Err(NluError::Decode(_))));
    }

    #[test]
    fn parse_url_drops_trailing_slash() {
        let engine = HttpNluEngine::new("http://localhost:5005/", None, Duration::from_secs(1))
            .expect("client");
        assert_eq!(engine.parse_url(), "http://localhost:5005/model/parse");
    }

    #[test]
    fn nlu_errors_map_to_integration_failures() {
        let error = ApplicationError::from(NluError::Status(502));
        assert_eq!(error, ApplicationError::Integration("nlu endpoint returned 502".to_string()));
    }

    #[tokio::test]
    async fn static_engine_answers_known_and_unknown_text() {
        let engine = StaticNluEngine::new().with(
            "balance of alpha",
            "check_balance",
            &[(PARTY_NAME, "alpha")],
        );

        let known = engine.parse("balance of alpha").await.expect("parse");
        assert_eq!(known.intent, "check_balance");
        assert_eq!(known.entities.first(PARTY_NAME), Some("alpha"));

        let unknown = engine.parse("something else").await.expect("parse");
        assert_eq!(unknown.intent, "");
        assert!(unknown.entities.is_empty());

        let failing = StaticNluEngine::failing("connection refused");
        assert!(matches!(failing.parse("x").await, Err(NluError::Transport(_))));
    }
}
