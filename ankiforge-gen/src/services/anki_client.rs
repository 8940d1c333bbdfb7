//! AnkiConnect client
//!
//! AnkiConnect is an Anki add-on serving a JSON API on localhost. Every call
//! is a POST of `{action, version, params}`; the reply is always an object
//! with exactly two keys, `result` and `error`.

use crate::services::card_formatter::{complete_card, CardDirection};
use crate::services::CardStore;
use ankiforge_common::config::AnkiConfig;
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

const ANKI_CONNECT_VERSION: u8 = 6;

/// Field names used when the note type cannot be queried
const FALLBACK_FIELD_NAMES: [&str; 2] = ["Frente", "Verso"];

/// AnkiConnect client errors
#[derive(Debug, Error)]
pub enum AnkiError {
    #[error("Could not connect to AnkiConnect at {0}. Make sure Anki is open and the AnkiConnect add-on is installed.")]
    Unreachable(String),

    #[error("Timed out talking to AnkiConnect")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Invalid AnkiConnect response: {0}")]
    InvalidResponse(String),

    #[error("AnkiConnect action '{action}' failed: {message}")]
    Action { action: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// AnkiConnect API client
pub struct AnkiClient {
    http_client: reqwest::Client,
    url: String,
    card_model: String,
    field_names: OnceCell<Vec<String>>,
}

impl AnkiClient {
    pub fn new(config: &AnkiConfig) -> Result<Self, AnkiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnkiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            card_model: config.card_model.clone(),
            field_names: OnceCell::new(),
        })
    }

    /// Invoke one AnkiConnect action and return its `result`
    pub async fn invoke(&self, action: &str, params: Value) -> Result<Value, AnkiError> {
        let payload = json!({
            "action": action,
            "version": ANKI_CONNECT_VERSION,
            "params": params,
        });

        tracing::debug!(action = %action, "Invoking AnkiConnect");

        let response = self
            .http_client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AnkiError::Unreachable(self.url.clone())
                } else if e.is_timeout() {
                    AnkiError::Timeout
                } else {
                    AnkiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnkiError::HttpStatus(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnkiError::InvalidResponse(e.to_string()))?;

        let mut object = match body {
            Value::Object(map)
                if map.len() == 2 && map.contains_key("result") && map.contains_key("error") =>
            {
                map
            }
            other => {
                return Err(AnkiError::InvalidResponse(format!(
                    "expected {{result, error}}, got {}",
                    other
                )))
            }
        };

        match object.remove("error") {
            Some(Value::Null) | None => {}
            Some(Value::String(message)) => {
                return Err(AnkiError::Action {
                    action: action.to_string(),
                    message,
                })
            }
            Some(other) => {
                return Err(AnkiError::Action {
                    action: action.to_string(),
                    message: other.to_string(),
                })
            }
        }

        Ok(object.remove("result").unwrap_or(Value::Null))
    }

    /// True when AnkiConnect answers the `version` action
    pub async fn check_connection(&self) -> bool {
        match self.invoke("version", json!({})).await {
            Ok(version) => {
                tracing::debug!(version = %version, "AnkiConnect reachable");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "AnkiConnect check failed");
                false
            }
        }
    }

    pub async fn deck_names(&self) -> Result<Vec<String>, AnkiError> {
        let result = self.invoke("deckNames", json!({})).await?;
        serde_json::from_value(result).map_err(|e| AnkiError::InvalidResponse(e.to_string()))
    }

    /// Create `deck_name` unless it already exists
    ///
    /// Returns true when the deck was created by this call.
    pub async fn create_deck_if_needed(&self, deck_name: &str) -> Result<bool, AnkiError> {
        if self.deck_names().await?.iter().any(|d| d == deck_name) {
            return Ok(false);
        }

        self.invoke("createDeck", json!({ "deck": deck_name })).await?;
        tracing::info!(deck = %deck_name, "Deck created");
        Ok(true)
    }

    /// Field names of the configured note type, queried once per client
    ///
    /// Falls back to the default Portuguese "Basic" fields when the query fails.
    pub async fn model_field_names(&self) -> &[String] {
        self.field_names
            .get_or_init(|| async {
                let result = self
                    .invoke("modelFieldNames", json!({ "modelName": self.card_model }))
                    .await
                    .and_then(|value| {
                        serde_json::from_value::<Vec<String>>(value)
                            .map_err(|e| AnkiError::InvalidResponse(e.to_string()))
                    });

                match result {
                    Ok(names) => names,
                    Err(e) => {
                        tracing::warn!(
                            model = %self.card_model,
                            error = %e,
                            "Could not read note type fields, using defaults"
                        );
                        FALLBACK_FIELD_NAMES.iter().map(|s| s.to_string()).collect()
                    }
                }
            })
            .await
    }

    /// Add one note with allowDuplicate disabled and return its id
    pub async fn add_note(
        &self,
        deck_name: &str,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<i64, AnkiError> {
        let field_names = self.model_field_names().await;
        let front_field = field_names
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_FIELD_NAMES[0]);
        let back_field = field_names
            .get(1)
            .map(String::as_str)
            .unwrap_or(FALLBACK_FIELD_NAMES[1]);

        let note = json!({
            "deckName": deck_name,
            "modelName": self.card_model,
            "fields": {
                front_field: front,
                back_field: back,
            },
            "tags": tags,
            "options": {
                "allowDuplicate": false,
            },
        });

        let result = self.invoke("addNote", json!({ "note": note })).await?;
        result
            .as_i64()
            .ok_or_else(|| AnkiError::InvalidResponse(format!("addNote returned {}", result)))
    }
}

#[async_trait]
impl CardStore for AnkiClient {
    async fn store_media_file(&self, path: &Path, filename: &str) -> Result<(), AnkiError> {
        let bytes = tokio::fs::read(path).await?;
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);

        self.invoke(
            "storeMediaFile",
            json!({ "filename": filename, "data": data }),
        )
        .await?;

        tracing::info!(filename = %filename, "Image added to Anki media");
        Ok(())
    }

    async fn create_flashcards(
        &self,
        word: &str,
        content: &str,
        image_filename: &str,
        deck_name: &str,
        tags: &[String],
    ) -> Vec<i64> {
        let mut card_ids = Vec::with_capacity(CardDirection::ALL.len());

        for (index, direction) in CardDirection::ALL.into_iter().enumerate() {
            let (front, back) = complete_card(direction, word, content, image_filename);

            match self.add_note(deck_name, &front, &back, tags).await {
                Ok(note_id) => {
                    tracing::info!(
                        card = index + 1,
                        direction = direction.label(),
                        note_id,
                        "Card created"
                    );
                    card_ids.push(note_id);
                }
                Err(e) => {
                    tracing::error!(
                        card = index + 1,
                        direction = direction.label(),
                        error = %e,
                        "Failed to create card"
                    );
                }
            }
        }

        card_ids
    }
}
