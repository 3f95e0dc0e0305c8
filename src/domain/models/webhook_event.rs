use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};

/// A raw provider notification, stored once per deduplication key.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub id: String,
    pub provider: String,
    pub event_key: String,
    pub payload: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn new(provider: &str, event_key: String, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider: provider.to_string(),
            event_key,
            payload: Json(payload),
            created_at: Utc::now(),
        }
    }
}
