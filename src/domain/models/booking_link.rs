use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

const TOKEN_LENGTH: usize = 16;

/// Opaque public entry point into a tenant's calendar, optionally pinned to one service.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingLink {
    pub id: String,
    pub tenant_id: String,
    pub token: String,
    pub service_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl BookingLink {
    pub fn new(tenant_id: String, service_id: Option<String>) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            token,
            service_id,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// The tenant (and optional fixed service) a public token grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkScope {
    pub tenant_id: String,
    pub service_id: Option<String>,
}

impl LinkScope {
    /// A pinned service always wins over whatever the caller asked for.
    pub fn effective_service<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        self.service_id.as_deref().or(requested)
    }
}
