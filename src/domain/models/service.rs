use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub signal_percent_override: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewServiceParams {
    pub tenant_id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub signal_percent_override: Option<i32>,
    pub active: bool,
}

impl Service {
    pub fn new(params: NewServiceParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: params.tenant_id,
            name: params.name,
            duration_minutes: params.duration_minutes,
            price_cents: params.price_cents,
            signal_percent_override: params.signal_percent_override,
            active: params.active,
            created_at: Utc::now(),
        }
    }
}
