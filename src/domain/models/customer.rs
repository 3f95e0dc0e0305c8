use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Input is trimmed; a blank email is dropped.
    pub fn new(tenant_id: String, name: &str, phone: &str, email: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            email: email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
            created_at: Utc::now(),
        }
    }
}
