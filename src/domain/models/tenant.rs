use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub timezone: String,
    pub slot_interval_minutes: i32,
    pub signal_percent_default: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: String, slug: String, timezone: String, slot_interval_minutes: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            timezone,
            slot_interval_minutes,
            signal_percent_default: None,
            created_at: Utc::now(),
        }
    }

    /// The tenant's IANA zone, or `fallback` when it is unset or unknown.
    pub fn zone(&self, fallback: Tz) -> Tz {
        if self.timezone.trim().is_empty() {
            return fallback;
        }
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(tenant_id = %self.id, timezone = %self.timezone, "Unknown tenant time zone, using fallback");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_parses_iana_name() {
        let t = Tenant::new("A".into(), "a".into(), "America/Sao_Paulo".into(), 30);
        assert_eq!(t.zone(chrono_tz::UTC), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn zone_falls_back_on_blank_or_garbage() {
        let mut t = Tenant::new("A".into(), "a".into(), "".into(), 30);
        assert_eq!(t.zone(chrono_tz::America::Fortaleza), chrono_tz::America::Fortaleza);
        t.timezone = "Not/AZone".into();
        assert_eq!(t.zone(chrono_tz::America::Fortaleza), chrono_tz::America::Fortaleza);
    }
}
