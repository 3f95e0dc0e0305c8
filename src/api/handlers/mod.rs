pub mod availability;
pub mod bookings;
pub mod health;
pub mod links;
pub mod payments;
pub mod public;
pub mod schedule;
pub mod services;
pub mod tenant;
pub mod webhooks;

use chrono::{DateTime, Utc};
use crate::error::AppError;

pub(crate) fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{} must be an ISO-8601 instant", field)))
}
