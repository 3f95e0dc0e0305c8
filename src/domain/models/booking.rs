use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};

use super::{customer::Customer, service::Service, time_range::TimeRange};

/// How long a deposit hold reserves its interval.
pub const PAYMENT_WINDOW_MINUTES: i64 = 30;

const CODE_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Expired,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Expired => "EXPIRED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(BookingStatus::PendingPayment),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "EXPIRED" => Ok(BookingStatus::Expired),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub tenant_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub code: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub total_price_cents: i64,
    pub signal_percent_applied: i32,
    pub signal_amount_cents: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub tenant_id: String,
    pub service_id: String,
    pub customer_id: String,
    pub start: DateTime<Utc>,
    pub duration_min: i32,
    pub total_price_cents: i64,
    pub signal_percent: i32,
    pub now: DateTime<Utc>,
}

impl Booking {
    /// A deposit above zero puts the booking on hold for `PAYMENT_WINDOW_MINUTES`,
    /// otherwise it is confirmed straight away.
    pub fn new(params: NewBookingParams) -> Self {
        let end_at = params.start + Duration::minutes(params.duration_min as i64);
        let signal_amount_cents = signal_amount(params.total_price_cents, params.signal_percent);
        let (status, expires_at) = if signal_amount_cents > 0 {
            (BookingStatus::PendingPayment, Some(params.now + Duration::minutes(PAYMENT_WINDOW_MINUTES)))
        } else {
            (BookingStatus::Confirmed, None)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: params.tenant_id,
            service_id: params.service_id,
            customer_id: params.customer_id,
            code: generate_code(),
            start_at: params.start,
            end_at,
            status: status.as_str().to_string(),
            total_price_cents: params.total_price_cents,
            signal_percent_applied: params.signal_percent,
            signal_amount_cents,
            expires_at,
            created_at: params.now,
        }
    }

    pub fn status(&self) -> Option<BookingStatus> {
        self.status.parse().ok()
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_at, self.end_at)
    }

    /// Whether this booking still reserves its interval at `now`. A hold past its
    /// expiry no longer blocks, even before the sweep has marked it EXPIRED.
    pub fn is_blocking(&self, now: DateTime<Utc>) -> bool {
        match self.status() {
            Some(BookingStatus::Confirmed) => true,
            Some(BookingStatus::PendingPayment) => self.expires_at.is_none_or(|exp| exp > now),
            _ => false,
        }
    }

    pub fn regenerate_code(&mut self) {
        self.code = generate_code();
    }
}

/// `round(total * percent / 100)` in integer cents, half away from zero.
pub fn signal_amount(total_price_cents: i64, percent: i32) -> i64 {
    if total_price_cents <= 0 || percent <= 0 {
        return 0;
    }
    (total_price_cents * percent as i64 + 50) / 100
}

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// A booking with its service and customer attached.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub service: Service,
    pub customer: Customer,
}
