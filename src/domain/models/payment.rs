use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const PROVIDER_MERCADOPAGO: &str = "MERCADOPAGO";
pub const METHOD_PIX: &str = "PIX";

// Provider vocabulary, stored verbatim.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentIntent {
    #[default]
    Signal,
    Total,
}

impl PaymentIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntent::Signal => "SIGNAL",
            PaymentIntent::Total => "TOTAL",
        }
    }
}

impl fmt::Display for PaymentIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGNAL" => Ok(PaymentIntent::Signal),
            "TOTAL" => Ok(PaymentIntent::Total),
            other => Err(format!("unknown payment intent '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    pub booking_id: String,
    pub provider: String,
    pub method: String,
    pub intent: String,
    pub amount_cents: i64,
    pub status: String,
    pub status_detail: Option<String>,
    pub provider_payment_id: String,
    pub idempotency_key: String,
    pub external_ref: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Local record of a PIX charge the provider has just issued.
    pub fn from_provider(
        tenant_id: String,
        booking_id: String,
        intent: PaymentIntent,
        amount_cents: i64,
        idempotency_key: String,
        charge: ProviderPayment,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            external_ref: charge.external_reference.or_else(|| Some(booking_id.clone())),
            booking_id,
            provider: PROVIDER_MERCADOPAGO.to_string(),
            method: METHOD_PIX.to_string(),
            intent: intent.as_str().to_string(),
            amount_cents,
            status: charge.status,
            status_detail: charge.status_detail,
            provider_payment_id: charge.id,
            idempotency_key,
            qr_code: charge.qr_code,
            qr_code_base64: charge.qr_code_base64,
            ticket_url: charge.ticket_url,
            expires_at: charge.expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_qr_data(&self) -> bool {
        self.qr_code.is_some() || self.qr_code_base64.is_some()
    }
}

/// A payment as the provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayment {
    pub id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PixChargeRequest {
    pub amount_cents: i64,
    pub description: String,
    pub payer_email: String,
    pub external_reference: String,
    pub notification_url: Option<String>,
    pub idempotency_key: String,
}

/// What the payer needs to complete a PIX charge.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PixCharge {
    pub payment_id: String,
    pub provider_payment_id: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

impl From<Payment> for PixCharge {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.id,
            provider_payment_id: p.provider_payment_id,
            status: p.status,
            expires_at: p.expires_at,
            qr_code: p.qr_code,
            qr_code_base64: p.qr_code_base64,
            ticket_url: p.ticket_url,
        }
    }
}
