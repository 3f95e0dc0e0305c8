use crate::domain::models::payment::{PixChargeRequest, ProviderPayment};
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

pub struct MercadoPagoGateway {
    client: Client,
    base_url: String,
    access_token: String,
}

impl MercadoPagoGateway {
    /// Fails when the HTTP client cannot be built; provider calls never run without the timeout.
    pub fn new(base_url: String, access_token: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Payment provider client: {}", e)))?;
        Ok(Self { client, base_url, access_token })
    }

    async fn read_payment(&self, res: reqwest::Response, context: &str) -> Result<ProviderPayment, AppError> {
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let msg = format!("{} failed. Status: {}, Body: {}", context, status, text);
            error!("{}", msg);
            return Err(AppError::Upstream(msg));
        }
        let body: MpPayment = res.json().await.map_err(|e| {
            error!("Failed to parse provider response: {:?}", e);
            AppError::Upstream(format!("{}: unreadable response", context))
        })?;
        body.into_provider_payment()
    }
}

#[derive(Serialize)]
struct PayerPayload<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct CreatePaymentPayload<'a> {
    transaction_amount: f64,
    description: &'a str,
    payment_method_id: &'static str,
    installments: u32,
    payer: PayerPayload<'a>,
    external_reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct MpTransactionData {
    qr_code: Option<String>,
    qr_code_base64: Option<String>,
    ticket_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct MpPointOfInteraction {
    transaction_data: Option<MpTransactionData>,
}

#[derive(Deserialize)]
struct MpPayment {
    id: Value,
    status: Option<String>,
    status_detail: Option<String>,
    external_reference: Option<String>,
    date_of_expiration: Option<String>,
    point_of_interaction: Option<MpPointOfInteraction>,
}

impl MpPayment {
    fn into_provider_payment(self) -> Result<ProviderPayment, AppError> {
        let id = match &self.id {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => return Err(AppError::Upstream("Provider response without payment id".into())),
        };
        let status = self.status
            .filter(|s| !s.is_empty())
            .ok_or(AppError::Upstream("Provider response without payment status".into()))?;
        let tx = self.point_of_interaction
            .and_then(|p| p.transaction_data)
            .unwrap_or_default();
        let expires_at = self.date_of_expiration
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ProviderPayment {
            id,
            status,
            status_detail: self.status_detail,
            external_reference: self.external_reference.filter(|r| !r.is_empty()),
            qr_code: tx.qr_code,
            qr_code_base64: tx.qr_code_base64,
            ticket_url: tx.ticket_url,
            expires_at,
        })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn create_pix(&self, request: &PixChargeRequest) -> Result<ProviderPayment, AppError> {
        let payload = CreatePaymentPayload {
            transaction_amount: request.amount_cents as f64 / 100.0,
            description: &request.description,
            payment_method_id: "pix",
            installments: 1,
            payer: PayerPayload { email: &request.payer_email },
            external_reference: &request.external_reference,
            notification_url: request.notification_url.as_deref(),
        };

        let res = self.client.post(format!("{}/v1/payments", self.base_url))
            .bearer_auth(&self.access_token)
            .header("X-Idempotency-Key", &request.idempotency_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment provider connection error: {}", e);
                error!("{}", msg);
                AppError::Upstream(msg)
            })?;

        let payment = self.read_payment(res, "PIX charge creation").await?;
        info!(provider_payment_id = %payment.id, status = %payment.status, "Provider issued PIX charge");
        Ok(payment)
    }

    async fn fetch_payment(&self, provider_payment_id: &str) -> Result<ProviderPayment, AppError> {
        let res = self.client.get(format!("{}/v1/payments/{}", self.base_url, provider_payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment provider connection error: {}", e);
                error!("{}", msg);
                AppError::Upstream(msg)
            })?;

        self.read_payment(res, "Payment lookup").await
    }
}
