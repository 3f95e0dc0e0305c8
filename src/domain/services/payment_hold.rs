use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::models::{
    booking::Booking,
    payment::{PROVIDER_MERCADOPAGO, STATUS_APPROVED},
    webhook_event::WebhookEvent,
};
use crate::domain::ports::{BookingRepository, PaymentGateway, PaymentRepository, WebhookEventRepository};
use crate::error::AppError;

/// Marks the tenant's holds whose `expires_at` has passed as EXPIRED.
pub async fn sweep_tenant(repo: &dyn BookingRepository, tenant_id: &str, now: DateTime<Utc>) -> Result<u64, AppError> {
    let expired = repo.expire_stale_holds(tenant_id, now).await?;
    if expired > 0 {
        info!(tenant_id = %tenant_id, expired, "Expired stale payment holds");
    }
    Ok(expired)
}

/// Same transition as [`sweep_tenant`], across every tenant.
pub async fn sweep_all(repo: &dyn BookingRepository, now: DateTime<Utc>) -> Result<u64, AppError> {
    let expired = repo.expire_all_stale_holds(now).await?;
    if expired > 0 {
        info!(expired, "Expired stale payment holds");
    }
    Ok(expired)
}

/// Provider payment id carried by a notification. Tried in order: `data.id` in the
/// body, `id` in the body, `data.id` in the query string, `id` in the query string.
/// Strings and integral numbers are accepted.
pub fn extract_payment_id(body: &Value, query: &HashMap<String, String>) -> Option<String> {
    fn as_id(v: &Value) -> Option<String> {
        match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    body.get("data").and_then(|d| d.get("id")).and_then(as_id)
        .or_else(|| body.get("id").and_then(as_id))
        .or_else(|| query.get("data.id").filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string()))
        .or_else(|| query.get("id").filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string()))
}

/// Deduplication key of a delivery: provider, payment id and delivery id.
pub fn event_key(payment_id: Option<&str>, request_id: Option<&str>) -> String {
    format!(
        "MP:{}:{}",
        payment_id.unwrap_or("no-id"),
        request_id.filter(|r| !r.trim().is_empty()).unwrap_or("no-reqid")
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payment status refreshed; `confirmed` tells whether the hold became CONFIRMED.
    Processed { confirmed: bool },
    Duplicate,
    /// Nothing to act on, e.g. no payment id in the notification.
    Ignored,
    UnknownPayment,
}

pub struct PaymentHoldService {
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    webhook_repo: Arc<dyn WebhookEventRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl PaymentHoldService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        webhook_repo: Arc<dyn WebhookEventRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self { booking_repo, payment_repo, webhook_repo, gateway }
    }

    /// Releases a hold. Only PENDING_PAYMENT bookings can be cancelled.
    pub async fn cancel_pending(&self, tenant_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.booking_repo.find_by_id(tenant_id, booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        match self.booking_repo.cancel_pending(tenant_id, &booking.id).await? {
            Some(cancelled) => {
                info!(tenant_id = %tenant_id, booking_id = %booking_id, "Cancelled pending booking");
                Ok(cancelled)
            }
            None => {
                warn!(tenant_id = %tenant_id, booking_id = %booking_id, status = %booking.status, "Refused to cancel non-pending booking");
                Err(AppError::Conflict("Only bookings awaiting payment can be cancelled".into()))
            }
        }
    }

    /// Applies a provider notification. The body is untrusted: the payment is
    /// re-read from the provider before anything changes locally.
    pub async fn reconcile_webhook(
        &self,
        body: &Value,
        query: &HashMap<String, String>,
        request_id: Option<&str>,
    ) -> Result<WebhookOutcome, AppError> {
        let gateway = self.gateway.as_ref()
            .ok_or(AppError::Configuration("Payment provider credentials are not configured".into()))?;

        let payment_id = extract_payment_id(body, query);
        let key = event_key(payment_id.as_deref(), request_id);

        let event = WebhookEvent::new(PROVIDER_MERCADOPAGO, key.clone(), body.clone());
        if !self.webhook_repo.record(&event).await? {
            info!(event_key = %key, "Duplicate webhook delivery ignored");
            return Ok(WebhookOutcome::Duplicate);
        }

        let Some(payment_id) = payment_id else {
            warn!(event_key = %key, "Webhook without payment id");
            return Ok(WebhookOutcome::Ignored);
        };

        let remote = match gateway.fetch_payment(&payment_id).await {
            Ok(remote) => remote,
            Err(e) => {
                // Forget the delivery so the provider's retry is processed.
                if let Err(release_err) = self.webhook_repo.release(&key).await {
                    warn!(event_key = %key, "Failed to release webhook event: {:?}", release_err);
                }
                return Err(e);
            }
        };

        let Some(local) = self.payment_repo.find_by_provider_id(&payment_id).await? else {
            warn!(provider_payment_id = %payment_id, "Webhook for unknown payment");
            return Ok(WebhookOutcome::UnknownPayment);
        };

        let payment = self.payment_repo
            .update_status(&local.id, &remote.status, remote.status_detail.as_deref())
            .await?;
        info!(payment_id = %payment.id, booking_id = %payment.booking_id, status = %payment.status, "Payment status updated");

        if payment.status != STATUS_APPROVED {
            return Ok(WebhookOutcome::Processed { confirmed: false });
        }

        if let Some(reference) = remote.external_reference.as_deref()
            && reference != payment.booking_id {
            warn!(payment_id = %payment.id, booking_id = %payment.booking_id, external_reference = %reference, "Approved payment references another booking");
            return Ok(WebhookOutcome::Processed { confirmed: false });
        }

        match self.booking_repo.confirm_pending(&payment.booking_id, Utc::now()).await? {
            Some(booking) => {
                info!(tenant_id = %booking.tenant_id, booking_id = %booking.id, "Booking confirmed by payment");
                Ok(WebhookOutcome::Processed { confirmed: true })
            }
            None => {
                warn!(booking_id = %payment.booking_id, payment_id = %payment.id, "Approved payment for a booking that is no longer pending or whose hold lapsed, needs manual refund");
                Ok(WebhookOutcome::Processed { confirmed: false })
            }
        }
    }
}
