use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::{
    booking::BookingStatus,
    payment::{Payment, PaymentIntent, PixCharge, PixChargeRequest},
};
use crate::domain::ports::{BookingRepository, CustomerRepository, PaymentGateway, PaymentRepository};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct PixChargeInput {
    pub booking_id: String,
    pub payer_email: Option<String>,
    pub intent: PaymentIntent,
}

/// Issues PIX deposit charges for bookings on a payment hold.
pub struct PaymentService {
    booking_repo: Arc<dyn BookingRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    notification_url: Option<String>,
}

impl PaymentService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notification_url: Option<String>,
    ) -> Self {
        Self { booking_repo, customer_repo, payment_repo, gateway, notification_url }
    }

    pub async fn create_pix_charge(&self, tenant_id: &str, input: PixChargeInput) -> Result<PixCharge, AppError> {
        let booking = self.booking_repo.find_by_id(tenant_id, &input.booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if booking.status() != Some(BookingStatus::PendingPayment) {
            return Err(AppError::Conflict("Booking is not awaiting payment".into()));
        }
        if booking.expires_at.is_some_and(|exp| exp <= Utc::now()) {
            return Err(AppError::Conflict("Booking payment window has expired".into()));
        }

        let amount_cents = match input.intent {
            PaymentIntent::Signal => booking.signal_amount_cents,
            PaymentIntent::Total => booking.total_price_cents,
        };
        if amount_cents <= 0 {
            return Err(AppError::Validation("Nothing to charge for this booking".into()));
        }

        if let Some(existing) = self.payment_repo.find_reusable_pending(&booking.id, input.intent).await?
            && existing.has_qr_data() {
            info!(booking_id = %booking.id, payment_id = %existing.id, "Reusing pending PIX charge");
            return Ok(existing.into());
        }

        let gateway = self.gateway.as_ref()
            .ok_or(AppError::Configuration("Payment provider credentials are not configured".into()))?;

        let payer_email = match input.payer_email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => email.to_string(),
            None => self.customer_repo.find_by_id(tenant_id, &booking.customer_id).await?
                .and_then(|c| c.email)
                .ok_or(AppError::Validation("A payer email is required".into()))?,
        };

        let request = PixChargeRequest {
            amount_cents,
            description: format!("Payment ({}) booking {}", input.intent, booking.id),
            payer_email,
            external_reference: booking.id.clone(),
            notification_url: self.notification_url.clone(),
            idempotency_key: Uuid::new_v4().to_string(),
        };

        // Nothing is stored unless the provider accepted the charge.
        let issued = gateway.create_pix(&request).await?;

        let payment = Payment::from_provider(
            tenant_id.to_string(),
            booking.id.clone(),
            input.intent,
            amount_cents,
            request.idempotency_key,
            issued,
        );
        let saved = self.payment_repo.create(&payment).await?;
        info!(
            tenant_id = %tenant_id,
            booking_id = %booking.id,
            payment_id = %saved.id,
            provider_payment_id = %saved.provider_payment_id,
            status = %saved.status,
            "PIX charge issued"
        );
        Ok(saved.into())
    }
}
