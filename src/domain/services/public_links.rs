use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::{
    booking::{Booking, BookingDetails},
    booking_link::{BookingLink, LinkScope},
    payment::PixCharge,
    service::Service,
};
use crate::domain::ports::{BookingLinkRepository, ServiceRepository};
use crate::domain::services::{
    admission::{BookingRequest, BookingService},
    availability::{AvailabilityService, DailyAvailability},
    payment_hold::PaymentHoldService,
    payments::{PaymentService, PixChargeInput},
};
use crate::error::AppError;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LinkDetails {
    #[serde(flatten)]
    pub link: BookingLink,
    pub service: Option<Service>,
}

/// Token-gated customer access. Every operation resolves the token first and
/// runs against the link's tenant, with the link's service forced when pinned.
pub struct PublicLinkService {
    link_repo: Arc<dyn BookingLinkRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    availability: Arc<AvailabilityService>,
    bookings: Arc<BookingService>,
    holds: Arc<PaymentHoldService>,
    payments: Arc<PaymentService>,
}

impl PublicLinkService {
    pub fn new(
        link_repo: Arc<dyn BookingLinkRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        availability: Arc<AvailabilityService>,
        bookings: Arc<BookingService>,
        holds: Arc<PaymentHoldService>,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self { link_repo, service_repo, availability, bookings, holds, payments }
    }

    pub async fn create_link(&self, tenant_id: &str, service_id: Option<String>) -> Result<BookingLink, AppError> {
        let service_id = service_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if let Some(id) = service_id.as_deref() {
            self.service_repo.find_by_id(tenant_id, id).await?
                .filter(|s| s.active)
                .ok_or(AppError::NotFound("Service not found".into()))?;
        }

        let link = self.link_repo.create(&BookingLink::new(tenant_id.to_string(), service_id)).await?;
        info!(tenant_id = %tenant_id, link_id = %link.id, "Booking link created");
        Ok(link)
    }

    pub async fn list_links(&self, tenant_id: &str) -> Result<Vec<LinkDetails>, AppError> {
        let services = self.service_repo.list(tenant_id).await?;
        let links = self.link_repo.list(tenant_id).await?;
        Ok(links.into_iter()
            .map(|link| {
                let service = link.service_id.as_ref()
                    .and_then(|id| services.iter().find(|s| &s.id == id).cloned());
                LinkDetails { link, service }
            })
            .collect())
    }

    pub async fn toggle_link(&self, tenant_id: &str, id: &str) -> Result<BookingLink, AppError> {
        let link = self.link_repo.find_by_id(tenant_id, id).await?
            .ok_or(AppError::NotFound("Link not found".into()))?;
        self.link_repo.set_active(tenant_id, id, !link.active).await
    }

    pub async fn resolve_token(&self, token: &str) -> Result<LinkScope, AppError> {
        match self.link_repo.find_by_token(token.trim()).await? {
            Some(link) if link.active => Ok(LinkScope { tenant_id: link.tenant_id, service_id: link.service_id }),
            _ => {
                warn!("Rejected invalid or inactive booking link");
                Err(AppError::NotFound("Invalid or inactive link".into()))
            }
        }
    }

    /// The pinned service alone, or every active service of the tenant.
    pub async fn list_public_services(&self, token: &str) -> Result<Vec<Service>, AppError> {
        let scope = self.resolve_token(token).await?;
        match scope.service_id.as_deref() {
            Some(id) => {
                let service = self.service_repo.find_by_id(&scope.tenant_id, id).await?
                    .filter(|s| s.active)
                    .ok_or(AppError::NotFound("Service unavailable".into()))?;
                Ok(vec![service])
            }
            None => self.service_repo.list_active(&scope.tenant_id).await,
        }
    }

    pub async fn availability(&self, token: &str, service_id: Option<&str>, date: &str) -> Result<DailyAvailability, AppError> {
        let scope = self.resolve_token(token).await?;
        let service_id = scope.effective_service(service_id)
            .filter(|s| !s.trim().is_empty())
            .ok_or(AppError::Validation("serviceId is required".into()))?;
        self.availability.daily_slots(&scope.tenant_id, service_id, date).await
    }

    pub async fn create_booking(&self, token: &str, mut req: BookingRequest) -> Result<BookingDetails, AppError> {
        let scope = self.resolve_token(token).await?;
        if let Some(pinned) = scope.service_id.as_deref() {
            req.service_id = pinned.to_string();
        }
        self.bookings.create_booking(&scope.tenant_id, req).await
    }

    pub async fn get_booking(&self, token: &str, booking_id: &str) -> Result<BookingDetails, AppError> {
        let scope = self.resolve_token(token).await?;
        self.bookings.get_booking(&scope.tenant_id, booking_id).await
    }

    pub async fn cancel_booking(&self, token: &str, booking_id: &str) -> Result<Booking, AppError> {
        let scope = self.resolve_token(token).await?;
        self.holds.cancel_pending(&scope.tenant_id, booking_id).await
    }

    pub async fn create_pix_charge(&self, token: &str, input: PixChargeInput) -> Result<PixCharge, AppError> {
        let scope = self.resolve_token(token).await?;
        self.payments.create_pix_charge(&scope.tenant_id, input).await
    }
}
