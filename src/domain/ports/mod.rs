use crate::domain::models::{
    tenant::Tenant, service::Service, schedule::{BusinessHour, ScheduleBlock},
    customer::Customer, booking::Booking, booking_link::BookingLink,
    payment::{Payment, PaymentIntent, PixChargeRequest, ProviderPayment},
    webhook_event::WebhookEvent,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Service>, AppError>;
    async fn list(&self, tenant_id: &str) -> Result<Vec<Service>, AppError>;
    async fn list_active(&self, tenant_id: &str) -> Result<Vec<Service>, AppError>;
    async fn update(&self, service: &Service) -> Result<Service, AppError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn list_business_hours(&self, tenant_id: &str) -> Result<Vec<BusinessHour>, AppError>;
    async fn list_active_hours_for_weekday(&self, tenant_id: &str, weekday: i32) -> Result<Vec<BusinessHour>, AppError>;
    /// Deletes every business hour of the tenant and inserts `hours`, atomically.
    async fn replace_business_hours(&self, tenant_id: &str, hours: &[BusinessHour]) -> Result<Vec<BusinessHour>, AppError>;

    async fn create_block(&self, block: &ScheduleBlock) -> Result<ScheduleBlock, AppError>;
    async fn delete_block(&self, tenant_id: &str, id: &str) -> Result<(), AppError>;
    /// Blocks intersecting `[start, end)`, ordered by start.
    async fn list_blocks_in_range(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleBlock>, AppError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Returns the tenant's customer with `customer.phone`, inserting `customer` if there is none.
    async fn find_or_create(&self, customer: &Customer) -> Result<Customer, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Customer>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `Conflict` when storage rejects the row as overlapping an active booking.
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    /// Bookings with `start_at >= from` and `end_at <= to`, chronological.
    async fn list_in_range(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    /// CONFIRMED and PENDING_PAYMENT bookings intersecting `[start, end)`.
    async fn list_overlapping_active(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    async fn expire_stale_holds(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<u64, AppError>;
    async fn expire_all_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
    /// PENDING_PAYMENT -> CONFIRMED while the hold is still open at `now`.
    /// `None` when the booking was not pending or its hold already lapsed.
    async fn confirm_pending(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError>;
    /// PENDING_PAYMENT -> CANCELLED. `None` when the booking was not pending.
    async fn cancel_pending(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<Payment, AppError>;
    /// Latest `pending` PIX payment for the booking and intent.
    async fn find_reusable_pending(&self, booking_id: &str, intent: PaymentIntent) -> Result<Option<Payment>, AppError>;
    async fn find_by_provider_id(&self, provider_payment_id: &str) -> Result<Option<Payment>, AppError>;
    async fn update_status(&self, id: &str, status: &str, status_detail: Option<&str>) -> Result<Payment, AppError>;
}

#[async_trait]
pub trait BookingLinkRepository: Send + Sync {
    async fn create(&self, link: &BookingLink) -> Result<BookingLink, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<BookingLink>, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<BookingLink>, AppError>;
    async fn list(&self, tenant_id: &str) -> Result<Vec<BookingLink>, AppError>;
    async fn set_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<BookingLink, AppError>;
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Stores the event unless its key is already known. Returns `false` for a duplicate.
    async fn record(&self, event: &WebhookEvent) -> Result<bool, AppError>;
    async fn release(&self, event_key: &str) -> Result<(), AppError>;
}

/// Outbound PIX provider. Implementations bound every call with a timeout and
/// report non-success responses as `AppError::Upstream`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_pix(&self, request: &PixChargeRequest) -> Result<ProviderPayment, AppError>;
    async fn fetch_payment(&self, provider_payment_id: &str) -> Result<ProviderPayment, AppError>;
}
