use std::sync::Arc;
use crate::domain::ports::{
    TenantRepository, ServiceRepository, ScheduleRepository, CustomerRepository,
    BookingRepository, PaymentRepository, BookingLinkRepository, WebhookEventRepository,
    PaymentGateway,
};
use crate::domain::services::{
    admission::BookingService, availability::AvailabilityService, catalog::CatalogService,
    payment_hold::PaymentHoldService, payments::PaymentService, public_links::PublicLinkService,
    tenant_locks::TenantLocks,
};
use crate::config::Config;

/// Storage adapters for one backend.
#[derive(Clone)]
pub struct Repositories {
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub schedule_repo: Arc<dyn ScheduleRepository>,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub link_repo: Arc<dyn BookingLinkRepository>,
    pub webhook_repo: Arc<dyn WebhookEventRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub schedule_repo: Arc<dyn ScheduleRepository>,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub link_repo: Arc<dyn BookingLinkRepository>,
    pub webhook_repo: Arc<dyn WebhookEventRepository>,
    pub availability: Arc<AvailabilityService>,
    pub bookings: Arc<BookingService>,
    pub holds: Arc<PaymentHoldService>,
    pub payments: Arc<PaymentService>,
    pub catalog: Arc<CatalogService>,
    pub public_links: Arc<PublicLinkService>,
}

impl AppState {
    /// Wires the domain services on top of `repos`. `gateway` is `None` when the
    /// payment provider is not configured.
    pub fn new(config: Config, repos: Repositories, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        let tz = config.default_timezone;

        let availability = Arc::new(AvailabilityService::new(
            repos.tenant_repo.clone(),
            repos.service_repo.clone(),
            repos.schedule_repo.clone(),
            repos.booking_repo.clone(),
            tz,
        ));
        let bookings = Arc::new(BookingService::new(
            repos.tenant_repo.clone(),
            repos.service_repo.clone(),
            repos.schedule_repo.clone(),
            repos.customer_repo.clone(),
            repos.booking_repo.clone(),
            Arc::new(TenantLocks::new()),
            tz,
        ));
        let holds = Arc::new(PaymentHoldService::new(
            repos.booking_repo.clone(),
            repos.payment_repo.clone(),
            repos.webhook_repo.clone(),
            gateway.clone(),
        ));
        let payments = Arc::new(PaymentService::new(
            repos.booking_repo.clone(),
            repos.customer_repo.clone(),
            repos.payment_repo.clone(),
            gateway,
            config.mp_webhook_url.clone(),
        ));
        let catalog = Arc::new(CatalogService::new(
            repos.tenant_repo.clone(),
            repos.service_repo.clone(),
            repos.schedule_repo.clone(),
        ));
        let public_links = Arc::new(PublicLinkService::new(
            repos.link_repo.clone(),
            repos.service_repo.clone(),
            availability.clone(),
            bookings.clone(),
            holds.clone(),
            payments.clone(),
        ));

        Self {
            config,
            tenant_repo: repos.tenant_repo,
            service_repo: repos.service_repo,
            schedule_repo: repos.schedule_repo,
            customer_repo: repos.customer_repo,
            booking_repo: repos.booking_repo,
            payment_repo: repos.payment_repo,
            link_repo: repos.link_repo,
            webhook_repo: repos.webhook_repo,
            availability,
            bookings,
            holds,
            payments,
            catalog,
            public_links,
        }
    }
}
