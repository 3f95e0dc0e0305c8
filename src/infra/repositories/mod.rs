pub mod sqlite_tenant_repo;
pub mod sqlite_service_repo;
pub mod sqlite_schedule_repo;
pub mod sqlite_customer_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_payment_repo;
pub mod sqlite_booking_link_repo;
pub mod sqlite_webhook_event_repo;

pub mod postgres_tenant_repo;
pub mod postgres_service_repo;
pub mod postgres_schedule_repo;
pub mod postgres_customer_repo;
pub mod postgres_booking_repo;
pub mod postgres_payment_repo;
pub mod postgres_booking_link_repo;
pub mod postgres_webhook_event_repo;
