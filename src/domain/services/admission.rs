use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::domain::models::{
    booking::{Booking, BookingDetails, NewBookingParams},
    customer::Customer,
    service::Service,
    time_range::TimeRange,
    schedule::weekday_index,
};
use crate::domain::ports::{
    BookingRepository, CustomerRepository, ScheduleRepository, ServiceRepository, TenantRepository,
};
use crate::domain::services::{payment_hold::sweep_tenant, tenant_locks::TenantLocks};
use crate::error::AppError;

const CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub service_id: String,
    pub start_at: String,
    pub customer: CustomerInput,
}

pub struct BookingService {
    tenant_repo: Arc<dyn TenantRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    schedule_repo: Arc<dyn ScheduleRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    locks: Arc<TenantLocks>,
    default_tz: Tz,
}

impl BookingService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        schedule_repo: Arc<dyn ScheduleRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        locks: Arc<TenantLocks>,
        default_tz: Tz,
    ) -> Self {
        Self { tenant_repo, service_repo, schedule_repo, customer_repo, booking_repo, locks, default_tz }
    }

    /// Admits a booking: validates it against business hours, rejects overlaps with
    /// blocks and blocking bookings, and stores it CONFIRMED or on a payment hold.
    pub async fn create_booking(&self, tenant_id: &str, req: BookingRequest) -> Result<BookingDetails, AppError> {
        let tenant = self.tenant_repo.find_by_id(tenant_id).await?
            .ok_or(AppError::NotFound("Tenant not found".into()))?;
        let service = self.service_repo.find_by_id(tenant_id, &req.service_id).await?
            .filter(|s| s.active)
            .ok_or(AppError::NotFound("Service not found or inactive".into()))?;

        let start = DateTime::parse_from_rfc3339(req.start_at.trim())
            .map_err(|_| AppError::Validation("Invalid startAt, expected an ISO-8601 instant".into()))?
            .with_timezone(&Utc);
        let requested = TimeRange::starting_at(start, Duration::minutes(service.duration_minutes as i64));

        let name = req.customer.name.trim();
        let phone = req.customer.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(AppError::Validation("Customer name and phone are required".into()));
        }

        let tz = tenant.zone(self.default_tz);
        let local_date = start.with_timezone(&tz).date_naive();
        let hours = self.schedule_repo.list_active_hours_for_weekday(tenant_id, weekday_index(local_date)).await?;
        if hours.is_empty() {
            return Err(AppError::Validation("No business hours configured for this day".into()));
        }
        let within_hours = hours.iter()
            .filter_map(|h| h.window_on(local_date, tz))
            .any(|window| window.contains(&requested));
        if !within_hours {
            return Err(AppError::Validation("Requested time is outside business hours".into()));
        }

        let _guard = self.locks.acquire(tenant_id).await;
        // Sweep and overlap checks share one instant so no hold lapses between them.
        let now = Utc::now();
        sweep_tenant(self.booking_repo.as_ref(), tenant_id, now).await?;

        let blocks = self.schedule_repo.list_blocks_in_range(tenant_id, requested.start, requested.end).await?;
        if blocks.iter().any(|b| b.range().overlaps(&requested)) {
            warn!(tenant_id = %tenant_id, start = %requested.start, "Booking rejected: schedule block");
            return Err(AppError::Conflict("Time slot unavailable (blocked)".into()));
        }

        let existing = self.booking_repo.list_overlapping_active(tenant_id, requested.start, requested.end).await?;
        if existing.iter().any(|b| b.is_blocking(now) && b.range().overlaps(&requested)) {
            warn!(tenant_id = %tenant_id, start = %requested.start, "Booking rejected: slot already taken");
            return Err(AppError::Conflict("Time slot unavailable (already booked)".into()));
        }

        let customer = self.customer_repo
            .find_or_create(&Customer::new(tenant_id.to_string(), name, phone, req.customer.email.as_deref()))
            .await?;

        let signal_percent = service.signal_percent_override
            .or(tenant.signal_percent_default)
            .unwrap_or(0);

        let mut booking = Booking::new(NewBookingParams {
            tenant_id: tenant_id.to_string(),
            service_id: service.id.clone(),
            customer_id: customer.id.clone(),
            start: requested.start,
            duration_min: service.duration_minutes,
            total_price_cents: service.price_cents,
            signal_percent,
            now,
        });

        let created = self.insert_with_fresh_code(&mut booking).await?;
        info!(
            tenant_id = %tenant_id,
            booking_id = %created.id,
            code = %created.code,
            status = %created.status,
            signal_amount_cents = created.signal_amount_cents,
            "Booking created"
        );

        Ok(BookingDetails { booking: created, service, customer })
    }

    async fn insert_with_fresh_code(&self, booking: &mut Booking) -> Result<Booking, AppError> {
        let mut attempt = 1;
        loop {
            match self.booking_repo.create(booking).await {
                Err(e) if e.is_unique_violation() && attempt < CODE_ATTEMPTS => {
                    warn!(code = %booking.code, attempt, "Booking code collision, retrying");
                    booking.regenerate_code();
                    attempt += 1;
                }
                Err(e) if e.is_unique_violation() => {
                    return Err(AppError::Conflict("Could not allocate a unique booking code".into()));
                }
                other => return other,
            }
        }
    }

    pub async fn get_booking(&self, tenant_id: &str, booking_id: &str) -> Result<BookingDetails, AppError> {
        let booking = self.booking_repo.find_by_id(tenant_id, booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let service = self.service_repo.find_by_id(tenant_id, &booking.service_id).await?
            .ok_or(AppError::NotFound("Service not found".into()))?;
        let customer = self.customer_repo.find_by_id(tenant_id, &booking.customer_id).await?
            .ok_or(AppError::NotFound("Customer not found".into()))?;
        Ok(BookingDetails { booking, service, customer })
    }

    /// Bookings that start at or after `from` and end at or before `to`.
    pub async fn list_bookings(&self, tenant_id: &str, from: &str, to: &str) -> Result<Vec<BookingDetails>, AppError> {
        let parse = |value: &str, field: &str| {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| AppError::Validation(format!("Invalid {}, expected an ISO-8601 instant", field)))
        };
        let from = parse(from, "from")?;
        let to = parse(to, "to")?;
        if to < from {
            return Err(AppError::Validation("'to' must not be before 'from'".into()));
        }

        let bookings = self.booking_repo.list_in_range(tenant_id, from, to).await?;

        let services: HashMap<String, Service> = self.service_repo.list(tenant_id).await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        let mut customers: HashMap<String, Customer> = HashMap::new();

        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let Some(service) = services.get(&booking.service_id).cloned() else {
                warn!(booking_id = %booking.id, "Booking references a missing service");
                continue;
            };
            if !customers.contains_key(&booking.customer_id) {
                match self.customer_repo.find_by_id(tenant_id, &booking.customer_id).await? {
                    Some(c) => { customers.insert(c.id.clone(), c); }
                    None => {
                        warn!(booking_id = %booking.id, "Booking references a missing customer");
                        continue;
                    }
                }
            }
            let Some(customer) = customers.get(&booking.customer_id).cloned() else { continue };
            details.push(BookingDetails { booking, service, customer });
        }
        Ok(details)
    }
}
