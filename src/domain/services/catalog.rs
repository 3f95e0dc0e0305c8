use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::models::{
    schedule::{parse_hhmm, BusinessHour, ScheduleBlock},
    service::{NewServiceParams, Service},
    tenant::Tenant,
};
use crate::domain::ports::{ScheduleRepository, ServiceRepository, TenantRepository};
use crate::error::AppError;

const ACTIVATION_NEEDS_HOURS: &str = "Configure at least one valid business hour before activating a service";

#[derive(Debug, Clone)]
pub struct NewServiceInput {
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub signal_percent_override: Option<i32>,
    pub active: Option<bool>,
}

/// Partial update. `signal_percent_override: Some(None)` clears the override.
#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub duration_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    pub signal_percent_override: Option<Option<i32>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BusinessHourInput {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

/// Staff-side management of services, business hours, blocks and tenant settings.
pub struct CatalogService {
    tenant_repo: Arc<dyn TenantRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    schedule_repo: Arc<dyn ScheduleRepository>,
}

impl CatalogService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        schedule_repo: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self { tenant_repo, service_repo, schedule_repo }
    }

    pub async fn get_tenant(&self, tenant_id: &str) -> Result<Tenant, AppError> {
        self.tenant_repo.find_by_id(tenant_id).await?
            .ok_or(AppError::NotFound("Tenant not found".into()))
    }

    async fn has_valid_business_hours(&self, tenant_id: &str) -> Result<bool, AppError> {
        let hours = self.schedule_repo.list_business_hours(tenant_id).await?;
        Ok(hours.iter().any(BusinessHour::is_valid))
    }

    /// A service is created inactive while the tenant has no valid business hour,
    /// whatever `active` asks for.
    pub async fn create_service(&self, tenant_id: &str, input: NewServiceInput) -> Result<Service, AppError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Service name is required".into()));
        }
        validate_service_numbers(input.duration_minutes, input.price_cents, input.signal_percent_override)?;

        let hours_ok = self.has_valid_business_hours(tenant_id).await?;
        let active = hours_ok && input.active.unwrap_or(false);

        let service = Service::new(NewServiceParams {
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            duration_minutes: input.duration_minutes,
            price_cents: input.price_cents,
            signal_percent_override: input.signal_percent_override,
            active,
        });
        let created = self.service_repo.create(&service).await?;
        info!(tenant_id = %tenant_id, service_id = %created.id, active = created.active, "Service created");
        Ok(created)
    }

    pub async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AppError> {
        self.service_repo.list(tenant_id).await
    }

    pub async fn update_service(&self, tenant_id: &str, id: &str, patch: ServicePatch) -> Result<Service, AppError> {
        let mut service = self.service_repo.find_by_id(tenant_id, id).await?
            .ok_or(AppError::NotFound("Service not found".into()))?;

        if patch.active == Some(true) && !self.has_valid_business_hours(tenant_id).await? {
            return Err(AppError::Conflict(ACTIVATION_NEEDS_HOURS.into()));
        }

        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Service name is required".into()));
            }
            service.name = name.to_string();
        }
        if let Some(d) = patch.duration_minutes { service.duration_minutes = d; }
        if let Some(p) = patch.price_cents { service.price_cents = p; }
        if let Some(o) = patch.signal_percent_override { service.signal_percent_override = o; }
        if let Some(a) = patch.active { service.active = a; }
        validate_service_numbers(service.duration_minutes, service.price_cents, service.signal_percent_override)?;

        self.service_repo.update(&service).await
    }

    pub async fn toggle_service(&self, tenant_id: &str, id: &str) -> Result<Service, AppError> {
        let mut service = self.service_repo.find_by_id(tenant_id, id).await?
            .ok_or(AppError::NotFound("Service not found".into()))?;

        if !service.active && !self.has_valid_business_hours(tenant_id).await? {
            return Err(AppError::Conflict(ACTIVATION_NEEDS_HOURS.into()));
        }
        service.active = !service.active;
        let updated = self.service_repo.update(&service).await?;
        info!(tenant_id = %tenant_id, service_id = %id, active = updated.active, "Service toggled");
        Ok(updated)
    }

    pub async fn get_business_hours(&self, tenant_id: &str) -> Result<Vec<BusinessHour>, AppError> {
        self.schedule_repo.list_business_hours(tenant_id).await
    }

    /// Replaces every business hour of the tenant with `items`.
    pub async fn set_business_hours(&self, tenant_id: &str, items: Vec<BusinessHourInput>) -> Result<Vec<BusinessHour>, AppError> {
        let mut hours = Vec::with_capacity(items.len());
        for item in items {
            if !(0..=6).contains(&item.weekday) {
                return Err(AppError::Validation(format!("Invalid weekday {}, expected 0..6", item.weekday)));
            }
            let (start, end) = (item.start_time.trim(), item.end_time.trim());
            if parse_hhmm(start).is_none() || parse_hhmm(end).is_none() {
                return Err(AppError::Validation("Business hours must use HH:MM".into()));
            }
            hours.push(BusinessHour::new(tenant_id.to_string(), item.weekday, start.to_string(), end.to_string(), item.active));
        }

        let saved = self.schedule_repo.replace_business_hours(tenant_id, &hours).await?;
        info!(tenant_id = %tenant_id, entries = saved.len(), "Business hours replaced");
        Ok(saved)
    }

    pub async fn create_block(
        &self,
        tenant_id: &str,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<ScheduleBlock, AppError> {
        if end_at <= start_at {
            return Err(AppError::Validation("endAt must be after startAt".into()));
        }
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let block = ScheduleBlock::new(tenant_id.to_string(), start_at, end_at, reason);
        self.schedule_repo.create_block(&block).await
    }

    pub async fn list_blocks(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ScheduleBlock>, AppError> {
        self.schedule_repo.list_blocks_in_range(tenant_id, from, to).await
    }

    pub async fn delete_block(&self, tenant_id: &str, id: &str) -> Result<(), AppError> {
        self.schedule_repo.delete_block(tenant_id, id).await
    }
}

fn validate_service_numbers(duration_minutes: i32, price_cents: i64, signal_percent: Option<i32>) -> Result<(), AppError> {
    if duration_minutes <= 0 {
        return Err(AppError::Validation("durationMinutes must be positive".into()));
    }
    if price_cents < 0 {
        return Err(AppError::Validation("priceCents must not be negative".into()));
    }
    if let Some(p) = signal_percent
        && !(0..=100).contains(&p) {
        return Err(AppError::Validation("signalPercentOverride must be between 0 and 100".into()));
    }
    Ok(())
}
