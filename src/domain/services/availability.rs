use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::domain::models::{
    schedule::{local_day, weekday_index},
    time_range::TimeRange,
};
use crate::domain::ports::{BookingRepository, ScheduleRepository, ServiceRepository, TenantRepository};
use crate::domain::services::payment_hold::sweep_tenant;
use crate::error::AppError;

/// Lazily yields the bookable slots of a day, window by window.
///
/// Inside each window a candidate starts at the window's open time and steps by
/// `step_min`; it is kept while `start + duration <= window.end`. Candidates
/// starting before `not_before` and candidates overlapping anything in `busy` are
/// dropped. Non-positive duration or step yields nothing.
pub fn calculate_slots<'a>(
    windows: &'a [TimeRange],
    duration_min: i32,
    step_min: i32,
    busy: &'a [TimeRange],
    not_before: Option<DateTime<Utc>>,
) -> impl Iterator<Item = TimeRange> + 'a {
    let usable = duration_min > 0 && step_min > 0;
    let duration = Duration::minutes(duration_min as i64);
    let step = Duration::minutes(step_min as i64);

    windows
        .iter()
        .filter(move |w| usable && w.end > w.start)
        .flat_map(move |w| {
            std::iter::successors(Some(w.start), move |s| Some(*s + step))
                .take_while(move |s| *s + duration <= w.end)
                .map(move |s| TimeRange::starting_at(s, duration))
        })
        .filter(move |slot| not_before.is_none_or(|cutoff| slot.start >= cutoff))
        .filter(move |slot| !busy.iter().any(|b| b.overlaps(slot)))
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start_at: String,
    pub end_at: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DailyAvailability {
    pub date: String,
    pub timezone: String,
    pub service_id: String,
    pub duration_minutes: i32,
    pub slot_interval_minutes: i32,
    pub slots: Vec<Slot>,
}

pub struct AvailabilityService {
    tenant_repo: Arc<dyn TenantRepository>,
    service_repo: Arc<dyn ServiceRepository>,
    schedule_repo: Arc<dyn ScheduleRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    default_tz: Tz,
}

impl AvailabilityService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        schedule_repo: Arc<dyn ScheduleRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        default_tz: Tz,
    ) -> Self {
        Self { tenant_repo, service_repo, schedule_repo, booking_repo, default_tz }
    }

    pub async fn daily_slots(&self, tenant_id: &str, service_id: &str, date: &str) -> Result<DailyAvailability, AppError> {
        let tenant = self.tenant_repo.find_by_id(tenant_id).await?
            .ok_or(AppError::NotFound("Tenant not found".into()))?;
        let service = self.service_repo.find_by_id(tenant_id, service_id).await?
            .filter(|s| s.active)
            .ok_or(AppError::NotFound("Service not found or inactive".into()))?;
        let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Invalid date, expected YYYY-MM-DD".into()))?;

        let now = Utc::now();
        sweep_tenant(self.booking_repo.as_ref(), tenant_id, now).await?;

        let tz = tenant.zone(self.default_tz);
        let mut result = DailyAvailability {
            date: day.format("%Y-%m-%d").to_string(),
            timezone: tz.name().to_string(),
            service_id: service.id.clone(),
            duration_minutes: service.duration_minutes,
            slot_interval_minutes: tenant.slot_interval_minutes,
            slots: Vec::new(),
        };

        let hours = self.schedule_repo.list_active_hours_for_weekday(tenant_id, weekday_index(day)).await?;
        if hours.is_empty() {
            return Ok(result);
        }
        let Some(day_range) = local_day(day, tz) else {
            return Ok(result);
        };

        let mut windows: Vec<TimeRange> = hours.iter().filter_map(|h| h.window_on(day, tz)).collect();
        windows.sort_by_key(|w| w.start);

        // Widen by 1ms so events starting exactly at the next midnight are loaded too.
        let load_end = day_range.end + Duration::milliseconds(1);
        let blocks = self.schedule_repo.list_blocks_in_range(tenant_id, day_range.start, load_end).await?;
        let bookings = self.booking_repo.list_overlapping_active(tenant_id, day_range.start, load_end).await?;

        let busy: Vec<TimeRange> = blocks.iter().map(|b| b.range())
            .chain(bookings.iter().filter(|b| b.is_blocking(now)).map(|b| b.range()))
            .collect();

        let is_today = now.with_timezone(&tz).date_naive() == day;
        let not_before = is_today.then_some(now);

        result.slots = calculate_slots(&windows, service.duration_minutes, tenant.slot_interval_minutes, &busy, not_before)
            .map(|slot| Slot {
                start_at: slot.start.with_timezone(&tz).to_rfc3339(),
                end_at: slot.end.with_timezone(&tz).to_rfc3339(),
            })
            .collect();

        debug!(tenant_id = %tenant_id, service_id = %service_id, date = %result.date, slots = result.slots.len(), "Computed availability");
        Ok(result)
    }
}
