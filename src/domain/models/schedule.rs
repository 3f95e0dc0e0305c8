use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;

use super::time_range::TimeRange;

/// A recurring weekly opening window. `weekday` is 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHour {
    pub id: String,
    pub tenant_id: String,
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

impl BusinessHour {
    pub fn new(tenant_id: String, weekday: i32, start_time: String, end_time: String, active: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            weekday,
            start_time,
            end_time,
            active,
        }
    }

    /// Active, well-formed and non-empty.
    pub fn is_valid(&self) -> bool {
        if !self.active {
            return false;
        }
        match (parse_hhmm(&self.start_time), parse_hhmm(&self.end_time)) {
            (Some(start), Some(end)) => start < end,
            _ => false,
        }
    }

    /// The concrete window this entry opens on `date` in `tz`. `None` when the
    /// times are malformed, the window is empty, or a boundary falls in a DST gap.
    pub fn window_on(&self, date: NaiveDate, tz: Tz) -> Option<TimeRange> {
        let start = local_instant(date, parse_hhmm(&self.start_time)?, tz)?;
        let end = local_instant(date, parse_hhmm(&self.end_time)?, tz)?;
        if end <= start {
            return None;
        }
        Some(TimeRange::new(start, end))
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub id: String,
    pub tenant_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleBlock {
    pub fn new(tenant_id: String, start_at: DateTime<Utc>, end_at: DateTime<Utc>, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            start_at,
            end_at,
            reason,
            created_at: Utc::now(),
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_at, self.end_at)
    }
}

/// Strict `HH:MM`, 00:00 through 23:59.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 || !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

/// Weekday index as stored in `business_hours.weekday`.
pub fn weekday_index(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// Resolves a wall-clock time on `date` in `tz`. Ambiguous times take the earlier instant.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `[local midnight, next local midnight)` for `date` in `tz`.
pub fn local_day(date: NaiveDate, tz: Tz) -> Option<TimeRange> {
    let start = local_instant(date, NaiveTime::MIN, tz)?;
    let end = local_instant(date.succ_opt()?, NaiveTime::MIN, tz)?;
    Some(TimeRange::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Fortaleza;

    fn hour(weekday: i32, start: &str, end: &str) -> BusinessHour {
        BusinessHour::new("t".into(), weekday, start.into(), end.into(), true)
    }

    #[test]
    fn parse_hhmm_accepts_only_strict_format() {
        assert_eq!(parse_hhmm("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_hhmm("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_hhmm("00:00"), Some(NaiveTime::MIN));
        assert!(parse_hhmm("9:30").is_none());
        assert!(parse_hhmm("24:00").is_none());
        assert!(parse_hhmm("12:60").is_none());
        assert!(parse_hhmm("12-30").is_none());
        assert!(parse_hhmm("+1:30").is_none());
        assert!(parse_hhmm("").is_none());
    }

    #[test]
    fn validity_requires_active_and_ordered_times() {
        assert!(hour(1, "09:00", "12:00").is_valid());
        assert!(!hour(1, "12:00", "09:00").is_valid());
        assert!(!hour(1, "09:00", "09:00").is_valid());
        assert!(!hour(1, "9h", "12:00").is_valid());
        let mut inactive = hour(1, "09:00", "12:00");
        inactive.active = false;
        assert!(!inactive.is_valid());
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2030, 1, 6).unwrap()), 0); // Sunday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()), 1); // Monday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2030, 1, 12).unwrap()), 6); // Saturday
    }

    #[test]
    fn window_is_resolved_in_tenant_zone() {
        // Fortaleza is UTC-3 all year.
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let w = hour(1, "09:00", "12:00").window_on(date, Fortaleza).unwrap();
        assert_eq!(w.start, Utc.with_ymd_and_hms(2030, 1, 7, 12, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2030, 1, 7, 15, 0, 0).unwrap());
    }

    #[test]
    fn inverted_window_yields_none() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        assert!(hour(1, "12:00", "09:00").window_on(date, Fortaleza).is_none());
    }

    #[test]
    fn local_day_spans_midnight_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let day = local_day(date, Fortaleza).unwrap();
        assert_eq!(day.start, Utc.with_ymd_and_hms(2030, 1, 7, 3, 0, 0).unwrap());
        assert_eq!(day.end, Utc.with_ymd_and_hms(2030, 1, 8, 3, 0, 0).unwrap());
    }
}
