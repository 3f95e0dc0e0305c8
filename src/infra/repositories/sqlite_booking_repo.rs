use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::{is_overlap_violation, AppError};
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        // The bookings_no_overlap trigger re-checks the interval inside the write.
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, tenant_id, service_id, customer_id, code, start_at, end_at, status, total_price_cents, signal_percent_applied, signal_amount_cents, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.tenant_id).bind(&booking.service_id).bind(&booking.customer_id)
            .bind(&booking.code).bind(booking.start_at).bind(booking.end_at).bind(&booking.status)
            .bind(booking.total_price_cents).bind(booking.signal_percent_applied).bind(booking.signal_amount_cents)
            .bind(booking.expires_at).bind(booking.created_at)
            .fetch_one(&self.pool).await
            .map_err(|e| {
                if is_overlap_violation(&e) {
                    AppError::Conflict("Time slot unavailable (already booked)".into())
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_in_range(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE tenant_id = ? AND start_at >= ? AND end_at <= ? ORDER BY start_at ASC"
        )
            .bind(tenant_id).bind(from).bind(to)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_overlapping_active(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE tenant_id = ? AND start_at < ? AND end_at > ? AND status IN ('CONFIRMED', 'PENDING_PAYMENT')
             ORDER BY start_at ASC"
        )
            .bind(tenant_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn expire_stale_holds(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'EXPIRED'
             WHERE tenant_id = ? AND status = 'PENDING_PAYMENT' AND expires_at IS NOT NULL AND expires_at <= ?"
        )
            .bind(tenant_id).bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn expire_all_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'EXPIRED'
             WHERE status = 'PENDING_PAYMENT' AND expires_at IS NOT NULL AND expires_at <= ?"
        )
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn confirm_pending(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CONFIRMED', expires_at = NULL
             WHERE id = ? AND status = 'PENDING_PAYMENT' AND (expires_at IS NULL OR expires_at > ?)
             RETURNING *"
        )
            .bind(id).bind(now)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn cancel_pending(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED', expires_at = NULL
             WHERE tenant_id = ? AND id = ? AND status = 'PENDING_PAYMENT'
             RETURNING *"
        )
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
