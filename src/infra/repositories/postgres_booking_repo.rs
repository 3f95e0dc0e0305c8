use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::{is_overlap_violation, AppError};
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn overlap_as_conflict(e: sqlx::Error) -> AppError {
    if is_overlap_violation(&e) {
        AppError::Conflict("Time slot unavailable (already booked)".into())
    } else {
        AppError::Database(e)
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Serialises admissions of one tenant across every process sharing the database.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&booking.tenant_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        // Stale holds are still inside the exclusion constraint until swept.
        sqlx::query(
            "UPDATE bookings SET status = 'EXPIRED'
             WHERE tenant_id = $1 AND status = 'PENDING_PAYMENT' AND expires_at IS NOT NULL AND expires_at <= $2"
        )
            .bind(&booking.tenant_id).bind(booking.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, tenant_id, service_id, customer_id, code, start_at, end_at, status, total_price_cents, signal_percent_applied, signal_amount_cents, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.tenant_id).bind(&booking.service_id).bind(&booking.customer_id)
            .bind(&booking.code).bind(booking.start_at).bind(booking.end_at).bind(&booking.status)
            .bind(booking.total_price_cents).bind(booking.signal_percent_applied).bind(booking.signal_amount_cents)
            .bind(booking.expires_at).bind(booking.created_at)
            .fetch_one(&mut *tx).await
            .map_err(overlap_as_conflict)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_in_range(&self, tenant_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE tenant_id = $1 AND start_at >= $2 AND end_at <= $3 ORDER BY start_at ASC"
        )
            .bind(tenant_id).bind(from).bind(to)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_overlapping_active(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE tenant_id = $1 AND start_at < $2 AND end_at > $3 AND status IN ('CONFIRMED', 'PENDING_PAYMENT')
             ORDER BY start_at ASC"
        )
            .bind(tenant_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn expire_stale_holds(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'EXPIRED'
             WHERE tenant_id = $1 AND status = 'PENDING_PAYMENT' AND expires_at IS NOT NULL AND expires_at <= $2"
        )
            .bind(tenant_id).bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn expire_all_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'EXPIRED'
             WHERE status = 'PENDING_PAYMENT' AND expires_at IS NOT NULL AND expires_at <= $1"
        )
            .bind(now)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn confirm_pending(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CONFIRMED', expires_at = NULL
             WHERE id = $1 AND status = 'PENDING_PAYMENT' AND (expires_at IS NULL OR expires_at > $2)
             RETURNING *"
        )
            .bind(id).bind(now)
            .fetch_optional(&self.pool).await
            .map_err(overlap_as_conflict)
    }

    async fn cancel_pending(&self, tenant_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED', expires_at = NULL
             WHERE tenant_id = $1 AND id = $2 AND status = 'PENDING_PAYMENT'
             RETURNING *"
        )
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
