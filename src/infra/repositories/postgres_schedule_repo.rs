use crate::domain::{models::schedule::{BusinessHour, ScheduleBlock}, ports::ScheduleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepo {
    async fn list_business_hours(&self, tenant_id: &str) -> Result<Vec<BusinessHour>, AppError> {
        sqlx::query_as::<_, BusinessHour>("SELECT * FROM business_hours WHERE tenant_id = $1 ORDER BY weekday ASC, start_time ASC")
            .bind(tenant_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_hours_for_weekday(&self, tenant_id: &str, weekday: i32) -> Result<Vec<BusinessHour>, AppError> {
        sqlx::query_as::<_, BusinessHour>(
            "SELECT * FROM business_hours WHERE tenant_id = $1 AND weekday = $2 AND active = TRUE ORDER BY start_time ASC"
        )
            .bind(tenant_id).bind(weekday)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn replace_business_hours(&self, tenant_id: &str, hours: &[BusinessHour]) -> Result<Vec<BusinessHour>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM business_hours WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        for h in hours {
            sqlx::query("INSERT INTO business_hours (id, tenant_id, weekday, start_time, end_time, active) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(&h.id).bind(tenant_id).bind(h.weekday).bind(&h.start_time).bind(&h.end_time).bind(h.active)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        self.list_business_hours(tenant_id).await
    }

    async fn create_block(&self, block: &ScheduleBlock) -> Result<ScheduleBlock, AppError> {
        sqlx::query_as::<_, ScheduleBlock>(
            "INSERT INTO schedule_blocks (id, tenant_id, start_at, end_at, reason, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
            .bind(&block.id).bind(&block.tenant_id).bind(block.start_at).bind(block.end_at)
            .bind(&block.reason).bind(block.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete_block(&self, tenant_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schedule_blocks WHERE id = $1 AND tenant_id = $2")
            .bind(id).bind(tenant_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Block not found".into())); }
        Ok(())
    }

    async fn list_blocks_in_range(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleBlock>, AppError> {
        sqlx::query_as::<_, ScheduleBlock>(
            "SELECT * FROM schedule_blocks WHERE tenant_id = $1 AND start_at < $2 AND end_at > $3 ORDER BY start_at ASC"
        )
            .bind(tenant_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
