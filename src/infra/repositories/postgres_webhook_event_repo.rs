use crate::domain::{models::webhook_event::WebhookEvent, ports::WebhookEventRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresWebhookEventRepo {
    pool: PgPool,
}

impl PostgresWebhookEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepo {
    async fn record(&self, event: &WebhookEvent) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO webhook_events (id, provider, event_key, payload, created_at) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (event_key) DO NOTHING"
        )
            .bind(&event.id).bind(&event.provider).bind(&event.event_key).bind(&event.payload).bind(event.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, event_key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM webhook_events WHERE event_key = $1")
            .bind(event_key)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
