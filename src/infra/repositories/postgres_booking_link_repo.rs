use crate::domain::{models::booking_link::BookingLink, ports::BookingLinkRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresBookingLinkRepo {
    pool: PgPool,
}

impl PostgresBookingLinkRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingLinkRepository for PostgresBookingLinkRepo {
    async fn create(&self, link: &BookingLink) -> Result<BookingLink, AppError> {
        sqlx::query_as::<_, BookingLink>(
            "INSERT INTO booking_links (id, tenant_id, token, service_id, active, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
            .bind(&link.id).bind(&link.tenant_id).bind(&link.token).bind(&link.service_id)
            .bind(link.active).bind(link.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE tenant_id = $1 ORDER BY created_at DESC")
            .bind(tenant_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<BookingLink, AppError> {
        sqlx::query_as::<_, BookingLink>("UPDATE booking_links SET active = $1 WHERE tenant_id = $2 AND id = $3 RETURNING *")
            .bind(active).bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Link not found".into()))
    }
}
