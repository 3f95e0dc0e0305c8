use crate::domain::{models::booking_link::BookingLink, ports::BookingLinkRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteBookingLinkRepo {
    pool: SqlitePool,
}

impl SqliteBookingLinkRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingLinkRepository for SqliteBookingLinkRepo {
    async fn create(&self, link: &BookingLink) -> Result<BookingLink, AppError> {
        sqlx::query_as::<_, BookingLink>(
            "INSERT INTO booking_links (id, tenant_id, token, service_id, active, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&link.id).bind(&link.tenant_id).bind(&link.token).bind(&link.service_id)
            .bind(link.active).bind(link.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<BookingLink>, AppError> {
        sqlx::query_as::<_, BookingLink>("SELECT * FROM booking_links WHERE tenant_id = ? ORDER BY created_at DESC")
            .bind(tenant_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_active(&self, tenant_id: &str, id: &str, active: bool) -> Result<BookingLink, AppError> {
        sqlx::query_as::<_, BookingLink>("UPDATE booking_links SET active = ? WHERE tenant_id = ? AND id = ? RETURNING *")
            .bind(active).bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Link not found".into()))
    }
}
