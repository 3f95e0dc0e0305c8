use crate::domain::{models::service::Service, ports::ServiceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresServiceRepo {
    pool: PgPool,
}

impl PostgresServiceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepo {
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, tenant_id, name, duration_minutes, price_cents, signal_percent_override, active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&service.id).bind(&service.tenant_id).bind(&service.name).bind(service.duration_minutes)
            .bind(service.price_cents).bind(service.signal_percent_override).bind(service.active).bind(service.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE tenant_id = $1 ORDER BY created_at DESC")
            .bind(tenant_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active(&self, tenant_id: &str) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE tenant_id = $1 AND active = TRUE ORDER BY created_at DESC")
            .bind(tenant_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "UPDATE services SET name=$1, duration_minutes=$2, price_cents=$3, signal_percent_override=$4, active=$5
             WHERE id=$6 AND tenant_id=$7
             RETURNING *"
        )
            .bind(&service.name).bind(service.duration_minutes).bind(service.price_cents)
            .bind(service.signal_percent_override).bind(service.active)
            .bind(&service.id).bind(&service.tenant_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Service not found".into()))
    }
}
