use crate::domain::{models::customer::Customer, ports::CustomerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteCustomerRepo {
    pool: SqlitePool,
}

impl SqliteCustomerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepo {
    async fn find_or_create(&self, customer: &Customer) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query(
            "INSERT INTO customers (id, tenant_id, name, phone, email, created_at) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (tenant_id, phone) DO NOTHING"
        )
            .bind(&customer.id).bind(&customer.tenant_id).bind(&customer.name)
            .bind(&customer.phone).bind(&customer.email).bind(customer.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        let found = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE tenant_id = ? AND phone = ?")
            .bind(&customer.tenant_id).bind(&customer.phone)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(found)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
