use crate::domain::{
    models::payment::{Payment, PaymentIntent, METHOD_PIX, PROVIDER_MERCADOPAGO, STATUS_PENDING},
    ports::PaymentRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::Utc;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn create(&self, payment: &Payment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, tenant_id, booking_id, provider, method, intent, amount_cents, status, status_detail, provider_payment_id, idempotency_key, external_ref, qr_code, qr_code_base64, ticket_url, expires_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&payment.id).bind(&payment.tenant_id).bind(&payment.booking_id).bind(&payment.provider)
            .bind(&payment.method).bind(&payment.intent).bind(payment.amount_cents).bind(&payment.status)
            .bind(&payment.status_detail).bind(&payment.provider_payment_id).bind(&payment.idempotency_key)
            .bind(&payment.external_ref).bind(&payment.qr_code).bind(&payment.qr_code_base64).bind(&payment.ticket_url)
            .bind(payment.expires_at).bind(payment.created_at).bind(payment.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_reusable_pending(&self, booking_id: &str, intent: PaymentIntent) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments
             WHERE booking_id = ? AND provider = ? AND method = ? AND intent = ? AND status = ?
             ORDER BY created_at DESC LIMIT 1"
        )
            .bind(booking_id).bind(PROVIDER_MERCADOPAGO).bind(METHOD_PIX).bind(intent.as_str()).bind(STATUS_PENDING)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_provider_id(&self, provider_payment_id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE provider_payment_id = ?")
            .bind(provider_payment_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: &str, status_detail: Option<&str>) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = ?, status_detail = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
            .bind(status).bind(status_detail).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Payment not found".into()))
    }
}
