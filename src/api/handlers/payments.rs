use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::CreatePixRequest;
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_pix_charge(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<CreatePixRequest>,
) -> Result<impl IntoResponse, AppError> {
    let charge = state.payments.create_pix_charge(&tenant_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(charge)))
}
