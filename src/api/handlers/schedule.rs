use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::{SetBusinessHoursRequest, CreateBlockRequest, RangeQuery};
use crate::api::handlers::parse_instant;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn get_business_hours(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<impl IntoResponse, AppError> {
    let hours = state.catalog.get_business_hours(&tenant_id).await?;
    Ok(Json(hours))
}

pub async fn set_business_hours(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<SetBusinessHoursRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hours = state.catalog.set_business_hours(&tenant_id, payload.into_inputs()).await?;
    Ok(Json(hours))
}

pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Query(q): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let from = parse_instant("from", &q.from)?;
    let to = parse_instant("to", &q.to)?;
    let blocks = state.catalog.list_blocks(&tenant_id, from, to).await?;
    Ok(Json(blocks))
}

pub async fn create_block(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<CreateBlockRequest>,
) -> Result<impl IntoResponse, AppError> {
    let start_at = parse_instant("startAt", &payload.start_at)?;
    let end_at = parse_instant("endAt", &payload.end_at)?;
    let block = state.catalog.create_block(&tenant_id, start_at, end_at, payload.reason).await?;
    info!(block_id = %block.id, "Schedule block created");
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn delete_block(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(block_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog.delete_block(&tenant_id, &block_id).await?;
    info!(block_id = %block_id, "Schedule block deleted");
    Ok(StatusCode::NO_CONTENT)
}
