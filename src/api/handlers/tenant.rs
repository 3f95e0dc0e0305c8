use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::error::AppError;
use std::sync::Arc;

pub async fn get_current_tenant(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.catalog.get_tenant(&tenant_id).await?;
    Ok(Json(tenant))
}
