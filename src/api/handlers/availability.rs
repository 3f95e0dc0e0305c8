use axum::{extract::{State, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::AvailabilityQuery;
use crate::error::AppError;
use std::sync::Arc;

pub async fn get_daily_slots(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Query(q): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let service_id = q.service_id
        .filter(|s| !s.is_empty())
        .ok_or(AppError::Validation("serviceId is required".into()))?;

    let availability = state.availability.daily_slots(&tenant_id, &service_id, &q.date).await?;
    Ok(Json(availability))
}
