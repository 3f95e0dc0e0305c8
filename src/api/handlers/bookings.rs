use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::{CreateBookingRequest, RangeQuery};
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.bookings.create_booking(&tenant_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Query(q): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.list_bookings(&tenant_id, &q.from, &q.to).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.bookings.get_booking(&tenant_id, &booking_id).await?;
    Ok(Json(details))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.holds.cancel_pending(&tenant_id, &booking_id).await?;
    Ok(Json(booking))
}
