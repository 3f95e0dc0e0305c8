//! Customer-facing endpoints. Every call is scoped by the link token in the path.

use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{AvailabilityQuery, CreateBookingRequest, CreatePixRequest};
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let services = state.public_links.list_public_services(&token).await?;
    Ok(Json(services))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(q): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let availability = state.public_links
        .availability(&token, q.service_id.as_deref(), &q.date)
        .await?;
    Ok(Json(availability))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.public_links.create_booking(&token, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path((token, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.public_links.get_booking(&token, &booking_id).await?;
    Ok(Json(details))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path((token, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.public_links.cancel_booking(&token, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn create_pix_charge(
    State(state): State<Arc<AppState>>,
    Path((token, booking_id)): Path<(String, String)>,
    Json(mut payload): Json<CreatePixRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.booking_id = booking_id;
    let charge = state.public_links.create_pix_charge(&token, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(charge)))
}
