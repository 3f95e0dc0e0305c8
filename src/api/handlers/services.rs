use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::{CreateServiceRequest, UpdateServiceRequest};
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<impl IntoResponse, AppError> {
    let services = state.catalog.list_services(&tenant_id).await?;
    Ok(Json(services))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.catalog.create_service(&tenant_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(service_id): Path<String>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.catalog.update_service(&tenant_id, &service_id, payload.into()).await?;
    Ok(Json(updated))
}

pub async fn toggle_service(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.catalog.toggle_service(&tenant_id, &service_id).await?;
    Ok(Json(updated))
}
