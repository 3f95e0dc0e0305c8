use axum::{body::Bytes, extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::tenant::TenantId;
use crate::api::dtos::requests::CreateLinkRequest;
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_links(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<impl IntoResponse, AppError> {
    let links = state.public_links.list_links(&tenant_id).await?;
    Ok(Json(links))
}

pub async fn create_link(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // The body is optional: an empty request creates a link for every active service.
    let payload: CreateLinkRequest = if body.is_empty() {
        CreateLinkRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?
    };
    let service_id = payload.service_id.filter(|s| !s.is_empty());
    let link = state.public_links.create_link(&tenant_id, service_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn toggle_link(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Path(link_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.public_links.toggle_link(&tenant_id, &link_id).await?;
    Ok(Json(link))
}
