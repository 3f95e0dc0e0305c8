use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant scope of a staff request, set by the identity layer in front of the service.
pub struct TenantId(pub String);

impl FromRequestParts<Arc<AppState>> for TenantId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let tenant_id = parts.headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Validation("Missing X-Tenant-Id header".into()))?;

        tracing::Span::current().record("tenant_id", tenant_id);
        Ok(TenantId(tenant_id.to_string()))
    }
}
