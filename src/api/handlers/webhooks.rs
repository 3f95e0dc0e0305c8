use axum::{
    body::Bytes,
    extract::{State, Query},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use crate::state::AppState;
use crate::api::dtos::responses::OK;
use crate::domain::services::payment_hold::WebhookOutcome;
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Provider notification endpoint. Answers 200 for anything that needs no
/// redelivery; provider fetch failures surface as 502 so the provider retries.
pub async fn mercadopago(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!("Unparseable webhook body: {}", e);
            Value::Null
        })
    };
    let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok());

    let outcome = state.holds.reconcile_webhook(&payload, &query, request_id).await?;
    match outcome {
        WebhookOutcome::Processed { confirmed } => info!(confirmed, "Webhook processed"),
        WebhookOutcome::Duplicate => info!("Webhook duplicate acknowledged"),
        WebhookOutcome::Ignored => info!("Webhook ignored"),
        WebhookOutcome::UnknownPayment => warn!("Webhook for unknown payment acknowledged"),
    }

    Ok(Json(OK))
}
