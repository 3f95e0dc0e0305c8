use axum::{response::IntoResponse, Json};
use crate::api::dtos::responses::HealthResponse;

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
