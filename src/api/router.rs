use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    health, tenant, services, schedule, availability, bookings, payments, links, public, webhooks,
};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Tenant
        .route("/api/v1/tenant", get(tenant::get_current_tenant))

        // Catalog
        .route("/api/v1/services", get(services::list_services).post(services::create_service))
        .route("/api/v1/services/{service_id}", put(services::update_service))
        .route("/api/v1/services/{service_id}/toggle", post(services::toggle_service))

        // Schedule
        .route("/api/v1/business-hours", get(schedule::get_business_hours).put(schedule::set_business_hours))
        .route("/api/v1/blocks", get(schedule::list_blocks).post(schedule::create_block))
        .route("/api/v1/blocks/{block_id}", delete(schedule::delete_block))

        // Availability & Bookings
        .route("/api/v1/availability", get(availability::get_daily_slots))
        .route("/api/v1/bookings", get(bookings::list_bookings).post(bookings::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(bookings::get_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(bookings::cancel_booking))

        // Payments
        .route("/api/v1/payments/pix", post(payments::create_pix_charge))
        .route("/api/v1/webhooks/mercadopago", post(webhooks::mercadopago))

        // Booking Links
        .route("/api/v1/links", get(links::list_links).post(links::create_link))
        .route("/api/v1/links/{link_id}/toggle", post(links::toggle_link))

        // Public Booking Flow
        .route("/api/v1/public/links/{token}/services", get(public::list_services))
        .route("/api/v1/public/links/{token}/availability", get(public::get_availability))
        .route("/api/v1/public/links/{token}/bookings", post(public::create_booking))
        .route("/api/v1/public/links/{token}/bookings/{booking_id}", get(public::get_booking))
        .route("/api/v1/public/links/{token}/bookings/{booking_id}/cancel", post(public::cancel_booking))
        .route("/api/v1/public/links/{token}/bookings/{booking_id}/pix", post(public::create_pix_charge))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request.headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                        .unwrap_or_else(|| Uuid::new_v4().to_string());
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
