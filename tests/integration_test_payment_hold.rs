mod common;
use common::{TestApp, parse_body, future_monday, local};
use axum::{body::Body, http::{Request, StatusCode}};
use chrono::{Duration, Utc};
use scheduling_backend::domain::models::booking::{Booking, BookingStatus, NewBookingParams};
use scheduling_backend::domain::models::payment::PaymentIntent;
use scheduling_backend::domain::services::admission::{BookingRequest, CustomerInput};
use scheduling_backend::domain::services::payment_hold::{sweep_all, WebhookOutcome};
use scheduling_backend::domain::services::payments::PixChargeInput;
use scheduling_backend::error::AppError;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

fn request(service_id: &str, start_at: String, phone: &str) -> BookingRequest {
    BookingRequest {
        service_id: service_id.to_string(),
        start_at,
        customer: CustomerInput { name: "Bia".into(), phone: phone.into(), email: Some("bia@example.test".into()) },
    }
}

fn pix(booking_id: &str) -> PixChargeInput {
    PixChargeInput { booking_id: booking_id.to_string(), payer_email: None, intent: PaymentIntent::Signal }
}

fn webhook_body(payment_id: &str) -> serde_json::Value {
    json!({ "type": "payment", "action": "payment.updated", "data": { "id": payment_id } })
}

#[tokio::test]
async fn test_deposit_puts_booking_on_hold() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();

    let before = Utc::now();
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "1")).await.unwrap();
    assert_eq!(held.booking.status, "PENDING_PAYMENT");
    assert_eq!(held.booking.signal_percent_applied, 20);
    assert_eq!(held.booking.signal_amount_cents, 2000);
    let expires = held.booking.expires_at.unwrap();
    assert!(expires >= before + Duration::minutes(30));
    assert!(expires <= Utc::now() + Duration::minutes(30));

    let err = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "2")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_tenant_default_percent_applies_without_override() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant(Some(50)).await;
    app.seed_hours(&tenant.id, &[(1, "09:00", "12:00")]).await;
    let with_default = app.seed_service(&tenant.id, 60, 3333, None).await;
    let no_deposit = app.seed_service(&tenant.id, 60, 3333, Some(0)).await;
    let day = future_monday();

    let held = app.state.bookings.create_booking(&tenant.id, request(&with_default.id, local(day, "09:00"), "1")).await.unwrap();
    assert_eq!(held.booking.signal_amount_cents, 1667);
    assert_eq!(held.booking.status, "PENDING_PAYMENT");

    let confirmed = app.state.bookings.create_booking(&tenant.id, request(&no_deposit.id, local(day, "10:00"), "1")).await.unwrap();
    assert_eq!(confirmed.booking.status, "CONFIRMED");
    assert!(confirmed.booking.expires_at.is_none());
}

/// Stores a hold whose payment window already closed, skipping admission.
async fn insert_stale_hold(app: &TestApp, tenant_id: &str, service_id: &str, start: &str) -> Booking {
    let customer = app.state.customer_repo
        .find_or_create(&scheduling_backend::domain::models::customer::Customer::new(tenant_id.to_string(), "Old", "999", None))
        .await
        .unwrap();
    let booking = Booking::new(NewBookingParams {
        tenant_id: tenant_id.to_string(),
        service_id: service_id.to_string(),
        customer_id: customer.id,
        start: start.parse().unwrap(),
        duration_min: 60,
        total_price_cents: 10000,
        signal_percent: 20,
        now: Utc::now() - Duration::minutes(45),
    });
    app.state.booking_repo.create(&booking).await.unwrap()
}

#[tokio::test]
async fn test_unpaid_hold_expires_and_frees_the_slot() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();

    let stale = insert_stale_hold(&app, &tenant.id, &service.id, &local(day, "10:00")).await;
    assert!(stale.expires_at.unwrap() < Utc::now());

    // Past expiry the hold no longer blocks, even before any sweep.
    let slots = app.state.availability.daily_slots(&tenant.id, &service.id, &day.to_string()).await.unwrap();
    assert_eq!(slots.slots.len(), 5);

    let swept = app.state.booking_repo.find_by_id(&tenant.id, &stale.id).await.unwrap().unwrap();
    assert_eq!(swept.status(), Some(BookingStatus::Expired));

    let rebooked = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "2")).await.unwrap();
    assert_eq!(rebooked.booking.status, "PENDING_PAYMENT");
}

#[tokio::test]
async fn test_admission_sweeps_stale_holds_of_the_tenant() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();

    let stale = insert_stale_hold(&app, &tenant.id, &service.id, &local(day, "09:00")).await;
    app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "11:00"), "2")).await.unwrap();

    let swept = app.state.booking_repo.find_by_id(&tenant.id, &stale.id).await.unwrap().unwrap();
    assert_eq!(swept.status, "EXPIRED");
}

#[tokio::test]
async fn test_background_sweep_covers_all_tenants() {
    let app = TestApp::new().await;
    let (first, first_service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let (second, second_service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();

    insert_stale_hold(&app, &first.id, &first_service.id, &local(day, "09:00")).await;
    insert_stale_hold(&app, &second.id, &second_service.id, &local(day, "09:00")).await;
    let fresh = app.state.bookings.create_booking(&first.id, request(&first_service.id, local(day, "11:00"), "5")).await.unwrap();

    // Admission above already swept the first tenant.
    let expired = sweep_all(app.state.booking_repo.as_ref(), Utc::now()).await.unwrap();
    assert_eq!(expired, 1);

    let still_held = app.state.booking_repo.find_by_id(&first.id, &fresh.booking.id).await.unwrap().unwrap();
    assert_eq!(still_held.status, "PENDING_PAYMENT");
}

#[tokio::test]
async fn test_pix_charge_then_approved_webhook_confirms_booking() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "1")).await.unwrap();

    let res = app.post_json("/api/v1/payments/pix", Some(&tenant.id), &json!({ "bookingId": held.booking.id })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let charge = parse_body(res).await;
    let provider_id = charge["providerPaymentId"].as_str().unwrap().to_string();
    assert_eq!(charge["status"], "pending");
    assert!(charge["qrCode"].as_str().is_some());

    {
        let sent = app.gateway.charge_requests.lock().unwrap();
        assert_eq!(sent[0].amount_cents, 2000);
        assert_eq!(sent[0].payer_email, "bia@example.test");
        assert_eq!(sent[0].external_reference, held.booking.id);
        assert_eq!(sent[0].notification_url.as_deref(), Some("https://hooks.test/mercadopago"));
    }

    app.gateway.set_status(&provider_id, "approved");
    let res = app.send(
        Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/mercadopago?type=payment")
            .header("content-type", "application/json")
            .header("x-request-id", "req-1")
            .body(Body::from(webhook_body(&provider_id).to_string()))
            .unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await, json!({ "ok": true }));

    let confirmed = app.state.booking_repo.find_by_id(&tenant.id, &held.booking.id).await.unwrap().unwrap();
    assert_eq!(confirmed.status, "CONFIRMED");
    assert!(confirmed.expires_at.is_none());

    let payment = app.state.payment_repo.find_by_provider_id(&provider_id).await.unwrap().unwrap();
    assert_eq!(payment.status, "approved");

    // Confirmed bookings block regardless of the former expiry.
    let err = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:30"), "2")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_webhook_redelivery_is_processed_once() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    app.gateway.set_status(&charge.provider_payment_id, "approved");

    let body = webhook_body(&charge.provider_payment_id);
    let none = HashMap::new();
    let first = app.state.holds.reconcile_webhook(&body, &none, Some("req-9")).await.unwrap();
    assert_eq!(first, WebhookOutcome::Processed { confirmed: true });

    let again = app.state.holds.reconcile_webhook(&body, &none, Some("req-9")).await.unwrap();
    assert_eq!(again, WebhookOutcome::Duplicate);
    assert_eq!(app.gateway.fetch_calls.load(Ordering::SeqCst), 1);

    // A new delivery id is a new event; the booking is already confirmed.
    let later = app.state.holds.reconcile_webhook(&body, &none, Some("req-10")).await.unwrap();
    assert_eq!(later, WebhookOutcome::Processed { confirmed: false });
}

#[tokio::test]
async fn test_approval_after_hold_lapsed_does_not_confirm() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();

    // The payment window closes and nothing has swept the hold yet.
    sqlx::query("UPDATE bookings SET expires_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .bind(&held.booking.id)
        .execute(&app.pool).await.unwrap();

    // The lapsed hold no longer blocks, so storage accepts an overlapping confirmed booking.
    let overlapping = Booking::new(NewBookingParams {
        tenant_id: tenant.id.clone(),
        service_id: service.id.clone(),
        customer_id: held.booking.customer_id.clone(),
        start: local(day, "10:30").parse().unwrap(),
        duration_min: 60,
        total_price_cents: 10000,
        signal_percent: 0,
        now: Utc::now(),
    });
    let overlapping = app.state.booking_repo.create(&overlapping).await.unwrap();
    assert_eq!(overlapping.status, "CONFIRMED");

    app.gateway.set_status(&charge.provider_payment_id, "approved");
    let outcome = app.state.holds
        .reconcile_webhook(&webhook_body(&charge.provider_payment_id), &HashMap::new(), Some("req-late"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed { confirmed: false });

    let payment = app.state.payment_repo.find_by_provider_id(&charge.provider_payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, "approved");

    let lapsed = app.state.booking_repo.find_by_id(&tenant.id, &held.booking.id).await.unwrap().unwrap();
    assert_ne!(lapsed.status, "CONFIRMED");

    let confirmed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE tenant_id = ? AND status = 'CONFIRMED'"
    )
        .bind(&tenant.id)
        .fetch_one(&app.pool).await.unwrap();
    assert_eq!(confirmed, 1);
}

#[tokio::test]
async fn test_provider_failure_releases_the_event_for_redelivery() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    app.gateway.set_status(&charge.provider_payment_id, "approved");

    app.gateway.fail_fetch.store(true, Ordering::SeqCst);
    let res = app.post_json("/api/v1/webhooks/mercadopago", None, &webhook_body(&charge.provider_payment_id)).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    app.gateway.fail_fetch.store(false, Ordering::SeqCst);
    let res = app.post_json("/api/v1/webhooks/mercadopago", None, &webhook_body(&charge.provider_payment_id)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let booking = app.state.booking_repo.find_by_id(&tenant.id, &held.booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "CONFIRMED");
}

#[tokio::test]
async fn test_rejected_payment_leaves_the_hold_alone() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    app.gateway.set_status(&charge.provider_payment_id, "rejected");

    let outcome = app.state.holds
        .reconcile_webhook(&webhook_body(&charge.provider_payment_id), &HashMap::new(), None)
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed { confirmed: false });

    let booking = app.state.booking_repo.find_by_id(&tenant.id, &held.booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "PENDING_PAYMENT");
    let payment = app.state.payment_repo.find_by_provider_id(&charge.provider_payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, "rejected");
}

#[tokio::test]
async fn test_approved_payment_with_foreign_reference_is_not_applied() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    app.gateway.set_status(&charge.provider_payment_id, "approved");
    app.gateway.set_external_reference(&charge.provider_payment_id, Some("another-booking"));

    let outcome = app.state.holds
        .reconcile_webhook(&webhook_body(&charge.provider_payment_id), &HashMap::new(), Some("r"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed { confirmed: false });
    let booking = app.state.booking_repo.find_by_id(&tenant.id, &held.booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "PENDING_PAYMENT");
}

#[tokio::test]
async fn test_webhooks_without_actionable_payment_are_acknowledged() {
    let app = TestApp::new().await;

    let res = app.post_json("/api/v1/webhooks/mercadopago", None, &json!({ "type": "test" })).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send(
        Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/mercadopago?topic=payment")
            .body(Body::from("not json"))
            .unwrap()
    ).await;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(app.gateway.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_local_payment_is_acknowledged() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();
    let charge = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();

    sqlx::query("DELETE FROM payments").execute(&app.pool).await.unwrap();

    let outcome = app.state.holds
        .reconcile_webhook(&webhook_body(&charge.provider_payment_id), &HashMap::new(), None)
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::UnknownPayment);
}

#[tokio::test]
async fn test_webhook_without_provider_config_is_unavailable() {
    let app = TestApp::without_gateway().await;
    let res = app.post_json("/api/v1/webhooks/mercadopago", None, &webhook_body("1")).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_pending_charge_is_reused() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();

    let first = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    let second = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap();
    assert_eq!(first.payment_id, second.payment_id);
    assert_eq!(app.gateway.charge_count(), 1);

    // A different intent is a different charge.
    let total = app.state.payments
        .create_pix_charge(&tenant.id, PixChargeInput { intent: PaymentIntent::Total, ..pix(&held.booking.id) })
        .await
        .unwrap();
    assert_ne!(total.payment_id, first.payment_id);
    assert_eq!(app.gateway.charge_requests.lock().unwrap()[1].amount_cents, 10000);
}

#[tokio::test]
async fn test_pix_charge_preconditions() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();

    let err = app.state.payments.create_pix_charge(&tenant.id, pix("missing")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let free = app.seed_service(&tenant.id, 60, 0, None).await;
    let confirmed = app.state.bookings.create_booking(&tenant.id, request(&free.id, local(day, "09:00"), "1")).await.unwrap();
    let err = app.state.payments.create_pix_charge(&tenant.id, pix(&confirmed.booking.id)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mut no_email = request(&service.id, local(day, "11:00"), "2");
    no_email.customer.email = None;
    let held = app.state.bookings.create_booking(&tenant.id, no_email).await.unwrap();
    let err = app.state.payments.create_pix_charge(&tenant.id, pix(&held.booking.id)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    app.gateway.fail_create.store(true, Ordering::SeqCst);
    let with_email = PixChargeInput { payer_email: Some("pay@example.test".into()), ..pix(&held.booking.id) };
    let err = app.state.payments.create_pix_charge(&tenant.id, with_email.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments").fetch_one(&app.pool).await.unwrap();
    assert_eq!(stored, 0);

    app.gateway.fail_create.store(false, Ordering::SeqCst);
    app.state.payments.create_pix_charge(&tenant.id, with_email).await.unwrap();

    let stale = insert_stale_hold(&app, &tenant.id, &service.id, &local(day + Duration::days(7), "10:00")).await;
    let err = app.state.payments.create_pix_charge(&tenant.id, pix(&stale.id)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_pix_without_provider_config_is_unavailable() {
    let app = TestApp::without_gateway().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(future_monday(), "10:00"), "1")).await.unwrap();

    let res = app.post_json("/api/v1/payments/pix", Some(&tenant.id), &json!({ "bookingId": held.booking.id })).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_cancel_pending_booking() {
    let app = TestApp::new().await;
    let (tenant, service) = app.seed_monday_shop(60, 10000, Some(20)).await;
    let day = future_monday();
    let held = app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "1")).await.unwrap();

    let res = app.post_json(&format!("/api/v1/bookings/{}/cancel", held.booking.id), Some(&tenant.id), &json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "CANCELLED");
    assert!(body["expiresAt"].is_null());

    // Cancelled bookings are terminal and free the slot.
    let err = app.state.holds.cancel_pending(&tenant.id, &held.booking.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    app.state.bookings.create_booking(&tenant.id, request(&service.id, local(day, "10:00"), "2")).await.unwrap();

    let err = app.state.holds.cancel_pending(&tenant.id, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
