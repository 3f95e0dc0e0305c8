use scheduling_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::sqlite_repositories,
    domain::models::{
        payment::{PixChargeRequest, ProviderPayment},
        service::{NewServiceParams, Service},
        tenant::Tenant,
    },
    domain::ports::PaymentGateway,
    domain::services::catalog::BusinessHourInput,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration as StdDuration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use tower::ServiceExt;
use serde_json::Value;

pub const TZ: &str = "America/Fortaleza";

/// In-memory stand-in for the PIX provider. Issued charges stay `pending` until
/// a test changes their status.
#[derive(Default)]
pub struct MockPaymentGateway {
    pub payments: Mutex<HashMap<String, ProviderPayment>>,
    pub charge_requests: Mutex<Vec<PixChargeRequest>>,
    pub fail_create: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fetch_calls: AtomicU64,
    next_id: AtomicU64,
}

#[allow(dead_code)]
impl MockPaymentGateway {
    pub fn set_status(&self, provider_payment_id: &str, status: &str) {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments.get_mut(provider_payment_id).expect("unknown mock payment");
        payment.status = status.to_string();
    }

    pub fn set_external_reference(&self, provider_payment_id: &str, reference: Option<&str>) {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments.get_mut(provider_payment_id).expect("unknown mock payment");
        payment.external_reference = reference.map(str::to_string);
    }

    pub fn charge_count(&self) -> usize {
        self.charge_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_pix(&self, request: &PixChargeRequest) -> Result<ProviderPayment, AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mock provider is down".into()));
        }
        let id = (9_000_000 + self.next_id.fetch_add(1, Ordering::SeqCst)).to_string();
        let payment = ProviderPayment {
            id: id.clone(),
            status: "pending".into(),
            status_detail: Some("pending_waiting_transfer".into()),
            external_reference: Some(request.external_reference.clone()),
            qr_code: Some(format!("00020126-mock-{}", id)),
            qr_code_base64: Some("iVBORw0KGgo=".into()),
            ticket_url: Some(format!("https://pix.test/ticket/{}", id)),
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        };
        self.payments.lock().unwrap().insert(id, payment.clone());
        self.charge_requests.lock().unwrap().push(request.clone());
        Ok(payment)
    }

    async fn fetch_payment(&self, provider_payment_id: &str) -> Result<ProviderPayment, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mock provider timeout".into()));
        }
        self.payments.lock().unwrap()
            .get(provider_payment_id)
            .cloned()
            .ok_or(AppError::Upstream(format!("payment {} not found at provider", provider_payment_id)))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub gateway: Arc<MockPaymentGateway>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::build(true).await
    }

    /// An app whose payment provider is not configured.
    pub async fn without_gateway() -> Self {
        Self::build(false).await
    }

    async fn build(with_gateway: bool) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .busy_timeout(StdDuration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(db_url.clone()),
            "MP_WEBHOOK_URL" => Some("https://hooks.test/mercadopago".into()),
            _ => None,
        });

        let gateway = Arc::new(MockPaymentGateway::default());
        let provider: Option<Arc<dyn PaymentGateway>> = if with_gateway {
            Some(gateway.clone())
        } else {
            None
        };

        let state = Arc::new(AppState::new(config, sqlite_repositories(pool.clone()), provider));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            gateway,
        }
    }

    /// A tenant in Fortaleza with 30 minute granularity.
    pub async fn seed_tenant(&self, signal_percent_default: Option<i32>) -> Tenant {
        let slug = format!("studio-{}", &Uuid::new_v4().to_string()[..8]);
        let mut tenant = Tenant::new("Studio".into(), slug, TZ.into(), 30);
        tenant.signal_percent_default = signal_percent_default;
        self.state.tenant_repo.create(&tenant).await.unwrap()
    }

    pub async fn seed_hours(&self, tenant_id: &str, hours: &[(i32, &str, &str)]) {
        let items = hours.iter()
            .map(|(weekday, start, end)| BusinessHourInput {
                weekday: *weekday,
                start_time: start.to_string(),
                end_time: end.to_string(),
                active: true,
            })
            .collect();
        self.state.catalog.set_business_hours(tenant_id, items).await.unwrap();
    }

    pub async fn seed_service(&self, tenant_id: &str, duration_minutes: i32, price_cents: i64, signal_percent_override: Option<i32>) -> Service {
        let service = Service::new(NewServiceParams {
            tenant_id: tenant_id.to_string(),
            name: "Corte".into(),
            duration_minutes,
            price_cents,
            signal_percent_override,
            active: true,
        });
        self.state.service_repo.create(&service).await.unwrap()
    }

    /// Tenant open Mondays 09:00-12:00 with one service.
    pub async fn seed_monday_shop(&self, duration_minutes: i32, price_cents: i64, signal_percent: Option<i32>) -> (Tenant, Service) {
        let tenant = self.seed_tenant(None).await;
        self.seed_hours(&tenant.id, &[(1, "09:00", "12:00")]).await;
        let service = self.seed_service(&tenant.id, duration_minutes, price_cents, signal_percent).await;
        (tenant, service)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, tenant_id: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(t) = tenant_id {
            builder = builder.header("X-Tenant-Id", t);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, tenant_id: Option<&str>, payload: &Value) -> Response {
        self.send_json("POST", uri, tenant_id, payload).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, tenant_id: Option<&str>, payload: &Value) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = tenant_id {
            builder = builder.header("X-Tenant-Id", t);
        }
        self.send(builder.body(Body::from(payload.to_string())).unwrap()).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A Monday at least a week ahead, so "today" cutoffs never apply.
#[allow(dead_code)]
pub fn future_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

/// Wall-clock time in Fortaleza (fixed UTC-3) as an RFC3339 instant.
#[allow(dead_code)]
pub fn local(date: NaiveDate, hhmm: &str) -> String {
    format!("{}T{}:00-03:00", date.format("%Y-%m-%d"), hhmm)
}
