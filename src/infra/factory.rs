use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::PaymentGateway;
use crate::state::{AppState, Repositories};
use crate::infra::payments::mercadopago_gateway::MercadoPagoGateway;
use crate::infra::repositories::{
    postgres_tenant_repo::PostgresTenantRepo, postgres_service_repo::PostgresServiceRepo,
    postgres_schedule_repo::PostgresScheduleRepo, postgres_customer_repo::PostgresCustomerRepo,
    postgres_booking_repo::PostgresBookingRepo, postgres_payment_repo::PostgresPaymentRepo,
    postgres_booking_link_repo::PostgresBookingLinkRepo, postgres_webhook_event_repo::PostgresWebhookEventRepo,
    sqlite_tenant_repo::SqliteTenantRepo, sqlite_service_repo::SqliteServiceRepo,
    sqlite_schedule_repo::SqliteScheduleRepo, sqlite_customer_repo::SqliteCustomerRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_payment_repo::SqlitePaymentRepo,
    sqlite_booking_link_repo::SqliteBookingLinkRepo, sqlite_webhook_event_repo::SqliteWebhookEventRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(pool)
    };

    AppState::new(config.clone(), repos, payment_gateway(config))
}

/// The provider adapter, or `None` when no access token is configured.
pub fn payment_gateway(config: &Config) -> Option<Arc<dyn PaymentGateway>> {
    match &config.mp_access_token {
        Some(token) => {
            if config.mp_webhook_url.is_none() {
                warn!("MP_WEBHOOK_URL is not set; the provider will not send payment notifications");
            }
            let gateway = MercadoPagoGateway::new(
                config.mp_api_base_url.clone(),
                token.clone(),
                config.payment_timeout,
            ).expect("Failed to build payment provider client");
            Some(Arc::new(gateway))
        }
        None => {
            warn!("MP_ACCESS_TOKEN is not set; PIX charges and webhook reconciliation are disabled");
            None
        }
    }
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        tenant_repo: Arc::new(SqliteTenantRepo::new(pool.clone())),
        service_repo: Arc::new(SqliteServiceRepo::new(pool.clone())),
        schedule_repo: Arc::new(SqliteScheduleRepo::new(pool.clone())),
        customer_repo: Arc::new(SqliteCustomerRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        payment_repo: Arc::new(SqlitePaymentRepo::new(pool.clone())),
        link_repo: Arc::new(SqliteBookingLinkRepo::new(pool.clone())),
        webhook_repo: Arc::new(SqliteWebhookEventRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        tenant_repo: Arc::new(PostgresTenantRepo::new(pool.clone())),
        service_repo: Arc::new(PostgresServiceRepo::new(pool.clone())),
        schedule_repo: Arc::new(PostgresScheduleRepo::new(pool.clone())),
        customer_repo: Arc::new(PostgresCustomerRepo::new(pool.clone())),
        booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
        payment_repo: Arc::new(PostgresPaymentRepo::new(pool.clone())),
        link_repo: Arc::new(PostgresBookingLinkRepo::new(pool.clone())),
        webhook_repo: Arc::new(PostgresWebhookEventRepo::new(pool)),
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
