use std::sync::Arc;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::services::payment_hold::sweep_all;

/// Periodically expires payment holds whose window has passed, for every tenant.
/// Reads already sweep lazily; this keeps stored statuses current between reads.
pub async fn start_hold_sweeper(state: Arc<AppState>) {
    let interval = state.config.hold_sweep_interval;
    info!(interval_secs = interval.as_secs(), "Starting payment hold sweeper...");

    loop {
        let span = info_span!("hold_sweep");
        async {
            match sweep_all(state.booking_repo.as_ref(), Utc::now()).await {
                Ok(0) => {}
                Ok(expired) => info!(expired, "Sweep pass finished"),
                Err(e) => error!("Failed to expire stale holds: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(interval).await;
    }
}
