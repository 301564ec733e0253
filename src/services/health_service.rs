use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the remote store status while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.remote_store().current().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let syncing = state.sync().is_syncing().await;
    if state.is_degraded().await {
        HealthResponse::degraded(syncing)
    } else {
        HealthResponse::ok(syncing)
    }
}
