use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a sync loop is currently running.
    pub syncing: bool,
}

impl HealthResponse {
    /// Create a health response indicating the remote store is reachable.
    pub fn ok(syncing: bool) -> Self {
        Self {
            status: "ok".to_string(),
            syncing,
        }
    }

    /// Create a health response indicating the remote store is unavailable.
    pub fn degraded(syncing: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            syncing,
        }
    }
}
