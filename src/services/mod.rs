/// OpenAPI documentation generation.
pub mod documentation;
/// Session operations and background loop wiring.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Lobby creation, join and leave.
pub mod lobby_service;
/// Recurring tokio task shared by the sync loop and the ticker.
pub mod periodic;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Remote store connection supervision.
pub mod storage_supervisor;
/// Snapshot reconciliation with the shared store.
pub mod sync_service;
/// Phase timer driver.
pub mod ticker;
