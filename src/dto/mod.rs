use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health payloads.
pub mod health;
/// Lobby payloads.
pub mod lobby;
/// Session payloads and views.
pub mod session;
/// Server-sent event payloads.
pub mod sse;
/// Custom field validators.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
