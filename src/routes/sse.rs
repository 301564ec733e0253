use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/session",
    tag = "sse",
    responses((status = 200, description = "Session SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream session updates, timer ticks and system status to the UI.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    let initial = sse_service::initial_events(&state).await;
    info!("New session SSE connection");
    sse_service::to_sse_stream(initial, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/session", get(session_stream))
}
