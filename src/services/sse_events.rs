use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::SessionView,
        sse::{ServerEvent, TimerEvent},
    },
    state::SharedState,
};

pub(crate) const EVENT_SESSION_UPDATED: &str = "session.updated";
pub(crate) const EVENT_SESSION_TIMER: &str = "session.timer";

/// Broadcast the full session view after a mutation, a phase change or an applied snapshot.
pub async fn broadcast_session(state: &SharedState) {
    let view = state.session().read(|session| SessionView::from(session)).await;
    send_event(state, EVENT_SESSION_UPDATED, &view);
}

/// Broadcast the remaining time of the running phase.
pub async fn broadcast_timer(state: &SharedState, remaining: u32) {
    let (phase, round) = state
        .session()
        .read(|session| (session.phase(), session.round()))
        .await;
    let payload = TimerEvent {
        phase,
        round,
        remaining,
    };
    send_event(state, EVENT_SESSION_TIMER, &payload);
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn session_event_carries_the_view() {
        let state = AppState::new(AppConfig::default());
        let mut events = state.sse().subscribe();
        state
            .session()
            .mutate(|session| session.add_participant("Ada"))
            .await
            .unwrap();

        broadcast_session(&state).await;

        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SESSION_UPDATED));
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(value["participants"][0]["name"], "Ada");
    }
}
