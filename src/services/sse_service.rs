use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        session::SessionView,
        sse::{Handshake, ServerEvent},
    },
    services::sse_events::EVENT_SESSION_UPDATED,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the session stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    let receiver = state.sse().subscribe();
    debug!(subscribers = state.sse().subscriber_count(), "session stream subscribed");
    receiver
}

/// Events sent to a new subscriber before live updates: the handshake, then the current session.
pub async fn initial_events(state: &SharedState) -> Vec<ServerEvent> {
    let handshake = Handshake {
        message: "session stream connected".into(),
        degraded: state.is_degraded().await,
    };
    let view = state.session().read(|session| SessionView::from(session)).await;

    [
        ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake),
        ServerEvent::json(Some(EVENT_SESSION_UPDATED.to_string()), &view),
    ]
    .into_iter()
    .filter_map(|event| {
        event
            .inspect_err(|err| warn!(error = %err, "failed to serialize initial SSE event"))
            .ok()
    })
    .collect()
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the client
/// disconnects. `initial` is sent first.
pub fn to_sse_stream(
    initial: Vec<ServerEvent>,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Later events carry the full state again.
                            debug!(skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("session SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
