use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Fan-out of session events to every connected SSE client.
///
/// Slow clients that fall more than `capacity` events behind skip ahead; the next
/// `session.updated` event carries the full state again.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event; dropped when nobody listens.
    pub fn broadcast(&self, event: ServerEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(event = ?event.event, "no SSE subscribers; event dropped");
        }
    }
}
