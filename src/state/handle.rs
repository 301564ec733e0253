use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::state::{
    session::{GameError, Session, TickOutcome},
    snapshot::Snapshot,
};

/// Shared handle to a [`Session`].
///
/// Every read and write goes through one mutex, so a snapshot or an applied remote
/// document never observes half of a multi-step mutation.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Share `session` behind a new lock.
    pub fn new(session: Session) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Process-local identifier used to tell handles apart in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run `f` with shared access to the session.
    pub async fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    /// Run `f` with exclusive access to the session.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    /// Snapshot taken under the lock.
    pub async fn snapshot(&self) -> Snapshot {
        self.read(Session::snapshot).await
    }

    /// Apply a replicated snapshot under the lock.
    pub async fn apply_snapshot(&self, snapshot: Snapshot) -> Result<(), GameError> {
        self.mutate(|session| session.apply_snapshot(snapshot)).await
    }

    /// Advance the phase timer by one tick.
    pub async fn advance_tick(&self) -> TickOutcome {
        self.mutate(Session::advance_tick).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[tokio::test]
    async fn clones_share_the_same_session() {
        let handle = SessionHandle::new(Session::new(SessionConfig::default()));
        let other = handle.clone();

        handle
            .mutate(|session| session.add_participant("Ada"))
            .await
            .unwrap();

        assert_eq!(other.read(Session::participant_count).await, 1);
        assert_eq!(handle.id(), other.id());
    }
}
