//! Periodic reconciliation of a local session with its shared store document.
//!
//! Each cycle pushes the local snapshot when it changed since the last reconciliation,
//! pulls the stored document and applies it locally when it differs. Concurrent writers
//! resolve by last push wins: documents are replaced whole and never merged.

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, SystemTime},
};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    dao::{
        game_store::GameStore,
        storage::{StorageError, StorageResult},
    },
    services::periodic::{AlreadyRunning, PeriodicTask},
    state::{
        handle::SessionHandle,
        lobby::{LobbyCode, Role},
        session::GameError,
        snapshot::Snapshot,
    },
};

/// Errors surfaced by the sync manager.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A sync loop is already active for this manager.
    #[error("sync is already running")]
    AlreadyRunning,
    /// The session has no lobby code to sync under.
    #[error("session is not in a lobby")]
    NoLobby,
    /// Push or pull against the store failed.
    #[error("remote sync failed: {0}")]
    RemoteSyncFailed(#[source] StorageError),
    /// The pulled snapshot could not be applied locally.
    #[error("remote snapshot rejected: {0}")]
    Rejected(#[source] GameError),
}

impl From<AlreadyRunning> for SyncError {
    fn from(_: AlreadyRunning) -> Self {
        SyncError::AlreadyRunning
    }
}

/// Where a sync loop reads and writes.
#[derive(Clone)]
pub struct SyncTarget {
    /// Document key.
    pub code: LobbyCode,
    /// Role of the local session; a host seeds the document on its first cycle.
    pub role: Role,
    /// Store holding the shared document.
    pub store: Arc<dyn GameStore>,
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// The local snapshot was written to the store.
    pub pushed: bool,
    /// The stored snapshot replaced the local state.
    pub applied: bool,
}

/// Counters and last results of the running (or last) sync loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Whether a loop is active.
    pub running: bool,
    /// Completed cycles, successful or not.
    pub cycles: u64,
    /// Cycles that ended with an error.
    pub failures: u64,
    /// End of the last successful cycle.
    pub last_success: Option<SystemTime>,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Run one push/pull/apply cycle.
///
/// `baseline` is the last snapshot reconciled with the store. It is updated as soon as the
/// store confirms a push and again after every successful pull, so a rejected apply does
/// not block the next push of the local state.
///
/// Local edits are pushed unconditionally (last push wins). A local state that only moved
/// its countdown is pushed only while the store still holds the baseline; otherwise the
/// peer's newer document is pulled and applied instead.
pub async fn run_cycle<P, PF, A, AF>(
    target: &SyncTarget,
    baseline: &mut Option<Snapshot>,
    provider: P,
    apply: A,
) -> Result<CycleOutcome, SyncError>
where
    P: FnOnce() -> PF,
    PF: Future<Output = Snapshot>,
    A: FnOnce(Snapshot) -> AF,
    AF: Future<Output = Result<(), GameError>>,
{
    let local = provider().await;

    let pushed = match baseline.as_ref() {
        None => target.role == Role::Host,
        Some(previous) if previous.differs_only_in_timer(&local) => {
            let current = pull(target).await.map_err(SyncError::RemoteSyncFailed)?;
            if current != *previous {
                debug!(code = %target.code, "store changed by a peer; skipping timer push");
            }
            current == *previous
        }
        Some(previous) => *previous != local,
    };
    if pushed {
        target
            .store
            .replace_document(&target.code, local.clone())
            .await
            .map_err(SyncError::RemoteSyncFailed)?;
        debug!(code = %target.code, "pushed local snapshot");
        *baseline = Some(local.clone());
    }

    let remote = pull(target).await.map_err(SyncError::RemoteSyncFailed)?;
    *baseline = Some(remote.clone());

    let applied = remote != local;
    if applied {
        apply(remote).await.map_err(SyncError::Rejected)?;
        info!(code = %target.code, "applied remote snapshot");
    }

    Ok(CycleOutcome { pushed, applied })
}

async fn pull(target: &SyncTarget) -> StorageResult<Snapshot> {
    target
        .store
        .get_document(&target.code)
        .await?
        .ok_or_else(|| StorageError::not_found(target.code.to_string()))
}

/// Owns at most one sync loop at a time.
pub struct SyncManager {
    interval: Duration,
    task: Mutex<Option<PeriodicTask>>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncManager {
    /// Manager whose loops run one cycle per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
            status: Arc::new(RwLock::new(SyncStatus::default())),
        }
    }

    /// Start the periodic loop. The first cycle runs immediately.
    ///
    /// Cycle failures are logged and counted; the loop keeps going at the next interval.
    pub async fn start<P, PF, A, AF>(
        &self,
        target: SyncTarget,
        provider: P,
        apply: A,
    ) -> Result<(), SyncError>
    where
        P: Fn() -> PF + Send + Sync + 'static,
        PF: Future<Output = Snapshot> + Send + 'static,
        A: Fn(Snapshot) -> AF + Send + Sync + 'static,
        AF: Future<Output = Result<(), GameError>> + Send + 'static,
    {
        let mut slot = self.task.lock().await;
        if slot.as_ref().is_some_and(PeriodicTask::is_running) {
            return Err(AlreadyRunning.into());
        }

        *self.status.write().await = SyncStatus {
            running: true,
            ..SyncStatus::default()
        };

        info!(code = %target.code, role = ?target.role, interval = ?self.interval, "starting sync loop");

        let cycle = Arc::new(SyncLoop {
            target,
            provider,
            apply,
            baseline: Mutex::new(None),
            status: self.status.clone(),
        });
        *slot = Some(PeriodicTask::spawn("sync", self.interval, move || {
            let cycle = cycle.clone();
            async move { cycle.run_once().await }
        }));
        Ok(())
    }

    /// Sync `handle` against `store` under its current lobby code and role.
    ///
    /// `on_applied` runs after every remote snapshot that was applied locally.
    pub async fn start_for_session<F, Fut>(
        &self,
        handle: &SessionHandle,
        store: Arc<dyn GameStore>,
        on_applied: F,
    ) -> Result<(), SyncError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (code, role) = handle
            .read(|session| (session.lobby_code().cloned(), session.role()))
            .await;
        let code = code.ok_or(SyncError::NoLobby)?;

        let provider_handle = handle.clone();
        let apply_handle = handle.clone();
        let on_applied = Arc::new(on_applied);

        self.start(
            SyncTarget { code, role, store },
            move || {
                let handle = provider_handle.clone();
                async move { handle.snapshot().await }
            },
            move |snapshot| {
                let handle = apply_handle.clone();
                let on_applied = on_applied.clone();
                async move {
                    handle.apply_snapshot(snapshot).await?;
                    (*on_applied)().await;
                    Ok(())
                }
            },
        )
        .await
    }

    /// Stop the loop, waiting for an in-flight cycle. No-op when nothing runs.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.stop().await;
            self.status.write().await.running = false;
            info!("sync loop stopped");
        }
    }

    /// Whether a loop is currently active.
    pub async fn is_syncing(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }

    /// Copy of the current counters.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }
}

struct SyncLoop<P, A> {
    target: SyncTarget,
    provider: P,
    apply: A,
    baseline: Mutex<Option<Snapshot>>,
    status: Arc<RwLock<SyncStatus>>,
}

impl<P, PF, A, AF> SyncLoop<P, A>
where
    P: Fn() -> PF,
    PF: Future<Output = Snapshot>,
    A: Fn(Snapshot) -> AF,
    AF: Future<Output = Result<(), GameError>>,
{
    async fn run_once(&self) {
        let mut baseline = self.baseline.lock().await;
        let result = run_cycle(&self.target, &mut baseline, &self.provider, &self.apply).await;

        let mut status = self.status.write().await;
        status.cycles += 1;
        match result {
            Ok(_) => {
                status.last_success = Some(SystemTime::now());
                status.last_error = None;
            }
            Err(err) => {
                warn!(code = %self.target.code, error = %err, "sync cycle failed");
                status.failures += 1;
                status.last_error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::{BoxFuture, ready};

    use super::*;
    use crate::{
        config::SessionConfig,
        dao::game_store::MemoryGameStore,
        state::{session::Session, state_machine::GamePhase},
    };

    fn code() -> LobbyCode {
        LobbyCode::parse("SYNC01").unwrap()
    }

    fn lobby_session(role: Role) -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.set_lobby(code(), role);
        session
    }

    fn target(store: &MemoryGameStore, role: Role) -> SyncTarget {
        SyncTarget {
            code: code(),
            role,
            store: Arc::new(store.clone()),
        }
    }

    async fn provision(store: &MemoryGameStore, session: &Session) {
        store
            .create_document(&code(), session.snapshot())
            .await
            .unwrap();
    }

    async fn cycle(
        target: &SyncTarget,
        baseline: &mut Option<Snapshot>,
        session: &mut Session,
    ) -> Result<CycleOutcome, SyncError> {
        let local = session.snapshot();
        let mut pulled = None;
        let outcome = run_cycle(
            target,
            baseline,
            || ready(local),
            |remote| {
                pulled = Some(remote);
                ready(Ok(()))
            },
        )
        .await?;
        if let Some(remote) = pulled {
            session.apply_snapshot(remote).map_err(SyncError::Rejected)?;
        }
        Ok(outcome)
    }

    #[tokio::test]
    async fn first_host_cycle_pushes_without_applying() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        host.add_participant("Ada").unwrap();

        let mut baseline = None;
        let outcome = cycle(&target(&store, Role::Host), &mut baseline, &mut host)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CycleOutcome {
                pushed: true,
                applied: false
            }
        );
        let stored = store.get_document(&code()).await.unwrap().unwrap();
        assert_eq!(stored, host.snapshot());
        assert_eq!(baseline, Some(host.snapshot()));
    }

    #[tokio::test]
    async fn guest_converges_to_host_document() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        let mut guest = lobby_session(Role::Guest);

        let host_target = target(&store, Role::Host);
        let guest_target = target(&store, Role::Guest);
        let mut host_baseline = None;
        let mut guest_baseline = None;

        host.add_participant("Ada").unwrap();
        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();

        let outcome = cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert!(!outcome.pushed);
        assert!(outcome.applied);
        assert_eq!(guest.snapshot(), host.snapshot());

        // Nothing changed since: both sides are quiet.
        let host_outcome = cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        let guest_outcome = cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert_eq!(host_outcome, CycleOutcome::default());
        assert_eq!(guest_outcome, CycleOutcome::default());
    }

    #[tokio::test]
    async fn guest_edit_reaches_host() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        let mut guest = lobby_session(Role::Guest);
        let host_target = target(&store, Role::Host);
        let guest_target = target(&store, Role::Guest);
        let (mut host_baseline, mut guest_baseline) = (None, None);

        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();

        let id = guest.add_participant("Grace").unwrap();
        let outcome = cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert!(outcome.pushed);
        assert!(!outcome.applied);

        let outcome = cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        assert!(outcome.applied);
        assert_eq!(host.participant(id).unwrap().name, "Grace");
    }

    #[tokio::test]
    async fn concurrent_edits_resolve_to_last_push() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        let mut guest = lobby_session(Role::Guest);
        let host_target = target(&store, Role::Host);
        let guest_target = target(&store, Role::Guest);
        let (mut host_baseline, mut guest_baseline) = (None, None);

        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();

        host.add_participant("Host side").unwrap();
        guest.add_participant("Guest side").unwrap();

        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        // The guest pushes last and overwrites the host's edit.
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();

        assert_eq!(host.snapshot(), guest.snapshot());
        let names: Vec<_> = host.participants().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Guest side".to_string()]);
    }

    #[tokio::test]
    async fn missing_document_is_reported() {
        let store = MemoryGameStore::new();
        let mut guest = lobby_session(Role::Guest);
        let mut baseline = None;

        let err = cycle(&target(&store, Role::Guest), &mut baseline, &mut guest)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::RemoteSyncFailed(StorageError::NotFound { .. })
        ));
        assert_eq!(baseline, None);
    }

    #[tokio::test]
    async fn rejected_snapshot_keeps_local_state() {
        let store = MemoryGameStore::new();
        let mut other = Session::new(SessionConfig::default());
        other.set_lobby(LobbyCode::parse("OTHER1").unwrap(), Role::Host);
        store
            .create_document(&code(), other.snapshot())
            .await
            .unwrap();

        let mut guest = lobby_session(Role::Guest);
        guest.add_participant("Ada").unwrap();
        let before = guest.snapshot();
        let mut baseline = Some(before.clone());

        let err = cycle(&target(&store, Role::Guest), &mut baseline, &mut guest)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Rejected(_)));
        assert_eq!(guest.snapshot(), before);
        assert_eq!(guest.phase(), GamePhase::Setup);
    }

    #[tokio::test]
    async fn counting_host_yields_to_guest_push() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        let mut guest = lobby_session(Role::Guest);
        let host_target = target(&store, Role::Host);
        let guest_target = target(&store, Role::Guest);
        let (mut host_baseline, mut guest_baseline) = (None, None);

        host.start_round().unwrap();
        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();

        let grace = guest.add_participant("Grace").unwrap();
        let outcome = cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert!(outcome.pushed);

        for _ in 0..5 {
            host.advance_tick();
        }
        let outcome = cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CycleOutcome {
                pushed: false,
                applied: true
            }
        );
        assert_eq!(host.participant(grace).unwrap().name, "Grace");

        // Once reconciled, the countdown flows to the guest again.
        host.advance_tick();
        let outcome = cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        assert!(outcome.pushed);
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert_eq!(guest.snapshot(), host.snapshot());
        assert_eq!(guest.phase(), GamePhase::Work);
    }

    #[tokio::test]
    async fn guest_edit_survives_host_timer_pushes() {
        let store = MemoryGameStore::new();
        let mut host = lobby_session(Role::Host);
        provision(&store, &host).await;
        let mut guest = lobby_session(Role::Guest);
        let host_target = target(&store, Role::Host);
        let guest_target = target(&store, Role::Guest);
        let (mut host_baseline, mut guest_baseline) = (None, None);

        host.start_round().unwrap();
        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();

        host.advance_tick();
        let outcome = cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        assert!(outcome.pushed);

        // The guest has not seen the tick yet; its edit still wins.
        let grace = guest.add_participant("Grace").unwrap();
        let outcome = cycle(&guest_target, &mut guest_baseline, &mut guest)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CycleOutcome {
                pushed: true,
                applied: false
            }
        );

        host.advance_tick();
        cycle(&host_target, &mut host_baseline, &mut host)
            .await
            .unwrap();
        assert_eq!(host.participant(grace).unwrap().name, "Grace");
    }

    #[tokio::test]
    async fn running_managers_converge_on_one_store() {
        let store = MemoryGameStore::new();
        let host = SessionHandle::new(lobby_session(Role::Host));
        provision(&store, &host.read(Session::clone).await).await;
        host.mutate(|session| session.add_participant("Ada"))
            .await
            .unwrap();
        let guest = SessionHandle::new(lobby_session(Role::Guest));

        let host_sync = SyncManager::new(Duration::from_millis(10));
        let guest_sync = SyncManager::new(Duration::from_millis(10));
        host_sync
            .start_for_session(&host, Arc::new(store.clone()), || ready(()))
            .await
            .unwrap();
        guest_sync
            .start_for_session(&guest, Arc::new(store.clone()), || ready(()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(guest.snapshot().await, host.snapshot().await);
        assert_eq!(guest.read(Session::participant_count).await, 1);

        guest
            .mutate(|session| session.add_participant("Grace"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        host_sync.stop().await;
        guest_sync.stop().await;
        assert_eq!(host.read(Session::participant_count).await, 2);
        assert_eq!(guest.snapshot().await, host.snapshot().await);
        assert_eq!(
            store.get_document(&code()).await.unwrap().unwrap(),
            host.snapshot().await
        );
    }

    struct FailingStore {
        calls: Arc<AtomicUsize>,
    }

    impl GameStore for FailingStore {
        fn get_document(
            &self,
            _code: &LobbyCode,
        ) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(ready(Err(StorageError::unavailable(
                "offline".into(),
                crate::dao::storage::NoBackend,
            ))))
        }

        fn create_document(
            &self,
            _code: &LobbyCode,
            _snapshot: Snapshot,
        ) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }

        fn replace_document(
            &self,
            _code: &LobbyCode,
            _snapshot: Snapshot,
        ) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }

        fn delete_document(&self, _code: &LobbyCode) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }
    }

    #[tokio::test]
    async fn failing_store_does_not_stop_the_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = SyncManager::new(Duration::from_millis(10));
        let handle = SessionHandle::new(lobby_session(Role::Guest));
        let store: Arc<dyn GameStore> = Arc::new(FailingStore {
            calls: calls.clone(),
        });

        manager
            .start_for_session(&handle, store, || ready(()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(manager.is_syncing().await);
        let status = manager.status().await;
        assert!(status.running);
        assert!(status.failures >= 2);
        assert_eq!(status.failures, status.cycles);
        assert!(status.last_error.is_some());
        assert!(calls.load(Ordering::SeqCst) >= 2);

        manager.stop().await;
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let store = MemoryGameStore::new();
        let handle = SessionHandle::new(lobby_session(Role::Host));
        provision(&store, &handle.read(Session::clone).await).await;
        let manager = SyncManager::new(Duration::from_secs(60));

        manager
            .start_for_session(&handle, Arc::new(store.clone()), || ready(()))
            .await
            .unwrap();
        let err = manager
            .start_for_session(&handle, Arc::new(store), || ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::AlreadyRunning));

        manager.stop().await;
    }

    #[tokio::test]
    async fn start_requires_a_lobby() {
        let manager = SyncManager::new(Duration::from_secs(60));
        let handle = SessionHandle::new(Session::new(SessionConfig::default()));
        let err = manager
            .start_for_session(&handle, Arc::new(MemoryGameStore::new()), || ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NoLobby));
        assert!(!manager.is_syncing().await);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_allows_restart() {
        let store = MemoryGameStore::new();
        let handle = SessionHandle::new(lobby_session(Role::Host));
        provision(&store, &handle.read(Session::clone).await).await;
        let manager = SyncManager::new(Duration::from_secs(60));

        manager.stop().await;
        manager
            .start_for_session(&handle, Arc::new(store.clone()), || ready(()))
            .await
            .unwrap();
        manager.stop().await;
        manager.stop().await;
        assert!(!manager.is_syncing().await);
        assert!(!manager.status().await.running);

        manager
            .start_for_session(&handle, Arc::new(store), || ready(()))
            .await
            .unwrap();
        assert!(manager.is_syncing().await);
        manager.stop().await;
    }

    #[tokio::test]
    async fn applied_snapshot_triggers_callback() {
        let store = MemoryGameStore::new();
        let mut remote = lobby_session(Role::Host);
        remote.add_participant("Ada").unwrap();
        provision(&store, &remote).await;

        let handle = SessionHandle::new(lobby_session(Role::Guest));
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = applied.clone();
        let manager = SyncManager::new(Duration::from_secs(60));
        manager
            .start_for_session(&handle, Arc::new(store), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                ready(())
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.stop().await;

        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert_eq!(handle.read(Session::participant_count).await, 1);
        assert_eq!(manager.status().await.cycles, 1);
    }
}
