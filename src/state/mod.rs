/// Shared session handle.
pub mod handle;
/// Lobby codes, roles and modes.
pub mod lobby;
/// Participants, tasks and scoring.
pub mod model;
/// Session aggregate.
pub mod session;
/// Replicated session document.
pub mod snapshot;
mod sse;
/// Phase table.
pub mod state_machine;
/// Mutations followed by a broadcast.
pub mod transitions;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::game_store::{GameStore, MemoryGameStore, SupervisedGameStore},
    dto::sse::{ServerEvent, SystemStatus},
    services::{lobby_service::LobbyManager, sync_service::SyncManager, ticker::PhaseTicker},
    state::{handle::SessionHandle, session::Session},
};

pub use self::sse::SseHub;

/// Application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 32;
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Central application state: the local session plus the services driving it.
pub struct AppState {
    config: AppConfig,
    session: SessionHandle,
    lobby: LobbyManager,
    sync: SyncManager,
    ticker: PhaseTicker,
    remote_store: SupervisedGameStore,
    offline_cache: MemoryGameStore,
    sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a remote store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let remote_store = SupervisedGameStore::new();
        let offline_cache = MemoryGameStore::new();
        let lobby = LobbyManager::new(
            Arc::new(remote_store.clone()),
            Arc::new(offline_cache.clone()),
        );

        Arc::new(Self {
            session: SessionHandle::new(Session::new(config.session())),
            lobby,
            sync: SyncManager::new(config.sync_interval()),
            ticker: PhaseTicker::new(config.tick_interval()),
            remote_store,
            offline_cache,
            sse: SseHub::new(SSE_CAPACITY),
            degraded: degraded_tx,
            config,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The local session.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Lobby lifecycle manager.
    pub fn lobby(&self) -> &LobbyManager {
        &self.lobby
    }

    /// Sync loop owner.
    pub fn sync(&self) -> &SyncManager {
        &self.sync
    }

    /// Phase timer loop owner.
    pub fn ticker(&self) -> &PhaseTicker {
        &self.ticker
    }

    /// Remote store facade; fails with `Unavailable` while degraded.
    pub fn remote_store(&self) -> &SupervisedGameStore {
        &self.remote_store
    }

    /// In-process document cache used by offline lobbies.
    pub fn offline_cache(&self) -> &MemoryGameStore {
        &self.offline_cache
    }

    /// Broadcast hub used for the session SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Install a remote store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        self.remote_store.install(store).await;
        self.update_degraded(false).await;
    }

    /// Remove the remote store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        self.remote_store.clear().await;
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if !changed {
            return;
        }

        match ServerEvent::json(
            Some(EVENT_SYSTEM_STATUS.to_string()),
            &SystemStatus { degraded: value },
        ) {
            Ok(event) => self.sse.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialize system status event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_degraded_and_toggles_once_per_change() {
        let state = AppState::new(AppConfig::default());
        let mut events = state.sse().subscribe();
        let watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);

        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state.update_degraded(false).await;

        assert!(!state.is_degraded().await);
        assert!(!*watcher.borrow());
        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SYSTEM_STATUS));
        assert_eq!(event.data, r#"{"degraded":false}"#);
        assert!(events.try_recv().is_err());

        state.clear_game_store().await;
        assert!(state.is_degraded().await);
    }
}
