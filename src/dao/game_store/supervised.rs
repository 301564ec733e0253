use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::{
    dao::{
        game_store::GameStore,
        storage::{NoBackend, StorageError, StorageResult},
    },
    state::{lobby::LobbyCode, snapshot::Snapshot},
};

/// Store facade delegating to whichever backend the storage supervisor has installed.
///
/// While no backend is installed (degraded mode) every call fails with
/// [`StorageError::Unavailable`], which the sync loop treats like any other transport error.
#[derive(Clone, Default)]
pub struct SupervisedGameStore {
    backend: Arc<RwLock<Option<Arc<dyn GameStore>>>>,
}

impl SupervisedGameStore {
    /// Facade with no backend installed (degraded).
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a handle to the current backend, if one is installed.
    pub async fn current(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.backend.read().await;
        guard.as_ref().cloned()
    }

    /// Route calls to `store` from now on.
    pub async fn install(&self, store: Arc<dyn GameStore>) {
        let mut guard = self.backend.write().await;
        *guard = Some(store);
    }

    /// Drop the backend; calls fail until the next install.
    pub async fn clear(&self) {
        let mut guard = self.backend.write().await;
        guard.take();
    }

    /// Whether a backend is installed.
    pub async fn is_installed(&self) -> bool {
        self.backend.read().await.is_some()
    }

    async fn require(
        backend: &RwLock<Option<Arc<dyn GameStore>>>,
    ) -> StorageResult<Arc<dyn GameStore>> {
        backend
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or_else(|| StorageError::unavailable("degraded mode".into(), NoBackend))
    }
}

impl GameStore for SupervisedGameStore {
    fn get_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
        let backend = self.backend.clone();
        let code = code.clone();
        Box::pin(async move { Self::require(&backend).await?.get_document(&code).await })
    }

    fn create_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.backend.clone();
        let code = code.clone();
        Box::pin(async move {
            Self::require(&backend)
                .await?
                .create_document(&code, snapshot)
                .await
        })
    }

    fn replace_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.backend.clone();
        let code = code.clone();
        Box::pin(async move {
            Self::require(&backend)
                .await?
                .replace_document(&code, snapshot)
                .await
        })
    }

    fn delete_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.backend.clone();
        let code = code.clone();
        Box::pin(async move { Self::require(&backend).await?.delete_document(&code).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.backend.clone();
        Box::pin(async move { Self::require(&backend).await?.health_check().await })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let backend = self.backend.clone();
        Box::pin(async move { Self::require(&backend).await?.try_reconnect().await })
    }
}
