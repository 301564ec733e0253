use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};

use crate::{
    dao::{
        game_store::GameStore,
        storage::{StorageError, StorageResult},
    },
    state::{lobby::LobbyCode, snapshot::Snapshot},
};

/// In-process document store. Serves as the offline cache shared by local sessions and as
/// a stand-in remote store in tests.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    documents: Arc<DashMap<LobbyCode, Snapshot>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provisioned documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document is provisioned.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl GameStore for MemoryGameStore {
    fn get_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
        let found = self.documents.get(code).map(|entry| entry.value().clone());
        Box::pin(future::ready(Ok(found)))
    }

    fn create_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.documents.entry(code.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(code.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
                Ok(())
            }
        };
        Box::pin(future::ready(result))
    }

    fn replace_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.documents.get_mut(code) {
            Some(mut entry) => {
                *entry = snapshot;
                Ok(())
            }
            None => Err(StorageError::not_found(code.as_str())),
        };
        Box::pin(future::ready(result))
    }

    fn delete_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<()>> {
        self.documents.remove(code);
        Box::pin(future::ready(Ok(())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::GamePhase;

    fn snapshot(code: &str, timer: u32) -> Snapshot {
        Snapshot {
            lobby_code: code.into(),
            phase: GamePhase::Setup,
            round: 1,
            total_rounds: 2,
            timer,
            participants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_then_replace_then_get() {
        let store = MemoryGameStore::new();
        let code = LobbyCode::parse("ABC123").unwrap();

        assert!(store.get_document(&code).await.unwrap().is_none());
        store
            .create_document(&code, snapshot("ABC123", 0))
            .await
            .unwrap();
        store
            .replace_document(&code, snapshot("ABC123", 7))
            .await
            .unwrap();

        let found = store.get_document(&code).await.unwrap().unwrap();
        assert_eq!(found.timer, 7);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_refuses_collisions() {
        let store = MemoryGameStore::new();
        let code = LobbyCode::parse("ABC123").unwrap();
        store
            .create_document(&code, snapshot("ABC123", 0))
            .await
            .unwrap();
        let err = store
            .create_document(&code, snapshot("ABC123", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn replace_requires_provisioning() {
        let store = MemoryGameStore::new();
        let code = LobbyCode::parse("ABC123").unwrap();
        let err = store
            .replace_document(&code, snapshot("ABC123", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryGameStore::new();
        let code = LobbyCode::parse("ABC123").unwrap();
        store
            .create_document(&code, snapshot("ABC123", 0))
            .await
            .unwrap();

        store.delete_document(&code).await.unwrap();
        store.delete_document(&code).await.unwrap();

        assert!(store.is_empty());
        assert!(store.get_document(&code).await.unwrap().is_none());
    }
}
