#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process store.
pub mod memory;
/// Store delegating to the installed backend.
pub mod supervised;

use crate::dao::storage::StorageResult;
use crate::state::{lobby::LobbyCode, snapshot::Snapshot};
use futures::future::BoxFuture;

pub use memory::MemoryGameStore;
pub use supervised::SupervisedGameStore;

/// Document store holding one session snapshot per lobby code.
pub trait GameStore: Send + Sync {
    /// Fetch the current document, `None` when it was never provisioned.
    fn get_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<Option<Snapshot>>>;
    /// Provision a new document; fails with `AlreadyExists` on a code collision.
    fn create_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite an existing document; fails with `NotFound` if it was never provisioned.
    fn replace_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Drop a document; deleting a missing document succeeds.
    fn delete_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap liveness check of the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend in place after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
