//! Lobby lifecycle: code generation, provisioning, join and leave.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::{
        handle::SessionHandle,
        lobby::{InvalidCode, LobbyCode, Role, SessionMode},
        session::Session,
    },
};

const MAX_CODE_ATTEMPTS: usize = 5;

/// Errors surfaced by lobby operations.
#[derive(Debug, Error)]
pub enum LobbyError {
    #[error(transparent)]
    InvalidCode(#[from] InvalidCode),
    /// The session already belongs to a lobby; leave it first.
    #[error("already in lobby `{0}`")]
    AlreadyInLobby(LobbyCode),
    /// Mode changes are only allowed outside a lobby.
    #[error("session mode cannot change while in lobby `{0}`")]
    ModeLocked(LobbyCode),
    /// The lobby document could not be created.
    #[error("failed to provision lobby: {0}")]
    RemoteProvisioningFailed(#[source] StorageError),
}

/// Result of [`LobbyManager::leave_lobby`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Left the lobby with this code.
    Left(LobbyCode),
    /// The session was not in a lobby.
    NotInLobby,
}

/// Lobby membership of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyInfo {
    /// Join code.
    pub code: LobbyCode,
    /// Host or guest.
    pub role: Role,
    /// Whether the lobby syncs through the remote store.
    pub online: bool,
    /// Participants in the local session.
    pub participant_count: usize,
}

impl LobbyInfo {
    fn of(session: &Session) -> Option<Self> {
        session
            .lobby_code()
            .map(|code| Self::describe(code.clone(), session))
    }

    fn describe(code: LobbyCode, session: &Session) -> Self {
        Self {
            code,
            role: session.role(),
            online: session.mode().is_online(),
            participant_count: session.participant_count(),
        }
    }
}

/// Draw a fresh random join code.
pub fn generate_code() -> LobbyCode {
    LobbyCode::generate(&mut rand::rng())
}

async fn discard(store: &dyn GameStore, code: &LobbyCode) {
    if let Err(err) = store.delete_document(code).await {
        warn!(%code, error = %err, "failed to delete lobby document");
    }
}

/// Creates, joins and leaves lobbies for any session handle.
///
/// Online sessions provision their document in the remote store, offline sessions in the
/// in-process cache.
#[derive(Clone)]
pub struct LobbyManager {
    remote: Arc<dyn GameStore>,
    offline_cache: Arc<dyn GameStore>,
}

impl LobbyManager {
    /// Manager provisioning online lobbies in `remote` and offline ones in `offline_cache`.
    pub fn new(remote: Arc<dyn GameStore>, offline_cache: Arc<dyn GameStore>) -> Self {
        Self {
            remote,
            offline_cache,
        }
    }

    /// Store that holds documents for sessions in `mode`.
    pub fn store_for(&self, mode: SessionMode) -> Arc<dyn GameStore> {
        match mode {
            SessionMode::Online => self.remote.clone(),
            SessionMode::Offline => self.offline_cache.clone(),
        }
    }

    /// Switch between online and offline; locked inside a lobby unless unchanged.
    pub async fn set_mode(&self, handle: &SessionHandle, mode: SessionMode) -> Result<(), LobbyError> {
        handle
            .mutate(|session| match session.lobby_code() {
                Some(code) if session.mode() != mode => Err(LobbyError::ModeLocked(code.clone())),
                _ => {
                    session.set_mode(mode);
                    Ok(())
                }
            })
            .await
    }

    /// Host a new lobby.
    ///
    /// The document is provisioned before the session changes: on failure the session is
    /// left exactly as it was.
    pub async fn create_lobby(&self, handle: &SessionHandle) -> Result<LobbyInfo, LobbyError> {
        let (mut draft, mode) = handle
            .read(|session| match session.lobby_code() {
                Some(code) => Err(LobbyError::AlreadyInLobby(code.clone())),
                None => Ok((session.clone(), session.mode())),
            })
            .await?;
        draft.reset();
        let store = self.store_for(mode);

        let mut attempt = 1;
        let code = loop {
            let code = generate_code();
            draft.set_lobby(code.clone(), Role::Host);
            match store.create_document(&code, draft.snapshot()).await {
                Ok(()) => break code,
                Err(StorageError::AlreadyExists { .. }) if attempt < MAX_CODE_ATTEMPTS => {
                    debug!(%code, attempt, "lobby code already taken; drawing another");
                    attempt += 1;
                }
                Err(err) => {
                    warn!(%code, ?mode, error = %err, "lobby provisioning failed");
                    return Err(LobbyError::RemoteProvisioningFailed(err));
                }
            }
        };

        let committed = handle
            .mutate(|session| {
                if let Some(existing) = session.lobby_code() {
                    return Err(LobbyError::AlreadyInLobby(existing.clone()));
                }
                session.reset();
                session.set_lobby(code.clone(), Role::Host);
                Ok(LobbyInfo::describe(code.clone(), session))
            })
            .await;

        match committed {
            Ok(info) => {
                info!(%code, ?mode, "lobby created");
                Ok(info)
            }
            Err(err) => {
                // Another lobby was entered while provisioning.
                discard(store.as_ref(), &code).await;
                Err(err)
            }
        }
    }

    /// Join an existing lobby as guest. The local game is reset; the lobby's state arrives
    /// with the first sync.
    pub async fn join_lobby(&self, handle: &SessionHandle, code: &str) -> Result<LobbyInfo, LobbyError> {
        let code = LobbyCode::parse(code)?;
        let info = handle
            .mutate(|session| {
                if let Some(existing) = session.lobby_code() {
                    return Err(LobbyError::AlreadyInLobby(existing.clone()));
                }
                session.reset();
                session.set_lobby(code.clone(), Role::Guest);
                Ok(LobbyInfo::describe(code.clone(), session))
            })
            .await?;

        info!(%code, "joined lobby");
        Ok(info)
    }

    /// Leave the current lobby. Never fails; leaving twice reports [`LeaveOutcome::NotInLobby`].
    ///
    /// An offline host also drops its document from the in-process cache.
    pub async fn leave_lobby(&self, handle: &SessionHandle) -> LeaveOutcome {
        let left = handle
            .mutate(|session| {
                let (role, mode) = (session.role(), session.mode());
                session.clear_lobby().map(|code| (code, role, mode))
            })
            .await;
        let Some((code, role, mode)) = left else {
            return LeaveOutcome::NotInLobby;
        };

        if role == Role::Host && mode == SessionMode::Offline {
            discard(self.offline_cache.as_ref(), &code).await;
        }
        info!(%code, ?role, "left lobby");
        LeaveOutcome::Left(code)
    }

    /// Membership of the session, `None` outside a lobby.
    pub async fn lobby_info(&self, handle: &SessionHandle) -> Option<LobbyInfo> {
        handle.read(LobbyInfo::of).await
    }
}
