use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    services::{lobby_service::LobbyError, periodic::AlreadyRunning, sync_service::SyncError},
    state::session::GameError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The caller's role does not allow the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            StorageError::AlreadyExists { .. } => ServiceError::InvalidState(err.to_string()),
            StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
        }
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::ParticipantNotFound(_)
            | GameError::TaskNotFound(_)
            | GameError::SubtaskNotFound { .. } => ServiceError::NotFound(err.to_string()),
            GameError::NotHost { .. } => ServiceError::Unauthorized(err.to_string()),
            GameError::InvalidInput(_) => ServiceError::InvalidInput(err.to_string()),
            GameError::InvalidPhaseTransition(_)
            | GameError::CapacityExceeded { .. }
            | GameError::InvalidStateTransition { .. }
            | GameError::InvalidSnapshot(_) => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<LobbyError> for ServiceError {
    fn from(err: LobbyError) -> Self {
        match err {
            LobbyError::InvalidCode(invalid) => ServiceError::InvalidInput(invalid.to_string()),
            LobbyError::AlreadyInLobby(_) | LobbyError::ModeLocked(_) => {
                ServiceError::InvalidState(err.to_string())
            }
            LobbyError::RemoteProvisioningFailed(source) => source.into(),
        }
    }
}

impl From<SyncError> for ServiceError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AlreadyRunning | SyncError::NoLobby => {
                ServiceError::InvalidState(err.to_string())
            }
            SyncError::RemoteSyncFailed(source) => source.into(),
            SyncError::Rejected(source) => source.into(),
        }
    }
}

impl From<AlreadyRunning> for ServiceError {
    fn from(err: AlreadyRunning) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::storage::NoBackend,
        state::{lobby::LobbyCode, state_machine::GamePhase, state_machine::InvalidTransition},
    };

    fn status_of(err: impl Into<ServiceError>) -> StatusCode {
        AppError::from(err.into()).into_response().status()
    }

    #[test]
    fn game_errors_map_to_http_status() {
        assert_eq!(status_of(GameError::TaskNotFound(3)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(GameError::NotHost {
                action: "start round"
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(GameError::InvalidPhaseTransition(InvalidTransition {
                from: GamePhase::GameOver,
                action: "start round",
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(GameError::InvalidInput("empty name".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn provisioning_failures_are_unavailable() {
        let err = LobbyError::RemoteProvisioningFailed(StorageError::unavailable(
            "refused".into(),
            NoBackend,
        ));
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn lobby_conflicts_map_to_conflict() {
        let code = LobbyCode::parse("AAAAAA").unwrap();
        assert_eq!(
            status_of(LobbyError::AlreadyInLobby(code.clone())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LobbyError::InvalidCode(
                LobbyCode::parse("nope").unwrap_err()
            )),
            StatusCode::BAD_REQUEST
        );
    }
}
