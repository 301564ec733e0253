use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_lobby_code,
    services::lobby_service::{LeaveOutcome, LobbyInfo},
    state::lobby::{Role, SessionMode},
};

/// Payload used to host a new lobby.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateLobbyRequest {
    /// Exchange snapshots through the remote store (`online`) or the local cache.
    #[serde(default)]
    pub mode: SessionMode,
}

/// Payload used to join a lobby by code.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct JoinLobbyRequest {
    /// Code to join, case-insensitive.
    #[validate(custom(function = "validate_lobby_code"))]
    pub code: String,
    /// Store the lobby lives in.
    #[serde(default)]
    pub mode: SessionMode,
}

/// Current lobby membership.
#[derive(Debug, Serialize, ToSchema)]
pub struct LobbyInfoResponse {
    /// Join code.
    pub code: String,
    /// Host or guest.
    pub role: Role,
    /// Whether the lobby syncs through the remote store.
    pub online: bool,
    /// Participants in the local session.
    pub participant_count: usize,
}

impl From<LobbyInfo> for LobbyInfoResponse {
    fn from(info: LobbyInfo) -> Self {
        Self {
            code: info.code.into(),
            role: info.role,
            online: info.online,
            participant_count: info.participant_count,
        }
    }
}

/// Result of leaving a lobby.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveLobbyResponse {
    /// Whether the session was in a lobby.
    pub left: bool,
    /// Code of the lobby that was left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<LeaveOutcome> for LeaveLobbyResponse {
    fn from(outcome: LeaveOutcome) -> Self {
        match outcome {
            LeaveOutcome::Left(code) => Self {
                left: true,
                code: Some(code.into()),
            },
            LeaveOutcome::NotInLobby => Self {
                left: false,
                code: None,
            },
        }
    }
}
