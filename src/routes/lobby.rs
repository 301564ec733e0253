use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::lobby::{CreateLobbyRequest, JoinLobbyRequest, LeaveLobbyResponse, LobbyInfoResponse},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Lobby membership of the local session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/lobby", get(get_lobby).post(create_lobby).delete(leave_lobby))
        .route("/lobby/join", post(join_lobby))
}

/// Describe the current lobby.
#[utoipa::path(
    get,
    path = "/lobby",
    tag = "lobby",
    responses(
        (status = 200, description = "Current lobby", body = LobbyInfoResponse),
        (status = 404, description = "Not in a lobby")
    )
)]
pub async fn get_lobby(State(state): State<SharedState>) -> Result<Json<LobbyInfoResponse>, AppError> {
    Ok(Json(game_service::lobby_info(&state).await?))
}

/// Host a new lobby; the local session is reset and becomes host.
#[utoipa::path(
    post,
    path = "/lobby",
    tag = "lobby",
    request_body = CreateLobbyRequest,
    responses(
        (status = 200, description = "Lobby created", body = LobbyInfoResponse),
        (status = 409, description = "Already in a lobby"),
        (status = 503, description = "Lobby document could not be provisioned")
    )
)]
pub async fn create_lobby(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateLobbyRequest>>,
) -> Result<Json<LobbyInfoResponse>, AppError> {
    Ok(Json(game_service::create_lobby(&state, payload).await?))
}

/// Join a lobby by code as guest.
#[utoipa::path(
    post,
    path = "/lobby/join",
    tag = "lobby",
    request_body = JoinLobbyRequest,
    responses(
        (status = 200, description = "Lobby joined", body = LobbyInfoResponse),
        (status = 400, description = "Malformed code"),
        (status = 409, description = "Already in a lobby")
    )
)]
pub async fn join_lobby(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinLobbyRequest>>,
) -> Result<Json<LobbyInfoResponse>, AppError> {
    Ok(Json(game_service::join_lobby(&state, payload).await?))
}

/// Leave the current lobby and stop syncing. Leaving twice is harmless.
#[utoipa::path(
    delete,
    path = "/lobby",
    tag = "lobby",
    responses((status = 200, description = "Lobby left", body = LeaveLobbyResponse))
)]
pub async fn leave_lobby(State(state): State<SharedState>) -> Json<LeaveLobbyResponse> {
    Json(game_service::leave_lobby(&state).await)
}
