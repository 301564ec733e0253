use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Rally Rounds.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::lobby::get_lobby,
        crate::routes::lobby::create_lobby,
        crate::routes::lobby::join_lobby,
        crate::routes::lobby::leave_lobby,
        crate::routes::session::get_session,
        crate::routes::session::get_leaderboard,
        crate::routes::session::reset_session,
        crate::routes::session::start_round,
        crate::routes::session::end_round,
        crate::routes::session::end_game,
        crate::routes::session::add_participant,
        crate::routes::session::remove_participant,
        crate::routes::session::add_task,
        crate::routes::session::update_task,
        crate::routes::session::remove_task,
        crate::routes::session::start_task,
        crate::routes::session::complete_task,
        crate::routes::session::add_subtask,
        crate::routes::session::toggle_subtask,
        crate::routes::session::sync_status,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::lobby::CreateLobbyRequest,
            crate::dto::lobby::JoinLobbyRequest,
            crate::dto::lobby::LobbyInfoResponse,
            crate::dto::lobby::LeaveLobbyResponse,
            crate::dto::session::SessionView,
            crate::dto::session::ParticipantView,
            crate::dto::session::TaskView,
            crate::dto::session::LeaderboardRow,
            crate::dto::session::AddParticipantRequest,
            crate::dto::session::AddTaskRequest,
            crate::dto::session::UpdateTaskRequest,
            crate::dto::session::AddSubtaskRequest,
            crate::dto::session::CreatedResponse,
            crate::dto::session::CompleteTaskResponse,
            crate::dto::session::SubtaskToggleResponse,
            crate::dto::session::SyncStatusView,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::TimerEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "lobby", description = "Lobby membership"),
        (name = "session", description = "Phases, participants and tasks of the local session"),
    )
)]
/// OpenAPI document served at `/docs`.
pub struct ApiDoc;
