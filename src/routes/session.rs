use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{
        AddParticipantRequest, AddSubtaskRequest, AddTaskRequest, CompleteTaskResponse,
        CreatedResponse, LeaderboardRow, SessionView, SubtaskToggleResponse, SyncStatusView,
        TaskView, UpdateTaskRequest,
    },
    error::AppError,
    services::game_service,
    state::{
        SharedState,
        model::{ParticipantId, SubtaskId, TaskId},
    },
};

/// Routes driving the local session: phases, roster, tasks and sync status.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/leaderboard", get(get_leaderboard))
        .route("/session/reset", post(reset_session))
        .route("/session/round/start", post(start_round))
        .route("/session/round/end", post(end_round))
        .route("/session/end", post(end_game))
        .route("/session/participants", post(add_participant))
        .route("/session/participants/{id}", delete(remove_participant))
        .route("/session/participants/{id}/tasks", post(add_task))
        .route(
            "/session/tasks/{id}",
            patch(update_task).delete(remove_task),
        )
        .route("/session/tasks/{id}/start", post(start_task))
        .route("/session/tasks/{id}/complete", post(complete_task))
        .route("/session/tasks/{id}/subtasks", post(add_subtask))
        .route(
            "/session/tasks/{id}/subtasks/{subtask_id}/toggle",
            post(toggle_subtask),
        )
        .route("/sync", get(sync_status))
}

/// Current state of the local session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Session state", body = SessionView))
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionView> {
    Json(game_service::session_view(&state).await)
}

/// Participants ranked by score.
#[utoipa::path(
    get,
    path = "/session/leaderboard",
    tag = "session",
    responses((status = 200, description = "Leaderboard", body = [LeaderboardRow]))
)]
pub async fn get_leaderboard(State(state): State<SharedState>) -> Json<Vec<LeaderboardRow>> {
    Json(game_service::leaderboard(&state).await)
}

/// Reset to setup with an empty roster.
#[utoipa::path(
    post,
    path = "/session/reset",
    tag = "session",
    responses((status = 200, description = "Session reset to setup", body = SessionView))
)]
pub async fn reset_session(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(game_service::reset_session(&state).await?))
}

/// Enter the work phase. Host only.
#[utoipa::path(
    post,
    path = "/session/round/start",
    tag = "session",
    responses(
        (status = 200, description = "Round started", body = SessionView),
        (status = 401, description = "Caller is not the host"),
        (status = 409, description = "Not allowed in the current phase")
    )
)]
pub async fn start_round(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(game_service::start_round(&state).await?))
}

/// Cut the work phase short and start the break. Host only.
#[utoipa::path(
    post,
    path = "/session/round/end",
    tag = "session",
    responses(
        (status = 200, description = "Break started", body = SessionView),
        (status = 401, description = "Caller is not the host"),
        (status = 409, description = "Not allowed in the current phase")
    )
)]
pub async fn end_round(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(game_service::end_round(&state).await?))
}

/// End the game. Host only.
#[utoipa::path(
    post,
    path = "/session/end",
    tag = "session",
    responses(
        (status = 200, description = "Game over", body = SessionView),
        (status = 401, description = "Caller is not the host"),
        (status = 409, description = "Game already over")
    )
)]
pub async fn end_game(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(game_service::end_game(&state).await?))
}

/// Register a participant.
#[utoipa::path(
    post,
    path = "/session/participants",
    tag = "session",
    request_body = AddParticipantRequest,
    responses(
        (status = 200, description = "Participant added", body = CreatedResponse),
        (status = 409, description = "Session full or over")
    )
)]
pub async fn add_participant(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AddParticipantRequest>>,
) -> Result<Json<CreatedResponse>, AppError> {
    Ok(Json(game_service::add_participant(&state, payload).await?))
}

/// Remove a participant and their tasks.
#[utoipa::path(
    delete,
    path = "/session/participants/{id}",
    tag = "session",
    params(("id" = u64, Path, description = "Participant identifier")),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 404, description = "Unknown participant")
    )
)]
pub async fn remove_participant(
    State(state): State<SharedState>,
    Path(id): Path<ParticipantId>,
) -> Result<StatusCode, AppError> {
    game_service::remove_participant(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a pending task owned by the participant.
#[utoipa::path(
    post,
    path = "/session/participants/{id}/tasks",
    tag = "session",
    params(("id" = u64, Path, description = "Owner of the task")),
    request_body = AddTaskRequest,
    responses(
        (status = 200, description = "Task created", body = CreatedResponse),
        (status = 404, description = "Unknown participant")
    )
)]
pub async fn add_task(
    State(state): State<SharedState>,
    Path(id): Path<ParticipantId>,
    Valid(Json(payload)): Valid<Json<AddTaskRequest>>,
) -> Result<Json<CreatedResponse>, AppError> {
    Ok(Json(game_service::add_task(&state, id, payload).await?))
}

/// Edit an open task.
#[utoipa::path(
    patch,
    path = "/session/tasks/{id}",
    tag = "session",
    params(("id" = u64, Path, description = "Task identifier")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskView),
        (status = 404, description = "Unknown task"),
        (status = 409, description = "Task already completed")
    )
)]
pub async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
    Valid(Json(payload)): Valid<Json<UpdateTaskRequest>>,
) -> Result<Json<TaskView>, AppError> {
    Ok(Json(game_service::update_task(&state, id, payload).await?))
}

/// Delete a task; points already earned are kept.
#[utoipa::path(
    delete,
    path = "/session/tasks/{id}",
    tag = "session",
    params(("id" = u64, Path, description = "Task identifier")),
    responses(
        (status = 204, description = "Task removed"),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn remove_task(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, AppError> {
    game_service::remove_task(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a pending task to in-progress.
#[utoipa::path(
    post,
    path = "/session/tasks/{id}/start",
    tag = "session",
    params(("id" = u64, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task in progress", body = TaskView),
        (status = 409, description = "Task cannot start")
    )
)]
pub async fn start_task(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskView>, AppError> {
    Ok(Json(game_service::start_task(&state, id).await?))
}

/// Complete a task and credit its points to the owner.
#[utoipa::path(
    post,
    path = "/session/tasks/{id}/complete",
    tag = "session",
    params(("id" = u64, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task completed", body = CompleteTaskResponse),
        (status = 409, description = "Task already completed or game over")
    )
)]
pub async fn complete_task(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
) -> Result<Json<CompleteTaskResponse>, AppError> {
    Ok(Json(game_service::complete_task(&state, id).await?))
}

/// Add a checklist item to a task.
#[utoipa::path(
    post,
    path = "/session/tasks/{id}/subtasks",
    tag = "session",
    params(("id" = u64, Path, description = "Task identifier")),
    request_body = AddSubtaskRequest,
    responses(
        (status = 200, description = "Subtask added", body = CreatedResponse),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn add_subtask(
    State(state): State<SharedState>,
    Path(id): Path<TaskId>,
    Valid(Json(payload)): Valid<Json<AddSubtaskRequest>>,
) -> Result<Json<CreatedResponse>, AppError> {
    Ok(Json(game_service::add_subtask(&state, id, payload).await?))
}

/// Flip a checklist item.
#[utoipa::path(
    post,
    path = "/session/tasks/{id}/subtasks/{subtask_id}/toggle",
    tag = "session",
    params(
        ("id" = u64, Path, description = "Task identifier"),
        ("subtask_id" = u32, Path, description = "Subtask identifier")
    ),
    responses(
        (status = 200, description = "Subtask toggled", body = SubtaskToggleResponse),
        (status = 404, description = "Unknown task or subtask")
    )
)]
pub async fn toggle_subtask(
    State(state): State<SharedState>,
    Path((id, subtask_id)): Path<(TaskId, SubtaskId)>,
) -> Result<Json<SubtaskToggleResponse>, AppError> {
    Ok(Json(
        game_service::toggle_subtask(&state, id, subtask_id).await?,
    ))
}

/// Status of the sync loop.
#[utoipa::path(
    get,
    path = "/sync",
    tag = "session",
    responses((status = 200, description = "Sync status", body = SyncStatusView))
)]
pub async fn sync_status(State(state): State<SharedState>) -> Json<SyncStatusView> {
    Json(game_service::sync_status(&state).await)
}
