//! Session operations exposed over HTTP, plus the wiring of the sync loop and the phase
//! ticker around lobby membership.

use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::{
    dto::{
        lobby::{CreateLobbyRequest, JoinLobbyRequest, LeaveLobbyResponse, LobbyInfoResponse},
        session::{
            AddParticipantRequest, AddSubtaskRequest, AddTaskRequest, CompleteTaskResponse,
            CreatedResponse, LeaderboardRow, SessionView, SubtaskToggleResponse, SyncStatusView,
            TaskView, UpdateTaskRequest,
        },
    },
    error::ServiceError,
    services::{
        periodic::AlreadyRunning,
        sse_events::{broadcast_session, broadcast_timer},
    },
    state::{
        AppState, SharedState,
        model::{ParticipantId, SubtaskId, TaskId},
        session::{GameError, Session, TickOutcome},
        transitions::mutate_with_broadcast,
    },
};

/// Current session state.
pub async fn session_view(state: &SharedState) -> SessionView {
    state.session().read(|session| SessionView::from(session)).await
}

/// Participants ordered by score.
pub async fn leaderboard(state: &SharedState) -> Vec<LeaderboardRow> {
    LeaderboardRow::ranked(state.session().read(Session::leaderboard).await)
}

/// Status of the sync loop.
pub async fn sync_status(state: &SharedState) -> SyncStatusView {
    state.sync().status().await.into()
}

// -------------------------------------------------------------------------
// Lobby
// -------------------------------------------------------------------------

/// Lobby membership, `NotFound` outside a lobby.
pub async fn lobby_info(state: &SharedState) -> Result<LobbyInfoResponse, ServiceError> {
    state
        .lobby()
        .lobby_info(state.session())
        .await
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound("session is not in a lobby".into()))
}

/// Host a new lobby and start syncing it.
pub async fn create_lobby(
    state: &SharedState,
    request: CreateLobbyRequest,
) -> Result<LobbyInfoResponse, ServiceError> {
    state
        .lobby()
        .set_mode(state.session(), request.mode)
        .await?;
    let info = state.lobby().create_lobby(state.session()).await?;

    start_sync(state).await?;
    ensure_ticker(state).await;
    broadcast_session(state).await;
    Ok(info.into())
}

/// Join a lobby as guest and start syncing it.
pub async fn join_lobby(
    state: &SharedState,
    request: JoinLobbyRequest,
) -> Result<LobbyInfoResponse, ServiceError> {
    state
        .lobby()
        .set_mode(state.session(), request.mode)
        .await?;
    let info = state
        .lobby()
        .join_lobby(state.session(), &request.code)
        .await?;

    if info.online {
        // Online guests receive the timer through sync.
        state.ticker().stop().await;
    } else {
        ensure_ticker(state).await;
    }
    start_sync(state).await?;
    broadcast_session(state).await;
    Ok(info.into())
}

/// Stop syncing and leave the current lobby, if any.
pub async fn leave_lobby(state: &SharedState) -> LeaveLobbyResponse {
    state.sync().stop().await;
    let outcome = state.lobby().leave_lobby(state.session()).await;
    ensure_ticker(state).await;
    broadcast_session(state).await;
    outcome.into()
}

async fn start_sync(state: &SharedState) -> Result<(), ServiceError> {
    let mode = state.session().read(Session::mode).await;
    let store = state.lobby().store_for(mode);
    let weak = Arc::downgrade(state);

    state
        .sync()
        .start_for_session(state.session(), store, move || {
            let weak = weak.clone();
            async move {
                if let Some(state) = weak.upgrade() {
                    broadcast_session(&state).await;
                }
            }
        })
        .await?;
    Ok(())
}

/// Make sure the phase timer runs. Online guests are excluded by the callers.
pub async fn ensure_ticker(state: &SharedState) {
    let weak: Weak<AppState> = Arc::downgrade(state);
    let started = state
        .ticker()
        .start(state.session().clone(), move |outcome| {
            let weak = weak.clone();
            async move {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                match outcome {
                    TickOutcome::Counting { remaining } => broadcast_timer(&state, remaining).await,
                    TickOutcome::Transitioned { .. } => broadcast_session(&state).await,
                    TickOutcome::Idle => {}
                }
            }
        })
        .await;
    if let Err(AlreadyRunning) = started {
        debug!("phase ticker already running");
    }
}

/// Stop the background loops before the process exits.
pub async fn shutdown(state: &SharedState) {
    state.sync().stop().await;
    state.ticker().stop().await;
    info!("background loops stopped");
}

// -------------------------------------------------------------------------
// Phases
// -------------------------------------------------------------------------

/// Start the next work phase. Host only.
pub async fn start_round(state: &SharedState) -> Result<SessionView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.start_round()?;
        Ok::<_, GameError>(SessionView::from(&*session))
    })
    .await
}

/// Cut the work phase short. Host only.
pub async fn end_round(state: &SharedState) -> Result<SessionView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.end_round()?;
        Ok::<_, GameError>(SessionView::from(&*session))
    })
    .await
}

/// Finish the game. Host only.
pub async fn end_game(state: &SharedState) -> Result<SessionView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.end_game()?;
        Ok::<_, GameError>(SessionView::from(&*session))
    })
    .await
}

/// Back to setup with an empty roster; lobby membership is kept.
pub async fn reset_session(state: &SharedState) -> Result<SessionView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.reset();
        Ok::<_, GameError>(SessionView::from(&*session))
    })
    .await
}

// -------------------------------------------------------------------------
// Roster and tasks
// -------------------------------------------------------------------------

/// Register a participant.
pub async fn add_participant(
    state: &SharedState,
    request: AddParticipantRequest,
) -> Result<CreatedResponse, ServiceError> {
    let id = mutate_with_broadcast(state, |session| session.add_participant(&request.name)).await?;
    Ok(CreatedResponse { id })
}

/// Remove a participant with their tasks.
pub async fn remove_participant(
    state: &SharedState,
    id: ParticipantId,
) -> Result<(), ServiceError> {
    mutate_with_broadcast(state, |session| session.remove_participant(id).map(drop)).await
}

/// Create a pending task for `participant`.
pub async fn add_task(
    state: &SharedState,
    participant: ParticipantId,
    request: AddTaskRequest,
) -> Result<CreatedResponse, ServiceError> {
    let id = mutate_with_broadcast(state, |session| {
        session.add_task(
            participant,
            &request.description,
            request.category,
            request.complexity,
        )
    })
    .await?;
    Ok(CreatedResponse { id })
}

/// Edit an open task.
pub async fn update_task(
    state: &SharedState,
    task_id: TaskId,
    request: UpdateTaskRequest,
) -> Result<TaskView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.update_task(task_id, request.into())?;
        task_view(session, task_id)
    })
    .await
}

/// Delete a task; the score is kept.
pub async fn remove_task(state: &SharedState, task_id: TaskId) -> Result<(), ServiceError> {
    mutate_with_broadcast(state, |session| session.remove_task(task_id).map(drop)).await
}

/// Move a pending task to in-progress.
pub async fn start_task(state: &SharedState, task_id: TaskId) -> Result<TaskView, ServiceError> {
    mutate_with_broadcast(state, |session| {
        session.start_task(task_id)?;
        task_view(session, task_id)
    })
    .await
}

/// Complete a task, crediting its points to the owner once per round.
pub async fn complete_task(
    state: &SharedState,
    task_id: TaskId,
) -> Result<CompleteTaskResponse, ServiceError> {
    mutate_with_broadcast(state, |session| {
        let points = session.complete_task(task_id)?;
        let score = session
            .task(task_id)
            .and_then(|task| session.participant(task.owner()))
            .map_or(0, |owner| owner.score);
        Ok::<_, GameError>(CompleteTaskResponse {
            task_id,
            points,
            score,
        })
    })
    .await
}

/// Add a checklist item.
pub async fn add_subtask(
    state: &SharedState,
    task_id: TaskId,
    request: AddSubtaskRequest,
) -> Result<CreatedResponse, ServiceError> {
    let id = mutate_with_broadcast(state, |session| {
        session.add_subtask(task_id, &request.text)
    })
    .await?;
    Ok(CreatedResponse { id: id.into() })
}

/// Flip a checklist item.
pub async fn toggle_subtask(
    state: &SharedState,
    task_id: TaskId,
    subtask_id: SubtaskId,
) -> Result<SubtaskToggleResponse, ServiceError> {
    let completed =
        mutate_with_broadcast(state, |session| session.toggle_subtask(task_id, subtask_id))
            .await?;
    Ok(SubtaskToggleResponse { completed })
}

fn task_view(session: &Session, task_id: TaskId) -> Result<TaskView, GameError> {
    session
        .task(task_id)
        .map(TaskView::from)
        .ok_or(GameError::TaskNotFound(task_id))
}
