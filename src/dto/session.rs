use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_not_blank},
    services::sync_service::SyncStatus,
    state::{
        lobby::{Role, SessionMode},
        model::{Category, Complexity, Participant, Subtask, Task, TaskStatus},
        session::{LeaderboardEntry, Session, TaskUpdate},
        state_machine::GamePhase,
    },
};

/// Full session state as rendered by the UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    /// Join code while in a lobby.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lobby_code: Option<String>,
    /// Host or guest.
    pub role: Role,
    /// Online or offline.
    pub mode: SessionMode,
    /// Current phase.
    pub phase: GamePhase,
    /// Current round, starting at 1.
    pub round: u32,
    /// Rounds in the game.
    pub total_rounds: u32,
    /// Seconds left in the current timed phase.
    pub timer: u32,
    /// Roster in join order.
    pub participants: Vec<ParticipantView>,
}

/// Participant with their tasks.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantView {
    /// Participant identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Points earned so far.
    pub score: u32,
    /// RFC 3339 timestamp.
    pub joined_at: String,
    /// Tasks owned by the participant.
    pub tasks: Vec<TaskView>,
}

/// Task as shown to the UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskView {
    /// Task identifier.
    pub id: u64,
    /// What the task is about.
    pub description: String,
    /// Scoring category.
    pub category: Category,
    /// Scoring multiplier.
    pub complexity: Complexity,
    /// Points credited on completion.
    pub points: u32,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 completion timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Checklist items.
    pub subtasks: Vec<Subtask>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            lobby_code: session.lobby_code().map(ToString::to_string),
            role: session.role(),
            mode: session.mode(),
            phase: session.phase(),
            round: session.round(),
            total_rounds: session.total_rounds(),
            timer: session.timer(),
            participants: session.participants().map(ParticipantView::from).collect(),
        }
    }
}

impl From<&Participant> for ParticipantView {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            name: participant.name.clone(),
            score: participant.score,
            joined_at: format_system_time(participant.joined_at),
            tasks: participant.tasks.iter().map(TaskView::from).collect(),
        }
    }
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            description: task.description().to_string(),
            category: task.category(),
            complexity: task.complexity(),
            points: task.points(),
            status: task.status(),
            created_at: format_system_time(task.created_at()),
            completed_at: task.completed_at().map(format_system_time),
            subtasks: task.subtasks().to_vec(),
        }
    }
}

/// Leaderboard row, highest score first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// Position, starting at 1.
    pub rank: usize,
    /// Participant identifier.
    pub participant_id: u64,
    /// Display name.
    pub name: String,
    /// Points earned so far.
    pub score: u32,
    /// Tasks completed.
    pub completed_tasks: usize,
}

impl LeaderboardRow {
    /// Number rows from 1 in leaderboard order.
    pub fn ranked(entries: Vec<LeaderboardEntry>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Self {
                rank: index + 1,
                participant_id: entry.participant_id,
                name: entry.name,
                score: entry.score,
                completed_tasks: entry.completed_tasks,
            })
            .collect()
    }
}

/// Payload used to register a participant.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddParticipantRequest {
    /// Display name.
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
}

/// Payload used to create a task.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddTaskRequest {
    /// What the task is about.
    #[validate(length(min = 1, max = 280), custom(function = "validate_not_blank"))]
    pub description: String,
    /// Scoring category.
    pub category: Category,
    /// Scoring multiplier.
    pub complexity: Complexity,
}

/// Partial task update; absent fields are left as they are.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    /// New description.
    #[validate(length(min = 1, max = 280), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
    /// New category.
    pub category: Option<Category>,
    /// New complexity.
    pub complexity: Option<Complexity>,
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(request: UpdateTaskRequest) -> Self {
        TaskUpdate {
            description: request.description,
            category: request.category,
            complexity: request.complexity,
        }
    }
}

/// Payload used to add a checklist item to a task.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddSubtaskRequest {
    /// Checklist item text.
    #[validate(length(min = 1, max = 280), custom(function = "validate_not_blank"))]
    pub text: String,
}

/// Identifier of a newly created entity.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// Identifier assigned by the session.
    pub id: u64,
}

/// Outcome of completing a task.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteTaskResponse {
    /// Completed task.
    pub task_id: u64,
    /// Points credited to the owner by this call.
    pub points: u32,
    /// Owner's score afterwards.
    pub score: u32,
}

/// New state of a toggled subtask.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubtaskToggleResponse {
    /// Whether the subtask is now done.
    pub completed: bool,
}

/// Sync loop status.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusView {
    /// Whether a sync loop is active.
    pub running: bool,
    /// Cycles run since the loop started.
    pub cycles: u64,
    /// Cycles that failed.
    pub failures: u64,
    /// RFC 3339 end of the last successful cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<String>,
    /// Message of the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<SyncStatus> for SyncStatusView {
    fn from(status: SyncStatus) -> Self {
        Self {
            running: status.running,
            cycles: status.cycles,
            failures: status.failures,
            last_success: status.last_success.map(format_system_time),
            last_error: status.last_error,
        }
    }
}
