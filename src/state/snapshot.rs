//! Serializable projection of a session exchanged with the document store.
//!
//! Snapshots carry no revision or clock: two snapshots are the same state exactly when
//! they compare equal field by field.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::state::{
    model::{Category, Complexity, Participant, ParticipantId, Subtask, Task, TaskId, TaskStatus},
    state_machine::GamePhase,
};

/// Whole-session document pushed to and pulled from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Lobby the document belongs to.
    pub lobby_code: String,
    /// Current phase.
    pub phase: GamePhase,
    /// Current round.
    pub round: u32,
    /// Rounds in the game.
    pub total_rounds: u32,
    /// Seconds left in the current phase.
    pub timer: u32,
    /// Roster in join order.
    pub participants: Vec<ParticipantSnapshot>,
}

/// Replicated participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Points earned so far.
    pub score: u32,
    /// Join time.
    pub joined_at: SystemTime,
    /// Owned tasks.
    pub tasks: Vec<TaskSnapshot>,
}

/// Replicated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,
    /// Task text.
    pub description: String,
    /// Scoring category.
    pub category: Category,
    /// Scoring multiplier.
    pub complexity: Complexity,
    /// Points credited on completion.
    pub points: u32,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Creation time.
    pub created_at: SystemTime,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<SystemTime>,
    /// Checklist items.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Snapshot {
    /// Number of participants in the snapshot.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Whether `other` is this snapshot with only the countdown moved.
    pub fn differs_only_in_timer(&self, other: &Snapshot) -> bool {
        self.timer != other.timer
            && self.lobby_code == other.lobby_code
            && self.phase == other.phase
            && self.round == other.round
            && self.total_rounds == other.total_rounds
            && self.participants == other.participants
    }

    /// Highest participant id present, if any.
    pub(crate) fn max_participant_id(&self) -> Option<ParticipantId> {
        self.participants.iter().map(|p| p.id).max()
    }

    /// Highest task id present, if any.
    pub(crate) fn max_task_id(&self) -> Option<TaskId> {
        self.participants
            .iter()
            .flat_map(|p| p.tasks.iter().map(|t| t.id))
            .max()
    }
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            description: task.description().to_string(),
            category: task.category(),
            complexity: task.complexity(),
            points: task.points(),
            status: task.status(),
            created_at: task.created_at(),
            completed_at: task.completed_at(),
            subtasks: task.subtasks().to_vec(),
        }
    }
}

impl From<&Participant> for ParticipantSnapshot {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            name: participant.name.clone(),
            score: participant.score,
            joined_at: participant.joined_at,
            tasks: participant.tasks.iter().map(TaskSnapshot::from).collect(),
        }
    }
}

impl From<ParticipantSnapshot> for Participant {
    fn from(value: ParticipantSnapshot) -> Self {
        let owner = value.id;
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            joined_at: value.joined_at,
            tasks: value
                .tasks
                .into_iter()
                .map(|task| {
                    Task::restore(
                        task.id,
                        owner,
                        task.description,
                        task.category,
                        task.complexity,
                        task.status,
                        task.subtasks,
                        task.created_at,
                        task.completed_at,
                    )
                })
                .collect(),
        }
    }
}
