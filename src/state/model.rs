//! Score and task model: participants, tasks, subtasks and the point rules.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier allocated by the session for each participant.
pub type ParticipantId = u64;
/// Identifier allocated by the session for each task, unique per session.
pub type TaskId = u64;
/// Identifier of a subtask, unique within its parent task.
pub type SubtaskId = u32;

/// Closed set of task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Personal errands and self-care.
    Personal,
    /// Household chores.
    Chores,
    /// Professional work.
    Work,
}

impl Category {
    /// Base points awarded for a task of this category before the complexity multiplier.
    pub fn base_points(self) -> u32 {
        match self {
            Category::Personal => 1,
            Category::Chores => 2,
            Category::Work => 3,
        }
    }
}

/// Complexity tier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Quick task.
    Easy,
    /// Task requiring some focus.
    Moderate,
    /// Long or demanding task.
    Hard,
}

impl Complexity {
    /// Multiplier applied to the category base points.
    pub fn multiplier(self) -> f64 {
        match self {
            Complexity::Easy => 1.0,
            Complexity::Moderate => 1.5,
            Complexity::Hard => 2.0,
        }
    }
}

/// Point value of a task: category base times complexity multiplier, rounded half away from zero.
pub fn task_points(category: Category, complexity: Complexity) -> u32 {
    (f64::from(category.base_points()) * complexity.multiplier()).round() as u32
}

/// Lifecycle of a task. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Created, not started.
    Pending,
    /// Work on the task has begun.
    InProgress,
    /// Done; points have been credited.
    Completed,
}

impl TaskStatus {
    fn rank(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Checklist item attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subtask {
    /// Identifier within the parent task.
    pub id: SubtaskId,
    /// Free-form text.
    pub text: String,
    /// Whether the item has been ticked off.
    pub completed: bool,
}

/// A scoring task owned by a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    owner: ParticipantId,
    description: String,
    category: Category,
    complexity: Complexity,
    points: u32,
    status: TaskStatus,
    subtasks: Vec<Subtask>,
    created_at: SystemTime,
    completed_at: Option<SystemTime>,
}

impl Task {
    /// Build a pending task with points derived from its category and complexity.
    pub fn new(
        id: TaskId,
        owner: ParticipantId,
        description: String,
        category: Category,
        complexity: Complexity,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id,
            owner,
            description,
            category,
            complexity,
            points: task_points(category, complexity),
            status: TaskStatus::Pending,
            subtasks: Vec::new(),
            created_at,
            completed_at: None,
        }
    }

    /// Rebuild a task from replicated data. Points are recomputed and the completion
    /// timestamp is dropped unless the status is completed.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: TaskId,
        owner: ParticipantId,
        description: String,
        category: Category,
        complexity: Complexity,
        status: TaskStatus,
        subtasks: Vec<Subtask>,
        created_at: SystemTime,
        completed_at: Option<SystemTime>,
    ) -> Self {
        let completed_at = match status {
            TaskStatus::Completed => Some(completed_at.unwrap_or(created_at)),
            _ => None,
        };
        Self {
            id,
            owner,
            description,
            category,
            complexity,
            points: task_points(category, complexity),
            status,
            subtasks,
            created_at,
            completed_at,
        }
    }

    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Participant owning the task.
    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    /// Task text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Scoring category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Scoring multiplier.
    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    /// Derived point value; never set directly.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Lifecycle status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Checklist items in creation order.
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Creation time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Set if and only if the task is completed.
    pub fn completed_at(&self) -> Option<SystemTime> {
        self.completed_at
    }

    /// Whether the task reached completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// Change category and/or complexity, recomputing the point value.
    pub(crate) fn reclassify(&mut self, category: Category, complexity: Complexity) {
        self.category = category;
        self.complexity = complexity;
        self.points = task_points(category, complexity);
    }

    pub(crate) fn mark_in_progress(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub(crate) fn mark_completed(&mut self, at: SystemTime) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    pub(crate) fn push_subtask(&mut self, text: String) -> SubtaskId {
        let id = self
            .subtasks
            .iter()
            .map(|subtask| subtask.id)
            .max()
            .map_or(1, |max| max + 1);
        self.subtasks.push(Subtask {
            id,
            text,
            completed: false,
        });
        id
    }

    pub(crate) fn subtask_mut(&mut self, id: SubtaskId) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|subtask| subtask.id == id)
    }
}

/// A player in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Session-allocated identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Accumulated points.
    pub score: u32,
    /// Owned tasks, in creation order.
    pub tasks: Vec<Task>,
    /// When the participant joined the session.
    pub joined_at: SystemTime,
}

impl Participant {
    /// Fresh participant with a zero score and no tasks.
    pub fn new(id: ParticipantId, name: String, joined_at: SystemTime) -> Self {
        Self {
            id,
            name,
            score: 0,
            tasks: Vec::new(),
            joined_at,
        }
    }

    /// Owned task with id `id`.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == id)
    }

    /// Number of completed tasks.
    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed()).count()
    }
}
