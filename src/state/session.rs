//! Session aggregate: phase/round/timer plus the participants and tasks of one game.

use std::{
    collections::{HashMap, HashSet},
    time::SystemTime,
};

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    config::SessionConfig,
    state::{
        lobby::{LobbyCode, Role, SessionMode},
        model::{
            Category, Complexity, Participant, ParticipantId, SubtaskId, Task, TaskId, TaskStatus,
        },
        snapshot::{ParticipantSnapshot, Snapshot},
        state_machine::{GamePhase, InvalidTransition, PhaseEvent, PhaseTimer, next_phase},
    },
};

const MAX_NAME_LENGTH: usize = 64;
const MAX_DESCRIPTION_LENGTH: usize = 280;

/// Errors raised by session mutators. A failed call leaves the session unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Operation not allowed in the current phase (always the case once game-over).
    #[error(transparent)]
    InvalidPhaseTransition(#[from] InvalidTransition),
    /// Unknown participant.
    #[error("participant `{0}` not found")]
    ParticipantNotFound(ParticipantId),
    /// Unknown task.
    #[error("task `{0}` not found")]
    TaskNotFound(TaskId),
    /// Unknown subtask on a known task.
    #[error("subtask `{subtask_id}` not found on task `{task_id}`")]
    SubtaskNotFound {
        /// Parent task.
        task_id: TaskId,
        /// Missing subtask.
        subtask_id: SubtaskId,
    },
    /// Participant limit reached.
    #[error("session is full ({max} participants)")]
    CapacityExceeded {
        /// Configured maximum.
        max: u32,
    },
    /// Task status cannot move as requested.
    #[error("task `{task_id}` cannot {action} while {status}")]
    InvalidStateTransition {
        /// Task concerned.
        task_id: TaskId,
        /// Status the task is in.
        status: TaskStatus,
        /// Operation that was refused.
        action: &'static str,
    },
    /// Phase transitions are reserved to the host.
    #[error("only the host can {action}")]
    NotHost {
        /// Operation that was refused.
        action: &'static str,
    },
    /// Rejected user input (empty names, oversized text...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Replicated snapshot violates the session invariants.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl GameError {
    /// Whether the error references an unknown entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GameError::ParticipantNotFound(_)
                | GameError::TaskNotFound(_)
                | GameError::SubtaskNotFound { .. }
        )
    }
}

/// Scoring actions recorded per participant for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerAction {
    /// Points for this task have been credited.
    TaskCompleted(TaskId),
}

/// Result of a single timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Phase has no running timer (setup or game-over).
    Idle,
    /// Timer decremented without a phase change.
    Counting {
        /// Seconds left in the phase.
        remaining: u32,
    },
    /// Timer elapsed and the phase changed.
    Transitioned {
        /// New phase.
        phase: GamePhase,
        /// Round after the transition.
        round: u32,
    },
}

/// Row of the leaderboard projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Participant identifier.
    pub participant_id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Points earned so far.
    pub score: u32,
    /// Tasks completed.
    pub completed_tasks: usize,
}

/// Optional changes applied by [`Session::update_task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<Category>,
    /// New complexity.
    pub complexity: Option<Complexity>,
}

/// One game instance: lobby identity, phase progression and the participant roster.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    lobby_code: Option<LobbyCode>,
    role: Role,
    mode: SessionMode,
    phase: GamePhase,
    round: u32,
    total_rounds: u32,
    timer: u32,
    participants: IndexMap<ParticipantId, Participant>,
    ledger: HashMap<ParticipantId, HashSet<LedgerAction>>,
    next_participant_id: ParticipantId,
    next_task_id: TaskId,
}

impl Session {
    /// Create a session in setup, round 1, timer 0.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            lobby_code: None,
            role: Role::Host,
            mode: SessionMode::Offline,
            phase: GamePhase::Setup,
            round: 1,
            total_rounds: config.max_rounds(),
            timer: 0,
            participants: IndexMap::new(),
            ledger: HashMap::new(),
            next_participant_id: 1,
            next_task_id: 1,
        }
    }

    // ---------------------------------------------------------------------
    // Read-only projections
    // ---------------------------------------------------------------------

    /// Validated limits of this session.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Join code while in a lobby.
    pub fn lobby_code(&self) -> Option<&LobbyCode> {
        self.lobby_code.as_ref()
    }

    /// Host or guest; host outside a lobby.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Online or offline.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current round, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Rounds in the game.
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Seconds left in the current phase.
    pub fn timer(&self) -> u32 {
        self.timer
    }

    /// Participants in join order.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Roster size.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Participant with id `id`.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Task with id `id`, whoever owns it.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.participants.values().find_map(|p| p.task(id))
    }

    /// Actions already recorded for `participant` in the current round.
    pub fn ledger_actions(&self, participant: ParticipantId) -> Option<&HashSet<LedgerAction>> {
        self.ledger.get(&participant)
    }

    /// Scores sorted from highest to lowest; ties keep join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries = self
            .participants
            .values()
            .map(|p| LeaderboardEntry {
                participant_id: p.id,
                name: p.name.clone(),
                score: p.score,
                completed_tasks: p.completed_tasks(),
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Project the session into the replicated document layout.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            lobby_code: self
                .lobby_code
                .as_ref()
                .map(|code| code.to_string())
                .unwrap_or_default(),
            phase: self.phase,
            round: self.round,
            total_rounds: self.total_rounds,
            timer: self.timer,
            participants: self
                .participants
                .values()
                .map(ParticipantSnapshot::from)
                .collect(),
        }
    }

    // ---------------------------------------------------------------------
    // Phase progression
    // ---------------------------------------------------------------------

    /// Advance the phase timer by one unit, transitioning when it runs out.
    pub fn advance_tick(&mut self) -> TickOutcome {
        if !self.phase.is_timed() {
            return TickOutcome::Idle;
        }

        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return TickOutcome::Counting {
                remaining: self.timer,
            };
        }

        match self.transition(PhaseEvent::TimerElapsed) {
            Ok(()) => TickOutcome::Transitioned {
                phase: self.phase,
                round: self.round,
            },
            // Timed phases always accept TimerElapsed.
            Err(_) => TickOutcome::Idle,
        }
    }

    /// Host-only: enter the work phase (from setup, or from a break before the last round).
    pub fn start_round(&mut self) -> Result<(), GameError> {
        self.ensure_host(PhaseEvent::StartRound.action())?;
        self.transition(PhaseEvent::StartRound)
    }

    /// Host-only: cut the work phase short and start the break.
    pub fn end_round(&mut self) -> Result<(), GameError> {
        self.ensure_host(PhaseEvent::EndRound.action())?;
        self.transition(PhaseEvent::EndRound)
    }

    /// Host-only: move to the terminal game-over phase.
    pub fn end_game(&mut self) -> Result<(), GameError> {
        self.ensure_host(PhaseEvent::EndGame.action())?;
        self.transition(PhaseEvent::EndGame)
    }

    fn transition(&mut self, event: PhaseEvent) -> Result<(), GameError> {
        let change = next_phase(self.phase, self.round, self.total_rounds, event)?;

        if change.advances_round(self.round) {
            self.ledger.clear();
        }

        self.phase = change.phase;
        self.round = change.round;
        self.timer = match change.timer {
            PhaseTimer::Round => self.config.round_seconds(),
            PhaseTimer::Break => self.config.break_seconds(),
            PhaseTimer::Stopped => 0,
        };
        Ok(())
    }

    /// Return to a fresh setup state, keeping the lobby identity and configuration.
    pub fn reset(&mut self) {
        let fresh = Session::new(self.config);
        *self = Session {
            lobby_code: self.lobby_code.take(),
            role: self.role,
            mode: self.mode,
            ..fresh
        };
    }

    // ---------------------------------------------------------------------
    // Roster
    // ---------------------------------------------------------------------

    /// Register a participant with a zero score.
    pub fn add_participant(&mut self, name: &str) -> Result<ParticipantId, GameError> {
        self.ensure_active("add a participant")?;
        let name = sanitize_text(name, "participant name", MAX_NAME_LENGTH)?;

        let max = self.config.max_players();
        if self.participants.len() >= max as usize {
            return Err(GameError::CapacityExceeded { max });
        }

        let id = self.next_participant_id;
        self.next_participant_id += 1;
        self.participants
            .insert(id, Participant::new(id, name, SystemTime::now()));
        Ok(id)
    }

    /// Remove a participant with their tasks and ledger entries.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<Participant, GameError> {
        self.ensure_active("remove a participant")?;
        let removed = self
            .participants
            .shift_remove(&id)
            .ok_or(GameError::ParticipantNotFound(id))?;
        self.ledger.remove(&id);
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    /// Create a pending task owned by `participant`.
    pub fn add_task(
        &mut self,
        participant: ParticipantId,
        description: &str,
        category: Category,
        complexity: Complexity,
    ) -> Result<TaskId, GameError> {
        self.ensure_active("add a task")?;
        let description = sanitize_text(description, "task description", MAX_DESCRIPTION_LENGTH)?;

        let id = self.next_task_id;
        let owner = self
            .participants
            .get_mut(&participant)
            .ok_or(GameError::ParticipantNotFound(participant))?;
        owner.tasks.push(Task::new(
            id,
            participant,
            description,
            category,
            complexity,
            SystemTime::now(),
        ));
        self.next_task_id += 1;
        Ok(id)
    }

    /// Move a pending task to in-progress.
    pub fn start_task(&mut self, task_id: TaskId) -> Result<(), GameError> {
        self.ensure_active("start a task")?;
        let task = self.task_mut(task_id)?;
        if task.status() != TaskStatus::Pending {
            return Err(GameError::InvalidStateTransition {
                task_id,
                status: task.status(),
                action: "start",
            });
        }
        task.mark_in_progress();
        Ok(())
    }

    /// Complete a task and credit its points to the owner, exactly once.
    ///
    /// Returns the number of points credited. Completing an already completed task fails
    /// and leaves the owner's score untouched.
    pub fn complete_task(&mut self, task_id: TaskId) -> Result<u32, GameError> {
        self.ensure_active("complete a task")?;

        let owner_id = self.task(task_id).ok_or(GameError::TaskNotFound(task_id))?.owner();
        let action = LedgerAction::TaskCompleted(task_id);
        let already_credited = self
            .ledger
            .get(&owner_id)
            .is_some_and(|actions| actions.contains(&action));

        let owner = self
            .participants
            .get_mut(&owner_id)
            .ok_or(GameError::ParticipantNotFound(owner_id))?;
        let task = owner
            .task_mut(task_id)
            .ok_or(GameError::TaskNotFound(task_id))?;

        if already_credited || !task.status().can_advance_to(TaskStatus::Completed) {
            return Err(GameError::InvalidStateTransition {
                task_id,
                status: task.status(),
                action: "complete",
            });
        }

        let points = task.points();
        task.mark_completed(SystemTime::now());
        owner.score = owner.score.saturating_add(points);
        self.ledger.entry(owner_id).or_default().insert(action);
        Ok(points)
    }

    /// Edit an open task; points follow category and complexity.
    pub fn update_task(&mut self, task_id: TaskId, update: TaskUpdate) -> Result<(), GameError> {
        self.ensure_active("update a task")?;
        let description = update
            .description
            .as_deref()
            .map(|text| sanitize_text(text, "task description", MAX_DESCRIPTION_LENGTH))
            .transpose()?;

        let task = self.task_mut(task_id)?;
        if task.is_completed() {
            return Err(GameError::InvalidStateTransition {
                task_id,
                status: task.status(),
                action: "be edited",
            });
        }

        if let Some(description) = description {
            task.set_description(description);
        }
        let category = update.category.unwrap_or(task.category());
        let complexity = update.complexity.unwrap_or(task.complexity());
        if category != task.category() || complexity != task.complexity() {
            task.reclassify(category, complexity);
        }
        Ok(())
    }

    /// Delete a task. Points already credited stay with the owner.
    pub fn remove_task(&mut self, task_id: TaskId) -> Result<Task, GameError> {
        self.ensure_active("remove a task")?;
        let owner_id = self.task(task_id).ok_or(GameError::TaskNotFound(task_id))?.owner();
        let owner = self
            .participants
            .get_mut(&owner_id)
            .ok_or(GameError::ParticipantNotFound(owner_id))?;
        let index = owner
            .tasks
            .iter()
            .position(|task| task.id() == task_id)
            .ok_or(GameError::TaskNotFound(task_id))?;
        Ok(owner.tasks.remove(index))
    }

    /// Append a checklist item to an open task.
    pub fn add_subtask(&mut self, task_id: TaskId, text: &str) -> Result<SubtaskId, GameError> {
        self.ensure_active("add a subtask")?;
        let text = sanitize_text(text, "subtask text", MAX_DESCRIPTION_LENGTH)?;
        let task = self.task_mut(task_id)?;
        Ok(task.push_subtask(text))
    }

    /// Flip a subtask's completed flag, returning the new value.
    pub fn toggle_subtask(
        &mut self,
        task_id: TaskId,
        subtask_id: SubtaskId,
    ) -> Result<bool, GameError> {
        self.ensure_active("toggle a subtask")?;
        let task = self.task_mut(task_id)?;
        let subtask = task
            .subtask_mut(subtask_id)
            .ok_or(GameError::SubtaskNotFound {
                task_id,
                subtask_id,
            })?;
        subtask.completed = !subtask.completed;
        Ok(subtask.completed)
    }

    // ---------------------------------------------------------------------
    // Replication
    // ---------------------------------------------------------------------

    /// Replace phase, round, timer and roster wholesale with a replicated snapshot.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<(), GameError> {
        self.validate_snapshot(&snapshot)?;

        let round_changed = snapshot.round != self.round;
        let next_participant_id = snapshot
            .max_participant_id()
            .map_or(self.next_participant_id, |max| {
                self.next_participant_id.max(max + 1)
            });
        let next_task_id = snapshot
            .max_task_id()
            .map_or(self.next_task_id, |max| self.next_task_id.max(max + 1));

        self.phase = snapshot.phase;
        self.round = snapshot.round;
        self.total_rounds = snapshot.total_rounds;
        self.timer = snapshot.timer;
        self.participants = snapshot
            .participants
            .into_iter()
            .map(|p| (p.id, Participant::from(p)))
            .collect();
        self.next_participant_id = next_participant_id;
        self.next_task_id = next_task_id;

        if round_changed {
            self.ledger.clear();
        } else {
            self.rebuild_ledger();
        }
        Ok(())
    }

    /// Keep only credits whose task is still completed in the current roster.
    fn rebuild_ledger(&mut self) {
        let participants = &self.participants;
        self.ledger.retain(|id, actions| {
            let Some(participant) = participants.get(id) else {
                return false;
            };
            actions.retain(|action| match action {
                LedgerAction::TaskCompleted(task_id) => participant
                    .task(*task_id)
                    .is_some_and(Task::is_completed),
            });
            !actions.is_empty()
        });
    }

    fn validate_snapshot(&self, snapshot: &Snapshot) -> Result<(), GameError> {
        if let Some(code) = &self.lobby_code {
            if !snapshot.lobby_code.eq_ignore_ascii_case(code.as_str()) {
                return Err(GameError::InvalidSnapshot(format!(
                    "snapshot belongs to lobby `{}`, expected `{code}`",
                    snapshot.lobby_code
                )));
            }
        }

        if snapshot.total_rounds == 0 {
            return Err(GameError::InvalidSnapshot(
                "total rounds must be positive".into(),
            ));
        }

        if snapshot.total_rounds > self.config.max_rounds() {
            return Err(GameError::InvalidSnapshot(format!(
                "{} rounds exceed the configured maximum of {}",
                snapshot.total_rounds,
                self.config.max_rounds()
            )));
        }

        if snapshot.round == 0 || snapshot.round > snapshot.total_rounds {
            return Err(GameError::InvalidSnapshot(format!(
                "round {} outside 1..={}",
                snapshot.round, snapshot.total_rounds
            )));
        }

        if !snapshot.phase.is_timed() && snapshot.timer != 0 {
            return Err(GameError::InvalidSnapshot(format!(
                "timer {} set while {}",
                snapshot.timer, snapshot.phase
            )));
        }

        let max_players = self.config.max_players() as usize;
        if snapshot.participant_count() > max_players {
            return Err(GameError::InvalidSnapshot(format!(
                "{} participants exceed the limit of {max_players}",
                snapshot.participant_count()
            )));
        }

        let mut participant_ids = HashSet::new();
        let mut task_ids = HashSet::new();
        for participant in &snapshot.participants {
            if !participant_ids.insert(participant.id) {
                return Err(GameError::InvalidSnapshot(format!(
                    "duplicate participant id `{}`",
                    participant.id
                )));
            }
            for task in &participant.tasks {
                if !task_ids.insert(task.id) {
                    return Err(GameError::InvalidSnapshot(format!(
                        "duplicate task id `{}`",
                        task.id
                    )));
                }
            }
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lobby identity
    // ---------------------------------------------------------------------

    pub(crate) fn set_lobby(&mut self, code: LobbyCode, role: Role) {
        self.lobby_code = Some(code);
        self.role = role;
    }

    pub(crate) fn clear_lobby(&mut self) -> Option<LobbyCode> {
        self.role = Role::Host;
        self.lobby_code.take()
    }

    pub(crate) fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }

    // ---------------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------------

    fn ensure_active(&self, action: &'static str) -> Result<(), GameError> {
        if self.phase.is_terminal() {
            return Err(InvalidTransition {
                from: self.phase,
                action,
            }
            .into());
        }
        Ok(())
    }

    fn ensure_host(&self, action: &'static str) -> Result<(), GameError> {
        if self.role != Role::Host {
            return Err(GameError::NotHost { action });
        }
        Ok(())
    }

    fn task_mut(&mut self, task_id: TaskId) -> Result<&mut Task, GameError> {
        self.participants
            .values_mut()
            .find_map(|p| p.task_mut(task_id))
            .ok_or(GameError::TaskNotFound(task_id))
    }
}

fn sanitize_text(input: &str, field: &str, max_len: usize) -> Result<String, GameError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(GameError::InvalidInput(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_players: u32, max_rounds: u32) -> SessionConfig {
        SessionConfig::new(max_players, max_rounds, 1, 1).unwrap()
    }

    fn ticks(session: &mut Session, count: u32) {
        for _ in 0..count {
            session.advance_tick();
        }
    }

    #[test]
    fn fresh_session_is_in_setup() {
        for (players, rounds) in [(1, 1), (8, 2), (32, 24)] {
            let session = Session::new(config(players, rounds));
            assert_eq!(session.phase(), GamePhase::Setup);
            assert_eq!(session.round(), 1);
            assert_eq!(session.timer(), 0);
            assert_eq!(session.total_rounds(), rounds);
        }
    }

    #[test]
    fn example_game_runs_to_game_over() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "ship release", Category::Work, Complexity::Hard)
            .unwrap();
        assert_eq!(session.task(task).unwrap().points(), 6);

        assert_eq!(session.complete_task(task).unwrap(), 6);
        assert_eq!(session.participant(ada).unwrap().score, 6);

        session.start_round().unwrap();
        assert_eq!(session.phase(), GamePhase::Work);
        assert_eq!(session.timer(), 60);

        ticks(&mut session, 59);
        assert_eq!(session.phase(), GamePhase::Work);
        assert_eq!(session.timer(), 1);
        assert_eq!(
            session.advance_tick(),
            TickOutcome::Transitioned {
                phase: GamePhase::Break,
                round: 1
            }
        );

        ticks(&mut session, 60);
        assert_eq!(session.phase(), GamePhase::Work);
        assert_eq!(session.round(), 2);

        ticks(&mut session, 120);
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.timer(), 0);

        assert_eq!(session.advance_tick(), TickOutcome::Idle);
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn setup_does_not_tick() {
        let mut session = Session::new(config(8, 2));
        assert_eq!(session.advance_tick(), TickOutcome::Idle);
        assert_eq!(session.timer(), 0);
    }

    #[test]
    fn completing_twice_fails_without_double_credit() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "dishes", Category::Chores, Complexity::Moderate)
            .unwrap();

        assert_eq!(session.complete_task(task).unwrap(), 3);
        let err = session.complete_task(task).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidStateTransition {
                status: TaskStatus::Completed,
                ..
            }
        ));
        assert_eq!(session.participant(ada).unwrap().score, 3);
        assert!(session.task(task).unwrap().completed_at().is_some());
    }

    #[test]
    fn start_then_complete_records_ledger_action() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "journal", Category::Personal, Complexity::Easy)
            .unwrap();

        session.start_task(task).unwrap();
        assert_eq!(session.task(task).unwrap().status(), TaskStatus::InProgress);
        assert!(session.start_task(task).is_err());

        session.complete_task(task).unwrap();
        assert!(
            session
                .ledger_actions(ada)
                .unwrap()
                .contains(&LedgerAction::TaskCompleted(task))
        );
    }

    #[test]
    fn ledger_is_cleared_when_round_advances() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "emails", Category::Work, Complexity::Easy)
            .unwrap();
        session.complete_task(task).unwrap();

        session.start_round().unwrap();
        session.end_round().unwrap();
        assert!(session.ledger_actions(ada).is_some());

        session.start_round().unwrap();
        assert_eq!(session.round(), 2);
        assert!(session.ledger_actions(ada).is_none());
    }

    #[test]
    fn capacity_is_enforced() {
        let mut session = Session::new(config(1, 2));
        session.add_participant("Ada").unwrap();
        let err = session.add_participant("Grace").unwrap_err();
        assert_eq!(err, GameError::CapacityExceeded { max: 1 });
        assert_eq!(session.participant_count(), 1);
    }

    #[test]
    fn removing_participant_purges_tasks_and_ledger_only_for_them() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let grace = session.add_participant("Grace").unwrap();
        let ada_task = session
            .add_task(ada, "report", Category::Work, Complexity::Hard)
            .unwrap();
        let grace_task = session
            .add_task(grace, "groceries", Category::Chores, Complexity::Easy)
            .unwrap();
        session.complete_task(ada_task).unwrap();
        session.complete_task(grace_task).unwrap();

        session.remove_participant(ada).unwrap();

        assert!(session.task(ada_task).is_none());
        assert!(session.ledger_actions(ada).is_none());
        let board = session.leaderboard();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].participant_id, grace);
        assert_eq!(board[0].score, 2);

        assert_eq!(
            session.remove_participant(ada).unwrap_err(),
            GameError::ParticipantNotFound(ada)
        );
    }

    #[test]
    fn unknown_references_fail_with_not_found() {
        let mut session = Session::new(config(8, 2));
        let err = session
            .add_task(42, "x", Category::Work, Complexity::Easy)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(session.complete_task(7).unwrap_err().is_not_found());
    }

    #[test]
    fn game_over_refuses_mutations() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "read", Category::Personal, Complexity::Easy)
            .unwrap();
        session.end_game().unwrap();

        assert!(matches!(
            session.complete_task(task),
            Err(GameError::InvalidPhaseTransition(_))
        ));
        assert!(matches!(
            session.add_participant("Grace"),
            Err(GameError::InvalidPhaseTransition(_))
        ));
        assert!(matches!(
            session.start_round(),
            Err(GameError::InvalidPhaseTransition(_))
        ));
        assert!(matches!(
            session.end_game(),
            Err(GameError::InvalidPhaseTransition(_))
        ));
        assert_eq!(session.participant(ada).unwrap().score, 0);
    }

    #[test]
    fn guests_cannot_drive_phases() {
        let mut session = Session::new(config(8, 2));
        session.set_lobby(LobbyCode::parse("ABC123").unwrap(), Role::Guest);
        assert!(matches!(
            session.start_round(),
            Err(GameError::NotHost { .. })
        ));
        assert_eq!(session.phase(), GamePhase::Setup);
    }

    #[test]
    fn update_task_recomputes_points_until_completed() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "tidy", Category::Chores, Complexity::Easy)
            .unwrap();

        session
            .update_task(
                task,
                TaskUpdate {
                    complexity: Some(Complexity::Hard),
                    ..TaskUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(session.task(task).unwrap().points(), 4);

        session.complete_task(task).unwrap();
        assert!(
            session
                .update_task(
                    task,
                    TaskUpdate {
                        category: Some(Category::Work),
                        ..TaskUpdate::default()
                    }
                )
                .is_err()
        );
        assert_eq!(session.task(task).unwrap().points(), 4);
    }

    #[test]
    fn subtasks_can_be_added_and_toggled() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "move out", Category::Chores, Complexity::Hard)
            .unwrap();
        let sub = session.add_subtask(task, "pack books").unwrap();
        assert!(session.toggle_subtask(task, sub).unwrap());
        assert!(!session.toggle_subtask(task, sub).unwrap());
        assert!(session.toggle_subtask(task, sub + 1).unwrap_err().is_not_found());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut session = Session::new(config(8, 2));
        assert!(matches!(
            session.add_participant("   "),
            Err(GameError::InvalidInput(_))
        ));
        assert_eq!(session.participant_count(), 0);
    }

    #[test]
    fn reset_keeps_lobby_identity() {
        let mut session = Session::new(config(8, 2));
        session.set_lobby(LobbyCode::parse("ABC123").unwrap(), Role::Host);
        session.add_participant("Ada").unwrap();
        session.start_round().unwrap();

        session.reset();

        assert_eq!(session.phase(), GamePhase::Setup);
        assert_eq!(session.participant_count(), 0);
        assert_eq!(session.lobby_code().unwrap().as_str(), "ABC123");
        assert_eq!(session.add_participant("Grace").unwrap(), 1);
    }

    #[test]
    fn apply_snapshot_replaces_state_and_advances_id_counters() {
        let mut source = Session::new(config(8, 2));
        let ada = source.add_participant("Ada").unwrap();
        let task = source
            .add_task(ada, "report", Category::Work, Complexity::Moderate)
            .unwrap();
        source.complete_task(task).unwrap();
        source.start_round().unwrap();

        let mut target = Session::new(config(8, 2));
        target.add_participant("Local").unwrap();
        target.apply_snapshot(source.snapshot()).unwrap();

        assert_eq!(target.snapshot(), source.snapshot());
        assert_eq!(target.phase(), GamePhase::Work);
        let next = target.add_participant("Grace").unwrap();
        assert!(next > ada);
    }

    #[test]
    fn apply_snapshot_rejects_inconsistent_documents() {
        let mut session = Session::new(config(8, 2));
        session.set_lobby(LobbyCode::parse("ABC123").unwrap(), Role::Guest);

        let mut snapshot = session.snapshot();
        snapshot.round = 3;
        assert!(matches!(
            session.apply_snapshot(snapshot),
            Err(GameError::InvalidSnapshot(_))
        ));

        let mut snapshot = session.snapshot();
        snapshot.lobby_code = "ZZZ999".into();
        assert!(session.apply_snapshot(snapshot).is_err());
        assert_eq!(session.round(), 1);
    }

    #[test]
    fn apply_snapshot_enforces_session_limits() {
        let mut session = Session::new(config(2, 2));
        session.set_lobby(LobbyCode::parse("ABC123").unwrap(), Role::Guest);
        session.add_participant("Local").unwrap();
        let before = session.snapshot();

        let mut crowded = Session::new(config(3, 2));
        for name in ["Ada", "Grace", "Linus"] {
            crowded.add_participant(name).unwrap();
        }
        let mut too_many = crowded.snapshot();
        too_many.lobby_code = "ABC123".into();

        let mut idle_timer = session.snapshot();
        idle_timer.timer = 30;

        let mut finished_timer = session.snapshot();
        finished_timer.phase = GamePhase::GameOver;
        finished_timer.timer = 5;

        let mut too_long = session.snapshot();
        too_long.total_rounds = 3;

        for snapshot in [too_many, idle_timer, finished_timer, too_long] {
            assert!(matches!(
                session.apply_snapshot(snapshot),
                Err(GameError::InvalidSnapshot(_))
            ));
        }
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn reverted_completion_can_be_completed_again() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "taxes", Category::Work, Complexity::Easy)
            .unwrap();
        let before = session.snapshot();

        let points = session.complete_task(task).unwrap();
        session.apply_snapshot(before).unwrap();
        assert_eq!(session.task(task).unwrap().status(), TaskStatus::Pending);
        assert_eq!(session.participant(ada).unwrap().score, 0);
        assert!(session.ledger_actions(ada).is_none());

        assert_eq!(session.complete_task(task).unwrap(), points);
        assert_eq!(session.participant(ada).unwrap().score, points);
    }

    #[test]
    fn applied_completion_keeps_its_credit() {
        let mut session = Session::new(config(8, 2));
        let ada = session.add_participant("Ada").unwrap();
        let task = session
            .add_task(ada, "laundry", Category::Chores, Complexity::Easy)
            .unwrap();
        session.complete_task(task).unwrap();
        let completed = session.snapshot();

        session.apply_snapshot(completed).unwrap();

        assert!(
            session
                .ledger_actions(ada)
                .unwrap()
                .contains(&LedgerAction::TaskCompleted(task))
        );
        assert!(session.complete_task(task).is_err());
    }
}
