use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// High-level phases a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Lobby is forming; participants and tasks can be set up.
    Setup,
    /// A work phase of the current round is running.
    Work,
    /// The break following the current round's work phase.
    Break,
    /// Terminal phase; the session accepts no further transitions.
    GameOver,
}

impl GamePhase {
    /// Whether the session has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver)
    }

    /// Whether the phase timer runs in this phase.
    pub fn is_timed(self) -> bool {
        matches!(self, GamePhase::Work | GamePhase::Break)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GamePhase::Setup => "setup",
            GamePhase::Work => "work",
            GamePhase::Break => "break",
            GamePhase::GameOver => "game-over",
        };
        f.write_str(label)
    }
}

/// Events that can be applied to the phase table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Host starts the next work phase.
    StartRound,
    /// Host cuts the work phase short and enters the break.
    EndRound,
    /// Host stops the game.
    EndGame,
    /// The phase timer reached zero.
    TimerElapsed,
}

impl PhaseEvent {
    /// Human readable verb used in error messages.
    pub fn action(self) -> &'static str {
        match self {
            PhaseEvent::StartRound => "start a round",
            PhaseEvent::EndRound => "end the round",
            PhaseEvent::EndGame => "end the game",
            PhaseEvent::TimerElapsed => "elapse the timer",
        }
    }
}

/// Error returned when an operation is not allowed from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid phase transition: cannot {action} while in {from}")]
pub struct InvalidTransition {
    /// The phase the session was in.
    pub from: GamePhase,
    /// The operation that was refused.
    pub action: &'static str,
}

/// Timer to load after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTimer {
    /// Full work phase duration.
    Round,
    /// Full break duration.
    Break,
    /// Timer stopped at zero.
    Stopped,
}

/// Outcome of a valid transition, applied by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// Phase after the transition.
    pub phase: GamePhase,
    /// Round after the transition.
    pub round: u32,
    /// Timer to load.
    pub timer: PhaseTimer,
}

impl PhaseChange {
    /// Whether applying this change moves to another round.
    pub fn advances_round(&self, current_round: u32) -> bool {
        self.round != current_round
    }
}

/// Compute the transition for `event` from (`phase`, `round`) if it is valid.
pub fn next_phase(
    phase: GamePhase,
    round: u32,
    total_rounds: u32,
    event: PhaseEvent,
) -> Result<PhaseChange, InvalidTransition> {
    let change = match (phase, event) {
        (GamePhase::Setup, PhaseEvent::StartRound) => PhaseChange {
            phase: GamePhase::Work,
            round,
            timer: PhaseTimer::Round,
        },
        (GamePhase::Break, PhaseEvent::StartRound) if round < total_rounds => PhaseChange {
            phase: GamePhase::Work,
            round: round + 1,
            timer: PhaseTimer::Round,
        },
        (GamePhase::Work, PhaseEvent::EndRound | PhaseEvent::TimerElapsed) => PhaseChange {
            phase: GamePhase::Break,
            round,
            timer: PhaseTimer::Break,
        },
        (GamePhase::Break, PhaseEvent::TimerElapsed) => {
            if round < total_rounds {
                PhaseChange {
                    phase: GamePhase::Work,
                    round: round + 1,
                    timer: PhaseTimer::Round,
                }
            } else {
                PhaseChange {
                    phase: GamePhase::GameOver,
                    round,
                    timer: PhaseTimer::Stopped,
                }
            }
        }
        (GamePhase::Setup | GamePhase::Work | GamePhase::Break, PhaseEvent::EndGame) => {
            PhaseChange {
                phase: GamePhase::GameOver,
                round,
                timer: PhaseTimer::Stopped,
            }
        }
        (from, event) => {
            return Err(InvalidTransition {
                from,
                action: event.action(),
            });
        }
    };

    Ok(change)
}
