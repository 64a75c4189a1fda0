//! Error types for the engine.
//!
//! Only caller-contract violations are errors. Routine absence (a
//! participant that was never added or is already in the graveyard) is
//! reported through `Option` instead.

use crate::actions::ActionKind;
use crate::types::{ParticipantId, PlayerId, TeamId};
use crate::turns::Turn;

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("{0} not found")]
    PlayerNotFound(PlayerId),

    #[error("no active turn to submit against")]
    NoActiveTurn,

    #[error("{0:?} already has a decision")]
    TurnAlreadyAnswered(Turn),

    #[error("participant {participant} cannot act in {turn:?}")]
    IneligibleParticipant {
        participant: ParticipantId,
        turn: Turn,
    },

    #[error("{action:?} is not allowed in {turn:?}")]
    ActionNotAllowed {
        action: ActionKind,
        turn: Turn,
    },

    #[error("every participant id is live or retired")]
    IdSpaceExhausted,

    #[error("force {force:?} is owned by unknown {owner}")]
    UnknownOwner {
        force: String,
        owner: PlayerId,
    },

    #[error("{player} belongs to undeclared {team}")]
    UnknownTeam {
        player: PlayerId,
        team: TeamId,
    },

    #[error("invalid force {force:?}: {reason}")]
    InvalidForce {
        force: String,
        reason: String,
    },

    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
