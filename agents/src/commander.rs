// ═══════════════════════════════════════════════════════════════════════
// Commander Trait: interface every turn-answering AI implements
//
// KEY DESIGN PRINCIPLE:
//   Commanders receive a `PlayerView` (not the ResolutionState), which
//   only holds what the player is allowed to know. Enemy reinforcements
//   that have not deployed yet never appear in it.
// ═══════════════════════════════════════════════════════════════════════

use autoresolve_engine::types::*;
use autoresolve_engine::engine::TurnDecision;
use autoresolve_engine::turns::Turn;
use autoresolve_engine::view::PlayerView;

/// Each method corresponds to one turn variant. `eligible` lists the
/// participants that may act in the turn and is never empty.
pub trait Commander: Send + Sync {
    /// Human-readable name for this commander (e.g. "Random", "Aggressive").
    fn name(&self) -> &str;

    /// The player this commander answers for.
    fn player(&self) -> PlayerId;

    /// Universal entry point; dispatches on the turn variant.
    fn decide(&mut self, view: &PlayerView, turn: Turn, eligible: &[ParticipantId]) -> TurnDecision {
        match turn {
            Turn::Deployment { .. } => self.deploy(view, eligible),
            Turn::Formation { .. } => self.maneuver(view, eligible),
            Turn::Free { .. } => self.fire(view, eligible),
        }
    }

    /// Bring one due reinforcement onto the board.
    fn deploy(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision;

    /// Move one formation.
    fn maneuver(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision;

    /// Let one participant attack, withdraw or hold.
    fn fire(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision;
}

/// Where a reinforcement enters: its configured entry, or the origin.
pub fn entry_of(view: &PlayerView, id: ParticipantId) -> Position {
    view.own_participant(id)
        .and_then(|p| p.deployment)
        .map(|d| d.entry)
        .unwrap_or_default()
}

/// Current position of one of the viewer's participants.
pub fn position_of(view: &PlayerView, id: ParticipantId) -> Option<Position> {
    view.own_participant(id).and_then(|p| p.position)
}
