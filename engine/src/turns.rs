// ═══════════════════════════════════════════════════════════════════════
// Turn scheduling: ordered turn tokens for the current phase
//
// The scheduler is phase-agnostic. It holds an ordered sequence of turns
// and a cursor:
//   None        → awaiting first turn
//   Some(i < N) → turn i is active
//   Some(N)     → exhausted
// Each turn decides which participants may act in it; the registry uses
// that to filter its live participants.
// ═══════════════════════════════════════════════════════════════════════

use crate::actions::ActionKind;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// One of the player's formations maneuvers.
    Formation { player: PlayerId },
    /// Any of the player's participants that has not acted yet.
    Free { player: PlayerId },
    /// One of the player's due reinforcements enters the battle.
    Deployment { player: PlayerId },
}

impl Turn {
    pub fn player(&self) -> PlayerId {
        match *self {
            Turn::Formation { player } | Turn::Free { player } | Turn::Deployment { player } => player,
        }
    }

    /// Whether `p` may act during this turn in round `round`.
    pub fn is_valid_for(&self, p: &Participant, round: u32) -> bool {
        if p.owner != self.player() || p.done {
            return false;
        }
        match self {
            Turn::Formation { .. } => p.is_formation() && p.is_deployed() && !p.is_destroyed(),
            Turn::Free { .. } => p.is_deployed() && !p.is_destroyed(),
            Turn::Deployment { .. } => p.deployment
                .map_or(false, |d| !d.deployed && d.round <= round),
        }
    }

    /// Whether an answer to this turn may carry `action`.
    pub fn allows(&self, action: &ActionKind) -> bool {
        matches!(
            (self, action),
            (Turn::Deployment { .. }, ActionKind::Deploy { .. })
                | (Turn::Formation { .. }, ActionKind::Move { .. })
                | (Turn::Free { .. }, ActionKind::Attack { .. } | ActionKind::Withdraw)
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnScheduler {
    turns: Vec<Turn>,
    cursor: Option<usize>,
    /// A decision was already submitted for the active turn.
    answered: bool,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new turn sequence. The cursor returns to the sentinel.
    pub fn set_turns(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
        self.cursor = None;
        self.answered = false;
    }

    pub fn clear(&mut self) {
        self.set_turns(Vec::new());
    }

    /// Move to the next turn and return it, or `None` once exhausted.
    pub fn advance(&mut self) -> Option<&Turn> {
        let next = self.cursor.map_or(0, |c| c + 1).min(self.turns.len());
        self.cursor = Some(next);
        self.answered = false;
        self.current()
    }

    /// The active turn; `None` before the first `advance` and once exhausted.
    pub fn current(&self) -> Option<&Turn> {
        self.cursor.and_then(|c| self.turns.get(c))
    }

    pub fn has_more_turns(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.turns.len()
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
        self.answered = false;
    }

    pub fn mark_answered(&mut self) {
        self.answered = true;
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_turns() -> TurnScheduler {
        let mut s = TurnScheduler::new();
        s.set_turns(vec![
            Turn::Formation { player: PlayerId(1) },
            Turn::Formation { player: PlayerId(2) },
            Turn::Free { player: PlayerId(1) },
        ]);
        s
    }

    #[test]
    fn test_cursor_walks_sequence() {
        let mut s = three_turns();
        assert!(s.current().is_none());
        assert!(s.has_more_turns());

        assert_eq!(s.advance(), Some(&Turn::Formation { player: PlayerId(1) }));
        assert!(s.has_more_turns());
        assert_eq!(s.advance(), Some(&Turn::Formation { player: PlayerId(2) }));
        assert!(s.has_more_turns());
        assert_eq!(s.advance(), Some(&Turn::Free { player: PlayerId(1) }));
        // Last turn active: nothing further
        assert!(!s.has_more_turns());
        assert_eq!(s.cursor(), Some(2));

        assert!(s.advance().is_none());
        assert_eq!(s.cursor(), Some(3));
        // Saturates at the exhausted position
        assert!(s.advance().is_none());
        assert_eq!(s.cursor(), Some(3));
    }

    #[test]
    fn test_empty_sequence() {
        let mut s = TurnScheduler::new();
        assert!(!s.has_more_turns());
        assert!(s.current().is_none());
        assert!(s.advance().is_none());
        assert!(s.current().is_none());
    }

    #[test]
    fn test_reset_cursor_returns_to_sentinel() {
        let mut s = three_turns();
        s.advance();
        s.advance();
        s.reset_cursor();
        assert!(s.current().is_none());
        assert_eq!(s.cursor(), None);
        assert_eq!(s.advance(), Some(&Turn::Formation { player: PlayerId(1) }));
    }

    #[test]
    fn test_set_turns_resets_cursor() {
        let mut s = three_turns();
        s.advance();
        s.set_turns(vec![Turn::Deployment { player: PlayerId(3) }]);
        assert_eq!(s.cursor(), None);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_eligibility_by_variant() {
        let owner = PlayerId(1);
        let formation = Participant::formation(
            ParticipantId(0), owner, "Lance", vec![Combatant::new("Atlas", 10, 4)],
        );
        let lone = Participant::combatant(ParticipantId(1), owner, Combatant::new("Turret", 6, 2));
        let reinforcement = Participant::formation(
            ParticipantId(2), owner, "Reserve", vec![Combatant::new("Hunchback", 8, 3)],
        ).arriving(3, Position::new(0, 5));

        let maneuver = Turn::Formation { player: owner };
        assert!(maneuver.is_valid_for(&formation, 1));
        assert!(!maneuver.is_valid_for(&lone, 1));
        assert!(!maneuver.is_valid_for(&reinforcement, 1));

        let free = Turn::Free { player: owner };
        assert!(free.is_valid_for(&formation, 1));
        assert!(free.is_valid_for(&lone, 1));

        let deploy = Turn::Deployment { player: owner };
        assert!(!deploy.is_valid_for(&formation, 3));
        assert!(!deploy.is_valid_for(&reinforcement, 2));
        assert!(deploy.is_valid_for(&reinforcement, 3));

        // Wrong owner never qualifies
        assert!(!Turn::Free { player: PlayerId(9) }.is_valid_for(&lone, 1));
    }

    #[test]
    fn test_acted_and_destroyed_are_ineligible() {
        let owner = PlayerId(1);
        let mut p = Participant::combatant(ParticipantId(0), owner, Combatant::new("Turret", 6, 2));
        let free = Turn::Free { player: owner };
        p.done = true;
        assert!(!free.is_valid_for(&p, 1));
        p.done = false;
        p.take_damage(6);
        assert!(!free.is_valid_for(&p, 1));
    }
}
