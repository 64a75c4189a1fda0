// ═══════════════════════════════════════════════════════════════════════
// Aggressive Commander: closes distance and focuses fire.
// Significantly stronger than RandomCommander.
// ═══════════════════════════════════════════════════════════════════════

use crate::commander::{entry_of, position_of, Commander};
use autoresolve_engine::actions::ActionKind;
use autoresolve_engine::engine::TurnDecision;
use autoresolve_engine::types::*;
use autoresolve_engine::view::PlayerView;
use tracing::debug;

pub struct AggressiveCommander {
    player: PlayerId,
}

impl AggressiveCommander {
    pub fn new(player: PlayerId) -> Self {
        AggressiveCommander { player }
    }

    /// Own participant among `eligible` with the highest `score`; lowest id on ties.
    fn best_by(view: &PlayerView, eligible: &[ParticipantId], score: impl Fn(&Participant) -> i64) -> ParticipantId {
        eligible.iter()
            .filter_map(|&id| view.own_participant(id))
            .max_by_key(|p| (score(p), std::cmp::Reverse(p.id)))
            .map_or(eligible[0], |p| p.id)
    }

    /// Distance from `id` to the nearest enemy contact.
    fn range_to_contact(view: &PlayerView, id: ParticipantId) -> Option<u32> {
        let from = position_of(view, id)?;
        let target = view.nearest_contact(from)?;
        Some(from.distance(target.position?))
    }
}

impl Commander for AggressiveCommander {
    fn name(&self) -> &str { "Aggressive" }
    fn player(&self) -> PlayerId { self.player }

    /// Heaviest reinforcement first, straight onto its entry point.
    fn deploy(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = Self::best_by(view, eligible, |p| i64::from(p.hit_points()));
        TurnDecision::new(actor, ActionKind::Deploy { at: entry_of(view, actor) })
    }

    /// The formation furthest from the enemy moves one step toward it.
    fn maneuver(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = Self::best_by(view, eligible, |p| {
            Self::range_to_contact(view, p.id).map_or(-1, i64::from)
        });
        let target = position_of(view, actor)
            .and_then(|from| view.nearest_contact(from).map(|c| (from, c)))
            .and_then(|(from, c)| c.position.map(|to| from.step_toward(to)));
        match target {
            Some(to) => TurnDecision::new(actor, ActionKind::Move { to }),
            None => TurnDecision::pass(actor),
        }
    }

    /// Hardest hitter shoots the weakest contact.
    fn fire(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = Self::best_by(view, eligible, |p| i64::from(p.damage()));
        match view.weakest_contact() {
            Some(target) => {
                debug!(player = %self.player, %actor, target = %target.id, "focus fire");
                TurnDecision::new(actor, ActionKind::Attack { target: target.id })
            }
            None => TurnDecision::pass(actor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoresolve_engine::registry::ResolutionState;
    use autoresolve_engine::turns::Turn;
    use autoresolve_engine::view::player_view;

    fn state() -> ResolutionState {
        let mut state = ResolutionState::new(1);
        state.add_player(PlayerId(1), Player::new(PlayerId(1), "Blue", TeamId(1)));
        state.add_player(PlayerId(2), Player::new(PlayerId(2), "Red", TeamId(2)));
        state.add_participant(Participant::formation(
            ParticipantId(0), PlayerId(1), "Light", vec![Combatant::new("Locust", 4, 1)],
        ).at(Position::new(0, 0))).unwrap();
        state.add_participant(Participant::formation(
            ParticipantId(1), PlayerId(1), "Heavy", vec![Combatant::new("Atlas", 20, 6)],
        ).at(Position::new(3, 0))).unwrap();
        state.add_participant(Participant::combatant(ParticipantId(2), PlayerId(2), Combatant::new("Tank", 9, 2)).at(Position::new(6, 0))).unwrap();
        state.add_participant(Participant::combatant(ParticipantId(3), PlayerId(2), Combatant::new("Scout", 3, 1)).at(Position::new(6, 4))).unwrap();
        state
    }

    #[test]
    fn test_focus_fire_on_weakest() {
        let state = state();
        let view = player_view(&state, PlayerId(1)).unwrap();
        let mut c = AggressiveCommander::new(PlayerId(1));
        let d = c.decide(&view, Turn::Free { player: PlayerId(1) }, &[ParticipantId(0), ParticipantId(1)]);
        assert_eq!(d.actor, ParticipantId(1));
        assert_eq!(d.action, Some(ActionKind::Attack { target: ParticipantId(3) }));
    }

    #[test]
    fn test_furthest_formation_advances() {
        let state = state();
        let view = player_view(&state, PlayerId(1)).unwrap();
        let mut c = AggressiveCommander::new(PlayerId(1));
        let d = c.decide(&view, Turn::Formation { player: PlayerId(1) }, &[ParticipantId(0), ParticipantId(1)]);
        assert_eq!(d.actor, ParticipantId(0));
        assert_eq!(d.action, Some(ActionKind::Move { to: Position::new(1, 0) }));
    }

    #[test]
    fn test_holds_without_contacts() {
        let mut state = state();
        state.remove_to_graveyard(ParticipantId(2), RemovalReason::Salvageable);
        state.remove_to_graveyard(ParticipantId(3), RemovalReason::Salvageable);
        let view = player_view(&state, PlayerId(1)).unwrap();
        let mut c = AggressiveCommander::new(PlayerId(1));
        let d = c.decide(&view, Turn::Free { player: PlayerId(1) }, &[ParticipantId(0)]);
        assert_eq!(d, TurnDecision::pass(ParticipantId(0)));
    }
}
