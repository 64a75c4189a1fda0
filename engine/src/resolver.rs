// ═══════════════════════════════════════════════════════════════════════
// Action handlers: turn queued intents into state changes
//
// Detailed weapons and movement physics live behind `ActionHandler`.
// `AttritionHandler` is the plain built-in rule set: attacks subtract
// the attacker's damage from the target's hit points.
// ═══════════════════════════════════════════════════════════════════════

use crate::actions::{ActionKind, EntityAction};
use crate::error::Result;
use crate::registry::ResolutionState;
use crate::types::*;
use tracing::debug;

pub trait ActionHandler: Send {
    /// Apply one dequeued action. Actions whose participant has left the
    /// battle in the meantime should be ignored, not treated as errors.
    fn resolve(&mut self, state: &mut ResolutionState, action: &EntityAction) -> Result<()>;
}

/// Drain the action queue in submission order through `handler`.
pub fn resolve_queued(state: &mut ResolutionState, handler: &mut dyn ActionHandler) -> Result<usize> {
    let mut resolved = 0;
    while let Some(action) = state.actions().snapshot().first().copied() {
        state.actions_mut().remove_one(&action);
        handler.resolve(state, &action)?;
        resolved += 1;
    }
    Ok(resolved)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttritionHandler;

impl AttritionHandler {
    fn removal_reason(target: &Participant, overflow: u32) -> RemovalReason {
        if overflow.saturating_mul(2) >= target.max_hit_points() {
            RemovalReason::Devastated
        } else if target.can_eject() {
            RemovalReason::Ejected
        } else {
            RemovalReason::Salvageable
        }
    }

    fn attack(state: &mut ResolutionState, attacker: ParticipantId, target: ParticipantId) {
        let damage = match state.participant(attacker) {
            Some(p) if p.is_deployed() && !p.is_destroyed() => p.damage(),
            _ => {
                debug!(%attacker, "attacker gone, attack dropped");
                return;
            }
        };
        let Some(victim) = state.participant_mut(target) else {
            debug!(%attacker, %target, "target gone, attack dropped");
            return;
        };
        let overflow = victim.take_damage(damage);
        debug!(%attacker, %target, damage, remaining = victim.hit_points(), "attack resolved");
        if victim.is_destroyed() {
            let reason = Self::removal_reason(victim, overflow);
            state.remove_to_graveyard(target, reason);
        }
    }
}

impl ActionHandler for AttritionHandler {
    fn resolve(&mut self, state: &mut ResolutionState, action: &EntityAction) -> Result<()> {
        let id = action.participant;
        match action.kind {
            ActionKind::Deploy { at } => {
                if let Some(p) = state.participant_mut(id) {
                    if let Some(d) = p.deployment.as_mut().filter(|d| !d.deployed) {
                        d.deployed = true;
                        p.position = Some(at);
                        debug!(participant = %id, x = at.x, y = at.y, "deployed");
                    }
                }
            }
            ActionKind::Move { to } => {
                if let Some(p) = state.participant_mut(id).filter(|p| p.is_deployed() && !p.is_destroyed()) {
                    p.position = Some(to);
                }
            }
            ActionKind::Attack { target } => Self::attack(state, id, target),
            ActionKind::Withdraw => {
                state.remove_to_graveyard(id, RemovalReason::InRetreat);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(participants: Vec<Participant>) -> ResolutionState {
        let mut state = ResolutionState::new(1);
        state.add_player(PlayerId(1), Player::new(PlayerId(1), "Blue", TeamId(1)));
        state.add_player(PlayerId(2), Player::new(PlayerId(2), "Red", TeamId(2)));
        for p in participants {
            state.add_participant(p).unwrap();
        }
        state
    }

    fn unit(id: u32, owner: u32, hp: u32, damage: u32) -> Participant {
        Participant::combatant(ParticipantId(id), PlayerId(owner), Combatant::new("Unit", hp, damage))
    }

    #[test]
    fn test_attack_reduces_hit_points() {
        let mut state = state_with(vec![unit(0, 1, 10, 3), unit(1, 2, 10, 3)]);
        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Attack { target: ParticipantId(1) }));
        let n = resolve_queued(&mut state, &mut AttritionHandler).unwrap();
        assert_eq!(n, 1);
        assert_eq!(state.participant(ParticipantId(1)).unwrap().hit_points(), 7);
        assert!(state.actions().is_empty());
    }

    #[test]
    fn test_destroyed_target_loses_queued_actions() {
        let mut state = state_with(vec![unit(0, 1, 10, 5), unit(1, 2, 4, 3)]);
        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Attack { target: ParticipantId(1) }));
        state.submit_action(EntityAction::new(ParticipantId(1), ActionKind::Attack { target: ParticipantId(0) }));
        resolve_queued(&mut state, &mut AttritionHandler).unwrap();

        assert!(state.participant(ParticipantId(1)).is_none());
        // Its return fire was dropped with it
        assert_eq!(state.participant(ParticipantId(0)).unwrap().hit_points(), 10);
        assert_eq!(state.graveyard().len(), 1);
        assert_eq!(state.graveyard()[0].reason, RemovalReason::Salvageable);
    }

    #[test]
    fn test_removal_reasons() {
        let mut pilot = Combatant::new("Jenner", 10, 2);
        pilot.can_eject = true;
        let mut state = state_with(vec![
            unit(0, 1, 10, 20),
            unit(1, 2, 10, 1),
            Participant::combatant(ParticipantId(2), PlayerId(2), pilot),
            unit(3, 1, 10, 10),
        ]);
        // 20 damage into 10 hp: overkill of 10 wrecks it completely
        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Attack { target: ParticipantId(1) }));
        // Exactly lethal against an ejectable pilot
        state.submit_action(EntityAction::new(ParticipantId(3), ActionKind::Attack { target: ParticipantId(2) }));
        resolve_queued(&mut state, &mut AttritionHandler).unwrap();

        let reasons: Vec<RemovalReason> = state.graveyard().iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec![RemovalReason::Devastated, RemovalReason::Ejected]);
        // Devastated wrecks are not reported outward
        assert_eq!(state.visible_graveyard().count(), 1);
    }

    #[test]
    fn test_huge_damage_saturates() {
        let mut state = state_with(vec![
            Participant::formation(
                ParticipantId(0), PlayerId(1), "Siege",
                vec![Combatant::new("Gun", 10, u32::MAX), Combatant::new("Gun", 10, u32::MAX)],
            ),
            unit(1, 2, 10, 1),
        ]);
        assert_eq!(state.participant(ParticipantId(0)).unwrap().damage(), u32::MAX);

        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Attack { target: ParticipantId(1) }));
        resolve_queued(&mut state, &mut AttritionHandler).unwrap();
        assert_eq!(state.graveyard()[0].reason, RemovalReason::Devastated);
    }

    #[test]
    fn test_withdraw_retires_in_retreat() {
        let mut state = state_with(vec![unit(0, 1, 10, 3)]);
        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Withdraw));
        resolve_queued(&mut state, &mut AttritionHandler).unwrap();
        assert_eq!(state.graveyard()[0].reason, RemovalReason::InRetreat);
        assert_eq!(state.visible_graveyard().count(), 0);
    }

    #[test]
    fn test_deploy_places_reinforcement() {
        let reserve = unit(0, 1, 10, 3).arriving(2, Position::new(0, 9));
        let mut state = state_with(vec![reserve]);
        state.submit_action(EntityAction::new(ParticipantId(0), ActionKind::Deploy { at: Position::new(1, 8) }));
        resolve_queued(&mut state, &mut AttritionHandler).unwrap();
        let p = state.participant(ParticipantId(0)).unwrap();
        assert!(p.is_deployed());
        assert_eq!(p.position, Some(Position::new(1, 8)));
    }
}
