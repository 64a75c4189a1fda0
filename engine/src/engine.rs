// ═══════════════════════════════════════════════════════════════════════
// Engine: round and phase progression
//
// Architecture:
//   The engine is a pure state machine. It never asks commanders for
//   anything itself. `advance()` pushes the resolution forward until a
//   turn needs a decision (returned as `Step::Turn`) or the battle is
//   over (`Step::Finished`). The driver answers the turn through
//   `submit_turn()` and calls `advance()` again.
//
// Round:
//   Initiative → Deployment → Movement → Firing → End → next round
//   Deployment turns come from the deployment index rebuilt at round
//   start; the other phases count each player's eligible participants.
//   Queued actions resolve through the injected `ActionHandler` when
//   Deployment, Movement and Firing close; victory is checked after each.
// ═══════════════════════════════════════════════════════════════════════

use crate::actions::{ActionKind, EntityAction};
use crate::error::{ResolutionError, Result};
use crate::registry::ResolutionState;
use crate::resolver::{resolve_queued, ActionHandler};
use crate::turns::Turn;
use crate::types::*;
use crate::victory::{check_victory, VictoryEvaluator};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What the driver has to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// This turn is active and waits for a decision.
    Turn(Turn),
    /// The resolution is over; the verdict is recorded on the state.
    Finished,
}

/// A commander's answer to a turn: which participant acts, and the one
/// thing it does, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnDecision {
    pub actor: ParticipantId,
    pub action: Option<ActionKind>,
}

impl TurnDecision {
    pub fn new(actor: ParticipantId, action: ActionKind) -> Self {
        TurnDecision { actor, action: Some(action) }
    }

    /// Act without doing anything.
    pub fn pass(actor: ParticipantId) -> Self {
        TurnDecision { actor, action: None }
    }
}

/// Advance the resolution until a turn needs a decision or it finishes.
pub fn advance(
    state: &mut ResolutionState,
    handler: &mut dyn ActionHandler,
    evaluator: &dyn VictoryEvaluator,
) -> Result<Step> {
    loop {
        if state.is_finished() {
            return Ok(Step::Finished);
        }

        if state.phase() == Phase::Setup {
            start_round(state);
            continue;
        }

        if let Some(turn) = state.advance_turn() {
            // Everyone this turn was built for may have been removed mid-phase
            if state.eligible_for(&turn).is_empty() {
                debug!(?turn, "turn skipped, nobody eligible");
                continue;
            }
            return Ok(Step::Turn(turn));
        }

        end_phase(state, handler, evaluator)?;
    }
}

/// Record a decision for the active turn and queue its action.
pub fn submit_turn(state: &mut ResolutionState, decision: TurnDecision) -> Result<()> {
    let turn = state.current_turn().ok_or(ResolutionError::NoActiveTurn)?;
    if state.turns().is_answered() {
        return Err(ResolutionError::TurnAlreadyAnswered(turn));
    }

    let round = state.round();
    let actor = decision.actor;
    if !state.participant(actor).map_or(false, |p| turn.is_valid_for(p, round)) {
        return Err(ResolutionError::IneligibleParticipant { participant: actor, turn });
    }
    if let Some(action) = decision.action.filter(|a| !turn.allows(a)) {
        return Err(ResolutionError::ActionNotAllowed { action, turn });
    }
    if let Some(p) = state.participant_mut(actor) {
        p.done = true;
    }
    state.mark_turn_answered();

    debug!(?turn, %actor, action = ?decision.action, "turn answered");
    if let Some(kind) = decision.action {
        state.submit_action(EntityAction::new(actor, kind));
    }
    Ok(())
}

// ── Phase transitions ──────────────────────────────────────────────────

fn start_round(state: &mut ResolutionState) {
    state.increment_round();
    state.receive_phase(Phase::Initiative);
    state.set_turns(Vec::new());
    state.clear_done_flags();
    roll_initiative(state);
    state.setup_deployment();
    info!(
        round = state.round(),
        participants = state.participant_count(),
        pending_deployment = !state.deployment_complete(),
        "round started"
    );
}

fn enter_phase(state: &mut ResolutionState, phase: Phase) {
    state.receive_phase(phase);
    state.clear_done_flags();
    let turns = build_turns(state, phase);
    debug!(round = state.round(), %phase, turns = turns.len(), "phase entered");
    state.set_turns(turns);
}

/// Publish, check for a winner, and move on to `next` if the battle goes on.
fn close_phase(state: &mut ResolutionState, evaluator: &dyn VictoryEvaluator, next: Phase) {
    let finished = check_victory(state, evaluator);
    state.publish();
    if !finished {
        enter_phase(state, next);
    }
}

fn end_phase(
    state: &mut ResolutionState,
    handler: &mut dyn ActionHandler,
    evaluator: &dyn VictoryEvaluator,
) -> Result<()> {
    match state.phase() {
        Phase::Setup => start_round(state),
        Phase::Initiative => {
            state.publish();
            enter_phase(state, Phase::Deployment);
        }
        Phase::Deployment => {
            resolve_queued(state, handler)?;
            deploy_stragglers(state);
            state.clear_deployment_this_round();
            close_phase(state, evaluator, Phase::Movement);
        }
        Phase::Movement => {
            resolve_queued(state, handler)?;
            close_phase(state, evaluator, Phase::Firing);
        }
        Phase::Firing => {
            resolve_queued(state, handler)?;
            close_phase(state, evaluator, Phase::End);
        }
        Phase::End => {
            let finished = check_victory(state, evaluator);
            state.publish();
            if !finished {
                start_round(state);
            }
        }
        Phase::Victory => {}
    }
    Ok(())
}

/// Reinforcements that are due but were not deployed by their commander
/// enter at their configured entry position.
fn deploy_stragglers(state: &mut ResolutionState) {
    for id in state.due_for_deployment() {
        if let Some(p) = state.participant_mut(id) {
            if let Some(d) = p.deployment.as_mut() {
                d.deployed = true;
                p.position = Some(d.entry);
                debug!(participant = %id, "deployed at entry position");
            }
        }
    }
}

// ── Initiative and turn order ──────────────────────────────────────────

/// Each team rolls 2d6 plus the best bonus among its players.
fn roll_initiative(state: &mut ResolutionState) {
    let stream = u64::from(state.round()).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = ChaCha8Rng::seed_from_u64(state.seed() ^ stream);

    let bonuses: Vec<(TeamId, i32)> = state.teams().iter()
        .map(|t| {
            let bonus = t.players.iter()
                .filter_map(|&id| state.player(id).ok())
                .map(|p| p.initiative_bonus)
                .max()
                .unwrap_or(0);
            (t.id, bonus)
        })
        .collect();

    for (team, bonus) in bonuses {
        let roll: i32 = rng.gen_range(1..=6) + rng.gen_range(1..=6);
        if let Some(t) = state.team_mut(team) {
            t.initiative = roll + bonus;
            debug!(%team, roll, bonus, "initiative");
        }
    }
}

/// Players by team initiative, lowest first; ties go to the lower team id.
pub fn player_order(state: &ResolutionState) -> Vec<PlayerId> {
    let mut teams: Vec<&Team> = state.teams().iter().collect();
    teams.sort_by_key(|t| (t.initiative, t.id));
    teams.into_iter()
        .flat_map(|t| t.players.iter().copied())
        .collect()
}

fn build_turns(state: &ResolutionState, phase: Phase) -> Vec<Turn> {
    let make: fn(PlayerId) -> Turn = match phase {
        Phase::Deployment => |player| Turn::Deployment { player },
        Phase::Movement => |player| Turn::Formation { player },
        Phase::Firing => |player| Turn::Free { player },
        _ => return Vec::new(),
    };

    let order = player_order(state);
    let counts = if phase == Phase::Deployment {
        deployment_counts(state)
    } else {
        order.iter()
            .map(|&player| (player, state.eligible_for(&make(player)).len()))
            .collect()
    };
    interleave(&order, &counts, make)
}

/// Due reinforcements per owner, straight from the deployment index.
fn deployment_counts(state: &ResolutionState) -> BTreeMap<PlayerId, usize> {
    let mut counts = BTreeMap::new();
    for id in state.due_for_deployment() {
        if let Some(p) = state.participant(id) {
            *counts.entry(p.owner).or_insert(0) += 1;
        }
    }
    counts
}

/// Round-robin one turn per player until every player's count is used up.
fn interleave(order: &[PlayerId], counts: &BTreeMap<PlayerId, usize>, make: fn(PlayerId) -> Turn) -> Vec<Turn> {
    let most = counts.values().copied().max().unwrap_or(0);
    let mut turns = Vec::with_capacity(counts.values().sum());
    for pass in 0..most {
        for &player in order {
            if counts.get(&player).copied().unwrap_or(0) > pass {
                turns.push(make(player));
            }
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_round_robin() {
        let order = vec![PlayerId(2), PlayerId(1)];
        let counts: BTreeMap<PlayerId, usize> = [(PlayerId(1), 3), (PlayerId(2), 1)].into_iter().collect();
        let turns = interleave(&order, &counts, |player| Turn::Formation { player });
        let players: Vec<u32> = turns.iter().map(|t| t.player().0).collect();
        assert_eq!(players, vec![2, 1, 1, 1]);
    }

    #[test]
    fn test_interleave_empty() {
        let turns = interleave(&[PlayerId(1)], &BTreeMap::new(), |player| Turn::Free { player });
        assert!(turns.is_empty());
    }
}
