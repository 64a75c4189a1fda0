// ═══════════════════════════════════════════════════════════════════════
// Resolution Runner: drives a complete headless resolution with commanders
// ═══════════════════════════════════════════════════════════════════════

use crate::error::{BatchError, Result};
use autoresolve_agents::{AggressiveCommander, Commander, RandomCommander};
use autoresolve_engine::engine::{self, Step};
use autoresolve_engine::registry::ResolutionState;
use autoresolve_engine::resolver::{ActionHandler, AttritionHandler};
use autoresolve_engine::setup::{create_initial_state, ScenarioConfig};
use autoresolve_engine::summary::ResolutionSummary;
use autoresolve_engine::types::*;
use autoresolve_engine::victory::{StandardVictory, VictoryEvaluator};
use autoresolve_engine::view::player_view;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One commander per player.
pub type Commanders = BTreeMap<PlayerId, Box<dyn Commander>>;

/// Result of a completed resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    pub scenario: String,
    pub seed: u64,
    pub rounds: u32,
    pub victory_team: Option<TeamId>,
    pub victory_player: Option<PlayerId>,
    pub local_team_won: bool,
    /// Ended by the round limit rather than by a decisive verdict.
    pub timed_out: bool,
    pub decisions: usize,
    pub sides: Vec<SideResult>,
    /// Salvageable and ejected losses, in removal order.
    pub removed: Vec<RemovedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideResult {
    pub player: PlayerId,
    pub team: TeamId,
    pub commander: String,
    pub survivors: usize,
    pub remaining_hit_points: u32,
    pub losses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedRecord {
    pub id: ParticipantId,
    pub owner: PlayerId,
    pub name: String,
    pub reason: RemovalReason,
}

/// Answer turns until the resolution finishes. Returns the number of
/// decisions made; fails if that exceeds `max_decisions`.
pub fn drive(
    state: &mut ResolutionState,
    commanders: &mut Commanders,
    handler: &mut dyn ActionHandler,
    evaluator: &dyn VictoryEvaluator,
    max_decisions: usize,
) -> Result<usize> {
    let mut decisions = 0;
    loop {
        let turn = match engine::advance(state, handler, evaluator)? {
            Step::Finished => return Ok(decisions),
            Step::Turn(turn) => turn,
        };
        if decisions >= max_decisions {
            return Err(BatchError::Stalled { decisions, round: state.round() });
        }

        let player = turn.player();
        let commander = commanders.get_mut(&player).ok_or(BatchError::NoCommander(player))?;
        let view = player_view(state, player)?;
        let eligible = state.eligible_for(&turn);
        let decision = commander.decide(&view, turn, &eligible);
        engine::submit_turn(state, decision)?;
        decisions += 1;
    }
}

/// Resolve one scenario with the built-in rules and summarize it.
pub fn resolve(config: &ScenarioConfig, commanders: &mut Commanders, max_decisions: usize) -> Result<ResolutionResult> {
    let mut state = create_initial_state(config)?;
    let decisions = drive(&mut state, commanders, &mut AttritionHandler, &StandardVictory, max_decisions)?;
    let summary = state.conclude(config.local_player)?;
    let result = build_result(config, &summary, commanders, decisions);

    if result.timed_out {
        warn!(seed = config.seed, rounds = result.rounds, "resolution hit the round limit");
    }
    Ok(result)
}

/// Resolve the same scenario once per seed, in parallel. Results come back
/// in seed order; each resolution gets fresh commanders from `make`.
pub fn run_batch<F>(
    config: &ScenarioConfig,
    seeds: &[u64],
    max_decisions: usize,
    make: F,
) -> Vec<Result<ResolutionResult>>
where
    F: Fn(&ScenarioConfig) -> Result<Commanders> + Sync,
{
    info!(scenario = %config.name, runs = seeds.len(), "batch started");
    seeds.par_iter()
        .map(|&seed| {
            let config = config.with_seed(seed);
            let mut commanders = make(&config)?;
            resolve(&config, &mut commanders, max_decisions)
        })
        .collect()
}

/// Build commanders for every player: "random", "aggressive", or "mixed"
/// (aggressive on the local player's team, random elsewhere).
pub fn make_commanders(config: &ScenarioConfig, kind: &str) -> Result<Commanders> {
    let local_team = config.players.iter()
        .find(|p| p.id == config.local_player)
        .map(|p| p.team);

    config.players.iter()
        .enumerate()
        .map(|(i, p)| {
            let seed = config.seed.wrapping_add(i as u64 * 7919);
            let commander: Box<dyn Commander> = match kind {
                "aggressive" => Box::new(AggressiveCommander::new(p.id)),
                "mixed" if Some(p.team) == local_team => Box::new(AggressiveCommander::new(p.id)),
                "random" | "mixed" => Box::new(RandomCommander::new(p.id, seed)),
                other => return Err(BatchError::UnknownCommander(other.to_string())),
            };
            Ok((p.id, commander))
        })
        .collect()
}

fn build_result(
    config: &ScenarioConfig,
    summary: &ResolutionSummary,
    commanders: &Commanders,
    decisions: usize,
) -> ResolutionResult {
    let state = &summary.state;

    let sides = state.players()
        .map(|p| {
            let survivors: Vec<&Participant> = summary.survivors.iter().filter(|s| s.owner == p.id).collect();
            SideResult {
                player: p.id,
                team: p.team,
                commander: commanders.get(&p.id).map(|c| c.name().to_string()).unwrap_or_default(),
                survivors: survivors.iter().filter(|s| !s.is_destroyed()).count(),
                remaining_hit_points: survivors.iter().map(|s| s.hit_points()).fold(0, u32::saturating_add),
                losses: state.graveyard().iter().filter(|e| e.participant.owner == p.id).count(),
            }
        })
        .collect();

    let removed = summary.removed.iter()
        .map(|e| RemovedRecord {
            id: e.participant.id,
            owner: e.participant.owner,
            name: e.participant.name().to_string(),
            reason: e.reason,
        })
        .collect();

    ResolutionResult {
        scenario: config.name.clone(),
        seed: config.seed,
        rounds: state.round(),
        victory_team: state.victory_team(),
        victory_player: state.victory_player(),
        local_team_won: summary.local_team_won,
        timed_out: state.timed_out(),
        decisions,
        sides,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIRMISH: &str = include_str!("../../scenarios/skirmish.json");

    fn skirmish() -> ScenarioConfig {
        ScenarioConfig::from_json_str(SKIRMISH).unwrap()
    }

    #[test]
    fn test_bundled_scenario_resolves() {
        let config = skirmish();
        let mut commanders = make_commanders(&config, "aggressive").unwrap();
        let result = resolve(&config, &mut commanders, 100_000).unwrap();

        assert!(result.rounds >= 1);
        assert!(result.decisions > 0);
        assert_eq!(result.sides.len(), 3);
        assert!(result.sides.iter().all(|s| s.commander == "Aggressive"));
        assert_eq!(result.local_team_won, result.victory_team == Some(TeamId(1)));
        assert!(result.removed.iter().all(|r| r.reason.is_reported()));
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = skirmish();
        let run = || {
            let mut commanders = make_commanders(&config, "random").unwrap();
            let r = resolve(&config, &mut commanders, 100_000).unwrap();
            (r.rounds, r.victory_team, r.decisions, r.removed.len())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_batch_keeps_seed_order() {
        let config = skirmish();
        let seeds = [5, 1, 9];
        let results = run_batch(&config, &seeds, 100_000, |c| make_commanders(c, "mixed"));
        let got: Vec<u64> = results.iter().map(|r| r.as_ref().unwrap().seed).collect();
        assert_eq!(got, vec![5, 1, 9]);
    }

    #[test]
    fn test_unknown_commander_kind() {
        let config = skirmish();
        assert!(matches!(make_commanders(&config, "cautious"), Err(BatchError::UnknownCommander(k)) if k == "cautious"));
        let results = run_batch(&config, &[1, 2], 100, |c| make_commanders(c, "cautious"));
        assert!(results.iter().all(|r| matches!(r, Err(BatchError::UnknownCommander(_)))));
    }

    #[test]
    fn test_missing_commander() {
        let config = skirmish();
        let mut commanders = make_commanders(&config, "random").unwrap();
        commanders.clear();
        assert!(matches!(resolve(&config, &mut commanders, 100), Err(BatchError::NoCommander(_))));
    }

    #[test]
    fn test_decision_limit() {
        let config = skirmish();
        let mut commanders = make_commanders(&config, "aggressive").unwrap();
        assert!(matches!(resolve(&config, &mut commanders, 3), Err(BatchError::Stalled { decisions: 3, .. })));
    }
}
