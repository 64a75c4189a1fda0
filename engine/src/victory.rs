// ═══════════════════════════════════════════════════════════════════════
// Victory: the evaluator boundary
//
// The registry never decides who won. An evaluator inspects the state and
// returns a verdict; `check_victory` stores it and ends the resolution.
// The round timer ends a resolution even when the evaluator stays
// undecided. Only an end at the timer with more than one team still
// fighting counts as timed out.
// ═══════════════════════════════════════════════════════════════════════

use crate::registry::ResolutionState;
use crate::types::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Undecided,
    Victory { team: TeamId, player: Option<PlayerId> },
    Draw,
}

pub trait VictoryEvaluator: Send + Sync {
    fn evaluate(&self, state: &ResolutionState) -> Verdict;
}

/// Ask the evaluator, record its verdict, and finish the resolution if
/// the battle is over. Returns whether the resolution is now finished.
pub fn check_victory(state: &mut ResolutionState, evaluator: &dyn VictoryEvaluator) -> bool {
    match evaluator.evaluate(state) {
        Verdict::Victory { team, player } => {
            info!(round = state.round(), %team, ?player, "victory");
            state.record_victory(Some(team), player);
            state.finish();
        }
        Verdict::Draw => {
            info!(round = state.round(), "draw");
            state.cancel_victory();
            state.finish();
        }
        Verdict::Undecided if state.game_timer_expired() => {
            warn!(round = state.round(), "game timer expired without a verdict");
            state.cancel_victory();
            state.finish();
        }
        Verdict::Undecided => {}
    }
    // A verdict reached at the limit while several teams still fight was
    // forced by the timer, whatever the evaluator made of it
    if state.is_finished() && state.game_timer_expired() && state.standing_team_count() > 1 {
        state.mark_timed_out();
    }
    state.is_finished()
}

// ── Standard rules ─────────────────────────────────────────────────────

/// Last team standing wins. When the timer runs out with several teams
/// standing, the most remaining hit points wins. A winner that failed to
/// preserve its tracked forces only earns a draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardVictory;

impl StandardVictory {
    /// Remaining hit points per team that still has a fighting participant.
    fn standing_teams(state: &ResolutionState) -> BTreeMap<TeamId, u32> {
        let mut standing = BTreeMap::new();
        for p in state.participants().filter(|p| !p.is_destroyed()) {
            if let Some(team) = state.team_of(p.owner) {
                let hp = standing.entry(team).or_insert(0u32);
                *hp = hp.saturating_add(p.hit_points());
            }
        }
        standing
    }

    fn preserved(state: &ResolutionState, team: TeamId) -> bool {
        state.objectives().iter()
            .filter(|o| o.team == team && !o.tracked.is_empty())
            .all(|o| {
                let alive = o.tracked.iter()
                    .filter(|&&id| state.participant(id).map_or(false, |p| !p.is_destroyed()))
                    .count();
                alive * 100 >= o.tracked.len() * o.percent as usize
            })
    }

    fn victory_for(state: &ResolutionState, team: TeamId) -> Verdict {
        if !Self::preserved(state, team) {
            return Verdict::Draw;
        }
        let player = state.team(team).and_then(|t| t.players.first().copied());
        Verdict::Victory { team, player }
    }
}

impl VictoryEvaluator for StandardVictory {
    fn evaluate(&self, state: &ResolutionState) -> Verdict {
        let standing = Self::standing_teams(state);
        let mut teams = standing.keys().copied();
        match (teams.next(), teams.next()) {
            (None, _) => Verdict::Draw,
            (Some(team), None) => Self::victory_for(state, team),
            _ if !state.game_timer_expired() => Verdict::Undecided,
            _ => {
                let best = standing.values().copied().max().unwrap_or(0);
                let leaders: Vec<TeamId> = standing.iter()
                    .filter(|(_, &hp)| hp == best)
                    .map(|(&team, _)| team)
                    .collect();
                match leaders.as_slice() {
                    [team] => Self::victory_for(state, *team),
                    _ => Verdict::Draw,
                }
            }
        }
    }
}
