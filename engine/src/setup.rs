// ═══════════════════════════════════════════════════════════════════════
// Scenario setup: builds the initial ResolutionState from a scenario
//
// A scenario is a JSON document: roster (teams, players), starting forces
// and force-preservation objectives. Everything the registry needs for
// `reset` is captured here once.
// ═══════════════════════════════════════════════════════════════════════

use crate::error::{ResolutionError, Result};
use crate::registry::ResolutionState;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    /// The player the concluding summary reports for.
    pub local_player: PlayerId,
    pub teams: Vec<TeamConfig>,
    pub players: Vec<PlayerConfig>,
    pub forces: Vec<ForceConfig>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub id: TeamId,
    #[serde(default)]
    pub faction: Option<String>,
    #[serde(default)]
    pub initiative: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub id: PlayerId,
    pub name: String,
    pub team: TeamId,
    #[serde(default)]
    pub initiative_bonus: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Defaults to the force name (lone combatants) or a numbered one.
    #[serde(default)]
    pub name: Option<String>,
    pub hit_points: u32,
    pub damage: u32,
    #[serde(default)]
    pub can_eject: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceKind {
    Combatant { unit: UnitConfig },
    Formation { units: Vec<UnitConfig> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Requested id; collisions are reassigned by the registry.
    #[serde(default)]
    pub id: Option<ParticipantId>,
    pub owner: PlayerId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ForceKind,
    /// Held off-board until this round.
    #[serde(default)]
    pub deploy_round: Option<u32>,
    /// Starting position, or the entry position for reinforcements.
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    pub team: TeamId,
    /// Share of the team's starting forces that must survive.
    pub percent: u8,
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Same scenario, different dice.
    pub fn with_seed(&self, seed: u64) -> Self {
        ScenarioConfig { seed, ..self.clone() }
    }
}

// ── Building the state ─────────────────────────────────────────────────

fn combatant_from(config: &UnitConfig, fallback: String) -> Result<Combatant> {
    let name = config.name.clone().unwrap_or(fallback);
    if config.hit_points == 0 {
        return Err(ResolutionError::InvalidForce { force: name, reason: "zero hit points".into() });
    }
    let mut unit = Combatant::new(name, config.hit_points, config.damage);
    unit.can_eject = config.can_eject;
    Ok(unit)
}

fn participant_from(config: &ForceConfig, requested: ParticipantId) -> Result<Participant> {
    let participant = match &config.kind {
        ForceKind::Combatant { unit } => {
            let unit = combatant_from(unit, config.name.clone())?;
            Participant::combatant(requested, config.owner, unit)
        }
        ForceKind::Formation { units } => {
            if units.is_empty() {
                return Err(ResolutionError::InvalidForce {
                    force: config.name.clone(),
                    reason: "formation without units".into(),
                });
            }
            let units = units.iter().enumerate()
                .map(|(i, u)| combatant_from(u, format!("{} {}", config.name, i + 1)))
                .collect::<Result<Vec<_>>>()?;
            Participant::formation(requested, config.owner, config.name.clone(), units)
        }
    };

    let position = config.position.unwrap_or_default();
    Ok(match config.deploy_round {
        Some(round) => participant.arriving(round, position),
        None => participant.at(position),
    })
}

/// Build a ready-to-resolve state: roster, forces (captured as the starting
/// forces for `reset`) and preservation objectives.
pub fn create_initial_state(config: &ScenarioConfig) -> Result<ResolutionState> {
    let mut state = ResolutionState::new(config.seed);

    let declared: BTreeSet<TeamId> = config.teams.iter().map(|t| t.id).collect();
    for p in &config.players {
        if !declared.contains(&p.team) {
            return Err(ResolutionError::UnknownTeam { player: p.id, team: p.team });
        }
        let mut player = Player::new(p.id, p.name.clone(), p.team);
        player.initiative_bonus = p.initiative_bonus;
        state.add_player(p.id, player);
    }
    state.player(config.local_player)?;

    for t in &config.teams {
        match state.team_mut(t.id) {
            Some(team) => {
                team.faction = t.faction.clone();
                team.initiative = t.initiative.unwrap_or(0);
            }
            None => debug!(team = %t.id, "declared team has no players"),
        }
    }

    // Forces without an explicit id ask for their position in the list
    for (i, force) in config.forces.iter().enumerate() {
        if state.player(force.owner).is_err() {
            return Err(ResolutionError::UnknownOwner { force: force.name.clone(), owner: force.owner });
        }
        let requested = force.id.unwrap_or(ParticipantId(i as u32));
        state.add_participant(participant_from(force, requested)?)?;
    }
    state.capture_starting_forces();

    for o in &config.objectives {
        let tracked: Vec<ParticipantId> = state.participants()
            .filter(|p| state.team_of(p.owner) == Some(o.team))
            .map(|p| p.id)
            .collect();
        state.add_objective(PreservationObjective { team: o.team, percent: o.percent.min(100), tracked });
    }

    info!(
        scenario = %config.name,
        seed = config.seed,
        players = config.players.len(),
        participants = state.participant_count(),
        "scenario loaded"
    );
    Ok(state)
}
