// ═══════════════════════════════════════════════════════════════════════
// Core types: identities, participants, players, teams, phases
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::fmt;

// ── Identities ─────────────────────────────────────────────────────────
// Compact, copyable identifiers. Participants reference players and
// actions reference participants purely by id, never by pointer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

// ── Phase ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Registry built (or reset) but the first round has not started.
    #[default]
    Setup,
    Initiative,
    Deployment,
    Movement,
    Firing,
    End,
    /// Resolution concluded; no further turns are produced.
    Victory,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "Setup"),
            Phase::Initiative => write!(f, "Initiative"),
            Phase::Deployment => write!(f, "Deployment"),
            Phase::Movement => write!(f, "Movement"),
            Phase::Firing => write!(f, "Firing"),
            Phase::End => write!(f, "End"),
            Phase::Victory => write!(f, "Victory"),
        }
    }
}

// ── Position ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Grid distance (king moves).
    pub fn distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    /// One step from `self` toward `target`.
    pub fn step_toward(self, target: Position) -> Position {
        Position {
            x: self.x + (target.x - self.x).signum(),
            y: self.y + (target.y - self.y).signum(),
        }
    }
}

// ── Combatant ──────────────────────────────────────────────────────────

/// A single fighting unit: a vehicle, a mech, an emplacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub hit_points: u32,
    pub max_hit_points: u32,
    /// Damage dealt per attack while the unit is operational.
    pub damage: u32,
    /// Crew or pilot can bail out when the unit is knocked out.
    pub can_eject: bool,
}

impl Combatant {
    pub fn new(name: impl Into<String>, hit_points: u32, damage: u32) -> Self {
        Combatant {
            name: name.into(),
            hit_points,
            max_hit_points: hit_points,
            damage,
            can_eject: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_points == 0
    }
}

// ── Formation ──────────────────────────────────────────────────────────

/// Several combatants maneuvering as one turn-taking unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    pub name: String,
    pub units: Vec<Combatant>,
}

impl Formation {
    /// Damage soaks through units in order, front unit first.
    /// Returns the damage left over once every unit is destroyed.
    fn absorb(&mut self, mut damage: u32) -> u32 {
        for unit in self.units.iter_mut().filter(|u| !u.is_destroyed()) {
            let taken = damage.min(unit.hit_points);
            unit.hit_points -= taken;
            damage -= taken;
            if damage == 0 {
                break;
            }
        }
        damage
    }
}

// ── Participant kind ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantKind {
    Combatant(Combatant),
    Formation(Formation),
}

/// The `Deployable` capability: a scheduled round of entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub round: u32,
    pub entry: Position,
    pub deployed: bool,
}

// ── Participant ────────────────────────────────────────────────────────

/// Any unit or formation tracked during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub owner: PlayerId,
    pub kind: ParticipantKind,
    /// `None` while off-board (undeployed reinforcements).
    pub position: Option<Position>,
    pub deployment: Option<Deployment>,
    /// Already acted during the current phase.
    pub done: bool,
}

impl Participant {
    pub fn combatant(id: ParticipantId, owner: PlayerId, unit: Combatant) -> Self {
        Participant {
            id,
            owner,
            kind: ParticipantKind::Combatant(unit),
            position: Some(Position::default()),
            deployment: None,
            done: false,
        }
    }

    pub fn formation(id: ParticipantId, owner: PlayerId, name: impl Into<String>, units: Vec<Combatant>) -> Self {
        Participant {
            id,
            owner,
            kind: ParticipantKind::Formation(Formation { name: name.into(), units }),
            position: Some(Position::default()),
            deployment: None,
            done: false,
        }
    }

    /// Place on the board at `position`.
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Hold off-board until `round`, then enter at `entry`.
    pub fn arriving(mut self, round: u32, entry: Position) -> Self {
        self.position = None;
        self.deployment = Some(Deployment { round, entry, deployed: false });
        self
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            ParticipantKind::Combatant(c) => &c.name,
            ParticipantKind::Formation(f) => &f.name,
        }
    }

    pub fn is_formation(&self) -> bool {
        matches!(self.kind, ParticipantKind::Formation(_))
    }

    pub fn is_deployable(&self) -> bool {
        self.deployment.is_some()
    }

    /// Participants without the deployable capability start on the board.
    pub fn is_deployed(&self) -> bool {
        self.deployment.map_or(true, |d| d.deployed)
    }

    pub fn hit_points(&self) -> u32 {
        match &self.kind {
            ParticipantKind::Combatant(c) => c.hit_points,
            ParticipantKind::Formation(f) => f.units.iter().map(|u| u.hit_points).fold(0, u32::saturating_add),
        }
    }

    pub fn max_hit_points(&self) -> u32 {
        match &self.kind {
            ParticipantKind::Combatant(c) => c.max_hit_points,
            ParticipantKind::Formation(f) => f.units.iter().map(|u| u.max_hit_points).fold(0, u32::saturating_add),
        }
    }

    /// Damage this participant deals per attack. Destroyed units add nothing.
    /// Totals here and in the hit point sums saturate at `u32::MAX`.
    pub fn damage(&self) -> u32 {
        match &self.kind {
            ParticipantKind::Combatant(c) if c.is_destroyed() => 0,
            ParticipantKind::Combatant(c) => c.damage,
            ParticipantKind::Formation(f) => f.units.iter()
                .filter(|u| !u.is_destroyed())
                .map(|u| u.damage)
                .fold(0, u32::saturating_add),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hit_points() == 0
    }

    pub fn can_eject(&self) -> bool {
        match &self.kind {
            ParticipantKind::Combatant(c) => c.can_eject,
            ParticipantKind::Formation(f) => f.units.iter().any(|u| u.can_eject),
        }
    }

    /// Apply damage and return the overflow beyond the remaining hit points.
    pub fn take_damage(&mut self, damage: u32) -> u32 {
        match &mut self.kind {
            ParticipantKind::Combatant(c) => {
                let taken = damage.min(c.hit_points);
                c.hit_points -= taken;
                damage - taken
            }
            ParticipantKind::Formation(f) => f.absorb(damage),
        }
    }
}

// ── Removal reason ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    Unknown,
    InRetreat,
    Pushed,
    /// Knocked out, wreck recoverable.
    Salvageable,
    /// Crew or pilot bailed out.
    Ejected,
    Captured,
    /// Destroyed beyond recovery.
    Devastated,
    NeverJoined,
}

impl RemovalReason {
    /// Reasons surfaced to salvage and casualty reporting.
    pub fn is_reported(self) -> bool {
        matches!(self, RemovalReason::Salvageable | RemovalReason::Ejected)
    }
}

/// A permanently removed participant and why it left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraveyardEntry {
    pub participant: Participant,
    pub reason: RemovalReason,
}

// ── Player / Team ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: TeamId,
    /// Added to the team's initiative roll; the best bonus on a team counts.
    pub initiative_bonus: i32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, team: TeamId) -> Self {
        Player { id, name: name.into(), team, initiative_bonus: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Member players, ordered by id.
    pub players: Vec<PlayerId>,
    /// Last initiative result; lower acts first.
    pub initiative: i32,
    pub faction: Option<String>,
}

impl Team {
    pub fn new(id: TeamId) -> Self {
        Team { id, players: Vec::new(), initiative: 0, faction: None }
    }
}

// ── Force preservation ─────────────────────────────────────────────────

/// "Keep at least `percent`% of these starting forces alive."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservationObjective {
    pub team: TeamId,
    pub percent: u8,
    /// Participant ids assigned at setup time.
    pub tracked: Vec<ParticipantId>,
}

// ── Victory ────────────────────────────────────────────────────────────

/// Rounds after which a resolution ends regardless of the evaluator.
pub const GAME_TIMER_ROUNDS: u32 = 1000;
