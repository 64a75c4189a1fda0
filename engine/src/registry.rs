// ═══════════════════════════════════════════════════════════════════════
// Resolution state: the registry that owns everything in a battle
//
// Owns participants, players, teams, the graveyard, the turn sequence,
// the action queue and the deployment index. Identity is assigned here:
// a requested participant id that is live or retired is replaced with
// the next free one, so ids never collide and are never reused.
//
// Only what a resolution can meaningfully support is exposed. There is
// no bulk participant replacement and no player removal.
// ═══════════════════════════════════════════════════════════════════════

use crate::actions::{ActionQueue, EntityAction};
use crate::deployment::DeploymentSchedule;
use crate::error::{ResolutionError, Result};
use crate::snapshot::{SnapshotHandle, StateSnapshot};
use crate::turns::{Turn, TurnScheduler};
use crate::types::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug)]
pub struct ResolutionState {
    seed: u64,
    round: u32,
    phase: Phase,
    last_phase: Phase,

    participants: BTreeMap<ParticipantId, Participant>,
    graveyard: Vec<GraveyardEntry>,
    /// Every id that ever went to the graveyard.
    retired: BTreeSet<ParticipantId>,

    players: BTreeMap<PlayerId, Player>,
    /// Derived from `players`; rebuilt on every player change.
    teams: Vec<Team>,

    turns: TurnScheduler,
    actions: ActionQueue,
    deployment: DeploymentSchedule,

    objectives: Vec<PreservationObjective>,
    /// Forces as they stood at setup, re-added on `reset`.
    starting_forces: Vec<Participant>,

    victory_player: Option<PlayerId>,
    victory_team: Option<TeamId>,
    finished: bool,
    /// Finished at the round limit with more than one team still fighting.
    timed_out: bool,

    snapshots: SnapshotHandle,
}

impl ResolutionState {
    pub fn new(seed: u64) -> Self {
        ResolutionState {
            seed,
            round: 0,
            phase: Phase::Setup,
            last_phase: Phase::Setup,
            participants: BTreeMap::new(),
            graveyard: Vec::new(),
            retired: BTreeSet::new(),
            players: BTreeMap::new(),
            teams: Vec::new(),
            turns: TurnScheduler::new(),
            actions: ActionQueue::new(),
            deployment: DeploymentSchedule::new(),
            objectives: Vec::new(),
            starting_forces: Vec::new(),
            victory_player: None,
            victory_team: None,
            finished: false,
            timed_out: false,
            snapshots: SnapshotHandle::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ── Rounds and phases ──────────────────────────────────────────────

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn increment_round(&mut self) {
        self.round += 1;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_phase(&self) -> Phase {
        self.last_phase
    }

    /// Install a new phase, remembering the one it replaces.
    pub fn receive_phase(&mut self, phase: Phase) {
        self.last_phase = self.phase;
        self.phase = phase;
    }

    // ── Participants ───────────────────────────────────────────────────

    /// Register a participant and return the id it ended up with.
    pub fn add_participant(&mut self, mut participant: Participant) -> Result<ParticipantId> {
        let requested = participant.id;
        if self.is_taken(requested) {
            participant.id = self.next_free_id().ok_or(ResolutionError::IdSpaceExhausted)?;
            debug!(%requested, assigned = %participant.id, "participant id reassigned");
        }
        let id = participant.id;
        self.participants.insert(id, participant);
        Ok(id)
    }

    fn is_taken(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id) || self.retired.contains(&id)
    }

    /// One past the highest id ever handed out, live or retired. Once the
    /// top of the range is taken, the lowest id never handed out instead.
    fn next_free_id(&self) -> Option<ParticipantId> {
        let live = self.participants.keys().next_back();
        let retired = self.retired.iter().next_back();
        match live.max(retired) {
            None => Some(ParticipantId(0)),
            Some(max) => match max.0.checked_add(1) {
                Some(next) => Some(ParticipantId(next)),
                None => (0..=u32::MAX).map(ParticipantId).find(|&id| !self.is_taken(id)),
            },
        }
    }

    /// Live participant by id. Graveyarded ids are not live.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// Live participants in id order.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn participants_of(&self, player: PlayerId) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(move |p| p.owner == player)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Live participants the turn accepts, in id order.
    pub fn eligible_for(&self, turn: &Turn) -> Vec<ParticipantId> {
        self.participants.values()
            .filter(|p| turn.is_valid_for(p, self.round))
            .map(|p| p.id)
            .collect()
    }

    /// Formations of `player` marked deployed. Combatant state is not
    /// consulted, so knocked-out formations still awaiting removal count.
    pub fn live_deployed_count(&self, player: PlayerId) -> usize {
        self.participants_of(player)
            .filter(|p| p.is_formation() && p.is_deployed())
            .count()
    }

    pub fn clear_done_flags(&mut self) {
        for p in self.participants.values_mut() {
            p.done = false;
        }
    }

    // ── Graveyard ──────────────────────────────────────────────────────

    /// Retire a live participant. Returns `false` if it was not live.
    pub fn remove_to_graveyard(&mut self, id: ParticipantId, reason: RemovalReason) -> bool {
        let Some(participant) = self.participants.remove(&id) else {
            return false;
        };
        info!(
            round = self.round,
            participant = %id,
            unit = participant.name(),
            ?reason,
            "participant removed"
        );
        self.actions.remove_all_for(id);
        self.retired.insert(id);
        self.graveyard.push(GraveyardEntry { participant, reason });
        true
    }

    /// Every removal, whatever the reason.
    pub fn graveyard(&self) -> &[GraveyardEntry] {
        &self.graveyard
    }

    /// Removals that matter for salvage and casualty reporting.
    pub fn visible_graveyard(&self) -> impl Iterator<Item = &GraveyardEntry> {
        self.graveyard.iter().filter(|e| e.reason.is_reported())
    }

    pub fn is_retired(&self, id: ParticipantId) -> bool {
        self.retired.contains(&id)
    }

    // ── Players and teams ──────────────────────────────────────────────

    /// Add or replace a player, then rebuild every team.
    pub fn add_player(&mut self, id: PlayerId, mut player: Player) {
        player.id = id;
        self.players.insert(id, player);
        self.rebuild_teams();
    }

    /// Looking up a player that was never added is a caller bug.
    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(ResolutionError::PlayerNotFound(id))
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Teams ordered by id.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    pub fn team_of(&self, player: PlayerId) -> Option<TeamId> {
        self.players.get(&player).map(|p| p.team)
    }

    /// Regroup all players by team id from scratch. Surviving teams keep
    /// their initiative and faction; teams left without members vanish.
    fn rebuild_teams(&mut self) {
        let mut rebuilt: BTreeMap<TeamId, Team> = BTreeMap::new();
        for player in self.players.values() {
            rebuilt.entry(player.team)
                .or_insert_with(|| Team::new(player.team))
                .players
                .push(player.id);
        }
        for team in rebuilt.values_mut() {
            if let Some(prior) = self.teams.iter().find(|t| t.id == team.id) {
                team.initiative = prior.initiative;
                team.faction = prior.faction.clone();
            }
        }
        self.teams = rebuilt.into_values().collect();
    }

    // ── Turns ──────────────────────────────────────────────────────────

    pub fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    pub fn set_turns(&mut self, turns: Vec<Turn>) {
        self.turns.set_turns(turns);
    }

    pub fn current_turn(&self) -> Option<Turn> {
        self.turns.current().copied()
    }

    pub fn advance_turn(&mut self) -> Option<Turn> {
        self.turns.advance().copied()
    }

    pub fn has_more_turns(&self) -> bool {
        self.turns.has_more_turns()
    }

    pub fn reset_turn_cursor(&mut self) {
        self.turns.reset_cursor();
    }

    pub fn mark_turn_answered(&mut self) {
        self.turns.mark_answered();
    }

    // ── Actions ────────────────────────────────────────────────────────

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut ActionQueue {
        &mut self.actions
    }

    pub fn submit_action(&mut self, action: EntityAction) {
        self.actions.submit(action);
    }

    // ── Deployment ─────────────────────────────────────────────────────

    pub fn deployment(&self) -> &DeploymentSchedule {
        &self.deployment
    }

    /// Rebuild the round → reinforcements index from current participants.
    pub fn setup_deployment(&mut self) {
        self.deployment.recompute(self.participants.values());
    }

    /// Reinforcements the index has due this round or earlier that are
    /// still live and waiting to enter.
    pub fn due_for_deployment(&self) -> Vec<ParticipantId> {
        self.deployment.due_through(self.round)
            .filter(|id| {
                self.participants.get(id)
                    .and_then(|p| p.deployment)
                    .map_or(false, |d| !d.deployed)
            })
            .collect()
    }

    pub fn should_deploy_this_round(&self) -> bool {
        self.deployment.due(self.round)
    }

    pub fn clear_deployment_this_round(&mut self) {
        self.deployment.clear_round(self.round);
    }

    pub fn deployment_complete(&self) -> bool {
        self.deployment.is_complete(self.round)
    }

    // ── Objectives and victory ─────────────────────────────────────────

    pub fn objectives(&self) -> &[PreservationObjective] {
        &self.objectives
    }

    pub fn add_objective(&mut self, objective: PreservationObjective) {
        self.objectives.push(objective);
    }

    pub fn victory_player(&self) -> Option<PlayerId> {
        self.victory_player
    }

    pub fn victory_team(&self) -> Option<TeamId> {
        self.victory_team
    }

    pub fn record_victory(&mut self, team: Option<TeamId>, player: Option<PlayerId>) {
        self.victory_team = team;
        self.victory_player = player;
    }

    pub fn cancel_victory(&mut self) {
        self.victory_team = None;
        self.victory_player = None;
    }

    /// Safety valve against runaway resolutions.
    pub fn game_timer_expired(&self) -> bool {
        self.round >= GAME_TIMER_ROUNDS
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn mark_timed_out(&mut self) {
        self.timed_out = true;
    }

    /// Teams that still have a participant with hit points left.
    pub fn standing_team_count(&self) -> usize {
        self.participants.values()
            .filter(|p| !p.is_destroyed())
            .filter_map(|p| self.team_of(p.owner))
            .collect::<BTreeSet<TeamId>>()
            .len()
    }

    pub fn finish(&mut self) {
        self.finished = true;
        self.turns.clear();
        self.receive_phase(Phase::Victory);
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Remember the current participants as the scenario's starting forces.
    pub fn capture_starting_forces(&mut self) {
        self.starting_forces = self.participants.values().cloned().collect();
    }

    /// Back to a pre-first-round state with the starting forces re-added.
    /// Players, teams and objectives are kept.
    pub fn reset(&mut self) {
        self.participants.clear();
        self.graveyard.clear();
        self.retired.clear();
        self.turns.clear();
        self.actions.clear();
        self.deployment.clear();
        self.round = 0;
        self.phase = Phase::Setup;
        self.last_phase = Phase::Setup;
        self.finished = false;
        self.timed_out = false;
        self.cancel_victory();
        // Captured from the live map, so the ids are already distinct
        for p in self.starting_forces.clone() {
            self.participants.insert(p.id, p);
        }
        debug!(participants = self.participants.len(), "resolution state reset");
    }

    // ── Snapshots ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            round: self.round,
            phase: self.phase,
            participants: self.participants.values().cloned().collect(),
            graveyard: self.visible_graveyard().cloned().collect(),
            players: self.players.values().cloned().collect(),
            teams: self.teams.clone(),
            victory_team: self.victory_team,
            victory_player: self.victory_player,
            finished: self.finished,
        }
    }

    /// Publish the current state to every `SnapshotHandle` reader.
    pub fn publish(&self) {
        self.snapshots.publish(self.snapshot());
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }
}
