// ═══════════════════════════════════════════════════════════════════════
// Player view: what one commander is allowed to know
//
//   OWN      every participant the player owns, deployed or not
//   ALLIED   teammates' participants that are on the board
//   CONTACTS enemy participants that are on the board
//   HIDDEN   enemy reinforcements that have not deployed yet
//
// Commanders MUST only receive a PlayerView, never the ResolutionState.
// ═══════════════════════════════════════════════════════════════════════

use crate::registry::ResolutionState;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub viewer: PlayerId,
    pub team: TeamId,
    pub round: u32,
    pub phase: Phase,

    pub own: Vec<Participant>,
    pub allies: Vec<Participant>,
    /// Deployed enemies only.
    pub contacts: Vec<Participant>,

    /// Team rosters and initiative are public.
    pub teams: Vec<Team>,
}

impl PlayerView {
    pub fn own_participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.own.iter().find(|p| p.id == id)
    }

    /// Live enemy contact closest to `from`; lowest id on ties.
    pub fn nearest_contact(&self, from: Position) -> Option<&Participant> {
        self.contacts.iter()
            .filter(|p| !p.is_destroyed())
            .filter_map(|p| p.position.map(|pos| (from.distance(pos), p)))
            .min_by_key(|&(d, p)| (d, p.id))
            .map(|(_, p)| p)
    }

    /// Live enemy contact with the fewest hit points; lowest id on ties.
    pub fn weakest_contact(&self) -> Option<&Participant> {
        self.contacts.iter()
            .filter(|p| !p.is_destroyed())
            .min_by_key(|p| (p.hit_points(), p.id))
    }
}

/// Build the view for `viewer`. Fails only if the player was never added.
pub fn player_view(state: &ResolutionState, viewer: PlayerId) -> crate::error::Result<PlayerView> {
    let team = state.player(viewer)?.team;

    let mut own = Vec::new();
    let mut allies = Vec::new();
    let mut contacts = Vec::new();
    for p in state.participants() {
        if p.owner == viewer {
            own.push(p.clone());
        } else if !p.is_deployed() {
            continue;
        } else if state.team_of(p.owner) == Some(team) {
            allies.push(p.clone());
        } else {
            contacts.push(p.clone());
        }
    }

    Ok(PlayerView {
        viewer,
        team,
        round: state.round(),
        phase: state.phase(),
        own,
        allies,
        contacts,
        teams: state.teams().to_vec(),
    })
}
