// ═══════════════════════════════════════════════════════════════════════
// Concluding summary: the single result handed back to the campaign
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Result;
use crate::registry::ResolutionState;
use crate::types::*;
use tracing::info;

#[derive(Debug)]
pub struct ResolutionSummary {
    /// The local player's team is the recorded victor.
    pub local_team_won: bool,
    /// Salvageable wrecks and ejected crews only.
    pub removed: Vec<GraveyardEntry>,
    /// Everything still tracked when the resolution concluded.
    pub survivors: Vec<Participant>,
    /// The registry, kept for detail queries.
    pub state: ResolutionState,
}

impl ResolutionState {
    /// Consume the registry into its concluding summary from the point of
    /// view of `local_player`.
    pub fn conclude(self, local_player: PlayerId) -> Result<ResolutionSummary> {
        let local_team = self.player(local_player)?.team;
        let local_team_won = self.victory_team() == Some(local_team);
        let removed: Vec<GraveyardEntry> = self.visible_graveyard().cloned().collect();
        let survivors: Vec<Participant> = self.participants().cloned().collect();

        info!(
            rounds = self.round(),
            %local_player,
            local_team_won,
            removed = removed.len(),
            survivors = survivors.len(),
            "resolution concluded"
        );

        Ok(ResolutionSummary { local_team_won, removed, survivors, state: self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conclude_reports_visible_losses() {
        let mut state = ResolutionState::new(0);
        state.add_player(PlayerId(1), Player::new(PlayerId(1), "Blue", TeamId(1)));
        state.add_player(PlayerId(2), Player::new(PlayerId(2), "Red", TeamId(2)));
        for id in 0..3 {
            state.add_participant(Participant::combatant(ParticipantId(id), PlayerId(2), Combatant::new("Tank", 5, 1))).unwrap();
        }
        state.add_participant(Participant::combatant(ParticipantId(3), PlayerId(1), Combatant::new("Mech", 5, 1))).unwrap();
        state.remove_to_graveyard(ParticipantId(0), RemovalReason::Salvageable);
        state.remove_to_graveyard(ParticipantId(1), RemovalReason::Devastated);
        state.record_victory(Some(TeamId(1)), Some(PlayerId(1)));

        let summary = state.conclude(PlayerId(1)).unwrap();
        assert!(summary.local_team_won);
        assert_eq!(summary.removed.len(), 1);
        assert_eq!(summary.removed[0].participant.id, ParticipantId(0));
        assert_eq!(summary.survivors.len(), 2);
        assert_eq!(summary.state.graveyard().len(), 2);
    }

    #[test]
    fn test_conclude_unknown_local_player() {
        let state = ResolutionState::new(0);
        assert!(state.conclude(PlayerId(4)).is_err());
    }
}
