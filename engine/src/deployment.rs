// ═══════════════════════════════════════════════════════════════════════
// Deployment schedule: which reinforcements enter on which round
//
// The round → entries index is derived data. It is rebuilt from the
// participants' current deploy rounds on every `recompute`, never
// patched, since arrival rounds can change between rounds.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSchedule {
    by_round: BTreeMap<u32, Vec<ParticipantId>>,
}

impl DeploymentSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from every not-yet-deployed deployable.
    pub fn recompute<'a>(&mut self, participants: impl IntoIterator<Item = &'a Participant>) {
        self.by_round.clear();
        for p in participants {
            if let Some(d) = p.deployment.filter(|d| !d.deployed) {
                self.by_round.entry(d.round).or_default().push(p.id);
            }
        }
    }

    /// Latest round with pending entries, `None` if nothing is pending.
    pub fn last_round(&self) -> Option<u32> {
        self.by_round.keys().next_back().copied()
    }

    pub fn is_complete(&self, current_round: u32) -> bool {
        self.last_round().map_or(true, |last| last < current_round)
    }

    pub fn due(&self, round: u32) -> bool {
        self.by_round.contains_key(&round)
    }

    /// Entries scheduled for `round` or earlier, earliest round first.
    pub fn due_through(&self, round: u32) -> impl Iterator<Item = ParticipantId> + '_ {
        self.by_round.range(..=round).flat_map(|(_, ids)| ids.iter().copied())
    }

    pub fn entries(&self, round: u32) -> &[ParticipantId] {
        self.by_round.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop a round's bucket once its entries have been deployed.
    pub fn clear_round(&mut self, round: u32) {
        self.by_round.remove(&round);
    }

    pub fn clear(&mut self) {
        self.by_round.clear();
    }

    pub fn rounds(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_round.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reinforcement(id: u32, round: u32) -> Participant {
        Participant::combatant(ParticipantId(id), PlayerId(1), Combatant::new("Scout", 4, 1))
            .arriving(round, Position::new(0, 0))
    }

    #[test]
    fn test_buckets_by_round() {
        let ps = vec![
            reinforcement(0, 2),
            reinforcement(1, 2),
            reinforcement(2, 4),
            Participant::combatant(ParticipantId(3), PlayerId(1), Combatant::new("Tank", 5, 2)),
        ];
        let mut d = DeploymentSchedule::new();
        d.recompute(&ps);
        assert_eq!(d.entries(2), &[ParticipantId(0), ParticipantId(1)]);
        assert_eq!(d.entries(4), &[ParticipantId(2)]);
        assert!(d.entries(3).is_empty());
        assert_eq!(d.last_round(), Some(4));
        assert!(d.due(2));
        assert!(!d.due(3));
        assert!(!d.is_complete(4));
        assert!(d.is_complete(5));
    }

    #[test]
    fn test_deployed_entries_excluded() {
        let mut p = reinforcement(0, 2);
        if let Some(d) = p.deployment.as_mut() {
            d.deployed = true;
        }
        let mut d = DeploymentSchedule::new();
        d.recompute([&p]);
        assert_eq!(d.last_round(), None);
        assert!(d.is_complete(0));
    }

    #[test]
    fn test_recompute_reflects_changed_rounds() {
        let mut ps = vec![reinforcement(0, 2)];
        let mut d = DeploymentSchedule::new();
        d.recompute(&ps);
        assert!(d.due(2));

        // Arrival delayed out-of-band
        if let Some(dep) = ps[0].deployment.as_mut() {
            dep.round = 5;
        }
        d.recompute(&ps);
        assert!(!d.due(2));
        assert!(d.due(5));
    }

    #[test]
    fn test_due_through_includes_overdue_rounds() {
        let ps = vec![reinforcement(0, 3), reinforcement(1, 1), reinforcement(2, 4)];
        let mut d = DeploymentSchedule::new();
        d.recompute(&ps);
        assert_eq!(d.due_through(3).collect::<Vec<_>>(), vec![ParticipantId(1), ParticipantId(0)]);
        assert_eq!(d.due_through(0).count(), 0);
    }

    #[test]
    fn test_clear_round() {
        let ps = vec![reinforcement(0, 1), reinforcement(1, 3)];
        let mut d = DeploymentSchedule::new();
        d.recompute(&ps);
        d.clear_round(1);
        assert!(!d.due(1));
        assert_eq!(d.rounds().collect::<Vec<_>>(), vec![3]);
    }
}
