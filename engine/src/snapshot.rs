// ═══════════════════════════════════════════════════════════════════════
// Snapshot publishing
//
// The resolution thread owns the registry outright. Reporting or UI
// threads never touch it; they read the latest immutable snapshot the
// registry published (once per phase) through a cloned `SnapshotHandle`.
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable copy of the externally interesting registry state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub round: u32,
    pub phase: Phase,
    pub participants: Vec<Participant>,
    /// Removals with a reported reason only.
    pub graveyard: Vec<GraveyardEntry>,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub victory_team: Option<TeamId>,
    pub victory_player: Option<PlayerId>,
    pub finished: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Arc<StateSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published snapshot. Cheap: clones an `Arc`.
    pub fn latest(&self) -> Arc<StateSnapshot> {
        // A panicked writer leaves a fully written Arc behind; keep serving it.
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn publish(&self, snapshot: StateSnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_readers_see_published_snapshot() {
        let handle = SnapshotHandle::new();
        assert_eq!(handle.latest().round, 0);

        let reader = handle.clone();
        handle.publish(StateSnapshot { round: 7, ..StateSnapshot::default() });

        let seen = thread::spawn(move || reader.latest().round)
            .join()
            .unwrap();
        assert_eq!(seen, 7);
    }

    #[test]
    fn test_old_snapshot_survives_publish() {
        let handle = SnapshotHandle::new();
        handle.publish(StateSnapshot { round: 1, ..StateSnapshot::default() });
        let held = handle.latest();
        handle.publish(StateSnapshot { round: 2, ..StateSnapshot::default() });
        assert_eq!(held.round, 1);
        assert_eq!(handle.latest().round, 2);
    }
}
