// ═══════════════════════════════════════════════════════════════════════
// Action queue: intents buffered for the current phase, FIFO
// ═══════════════════════════════════════════════════════════════════════

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Enter the battle at a position (reinforcements).
    Deploy { at: Position },
    Move { to: Position },
    Attack { target: ParticipantId },
    /// Leave the battle in good order.
    Withdraw,
}

/// An intent submitted for exactly one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAction {
    pub participant: ParticipantId,
    pub kind: ActionKind,
}

impl EntityAction {
    pub fn new(participant: ParticipantId, kind: ActionKind) -> Self {
        EntityAction { participant, kind }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    actions: Vec<EntityAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, action: EntityAction) {
        self.actions.push(action);
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Drop every queued action of `participant` (e.g. it was destroyed mid-phase).
    pub fn remove_all_for(&mut self, participant: ParticipantId) {
        self.actions.retain(|a| a.participant != participant);
    }

    /// Remove the first entry equal to `action`. Returns whether one was found.
    pub fn remove_one(&mut self, action: &EntityAction) -> bool {
        match self.actions.iter().position(|a| a == action) {
            Some(pos) => {
                self.actions.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Read-only view in submission order.
    pub fn snapshot(&self) -> &[EntityAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
