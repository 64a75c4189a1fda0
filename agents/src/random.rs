// ═══════════════════════════════════════════════════════════════════════
// Random Commander: makes all decisions randomly.
// Serves as baseline and for testing engine stability.
// ═══════════════════════════════════════════════════════════════════════

use crate::commander::{entry_of, position_of, Commander};
use autoresolve_engine::actions::ActionKind;
use autoresolve_engine::engine::TurnDecision;
use autoresolve_engine::types::*;
use autoresolve_engine::view::PlayerView;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct RandomCommander {
    player: PlayerId,
    rng: ChaCha8Rng,
}

impl RandomCommander {
    pub fn new(player: PlayerId, seed: u64) -> Self {
        RandomCommander {
            player,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, eligible: &[ParticipantId]) -> ParticipantId {
        eligible[self.rng.gen_range(0..eligible.len())]
    }
}

impl Commander for RandomCommander {
    fn name(&self) -> &str { "Random" }
    fn player(&self) -> PlayerId { self.player }

    fn deploy(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = self.pick(eligible);
        let entry = entry_of(view, actor);
        // Wander up to one square off the entry point
        let at = Position::new(entry.x + self.rng.gen_range(-1..=1), entry.y + self.rng.gen_range(-1..=1));
        TurnDecision::new(actor, ActionKind::Deploy { at })
    }

    fn maneuver(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = self.pick(eligible);
        let Some(from) = position_of(view, actor) else {
            return TurnDecision::pass(actor);
        };
        if self.rng.gen_bool(0.2) {
            return TurnDecision::pass(actor);
        }
        let to = Position::new(from.x + self.rng.gen_range(-1..=1), from.y + self.rng.gen_range(-1..=1));
        TurnDecision::new(actor, ActionKind::Move { to })
    }

    fn fire(&mut self, view: &PlayerView, eligible: &[ParticipantId]) -> TurnDecision {
        let actor = self.pick(eligible);
        if self.rng.gen_bool(0.02) {
            return TurnDecision::new(actor, ActionKind::Withdraw);
        }
        match view.contacts.choose(&mut self.rng) {
            Some(target) => TurnDecision::new(actor, ActionKind::Attack { target: target.id }),
            None => TurnDecision::pass(actor),
        }
    }
}
