pub mod types;
pub mod error;
pub mod turns;
pub mod actions;
pub mod deployment;
pub mod snapshot;
pub mod registry;
pub mod resolver;
pub mod victory;
pub mod engine;
pub mod view;
pub mod summary;
pub mod setup;


pub use types::*;
pub use error::{ResolutionError, Result};
pub use turns::Turn;
pub use actions::{ActionKind, EntityAction};
pub use registry::ResolutionState;
pub use engine::{advance, submit_turn, Step, TurnDecision};
pub use resolver::{ActionHandler, AttritionHandler};
pub use victory::{StandardVictory, Verdict, VictoryEvaluator};
pub use view::{player_view, PlayerView};
pub use summary::ResolutionSummary;
pub use setup::{create_initial_state, ScenarioConfig};
