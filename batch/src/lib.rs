pub mod error;
pub mod runner;
pub mod database;

pub use error::{BatchError, Result};
pub use runner::{drive, make_commanders, resolve, run_batch, Commanders, ResolutionResult};
pub use database::Database;
