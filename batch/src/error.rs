use autoresolve_engine::{PlayerId, ResolutionError};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("unknown commander type {0:?} (expected random, aggressive or mixed)")]
    UnknownCommander(String),

    #[error("no commander for {0}")]
    NoCommander(PlayerId),

    #[error("resolution exceeded {decisions} decisions without finishing (round {round})")]
    Stalled { decisions: usize, round: u32 },
}

pub type Result<T> = std::result::Result<T, BatchError>;
