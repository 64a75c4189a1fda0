pub mod commander;
pub mod random;
pub mod aggressive;

pub use commander::Commander;
pub use random::RandomCommander;
pub use aggressive::AggressiveCommander;
