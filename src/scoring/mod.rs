//! Validating sheets, merging master edits, and scoring entries against the master.

pub mod leaderboard;
pub mod merge;
pub mod scorer;
pub mod validate;

pub use leaderboard::{Standing, build_leaderboard};
pub use merge::merge_master;
pub use scorer::{Scorecard, scorecard};
