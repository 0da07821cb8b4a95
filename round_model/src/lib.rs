//! # Round Model
//!
//! The data model for a single game round as seen by the stats service:
//! participants, their cumulative leaderboard entries, and the ordered
//! snapshots sampled while the round was played. This crate holds no
//! narrative logic; it is the read-only input to `battle_narrative`.

pub mod mechanics;
pub mod participants;
pub mod round_state;

pub use mechanics::*;
pub use participants::*;
pub use round_state::*;
