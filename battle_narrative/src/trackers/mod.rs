//! State trackers driven by the event synthesizer.
//!
//! - **participant**: per-participant cumulative counters, kill streaks and
//!   kill attribution
//! - **team**: per-snapshot team score aggregation and lead tracking

mod participant;
mod team;

pub use participant::*;
pub use team::*;
