//! # Battle Narrative
//!
//! Turns the periodic leaderboard snapshots of a finished round into a
//! play-by-play event feed, a set of highlight moments and a round summary.
//! The input comes from `round_model`; rendering the output is left to the
//! presentation layer.
//!
//! ## Core Components
//!
//! - **trackers**: per-participant streak/attribution state and team lead tracking
//! - **synthesizer**: the forward walk that infers events from snapshot deltas
//! - **highlights**: classification of notable moments, plus the MVP
//! - **summary**: aggregate statistics from the terminal state
//! - **report**: [`ReportAssembler`], the entry point tying it together
//!
//! ## Design Philosophy
//!
//! - **Single Pass**: one forward walk, O(snapshots x participants)
//! - **Deterministic**: identical input always yields an identical report
//! - **Best Effort**: anomalies in the input degrade the narrative, never abort it

pub mod config;
pub mod events;
pub mod highlights;
pub mod report;
pub mod summary;
pub mod synthesizer;
pub mod trackers;

pub use config::*;
pub use events::*;
pub use highlights::*;
pub use report::*;
pub use summary::*;
pub use synthesizer::*;
pub use trackers::*;
