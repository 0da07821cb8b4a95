//! Tunable thresholds for narrative synthesis, loadable from TOML.

use serde::Deserialize;
use std::path::Path;

use crate::highlights::HighlightKind;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("failed to parse config TOML: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },
}

/// Thresholds and cadences used while synthesizing a report.
///
/// Every field has a default, so a partial TOML table is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Emit a status event every N snapshots (0 disables).
    pub status_cadence: usize,

    /// Minimum gap between the top two teams for a lead change.
    pub lead_change_gap: i64,

    /// Non-kill score gain above this counts as an objective.
    pub objective_score_threshold: i64,

    /// Points shown per kill when no score could be apportioned.
    pub default_kill_points: i64,

    /// Shortest streak whose end is announced.
    pub spree_end_min_streak: u32,

    /// Consecutive kills on one victim that make a domination.
    pub domination_threshold: u32,

    /// Deficit a team must overturn for its lead change to count as a comeback.
    pub comeback_deficit: i64,

    /// Highlight kinds kept in the final report.
    pub highlight_kinds: Vec<HighlightKind>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            status_cadence: 5,
            lead_change_gap: 50,
            objective_score_threshold: 50,
            default_kill_points: 10,
            spree_end_min_streak: 3,
            domination_threshold: 4,
            comeback_deficit: 200,
            highlight_kinds: HighlightKind::ALL.to_vec(),
        }
    }
}

impl NarrativeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}
