//! Leaderboard entry definitions.

use serde::{Deserialize, Serialize};

use super::{ParticipantId, TeamLabel};

/// One participant's cumulative stats at a single snapshot.
///
/// Counters only grow while the participant is continuously tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub participant_id: ParticipantId,
    pub score: i64,
    pub kills: u32,
    pub deaths: u32,
    pub team_label: TeamLabel,
}

impl Entry {
    /// Create an entry with zeroed counters.
    pub fn new(participant_id: impl Into<ParticipantId>, team_label: impl Into<TeamLabel>) -> Self {
        Self {
            participant_id: participant_id.into(),
            score: 0,
            kills: 0,
            deaths: 0,
            team_label: team_label.into(),
        }
    }

    /// Set the cumulative score.
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    /// Set the cumulative kill count.
    pub fn with_kills(mut self, kills: u32) -> Self {
        self.kills = kills;
        self
    }

    /// Set the cumulative death count.
    pub fn with_deaths(mut self, deaths: u32) -> Self {
        self.deaths = deaths;
        self
    }

    /// Kill/death ratio, or the raw kill count when the participant never died.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(self.deaths)
        }
    }
}
