//! Round summary computed from the terminal state of the walk.

use chrono::{DateTime, Utc};
use round_model::{ParticipantId, RoundId, RoundMeta, SnapshotSequence, StreakTier, TeamLabel};
use serde::{Deserialize, Serialize};

use crate::trackers::{ParticipantStateTracker, TeamAggregator};

/// Who drew first blood, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstBloodRecord {
    pub participant: ParticipantId,
    pub timestamp: DateTime<Utc>,
}

/// The round's top entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpRecord {
    pub player_name: ParticipantId,
    pub team: TeamLabel,
    pub score: i64,
    pub kills: u32,
    pub deaths: u32,
    pub kd_ratio: f64,
}

/// The longest kill streak of the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub participant: ParticipantId,
    pub length: u32,
}

/// Aggregate statistics for one round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round_id: Option<RoundId>,
    pub map_name: String,
    pub duration_secs: i64,
    pub total_kills: u64,
    pub total_deaths: u64,
    pub participant_count: usize,
    pub average_kd: f64,
    pub mvp: Option<MvpRecord>,
    pub longest_streak: Option<StreakRecord>,
    pub first_blood: Option<FirstBloodRecord>,
    pub lead_change_count: usize,
    /// Smallest top-two team margin; 0 when fewer than two teams were seen.
    pub closest_gap: i64,
}

/// Computes the [`RoundSummary`] once the walk is complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryCalculator;

impl SummaryCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Build the summary from the final snapshot and the trackers' terminal state.
    pub fn calculate(
        &self,
        sequence: &SnapshotSequence,
        meta: &RoundMeta,
        participants: &ParticipantStateTracker,
        teams: &TeamAggregator,
        first_blood: Option<&FirstBloodRecord>,
    ) -> RoundSummary {
        let mut summary = RoundSummary {
            round_id: meta.round_id,
            map_name: meta.map_name.clone(),
            ..Default::default()
        };

        let Some(last) = sequence.last() else {
            return summary;
        };

        summary.total_kills = last.entries.iter().map(|e| u64::from(e.kills)).sum();
        summary.total_deaths = last.entries.iter().map(|e| u64::from(e.deaths)).sum();
        summary.participant_count = last.entries.len();
        summary.average_kd = average_kd(summary.total_kills, summary.total_deaths);

        // Entries arrive score-sorted, so the first one is the MVP.
        summary.mvp = last.leader().map(|top| MvpRecord {
            player_name: top.participant_id.clone(),
            team: top.team_label.clone(),
            score: top.score,
            kills: top.kills,
            deaths: top.deaths,
            kd_ratio: top.kd_ratio(),
        });

        summary.longest_streak = longest_streak(participants);
        summary.first_blood = first_blood.cloned();
        summary.lead_change_count = teams.lead_change_count();
        summary.closest_gap = teams.closest_gap().unwrap_or(0);

        // Same bounds as the report's round start and end events.
        let start = sequence
            .first()
            .map_or(meta.start_time, |first| meta.round_start(first.timestamp));
        summary.duration_secs = (meta.round_end(last.timestamp) - start).num_seconds();

        summary
    }
}

fn average_kd(kills: u64, deaths: u64) -> f64 {
    // Counts stay far below 2^52, so the conversion is exact.
    if deaths == 0 {
        kills as f64
    } else {
        kills as f64 / deaths as f64
    }
}

/// Best streak that reached a tier; the first-tracked participant wins ties.
fn longest_streak(participants: &ParticipantStateTracker) -> Option<StreakRecord> {
    let min = StreakTier::KillingSpree.threshold();
    let mut best: Option<StreakRecord> = None;

    for (id, state) in participants.iter_in_order() {
        if state.best_streak < min {
            continue;
        }
        if best.as_ref().map_or(true, |b| state.best_streak > b.length) {
            best = Some(StreakRecord {
                participant: id.clone(),
                length: state.best_streak,
            });
        }
    }

    best
}
