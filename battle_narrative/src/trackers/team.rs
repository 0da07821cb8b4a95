//! Team score aggregation and lead tracking.

use round_model::{Entry, TeamLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A team's aggregate score in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team: TeamLabel,
    pub score: i64,
}

/// A confirmed change of the leading team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadChange {
    pub team: TeamLabel,
    pub previous: TeamLabel,
    /// Margin over the runner-up in the snapshot where the lead changed.
    pub gap: i64,
    /// Largest deficit the new leader had faced since the previous change.
    pub overturned_deficit: i64,
}

/// Tracks the leading team across snapshots.
///
/// The leader is the top team of the latest snapshot with two or more teams.
/// A lead change is reported when that top team differs from the previous
/// snapshot's and its margin exceeds the configured gap. The first such
/// snapshot sets the leader silently.
#[derive(Debug, Clone)]
pub struct TeamAggregator {
    lead_change_gap: i64,
    leader: Option<TeamLabel>,
    deficits: HashMap<TeamLabel, i64>,
    closest_gap: Option<i64>,
    lead_change_count: usize,
}

impl TeamAggregator {
    pub fn new(lead_change_gap: i64) -> Self {
        Self {
            lead_change_gap,
            leader: None,
            deficits: HashMap::new(),
            closest_gap: None,
            lead_change_count: 0,
        }
    }

    /// Sum entry scores per team, in order of first appearance.
    pub fn aggregate(entries: &[Entry]) -> Vec<TeamStanding> {
        let mut standings: Vec<TeamStanding> = Vec::new();
        for entry in entries {
            match standings.iter_mut().find(|s| s.team == entry.team_label) {
                Some(standing) => standing.score = standing.score.saturating_add(entry.score),
                None => standings.push(TeamStanding {
                    team: entry.team_label.clone(),
                    score: entry.score,
                }),
            }
        }
        standings
    }

    /// Fold one snapshot's entries in; returns the lead change it confirms, if any.
    pub fn observe(&mut self, entries: &[Entry]) -> Option<LeadChange> {
        let standings = Self::aggregate(entries);
        if standings.len() < 2 {
            return None;
        }

        let (top, gap) = top_and_gap(&standings)?;
        self.closest_gap = Some(self.closest_gap.map_or(gap, |closest| closest.min(gap)));

        let previous = self.leader.replace(top.team.clone());
        let change = match previous {
            Some(previous) if previous != top.team && gap > self.lead_change_gap => {
                let change = LeadChange {
                    team: top.team.clone(),
                    previous,
                    gap,
                    overturned_deficit: self.deficits.get(&top.team).copied().unwrap_or(0),
                };
                debug!(team = %change.team, previous = %change.previous, gap, "Lead changed");
                self.deficits.clear();
                self.lead_change_count += 1;
                Some(change)
            }
            _ => None,
        };

        self.track_deficits(&standings);
        change
    }

    /// Worst deficit of each team to this snapshot's leader since the last change.
    fn track_deficits(&mut self, standings: &[TeamStanding]) {
        let Some(leader) = &self.leader else {
            return;
        };
        let Some(leader_score) = standings
            .iter()
            .find(|s| &s.team == leader)
            .map(|s| s.score)
        else {
            return;
        };

        for standing in standings.iter().filter(|s| &s.team != leader) {
            let deficit = leader_score.saturating_sub(standing.score);
            let worst = self.deficits.entry(standing.team.clone()).or_insert(0);
            *worst = (*worst).max(deficit);
        }
    }

    pub fn leader(&self) -> Option<&TeamLabel> {
        self.leader.as_ref()
    }

    /// Smallest top-two margin seen, or None with fewer than two teams.
    pub fn closest_gap(&self) -> Option<i64> {
        self.closest_gap
    }

    pub fn lead_change_count(&self) -> usize {
        self.lead_change_count
    }
}

/// The top team (first seen wins ties) and its margin over the runner-up.
fn top_and_gap(standings: &[TeamStanding]) -> Option<(&TeamStanding, i64)> {
    let mut top: Option<&TeamStanding> = None;
    for standing in standings {
        if top.map_or(true, |t| standing.score > t.score) {
            top = Some(standing);
        }
    }
    let top = top?;

    let runner_up = standings
        .iter()
        .filter(|s| s.team != top.team)
        .map(|s| s.score)
        .max()?;

    Some((top, top.score.saturating_sub(runner_up)))
}
