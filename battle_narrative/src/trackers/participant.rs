//! Per-participant state across one walk of the snapshot sequence.

use round_model::{Entry, ParticipantId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Everything remembered about one participant during a report build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantState {
    pub cumulative_kills: u32,
    pub cumulative_deaths: u32,
    pub cumulative_score: i64,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Victim -> kills on them since they last killed this participant.
    pub kill_attribution: HashMap<ParticipantId, u32>,
    /// Killer -> deaths to them.
    pub death_attribution: HashMap<ParticipantId, u32>,
}

/// What changed for one participant between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDelta {
    pub participant: ParticipantId,
    /// No previous entry: kill/death inference is skipped for this interval.
    pub spawned: bool,
    pub kills: u32,
    pub deaths: u32,
    pub score: i64,
    pub streak_before: u32,
    /// Streak after this interval's kills, before any death reset.
    pub streak_peak: u32,
    /// The streak a death broke, if the participant died this interval.
    pub broken_streak: Option<u32>,
}

impl StateDelta {
    /// Nothing changed; no rule can fire.
    pub fn is_idle(&self) -> bool {
        self.kills == 0 && self.deaths == 0 && self.score == 0
    }
}

/// Outcome of attributing one kill to a killer/victim pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillAttribution {
    /// The victim had been dominating the killer.
    pub revenge: bool,
    /// The killer just reached the domination threshold on the victim.
    pub domination: bool,
}

/// Owns every participant's state for the lifetime of one report build.
#[derive(Debug, Clone, Default)]
pub struct ParticipantStateTracker {
    states: HashMap<ParticipantId, ParticipantState>,
    /// First-sighting order, used for deterministic tie-breaks.
    order: Vec<ParticipantId>,
}

impl ParticipantStateTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry into the participant's state and report the delta.
    ///
    /// Negative deltas are clamped to zero. Never fails.
    pub fn observe(&mut self, prev: Option<&Entry>, curr: &Entry) -> StateDelta {
        let id = &curr.participant_id;
        let state = self.state_mut(id);
        let streak_before = state.current_streak;

        let Some(prev) = prev else {
            state.cumulative_kills = curr.kills;
            state.cumulative_deaths = curr.deaths;
            state.cumulative_score = curr.score;
            return StateDelta {
                participant: id.clone(),
                spawned: true,
                kills: 0,
                deaths: 0,
                score: 0,
                streak_before,
                streak_peak: streak_before,
                broken_streak: None,
            };
        };

        let kills = clamp_delta(id, "kills", i64::from(prev.kills), i64::from(curr.kills));
        let deaths = clamp_delta(id, "deaths", i64::from(prev.deaths), i64::from(curr.deaths));
        let score = clamp_delta(id, "score", prev.score, curr.score);
        // Kill/death deltas fit in u32 because both sides are u32.
        let kills = u32::try_from(kills).unwrap_or(u32::MAX);
        let deaths = u32::try_from(deaths).unwrap_or(u32::MAX);

        state.cumulative_kills = curr.kills;
        state.cumulative_deaths = curr.deaths;
        state.cumulative_score = curr.score;

        if kills > 0 {
            state.current_streak = state.current_streak.saturating_add(kills);
            state.best_streak = state.best_streak.max(state.current_streak);
        }
        let streak_peak = state.current_streak;

        let broken_streak = if deaths > 0 {
            let broken = state.current_streak;
            state.current_streak = 0;
            Some(broken)
        } else {
            None
        };

        StateDelta {
            participant: id.clone(),
            spawned: false,
            kills,
            deaths,
            score,
            streak_before,
            streak_peak,
            broken_streak,
        }
    }

    /// Record that `killer` killed `victim` and update both attribution maps.
    pub fn attribute_kill(
        &mut self,
        killer: &ParticipantId,
        victim: &ParticipantId,
        domination_threshold: u32,
    ) -> KillAttribution {
        let mut outcome = KillAttribution::default();

        let victim_state = self.state_mut(victim);
        let victims_run = victim_state.kill_attribution.remove(killer).unwrap_or(0);
        outcome.revenge = domination_threshold > 0 && victims_run >= domination_threshold;
        *victim_state
            .death_attribution
            .entry(killer.clone())
            .or_default() += 1;

        let killer_state = self.state_mut(killer);
        let run = killer_state
            .kill_attribution
            .entry(victim.clone())
            .or_default();
        *run += 1;
        outcome.domination = *run == domination_threshold;

        outcome
    }

    fn state_mut(&mut self, id: &ParticipantId) -> &mut ParticipantState {
        if !self.states.contains_key(id) {
            self.order.push(id.clone());
        }
        self.states.entry(id.clone()).or_default()
    }

    /// Get a participant's state.
    pub fn get(&self, id: &ParticipantId) -> Option<&ParticipantState> {
        self.states.get(id)
    }

    /// Iterate over participants in first-sighting order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantState)> {
        self.order
            .iter()
            .filter_map(|id| self.states.get(id).map(|state| (id, state)))
    }

}

fn clamp_delta(participant: &ParticipantId, counter: &'static str, prev: i64, curr: i64) -> i64 {
    let delta = curr.saturating_sub(prev);
    if delta < 0 {
        warn!(%participant, counter, prev, curr, "Negative counter delta clamped to zero");
        0
    } else {
        delta
    }
}
