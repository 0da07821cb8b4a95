//! Event Synthesizer - infers discrete events from consecutive leaderboard snapshots.
//!
//! The walk visits every snapshot once. For each participant in a snapshot the
//! rule chain runs in a fixed order, because later rules read state the
//! earlier ones set:
//! 1. **First blood**: the first kill of the round
//! 2. **Streak tier**: a new tier was reached this interval
//! 3. **Kills**: one event per kill, with inferred victim, revenge and domination
//! 4. **Deaths**: a broken streak, then one event per death
//! 5. **Objective**: large score gain without kills
//! 6. **Spawn**: first sighting replaces rules 1-5 for that interval
//!
//! Per snapshot, after all participants:
//! 7. **Lead change** between teams
//! 8. **Status**: periodic announcement of the score leader

use chrono::{DateTime, Utc};
use round_model::{Entry, ParticipantId, Snapshot, SnapshotSequence, StreakTier, TeamLabel};
use std::collections::HashMap;
use tracing::debug;

use crate::config::NarrativeConfig;
use crate::events::{BattleEvent, EventKind};
use crate::highlights::{Highlight, HighlightSelector};
use crate::summary::FirstBloodRecord;
use crate::trackers::{ParticipantStateTracker, StateDelta, TeamAggregator};

/// Everything one walk produces, including the terminal tracker state.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// Events ordered by timestamp.
    pub events: Vec<BattleEvent>,
    /// Highlight candidates in emission order.
    pub highlights: Vec<Highlight>,
    pub first_blood: Option<FirstBloodRecord>,
    pub participants: ParticipantStateTracker,
    pub teams: TeamAggregator,
}

impl SynthesisOutput {
    fn empty(config: &NarrativeConfig) -> Self {
        Self {
            events: Vec::new(),
            highlights: Vec::new(),
            first_blood: None,
            participants: ParticipantStateTracker::new(),
            teams: TeamAggregator::new(config.lead_change_gap),
        }
    }

    fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }
}

/// Kill/death pairing for one interval, indexed like the snapshot's entries.
#[derive(Debug, Default)]
struct Pairing {
    victims: Vec<Vec<ParticipantId>>,
    killers: Vec<Vec<ParticipantId>>,
}

/// Walks a snapshot sequence and emits typed events.
pub struct EventSynthesizer {
    config: NarrativeConfig,
    selector: HighlightSelector,
}

impl EventSynthesizer {
    /// Create a synthesizer with the given configuration.
    pub fn new(config: NarrativeConfig) -> Self {
        let selector =
            HighlightSelector::new(config.highlight_kinds.clone(), config.comeback_deficit);
        Self { config, selector }
    }

    /// Create a synthesizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(NarrativeConfig::default())
    }

    pub fn selector(&self) -> &HighlightSelector {
        &self.selector
    }

    /// Run the walk. Fewer than two snapshots yield no events.
    pub fn synthesize(&self, sequence: &SnapshotSequence) -> SynthesisOutput {
        let mut out = SynthesisOutput::empty(&self.config);
        if sequence.len() < 2 {
            return out;
        }

        let mut previous: Option<&Snapshot> = None;
        for (index, snapshot) in sequence.iter().enumerate() {
            self.walk_snapshot(index, previous, snapshot, &mut out);
            previous = Some(snapshot);
        }

        // Stable: equal timestamps keep emission order.
        out.events.sort_by_key(|e| e.timestamp);
        out
    }

    fn walk_snapshot(
        &self,
        index: usize,
        previous: Option<&Snapshot>,
        snapshot: &Snapshot,
        out: &mut SynthesisOutput,
    ) {
        let prev_entries: HashMap<&ParticipantId, &Entry> = previous
            .map(|p| p.entries.iter().map(|e| (&e.participant_id, e)).collect())
            .unwrap_or_default();

        let deltas: Vec<StateDelta> = snapshot
            .entries
            .iter()
            .map(|entry| {
                let prev = prev_entries.get(&entry.participant_id).copied();
                out.participants.observe(prev, entry)
            })
            .collect();

        let pairing = pair_kills(&deltas, &snapshot.entries);

        for (i, (delta, entry)) in deltas.iter().zip(&snapshot.entries).enumerate() {
            let victims = pairing.victims.get(i).map(Vec::as_slice).unwrap_or(&[]);
            let killers = pairing.killers.get(i).map(Vec::as_slice).unwrap_or(&[]);
            self.apply_rules(snapshot.timestamp, delta, &entry.team_label, victims, killers, out);
        }

        self.check_lead_change(snapshot, out);
        self.announce_status(index, snapshot, out);
    }

    fn apply_rules(
        &self,
        timestamp: DateTime<Utc>,
        delta: &StateDelta,
        team: &TeamLabel,
        victims: &[ParticipantId],
        killers: &[ParticipantId],
        out: &mut SynthesisOutput,
    ) {
        let who = &delta.participant;

        if delta.spawned {
            out.emit(BattleEvent::new(
                timestamp,
                who.clone(),
                EventKind::Spawn,
                format!("{} joined the battle for {}", who, team),
            ));
            return;
        }
        if delta.is_idle() {
            return;
        }

        // First blood
        if delta.kills > 0 && out.first_blood.is_none() {
            debug!(participant = %who, "First blood");
            out.first_blood = Some(FirstBloodRecord {
                participant: who.clone(),
                timestamp,
            });
            let target = victims.first().cloned();
            let message = match &target {
                Some(victim) => format!("{} drew first blood against {}!", who, victim),
                None => format!("{} drew first blood!", who),
            };
            self.emit_highlighted(
                BattleEvent::new(timestamp, who.clone(), EventKind::FirstBlood { target }, message),
                out,
            );
        }

        // Streak tier
        let tier_before = StreakTier::resolve(delta.streak_before);
        if let Some(tier) = StreakTier::resolve(delta.streak_peak) {
            if tier_before != Some(tier) {
                debug!(participant = %who, %tier, streak = delta.streak_peak, "Streak tier reached");
                self.emit_highlighted(
                    BattleEvent::new(
                        timestamp,
                        who.clone(),
                        EventKind::KillingSpree {
                            tier,
                            streak: delta.streak_peak,
                        },
                        format!("{} is on a {}! ({} kills)", who, tier, delta.streak_peak),
                    ),
                    out,
                );
            }
        }

        // Kills
        let points = self.points_per_kill(delta);
        for unit in 0..delta.kills {
            let target = usize::try_from(unit).ok().and_then(|u| victims.get(u)).cloned();
            let message = match &target {
                Some(victim) => format!("{} eliminated {} (+{})", who, victim, points),
                None => format!("{} scored a kill (+{})", who, points),
            };
            out.emit(BattleEvent::new(
                timestamp,
                who.clone(),
                EventKind::Kill {
                    target: target.clone(),
                    points,
                },
                message,
            ));

            if let Some(victim) = target {
                self.attribute(timestamp, who, victim, out);
            }
        }

        // Deaths
        if let Some(broken) = delta.broken_streak {
            if broken >= self.config.spree_end_min_streak {
                let message = match killers.first() {
                    Some(killer) => format!("{} ended {}'s {}-kill streak", killer, who, broken),
                    None => format!("{}'s {}-kill streak has ended", who, broken),
                };
                out.emit(BattleEvent::new(
                    timestamp,
                    who.clone(),
                    EventKind::SpreeEnded { streak: broken },
                    message,
                ));
            }
        }
        for unit in 0..delta.deaths {
            let killer = usize::try_from(unit).ok().and_then(|u| killers.get(u)).cloned();
            let message = match &killer {
                Some(k) => format!("{} was eliminated by {}", who, k),
                None => format!("{} was eliminated", who),
            };
            out.emit(BattleEvent::new(
                timestamp,
                who.clone(),
                EventKind::Death { killer },
                message,
            ));
        }

        // Objective
        if delta.kills == 0 && delta.score > self.config.objective_score_threshold {
            out.emit(BattleEvent::new(
                timestamp,
                who.clone(),
                EventKind::Objective {
                    points: delta.score,
                },
                format!("{} captured an objective (+{})", who, delta.score),
            ));
        }
    }

    /// Display estimate; the leaderboard does not split score by source.
    fn points_per_kill(&self, delta: &StateDelta) -> i64 {
        let units = i64::from(delta.kills) + i64::from(delta.deaths);
        if units == 0 {
            self.config.default_kill_points
        } else {
            delta.score / units
        }
    }

    fn attribute(
        &self,
        timestamp: DateTime<Utc>,
        killer: &ParticipantId,
        victim: ParticipantId,
        out: &mut SynthesisOutput,
    ) {
        let outcome =
            out.participants
                .attribute_kill(killer, &victim, self.config.domination_threshold);

        if outcome.revenge {
            out.emit(BattleEvent::new(
                timestamp,
                killer.clone(),
                EventKind::Revenge {
                    target: victim.clone(),
                },
                format!("{} got revenge on {}", killer, victim),
            ));
        }
        if outcome.domination {
            let message = format!("{} is DOMINATING {}", killer, victim);
            self.emit_highlighted(
                BattleEvent::new(
                    timestamp,
                    killer.clone(),
                    EventKind::Domination { target: victim },
                    message,
                ),
                out,
            );
        }
    }

    fn check_lead_change(&self, snapshot: &Snapshot, out: &mut SynthesisOutput) {
        let Some(change) = out.teams.observe(&snapshot.entries) else {
            return;
        };

        let event = BattleEvent::new(
            snapshot.timestamp,
            ParticipantId::new(change.team.as_str()),
            EventKind::LeadChange {
                team: change.team.clone(),
                gap: change.gap,
            },
            format!(
                "{} takes the lead from {} by {} points",
                change.team, change.previous, change.gap
            ),
        );
        if let Some(highlight) = self.selector.classify(&event, Some(&change)) {
            out.highlights.push(highlight);
        }
        out.emit(event);
    }

    fn announce_status(&self, index: usize, snapshot: &Snapshot, out: &mut SynthesisOutput) {
        let cadence = self.config.status_cadence;
        if cadence == 0 || index == 0 || index % cadence != 0 {
            return;
        }
        let Some(leader) = score_leader(&snapshot.entries) else {
            return;
        };

        out.emit(BattleEvent::new(
            snapshot.timestamp,
            ParticipantId::system(),
            EventKind::System,
            format!(
                "{} leads with {} points ({} kills)",
                leader.participant_id, leader.score, leader.kills
            ),
        ));
    }

    fn emit_highlighted(&self, event: BattleEvent, out: &mut SynthesisOutput) {
        if let Some(highlight) = self.selector.classify(&event, None) {
            out.highlights.push(highlight);
        }
        out.emit(event);
    }
}

/// Highest-scoring entry; the first one wins ties.
fn score_leader(entries: &[Entry]) -> Option<&Entry> {
    entries.iter().fold(None, |best: Option<&Entry>, entry| match best {
        Some(b) if b.score >= entry.score => Some(b),
        _ => Some(entry),
    })
}

/// Pair this interval's kill units with death units on other teams, both in entry order.
fn pair_kills(deltas: &[StateDelta], entries: &[Entry]) -> Pairing {
    let mut pairing = Pairing {
        victims: vec![Vec::new(); deltas.len()],
        killers: vec![Vec::new(); deltas.len()],
    };

    let mut death_units: Vec<(usize, bool)> = Vec::new();
    for (i, delta) in deltas.iter().enumerate() {
        for _ in 0..delta.deaths {
            death_units.push((i, false));
        }
    }
    if death_units.is_empty() {
        return pairing;
    }

    for (k, (delta, killer)) in deltas.iter().zip(entries).enumerate() {
        for _ in 0..delta.kills {
            let slot = death_units.iter_mut().find(|(v, used)| {
                !*used
                    && entries
                        .get(*v)
                        .is_some_and(|victim| victim.team_label != killer.team_label)
            });
            let Some((v, used)) = slot else {
                break;
            };
            *used = true;
            let v = *v;

            if let (Some(victim), Some(victim_list), Some(killer_list)) = (
                entries.get(v),
                pairing.victims.get_mut(k),
                pairing.killers.get_mut(v),
            ) {
                victim_list.push(victim.participant_id.clone());
                killer_list.push(killer.participant_id.clone());
            }
        }
    }

    pairing
}
