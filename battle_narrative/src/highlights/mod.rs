//! Highlight selection - the notable moments surfaced from the event feed.

use chrono::{DateTime, Utc};
use round_model::{ParticipantId, Snapshot};
use serde::{Deserialize, Serialize};

use crate::events::{BattleEvent, EventKind};
use crate::trackers::LeadChange;

/// Kinds of highlight moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    FirstBlood,
    KillingSpree,
    LeadChange,
    /// A lead change that overturned a large deficit.
    Comeback,
    Domination,
    Mvp,
}

impl HighlightKind {
    pub const ALL: [HighlightKind; 6] = [
        HighlightKind::FirstBlood,
        HighlightKind::KillingSpree,
        HighlightKind::LeadChange,
        HighlightKind::Comeback,
        HighlightKind::Domination,
        HighlightKind::Mvp,
    ];
}

/// A curated round moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    #[serde(rename = "type")]
    pub kind: HighlightKind,
    pub timestamp: DateTime<Utc>,
    pub participant: ParticipantId,
    pub description: String,
    pub value: Option<i64>,
}

/// Turns highlight-worthy events into highlights and assembles the final list.
#[derive(Debug, Clone)]
pub struct HighlightSelector {
    enabled: Vec<HighlightKind>,
    comeback_deficit: i64,
}

impl HighlightSelector {
    pub fn new(enabled: Vec<HighlightKind>, comeback_deficit: i64) -> Self {
        Self {
            enabled,
            comeback_deficit,
        }
    }

    /// Classify an event; `lead_change` carries the tracker's view of a lead change event.
    pub fn classify(
        &self,
        event: &BattleEvent,
        lead_change: Option<&LeadChange>,
    ) -> Option<Highlight> {
        let (kind, description) = match &event.kind {
            EventKind::FirstBlood { .. } => (
                HighlightKind::FirstBlood,
                format!("{} drew first blood", event.participant),
            ),
            EventKind::KillingSpree { tier, streak } => (
                HighlightKind::KillingSpree,
                format!("{} reached {} with {} kills", event.participant, tier, streak),
            ),
            EventKind::LeadChange { team, .. } => {
                match lead_change.filter(|c| c.overturned_deficit >= self.comeback_deficit) {
                    Some(change) => (
                        HighlightKind::Comeback,
                        format!(
                            "{} came back from {} points down to take the lead",
                            team, change.overturned_deficit
                        ),
                    ),
                    None => (HighlightKind::LeadChange, format!("{} took the lead", team)),
                }
            }
            EventKind::Domination { target } => (
                HighlightKind::Domination,
                format!("{} is dominating {}", event.participant, target),
            ),
            _ => return None,
        };

        let value = match event.kind {
            EventKind::LeadChange { gap, .. } => Some(gap),
            _ => event.value(),
        };

        Some(Highlight {
            kind,
            timestamp: event.timestamp,
            participant: event.participant.clone(),
            description,
            value,
        })
    }

    /// MVP highlight for the top entry of the final snapshot, stamped at round end.
    pub fn mvp(&self, final_snapshot: &Snapshot, round_end: DateTime<Utc>) -> Option<Highlight> {
        let top = final_snapshot.leader()?;
        Some(Highlight {
            kind: HighlightKind::Mvp,
            timestamp: round_end,
            participant: top.participant_id.clone(),
            description: format!(
                "{} was the MVP with {} points ({} kills, {} deaths)",
                top.participant_id, top.score, top.kills, top.deaths
            ),
            value: Some(top.score),
        })
    }

    /// Drop disabled kinds, append the MVP and order by timestamp.
    pub fn select(&self, candidates: Vec<Highlight>, mvp: Option<Highlight>) -> Vec<Highlight> {
        let mut selected: Vec<Highlight> = candidates
            .into_iter()
            .chain(mvp)
            .filter(|h| self.enabled.contains(&h.kind))
            .collect();
        selected.sort_by_key(|h| h.timestamp);
        selected
    }
}

impl Default for HighlightSelector {
    fn default() -> Self {
        Self::new(HighlightKind::ALL.to_vec(), 200)
    }
}
