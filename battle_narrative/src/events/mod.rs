//! Battle events - the play-by-play feed inferred from snapshot deltas.

use chrono::{DateTime, Utc};
use round_model::{ParticipantId, StreakTier, TeamLabel};
use serde::{Deserialize, Serialize, Serializer};

/// What happened, with the payload that kind of event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// One kill, with the estimated points it was worth.
    Kill {
        target: Option<ParticipantId>,
        points: i64,
    },
    Death {
        killer: Option<ParticipantId>,
    },
    /// Score gained without kills.
    Objective { points: i64 },
    /// First sighting of a participant.
    Spawn,
    FirstBlood { target: Option<ParticipantId> },
    /// A new streak tier was reached.
    KillingSpree { tier: StreakTier, streak: u32 },
    /// A streak was broken by a death.
    SpreeEnded { streak: u32 },
    LeadChange { team: TeamLabel, gap: i64 },
    Domination { target: ParticipantId },
    Revenge { target: ParticipantId },
    /// Round-level announcement.
    System,
}

impl EventKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Kill { .. } => "kill",
            EventKind::Death { .. } => "death",
            EventKind::Objective { .. } => "objective",
            EventKind::Spawn => "spawn",
            EventKind::FirstBlood { .. } => "first_blood",
            EventKind::KillingSpree { .. } => "killing_spree",
            EventKind::SpreeEnded { .. } => "spree_ended",
            EventKind::LeadChange { .. } => "lead_change",
            EventKind::Domination { .. } => "domination",
            EventKind::Revenge { .. } => "revenge",
            EventKind::System => "system",
        }
    }
}

/// A single inferred event in the round.
///
/// Serialized with its derived `value` and `isHighlight` alongside the kind's payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEvent {
    pub timestamp: DateTime<Utc>,
    pub participant: ParticipantId,
    pub message: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl BattleEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        participant: ParticipantId,
        kind: EventKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            participant,
            message: message.into(),
            kind,
        }
    }

    /// The other participant involved, if any.
    pub fn target(&self) -> Option<&ParticipantId> {
        match &self.kind {
            EventKind::Kill { target, .. } | EventKind::FirstBlood { target } => target.as_ref(),
            EventKind::Death { killer } => killer.as_ref(),
            EventKind::Domination { target } | EventKind::Revenge { target } => Some(target),
            _ => None,
        }
    }

    /// Numeric payload; only kills, objectives and streak events carry one.
    pub fn value(&self) -> Option<i64> {
        match self.kind {
            EventKind::Kill { points, .. } | EventKind::Objective { points } => Some(points),
            EventKind::KillingSpree { streak, .. } | EventKind::SpreeEnded { streak } => {
                Some(i64::from(streak))
            }
            _ => None,
        }
    }

    /// Whether the feed should call this event out.
    pub fn is_highlight(&self) -> bool {
        matches!(
            self.kind,
            EventKind::FirstBlood { .. }
                | EventKind::KillingSpree { .. }
                | EventKind::LeadChange { .. }
                | EventKind::Domination { .. }
        )
    }
}

/// Wire form of [`BattleEvent`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord<'a> {
    timestamp: &'a DateTime<Utc>,
    participant: &'a ParticipantId,
    message: &'a str,
    #[serde(flatten)]
    kind: &'a EventKind,
    value: Option<i64>,
    is_highlight: bool,
}

impl Serialize for BattleEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EventRecord {
            timestamp: &self.timestamp,
            participant: &self.participant,
            message: &self.message,
            kind: &self.kind,
            value: self.value(),
            is_highlight: self.is_highlight(),
        }
        .serialize(serializer)
    }
}
