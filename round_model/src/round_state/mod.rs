//! Round state - leaderboard snapshots and the metadata of the round they belong to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::participants::{Entry, ParticipantId};

/// Unique identifier for rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundId(pub Uuid);

impl RoundId {
    /// Create a new random round ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a round ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata about the round supplied alongside its snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundMeta {
    #[serde(default)]
    pub round_id: Option<RoundId>,
    pub map_name: String,
    pub start_time: DateTime<Utc>,
    /// None = the round ended at its last snapshot.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl RoundMeta {
    /// Create metadata for a round on the given map.
    pub fn new(map_name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            round_id: None,
            map_name: map_name.into(),
            start_time,
            end_time: None,
        }
    }

    pub fn with_round_id(mut self, round_id: RoundId) -> Self {
        self.round_id = Some(round_id);
        self
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Start of the round, never later than its first snapshot.
    pub fn round_start(&self, first_snapshot: DateTime<Utc>) -> DateTime<Utc> {
        self.start_time.min(first_snapshot)
    }

    /// End of the round, never earlier than its last snapshot.
    pub fn round_end(&self, last_snapshot: DateTime<Utc>) -> DateTime<Utc> {
        self.end_time.unwrap_or(last_snapshot).max(last_snapshot)
    }
}

/// All participants' cumulative stats at one instant of the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<Entry>,
}

impl Snapshot {
    /// Create a snapshot from its entries.
    pub fn new(timestamp: DateTime<Utc>, entries: Vec<Entry>) -> Self {
        Self { timestamp, entries }
    }

    /// The first entry; the stats service sorts entries by score descending.
    pub fn leader(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors found when checking a snapshot sequence against the upstream guarantees.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// A snapshot is not strictly later than its predecessor.
    #[error("snapshot {index} at {timestamp} is not after the previous snapshot")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// A participant appears twice in one snapshot.
    #[error("participant {participant} appears more than once in snapshot {index}")]
    DuplicateParticipant {
        index: usize,
        participant: ParticipantId,
    },

    /// A cumulative counter went down while the participant was tracked.
    #[error("{counter} of {participant} decreased from {previous} to {current} at snapshot {index}")]
    CounterRegression {
        index: usize,
        participant: ParticipantId,
        counter: &'static str,
        previous: i64,
        current: i64,
    },

    /// The JSON payload could not be decoded.
    #[error("failed to decode snapshot sequence: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// The time-ordered snapshots of one round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotSequence {
    snapshots: Vec<Snapshot>,
}

impl SnapshotSequence {
    /// Wrap snapshots that are already in time order.
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    /// Decode a sequence from the stats service's JSON array.
    pub fn from_json(json: &str) -> Result<Self, SequenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Iterate over snapshots in time order.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Check the ordering, uniqueness and monotonic-counter guarantees.
    ///
    /// Counters are only compared between consecutive snapshots that both
    /// contain the participant.
    pub fn validate(&self) -> Result<(), SequenceError> {
        let mut previous: Option<&Snapshot> = None;

        for (index, snapshot) in self.snapshots.iter().enumerate() {
            let mut seen = HashSet::new();
            for entry in &snapshot.entries {
                if !seen.insert(&entry.participant_id) {
                    return Err(SequenceError::DuplicateParticipant {
                        index,
                        participant: entry.participant_id.clone(),
                    });
                }
            }

            if let Some(prev) = previous {
                if snapshot.timestamp <= prev.timestamp {
                    return Err(SequenceError::OutOfOrder {
                        index,
                        timestamp: snapshot.timestamp,
                    });
                }

                let prev_entries: HashMap<_, _> = prev
                    .entries
                    .iter()
                    .map(|e| (&e.participant_id, e))
                    .collect();

                for entry in &snapshot.entries {
                    let Some(before) = prev_entries.get(&entry.participant_id) else {
                        continue;
                    };
                    let counters = [
                        ("kills", i64::from(before.kills), i64::from(entry.kills)),
                        ("deaths", i64::from(before.deaths), i64::from(entry.deaths)),
                        ("score", before.score, entry.score),
                    ];
                    for (counter, old, new) in counters {
                        if new < old {
                            return Err(SequenceError::CounterRegression {
                                index,
                                participant: entry.participant_id.clone(),
                                counter,
                                previous: old,
                                current: new,
                            });
                        }
                    }
                }
            }

            previous = Some(snapshot);
        }

        Ok(())
    }
}

impl From<Vec<Snapshot>> for SnapshotSequence {
    fn from(snapshots: Vec<Snapshot>) -> Self {
        Self::new(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_valid_sequence() {
        let seq = SnapshotSequence::new(vec![
            Snapshot::new(at(0), vec![Entry::new("Viper", "Red")]),
            Snapshot::new(at(30), vec![Entry::new("Viper", "Red").with_kills(1).with_score(10)]),
        ]);
        assert!(seq.validate().is_ok());
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_out_of_order_snapshots() {
        let seq = SnapshotSequence::new(vec![
            Snapshot::new(at(30), vec![]),
            Snapshot::new(at(30), vec![]),
        ]);
        assert!(matches!(
            seq.validate(),
            Err(SequenceError::OutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_participant() {
        let seq = SnapshotSequence::new(vec![Snapshot::new(
            at(0),
            vec![Entry::new("Viper", "Red"), Entry::new("Viper", "Blue")],
        )]);
        assert!(matches!(
            seq.validate(),
            Err(SequenceError::DuplicateParticipant { index: 0, .. })
        ));
    }

    #[test]
    fn test_counter_regression() {
        let seq = SnapshotSequence::new(vec![
            Snapshot::new(at(0), vec![Entry::new("Viper", "Red").with_kills(3)]),
            Snapshot::new(at(30), vec![Entry::new("Viper", "Red").with_kills(2)]),
        ]);
        match seq.validate() {
            Err(SequenceError::CounterRegression {
                counter,
                previous,
                current,
                ..
            }) => {
                assert_eq!(counter, "kills");
                assert_eq!(previous, 3);
                assert_eq!(current, 2);
            }
            other => panic!("expected counter regression, got {:?}", other),
        }
    }

    #[test]
    fn test_rejoining_participant_is_not_a_regression() {
        let seq = SnapshotSequence::new(vec![
            Snapshot::new(at(0), vec![Entry::new("Viper", "Red").with_kills(3)]),
            Snapshot::new(at(30), vec![]),
            Snapshot::new(at(60), vec![Entry::new("Viper", "Red")]),
        ]);
        assert!(seq.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"timestamp": "2024-05-01T20:00:00Z", "entries": [
                {"participantId": "Viper", "score": 0, "kills": 0, "deaths": 0, "teamLabel": "Red"}
            ]},
            {"timestamp": "2024-05-01T20:00:30Z", "entries": [
                {"participantId": "Viper", "score": 10, "kills": 1, "deaths": 0, "teamLabel": "Red"}
            ]}
        ]"#;

        let seq = SnapshotSequence::from_json(json).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.last().unwrap().leader().unwrap().kills, 1);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            SnapshotSequence::from_json("{not json"),
            Err(SequenceError::Json { .. })
        ));
    }

    #[test]
    fn test_round_bounds_cover_the_snapshots() {
        let meta = RoundMeta::new("Dust", at(10));
        assert_eq!(meta.round_start(at(5)), at(5));
        assert_eq!(meta.round_start(at(20)), at(10));
        assert_eq!(meta.round_end(at(60)), at(60));

        let meta = meta.with_end_time(at(40));
        assert_eq!(meta.round_end(at(60)), at(60));
        assert_eq!(meta.round_end(at(30)), at(40));
    }

    #[test]
    fn test_snapshot_leader() {
        let snapshot = Snapshot::new(
            at(0),
            vec![
                Entry::new("Viper", "Red").with_score(50),
                Entry::new("Ghost", "Blue").with_score(20),
            ],
        );
        assert_eq!(snapshot.leader().unwrap().participant_id.as_str(), "Viper");
        assert!(!snapshot.is_empty());
        assert!(Snapshot::new(at(0), vec![]).leader().is_none());
    }
}
