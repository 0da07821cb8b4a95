//! Report assembly - the entry point that runs one forward pass and packages its results.

use chrono::{DateTime, Utc};
use round_model::{Entry, ParticipantId, RoundMeta, SequenceError, SnapshotSequence};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NarrativeConfig;
use crate::events::{BattleEvent, EventKind};
use crate::highlights::Highlight;
use crate::summary::{RoundSummary, SummaryCalculator};
use crate::synthesizer::EventSynthesizer;

/// Errors raised when a report is built with strict input checking.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The snapshot sequence broke an upstream guarantee.
    #[error("invalid snapshot sequence: {source}")]
    InvalidSequence {
        #[from]
        source: SequenceError,
    },
}

/// The play-by-play feed, highlights and summary for one round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleReport {
    pub events: Vec<BattleEvent>,
    pub highlights: Vec<Highlight>,
    pub summary: RoundSummary,
}

impl BattleReport {
    /// Serialize the report for the presentation layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Only the events flagged as highlights.
    pub fn highlighted_events(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter().filter(|e| e.is_highlight())
    }
}

/// Builds [`BattleReport`]s. Holds configuration only; every build owns its state.
pub struct ReportAssembler {
    synthesizer: EventSynthesizer,
    summary: SummaryCalculator,
}

impl ReportAssembler {
    /// Create an assembler with the given configuration.
    pub fn new(config: NarrativeConfig) -> Self {
        Self {
            synthesizer: EventSynthesizer::new(config),
            summary: SummaryCalculator::new(),
        }
    }

    /// Create an assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(NarrativeConfig::default())
    }

    /// Build the report in a single pass. Malformed counters are clamped, never rejected.
    pub fn build_report(&self, sequence: &SnapshotSequence, meta: &RoundMeta) -> BattleReport {
        let output = self.synthesizer.synthesize(sequence);

        let (Some(first), Some(last)) = (sequence.first(), sequence.last()) else {
            info!(map = %meta.map_name, "Empty snapshot sequence, nothing to report");
            return BattleReport {
                summary: self.summary.calculate(
                    sequence,
                    meta,
                    &output.participants,
                    &output.teams,
                    None,
                ),
                ..Default::default()
            };
        };

        info!(map = %meta.map_name, snapshots = sequence.len(), "Building battle report");

        let round_start = meta.round_start(first.timestamp);
        let round_end = meta.round_end(last.timestamp);

        let mut events = Vec::with_capacity(output.events.len() + 2);
        events.push(BattleEvent::new(
            round_start,
            ParticipantId::system(),
            EventKind::System,
            format!("Round started on {}", meta.map_name),
        ));
        events.extend(output.events);
        events.push(round_end_event(round_end, last.leader()));
        events.sort_by_key(|e| e.timestamp);

        let selector = self.synthesizer.selector();
        let mvp = selector.mvp(last, round_end);
        let highlights = selector.select(output.highlights, mvp);

        let summary = self.summary.calculate(
            sequence,
            meta,
            &output.participants,
            &output.teams,
            output.first_blood.as_ref(),
        );

        info!(
            map = %meta.map_name,
            events = events.len(),
            highlights = highlights.len(),
            lead_changes = summary.lead_change_count,
            "Battle report built"
        );

        BattleReport {
            events,
            highlights,
            summary,
        }
    }

    /// Validate the sequence first and refuse it instead of clamping.
    pub fn build_report_checked(
        &self,
        sequence: &SnapshotSequence,
        meta: &RoundMeta,
    ) -> Result<BattleReport, ReportError> {
        sequence.validate()?;
        Ok(self.build_report(sequence, meta))
    }
}

fn round_end_event(timestamp: DateTime<Utc>, winner: Option<&Entry>) -> BattleEvent {
    let message = match winner {
        Some(top) => format!(
            "Round over! {} ({}) wins with {} points",
            top.participant_id, top.team_label, top.score
        ),
        None => "Round over!".to_string(),
    };
    BattleEvent::new(timestamp, ParticipantId::system(), EventKind::System, message)
}
