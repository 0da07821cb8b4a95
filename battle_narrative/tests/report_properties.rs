//! End-to-end properties of `ReportAssembler::build_report`.

use battle_narrative::{BattleEvent, EventKind, HighlightKind, ReportAssembler};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use round_model::{Entry, RoundId, RoundMeta, Snapshot, SnapshotSequence};
use uuid::Uuid;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap() + Duration::seconds(secs)
}

fn meta() -> RoundMeta {
    RoundMeta::new("Harbor", at(0)).with_round_id(RoundId::from_uuid(Uuid::nil()))
}

fn sequence(rows: Vec<Vec<Entry>>) -> SnapshotSequence {
    rows.into_iter()
        .enumerate()
        .map(|(i, entries)| Snapshot::new(at(i as i64 * 30), entries))
        .collect::<Vec<_>>()
        .into()
}

fn player(kills: u32, deaths: u32, score: i64) -> Entry {
    Entry::new("P", "Red")
        .with_kills(kills)
        .with_deaths(deaths)
        .with_score(score)
}

fn of_kind<'a>(events: &'a [BattleEvent], name: &str) -> Vec<&'a BattleEvent> {
    events.iter().filter(|e| e.kind.name() == name).collect()
}

#[test]
fn empty_sequence_yields_empty_report() {
    let report = ReportAssembler::with_defaults().build_report(&SnapshotSequence::default(), &meta());

    assert!(report.events.is_empty());
    assert!(report.highlights.is_empty());
    assert!(report.summary.mvp.is_none());
    assert_eq!(report.summary.total_kills, 0);
    assert_eq!(report.summary.total_deaths, 0);
    assert_eq!(report.summary.participant_count, 0);
    assert_eq!(report.summary.duration_secs, 0);
    assert_eq!(report.summary.lead_change_count, 0);
    assert_eq!(report.summary.closest_gap, 0);
}

#[test]
fn spawn_then_single_kill() {
    let seq = sequence(vec![vec![player(0, 0, 0)], vec![player(1, 0, 10)]]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    let spawns = of_kind(&report.events, "spawn");
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].timestamp, at(0));

    let kills = of_kind(&report.events, "kill");
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].timestamp, at(30));
    assert_eq!(kills[0].value(), Some(10));

    assert_eq!(report.summary.total_kills, 1);
    assert_eq!(report.summary.mvp.as_ref().unwrap().player_name.as_str(), "P");
}

#[test]
fn killing_spree_fires_once_when_streak_reaches_three() {
    let seq = sequence(vec![
        vec![player(0, 0, 0)],
        vec![player(1, 0, 10)],
        vec![player(2, 0, 20)],
        vec![player(3, 0, 30)],
        vec![player(4, 0, 40)],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    let sprees = of_kind(&report.events, "killing_spree");
    assert_eq!(sprees.len(), 1);
    assert_eq!(sprees[0].timestamp, at(90));
    assert_eq!(sprees[0].value(), Some(3));
    assert!(sprees[0].is_highlight());
}

#[test]
fn death_ends_spree_before_death_event() {
    let seq = sequence(vec![
        vec![player(0, 0, 0)],
        vec![player(4, 0, 40)],
        vec![player(4, 1, 40)],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    let ended = of_kind(&report.events, "spree_ended");
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].value(), Some(4));

    let at_death: Vec<_> = report
        .events
        .iter()
        .filter(|e| e.timestamp == at(60) && e.kind != EventKind::System)
        .map(|e| e.kind.name())
        .collect();
    assert_eq!(at_death, vec!["spree_ended", "death"]);
    assert!(report.summary.longest_streak.is_some());
    assert_eq!(report.summary.longest_streak.unwrap().length, 4);
}

#[test]
fn first_blood_is_unique() {
    let seq = sequence(vec![
        vec![Entry::new("A", "Red"), Entry::new("B", "Blue")],
        vec![
            Entry::new("A", "Red").with_kills(1).with_score(10),
            Entry::new("B", "Blue").with_kills(1).with_score(10),
        ],
        vec![
            Entry::new("A", "Red").with_kills(2).with_score(20),
            Entry::new("B", "Blue").with_kills(3).with_score(30),
        ],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    let first_bloods = of_kind(&report.events, "first_blood");
    assert_eq!(first_bloods.len(), 1);
    // Simultaneous kills resolve to entry order.
    assert_eq!(first_bloods[0].participant.as_str(), "A");

    let highlights: Vec<_> = report
        .highlights
        .iter()
        .filter(|h| h.kind == HighlightKind::FirstBlood)
        .collect();
    assert_eq!(highlights.len(), 1);

    let record = report.summary.first_blood.unwrap();
    assert_eq!(record.participant.as_str(), "A");
    assert_eq!(record.timestamp, at(30));
}

#[test]
fn lead_change_between_two_teams() {
    let seq = sequence(vec![
        vec![Entry::new("A", "Alpha").with_score(100), Entry::new("B", "Bravo")],
        vec![Entry::new("A", "Alpha").with_score(100), Entry::new("B", "Bravo").with_score(200)],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    let changes = of_kind(&report.events, "lead_change");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].timestamp, at(30));
    assert!(matches!(
        &changes[0].kind,
        EventKind::LeadChange { team, gap: 100 } if team.as_str() == "Bravo"
    ));
    assert_eq!(report.summary.lead_change_count, 1);
    assert!(report
        .highlights
        .iter()
        .any(|h| h.kind == HighlightKind::LeadChange && h.timestamp == at(30)));
}

fn teams(alpha: i64, bravo: i64) -> Vec<Entry> {
    vec![
        Entry::new("A", "Alpha").with_score(alpha),
        Entry::new("B", "Bravo").with_score(bravo),
    ]
}

fn lead_change_times(rows: Vec<Vec<Entry>>) -> Vec<DateTime<Utc>> {
    let report = ReportAssembler::with_defaults().build_report(&sequence(rows), &meta());
    of_kind(&report.events, "lead_change")
        .into_iter()
        .map(|e| e.timestamp)
        .collect()
}

#[test]
fn retaking_the_lead_after_a_narrow_swap_is_a_lead_change() {
    let times = lead_change_times(vec![teams(100, 0), teams(100, 120), teams(300, 120)]);
    assert_eq!(times, vec![at(60)]);
}

#[test]
fn widening_an_existing_lead_is_not_a_lead_change() {
    let times = lead_change_times(vec![teams(100, 0), teams(100, 120), teams(100, 200)]);
    assert!(times.is_empty());
}

#[test]
fn large_deficit_is_a_comeback() {
    let seq = sequence(vec![
        vec![Entry::new("A", "Alpha").with_score(300), Entry::new("B", "Bravo")],
        vec![Entry::new("A", "Alpha").with_score(300), Entry::new("B", "Bravo").with_score(400)],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    assert_eq!(of_kind(&report.events, "lead_change").len(), 1);
    assert!(report
        .highlights
        .iter()
        .any(|h| h.kind == HighlightKind::Comeback));
}

#[test]
fn single_team_keeps_closest_gap_unset() {
    let seq = sequence(vec![
        vec![Entry::new("A", "Alpha"), Entry::new("B", "Alpha")],
        vec![Entry::new("A", "Alpha").with_score(90), Entry::new("B", "Alpha")],
    ]);
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta());

    assert!(of_kind(&report.events, "lead_change").is_empty());
    assert_eq!(report.summary.closest_gap, 0);
}

#[test]
fn idle_interval_emits_nothing_but_status() {
    let rows = (0..6).map(|_| vec![player(2, 1, 30)]).collect();
    let report = ReportAssembler::with_defaults().build_report(&sequence(rows), &meta());

    for name in ["kill", "death", "objective", "spree_ended"] {
        assert!(of_kind(&report.events, name).is_empty(), "unexpected {name}");
    }
    let status: Vec<_> = report
        .events
        .iter()
        .filter(|e| e.kind == EventKind::System && e.timestamp == at(150))
        .collect();
    assert_eq!(status.len(), 2, "cadence status plus round end");
}

#[test]
fn mvp_highlight_is_last_at_round_end() {
    let seq = sequence(vec![vec![player(0, 0, 0)], vec![player(1, 0, 10)]]);
    let meta = meta().with_end_time(at(45));
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta);

    let mvp = report.highlights.last().unwrap();
    assert_eq!(mvp.kind, HighlightKind::Mvp);
    assert_eq!(mvp.timestamp, at(45));
    assert_eq!(report.summary.duration_secs, 45);
    assert_eq!(report.events.last().unwrap().timestamp, at(45));
}

#[test]
fn stale_end_time_agrees_between_feed_and_summary() {
    let seq = sequence(vec![vec![player(0, 0, 0)], vec![player(1, 0, 10)]]);
    let meta = meta().with_end_time(at(10));
    let report = ReportAssembler::with_defaults().build_report(&seq, &meta);

    let round_end = report.events.last().unwrap().timestamp;
    assert_eq!(round_end, at(30));
    assert_eq!(report.highlights.last().unwrap().timestamp, round_end);
    assert_eq!(report.summary.duration_secs, 30);
}

fn arb_sequence() -> impl Strategy<Value = SnapshotSequence> {
    let names = ["A", "B", "C", "D"];
    let teams = ["Red", "Blue"];
    prop::collection::vec(
        prop::collection::vec((0u32..4, 0u32..3, -20i64..120), 4),
        0..12,
    )
    .prop_map(move |rows| {
        let mut totals = [(0u32, 0u32, 0i64); 4];
        let snapshots = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let entries = row
                    .into_iter()
                    .enumerate()
                    .map(|(p, (k, d, s))| {
                        let t = &mut totals[p];
                        t.0 += k;
                        t.1 += d;
                        // Scores may dip to exercise clamping.
                        t.2 += s;
                        Entry::new(names[p], teams[p % 2])
                            .with_kills(t.0)
                            .with_deaths(t.1)
                            .with_score(t.2)
                    })
                    .collect();
                Snapshot::new(at(i as i64 * 15), entries)
            })
            .collect::<Vec<_>>();
        SnapshotSequence::new(snapshots)
    })
}

proptest! {
    #[test]
    fn reports_are_deterministic(seq in arb_sequence()) {
        let assembler = ReportAssembler::with_defaults();
        let first = assembler.build_report(&seq, &meta());
        let second = assembler.build_report(&seq, &meta());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn events_are_time_ordered(seq in arb_sequence()) {
        let report = ReportAssembler::with_defaults().build_report(&seq, &meta());
        prop_assert!(report.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        prop_assert!(report.highlights.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        prop_assert!(report.events.iter().filter(|e| e.kind.name() == "first_blood").count() <= 1);
    }
}
