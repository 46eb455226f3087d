use super::*;

fn record(session: &mut CalibrationSession, action: Action, samples: &[i32]) -> RecordingCompleted {
    session.begin_recording(action, DEFAULT_RECORDING_DURATION);
    for &sample in samples {
        session.ingest_sample(sample);
    }
    session
        .end_recording()
        .expect("window should be open")
}

#[test]
fn test_new_default() {
    let session = CalibrationSession::new_default();
    assert!(session.open_action().is_none());
    assert!(session.current_value().is_none());
    assert!(!session.has_data());
    assert_eq!(session.rules(), &DerivationRules::default());
}

#[test]
fn test_ingest_without_window_only_updates_live_value() {
    let mut session = CalibrationSession::new_default();
    session.ingest_sample(37);
    session.ingest_sample(-800);
    assert_eq!(session.current_value(), Some(-800));
    assert!(!session.has_data());
    assert_eq!(session.open_sample_count(), 0);
}

#[test]
fn test_samples_attributed_to_open_window() {
    let mut session = CalibrationSession::new_default();
    let completed = record(&mut session, Action::SoftPuff, &[60, 70, 80]);

    assert_eq!(completed.action, Action::SoftPuff);
    assert_eq!(completed.sample_count, 3);
    assert_eq!(session.window(Action::SoftPuff).unwrap().samples, vec![60, 70, 80]);
    assert!(session.open_action().is_none());

    // samples after close are not recorded
    session.ingest_sample(999);
    assert_eq!(session.window(Action::SoftPuff).unwrap().samples.len(), 3);
    assert_eq!(session.current_value(), Some(999));
}

#[test]
fn test_out_of_range_values_are_not_clamped() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::HardPuff, &[2000, 2000]);
    assert_eq!(session.compute_stats(Action::HardPuff).max, 2000);
}

#[test]
fn test_end_recording_without_window_is_noop() {
    let mut session = CalibrationSession::new_default();
    assert!(session.end_recording().is_none());
    record(&mut session, Action::Neutral, &[1, 2]);
    assert!(session.end_recording().is_none());
    assert_eq!(session.recorded_actions(), vec![Action::Neutral]);
}

#[test]
fn test_rerecording_replaces_previous_window() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::HardSip, &[-300, -310, -290]);
    record(&mut session, Action::HardSip, &[-150]);

    let stats = session.compute_stats(Action::HardSip);
    assert_eq!(stats.count, 1);
    assert_eq!(stats.average, -150);
}

#[test]
fn test_begin_supersedes_open_window() {
    let mut session = CalibrationSession::new_default();
    let first = session.begin_recording(Action::SoftSip, DEFAULT_RECORDING_DURATION);
    session.ingest_sample(-50);
    let second = session.begin_recording(Action::HardSip, DEFAULT_RECORDING_DURATION);
    session.ingest_sample(-250);

    assert!(second > first);
    assert_eq!(session.open_action(), Some(Action::HardSip));

    let completed = session.end_recording().unwrap();
    assert_eq!(completed.action, Action::HardSip);
    assert_eq!(completed.sample_count, 1);
    // the superseded window was discarded, not stored
    assert!(session.window(Action::SoftSip).is_none());
}

#[test]
fn test_stale_window_id_does_not_close_newer_window() {
    let mut session = CalibrationSession::new_default();
    let stale = session.begin_recording(Action::Neutral, DEFAULT_RECORDING_DURATION);
    let current = session.begin_recording(Action::SoftPuff, DEFAULT_RECORDING_DURATION);
    session.ingest_sample(40);

    assert!(session.end_recording_window(stale).is_none());
    assert_eq!(session.open_action(), Some(Action::SoftPuff));

    let completed = session.end_recording_window(current).unwrap();
    assert_eq!(completed.window_id, current);
    assert_eq!(completed.sample_count, 1);
}

#[test]
fn test_compute_stats_missing_action_is_zero() {
    let session = CalibrationSession::new_default();
    assert_eq!(session.compute_stats(Action::SoftSip), ActionStats::zero());
}

#[test]
fn test_empty_recorded_window_reports_zero_stats() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::SoftSip, &[]);
    let stats = session.compute_stats(Action::SoftSip);
    assert_eq!(stats, ActionStats::zero());
}

#[test]
fn test_neutral_scenario() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::Neutral, &[-5, 0, 5, 0, -2]);

    let stats = session.compute_stats(Action::Neutral);
    // sum -2 over 5 samples floors to -1
    assert_eq!(stats.average, -1);
    assert_eq!(stats.min, -5);
    assert_eq!(stats.max, 5);

    let suggestion = session.suggest();
    assert_eq!(suggestion.neutral_band.low, stats.average - 15);
    assert_eq!(suggestion.neutral_band.high, stats.average + 15);
    assert_eq!(suggestion.thresholds.nmax, 14);
}

#[test]
fn test_no_data_derives_from_defaults() {
    let session = CalibrationSession::new_default();
    let set = session.derive_thresholds();
    // neutral 0 -> band (-15, 15); every default already clears the gaps
    assert_eq!(
        set,
        ThresholdSet {
            hst: -200,
            nmin: -100,
            nmax: 15,
            spt: 100,
            hpt: 200,
        }
    );
}

#[test]
fn test_missing_action_uses_its_default_entry() {
    let defaults = DefaultThresholds {
        neutral: 0,
        soft_sip: -90,
        hard_sip: -333,
        soft_puff: 95,
        hard_puff: 444,
    };
    let mut session = CalibrationSession::new(defaults, DerivationRules::default());
    record(&mut session, Action::Neutral, &[0; 20]);
    record(&mut session, Action::SoftSip, &[-80; 20]);

    let set = session.derive_thresholds();
    assert_eq!(set.nmin, -80);
    assert_eq!(set.hst, -333);
    assert_eq!(set.spt, 95);
    assert_eq!(set.hpt, 444);
}

#[test]
fn test_pathological_soft_sip_above_neutral_still_ordered() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::Neutral, &[10; 30]);
    record(&mut session, Action::SoftSip, &[120; 30]);
    record(&mut session, Action::HardSip, &[300; 30]);
    record(&mut session, Action::SoftPuff, &[-200; 30]);
    record(&mut session, Action::HardPuff, &[-400; 30]);

    let set = session.derive_thresholds();
    assert!(set.is_ordered(), "{:?}", set);
    assert_eq!(set.nmin, -10);
    assert_eq!(set.hst, -20);
    assert_eq!(set.nmax, 25);
    assert_eq!(set.spt, 30);
    assert_eq!(set.hpt, 40);
}

#[test]
fn test_derive_is_idempotent() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::Neutral, &[3, 1, 2, 5, 0, -1, 2, 2, 4, 3]);
    record(&mut session, Action::HardPuff, &[260, 270, 255, 280, 265]);

    let first = session.derive_thresholds();
    let second = session.derive_thresholds();
    assert_eq!(first, second);
    assert_eq!(session.suggest(), session.suggest());
}

#[test]
fn test_suggest_reports_only_recorded_stats() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::SoftPuff, &[80, 90, 100]);

    let suggestion = session.suggest();
    assert_eq!(suggestion.stats.len(), 1);
    assert_eq!(suggestion.stats[&Action::SoftPuff].average, 90);
}

#[test]
fn test_clear_discards_everything() {
    let mut session = CalibrationSession::new_default();
    record(&mut session, Action::Neutral, &[0, 1]);
    session.begin_recording(Action::SoftSip, DEFAULT_RECORDING_DURATION);
    session.clear();

    assert!(!session.has_data());
    assert!(session.open_action().is_none());
    assert!(session.current_value().is_none());
}

#[test]
fn test_custom_trim_fraction() {
    let rules = DerivationRules {
        trim_fraction: 0.25,
        ..DerivationRules::default()
    };
    let mut session = CalibrationSession::new(DefaultThresholds::default(), rules);
    record(&mut session, Action::HardPuff, &[0, 300, 300, 900]);
    assert_eq!(session.compute_stats(Action::HardPuff).average, 300);
}

#[test]
fn test_shared_id_source_keeps_ids_unique_across_sessions() {
    let ids = Arc::new(AtomicU64::new(1));
    let mut first = CalibrationSession::with_window_ids(
        DefaultThresholds::default(),
        DerivationRules::default(),
        Arc::clone(&ids),
    );
    let stale = first.begin_recording(Action::SoftSip, DEFAULT_RECORDING_DURATION);
    drop(first);

    let mut second = CalibrationSession::with_window_ids(
        DefaultThresholds::default(),
        DerivationRules::default(),
        ids,
    );
    let current = second.begin_recording(Action::HardSip, DEFAULT_RECORDING_DURATION);
    second.ingest_sample(-250);

    assert_ne!(stale, current);
    assert_eq!(second.end_recording_window(stale), None);
    assert_eq!(second.open_window_id(), Some(current));
    assert_eq!(second.open_sample_count(), 1);
}
