use rand::SeedableRng;
use rand::rngs::StdRng;
use stroop_core::{Color, Locale, TrialFields, catalog};
use stroop_experiment::record::{SessionRecord, record_key};
use stroop_experiment::{
    ConfigError, EvalPolicy, Experiment, IndexPolicy, RunConfig, SessionEvent, SessionState,
    StroopSession,
};
use stroop_timing::ManualTimer;

type Session = StroopSession<ManualTimer, StdRng>;

fn session(trials: usize) -> (Session, ManualTimer) {
    let timer = ManualTimer::new();
    let config = RunConfig {
        trials,
        ..RunConfig::default()
    };
    let s = StroopSession::new(0, config, timer.clone(), StdRng::seed_from_u64(42));
    (s, timer)
}

/// Waits out the fixation and returns the color of the stimulus now on screen.
fn show_stimulus(s: &mut Session, timer: &ManualTimer) -> Color {
    timer.advance_ms(1000);
    assert!(s.update().unwrap(), "stimulus should be due");
    s.current_stimulus().expect("stimulus on screen").color
}

fn answer_correctly(s: &mut Session, timer: &ManualTimer, latency_ms: u64) {
    let color = show_stimulus(s, timer);
    timer.advance_ms(latency_ms);
    assert!(s.respond(color).unwrap());
}

#[test]
fn start_emits_run_started_then_fixation() {
    let (mut s, _timer) = session(4);
    assert_eq!(s.state(), SessionState::Idle);
    assert!(s.start().unwrap());
    assert_eq!(s.state(), SessionState::Running);
    assert_eq!(
        s.drain_events(),
        vec![SessionEvent::RunStarted(0), SessionEvent::FixationPoint]
    );
    assert_eq!(s.progress(), (0, 4));
}

#[test]
fn stimulus_waits_for_fixation_delay() {
    let (mut s, timer) = session(4);
    s.start().unwrap();
    s.drain_events();

    timer.advance_ms(999);
    assert!(!s.update().unwrap());
    assert!(s.showing_fixation());

    timer.advance_ms(1);
    assert!(s.update().unwrap());
    let stim = s.current_stimulus().unwrap().clone();
    let expected = if stim.mode.is_text() {
        SessionEvent::ColoredWriting {
            text: stim.text,
            color: stim.color,
        }
    } else {
        SessionEvent::ColoredQuad(stim.color)
    };
    assert_eq!(s.drain_events(), vec![expected]);
}

#[test]
fn responses_during_fixation_are_ignored() {
    let (mut s, timer) = session(4);
    s.start().unwrap();
    timer.advance_ms(500);
    assert!(!s.respond(Color::Red).unwrap());
    assert_eq!(s.progress().0, 0);
}

#[test]
fn response_records_latency_and_advances() {
    let (mut s, timer) = session(4);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 250);

    let first = &s.trials()[0];
    assert!(first.valid);
    assert_eq!(first.latency_ms, Some(250));
    assert_eq!(s.progress(), (1, 4));
    assert!(s.showing_fixation());
}

#[test]
fn natural_completion_evaluates_and_stores() {
    let (mut s, timer) = session(3);
    s.start().unwrap();
    for ms in [100, 200, 300] {
        answer_correctly(&mut s, &timer, ms);
    }

    assert_eq!(s.state(), SessionState::Stopped);
    let events = s.drain_events();
    let stats = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::StatsComputed(stats) => Some(*stats),
            _ => None,
        })
        .unwrap();
    assert_eq!(events.last(), Some(&SessionEvent::RunStopped(0)));
    assert_eq!((stats.correct, stats.wrong, stats.total), (3, 0, 3));
    assert_eq!(stats.mean_ms(), Some(200.0));
    assert!((stats.stdev_ms().unwrap() - 81.6497).abs() < 1e-3);
    assert_eq!(s.dataset_count(), 1);
}

#[test]
fn abort_keeps_only_answered_prefix() {
    let (mut s, timer) = session(10);
    s.start().unwrap();
    for _ in 0..4 {
        answer_correctly(&mut s, &timer, 300);
    }
    show_stimulus(&mut s, &timer);
    assert!(s.stop().unwrap());

    assert_eq!(s.trials().len(), 4);
    assert_eq!(s.progress(), (4, 4));
    assert_eq!(s.last_stats().unwrap().total, 4);

    let values = &s.data_to_save()[&record_key(1)];
    let record = SessionRecord::from_values(values);
    assert_eq!(record.trials.len(), 4);
    assert_eq!(record.timestamp.as_deref(), Some(s.timestamp()));
}

#[test]
fn abort_before_any_answer_stores_nothing() {
    let (mut s, _timer) = session(5);
    s.start().unwrap();
    assert!(s.stop().unwrap());
    assert!(s.trials().is_empty());
    assert_eq!(s.dataset_count(), 0);
    assert!(s.data_to_save().is_empty());
    let events = s.drain_events();
    assert_eq!(events.last(), Some(&SessionEvent::RunStopped(0)));
}

#[test]
fn second_stop_is_a_no_op() {
    let (mut s, timer) = session(6);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 120);
    assert!(s.stop().unwrap());
    s.drain_events();

    assert!(!s.stop().unwrap());
    assert!(s.drain_events().is_empty());
    assert_eq!(s.dataset_count(), 1);
    assert_eq!(s.data_to_save().len(), 1);
}

#[test]
fn stop_before_start_is_a_no_op() {
    let (mut s, _timer) = session(6);
    assert!(!s.stop().unwrap());
    assert_eq!(s.state(), SessionState::Idle);
}

#[test]
fn pause_blocks_progress_and_resume_repeats_the_stimulus() {
    let (mut s, timer) = session(6);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 100);
    let shown = show_stimulus(&mut s, &timer);
    let slot = s.trials()[1].stimulus;
    let stamp = s.timestamp().to_string();
    s.drain_events();

    assert!(s.pause().unwrap());
    assert_eq!(s.state(), SessionState::Paused);
    assert!(!s.respond(shown).unwrap());
    timer.advance_ms(5_000);
    assert!(!s.update().unwrap());
    assert_eq!(s.progress(), (1, 6));

    assert!(s.toggle_pause().unwrap());
    assert_eq!(s.state(), SessionState::Running);
    assert_eq!(s.drain_events(), vec![SessionEvent::FixationPoint]);
    show_stimulus(&mut s, &timer);
    assert_eq!(s.trials()[1].stimulus, slot);
    assert_eq!(s.timestamp(), stamp);
    assert_eq!(s.progress(), (1, 6));
}

#[test]
fn pause_during_fixation_cancels_the_pending_stimulus() {
    let (mut s, timer) = session(6);
    s.start().unwrap();
    s.pause().unwrap();
    timer.advance_ms(2_000);
    assert!(!s.update().unwrap());
    assert_eq!(s.time_to_stimulus(), None);
}

#[test]
fn stopping_while_paused_finalizes() {
    let (mut s, timer) = session(8);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 100);
    answer_correctly(&mut s, &timer, 100);
    s.pause().unwrap();
    assert!(s.stop().unwrap());
    assert_eq!(s.state(), SessionState::Stopped);
    assert_eq!(s.trials().len(), 2);
}

#[test]
fn restart_after_stop_begins_a_fresh_run() {
    let (mut s, timer) = session(2);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 100);
    answer_correctly(&mut s, &timer, 100);
    assert_eq!(s.state(), SessionState::Stopped);

    assert!(s.start().unwrap());
    assert_eq!(s.progress(), (0, 2));
    assert!(s.trials().iter().all(|t| !t.valid));
    answer_correctly(&mut s, &timer, 100);
    answer_correctly(&mut s, &timer, 100);
    assert_eq!(s.dataset_count(), 2);
    assert!(s.data_to_save().contains_key(&record_key(2)));
}

#[test]
fn second_start_while_running_is_a_no_op() {
    let (mut s, _timer) = session(3);
    assert!(s.start().unwrap());
    s.drain_events();
    assert!(!s.start().unwrap());
    assert!(s.drain_events().is_empty());
}

#[test]
fn settings_are_locked_during_a_run() {
    let (mut s, _timer) = session(3);
    s.start().unwrap();
    assert_eq!(s.set_trials(20), Err(ConfigError::RunActive));
    assert_eq!(
        s.set_index_policy(IndexPolicy::FullyRandom),
        Err(ConfigError::RunActive)
    );
    s.set_eval_policy(EvalPolicy::CorrectOnly);
    s.stop().unwrap();
    assert_eq!(s.set_trials(20), Ok(()));
    assert_eq!(s.set_trials(0), Err(ConfigError::ZeroTrials));
}

#[test]
fn wrong_answers_are_scored_per_slot() {
    let (mut s, timer) = session(4);
    s.start().unwrap();
    let mut correct = 0;
    for i in 0..4 {
        let color = show_stimulus(&mut s, &timer);
        let chosen = if i % 2 == 0 {
            correct += 1;
            color
        } else {
            Color::RESPONSES.into_iter().find(|c| *c != color).unwrap()
        };
        timer.advance_ms(400);
        s.respond(chosen).unwrap();
    }
    let stats = s.last_stats().unwrap();
    assert_eq!(stats.correct, correct);
    assert_eq!(stats.wrong, 4 - correct);
    assert_eq!(stats.correct + stats.wrong, stats.valid);
}

#[test]
fn stored_record_parses_back_to_trial_fields() {
    let (mut s, timer) = session(5);
    s.start().unwrap();
    for ms in [321, 1200, 87, 450, 999] {
        answer_correctly(&mut s, &timer, ms);
    }

    let record = SessionRecord::from_values(&s.data_to_save()[&record_key(1)]);
    let parsed: Vec<TrialFields> = record.trial_fields().map(|f| f.unwrap()).collect();
    assert_eq!(parsed.len(), s.trials().len());

    for (fields, trial) in parsed.iter().zip(s.trials()) {
        let stim = catalog().get(trial.stimulus).unwrap();
        assert_eq!(fields.mode, stim.mode.tag());
        assert_eq!(fields.text, stim.text);
        assert_eq!(fields.color, stim.color.label(Locale::German));
        assert_eq!(fields.chosen, trial.chosen.label(Locale::German));
        assert!(fields.is_correct());
        assert_eq!(
            fields.latency,
            format!("{:.3}", trial.latency_ms.unwrap() as f64 / 1000.0)
        );
    }
}

#[test]
fn export_last_run_with_stats_preamble() {
    let (mut s, timer) = session(2);
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 500);
    answer_correctly(&mut s, &timer, 700);

    let headers = stroop_experiment::record::default_headers(Locale::German);
    let rows = s.export_last_run(&headers, true);
    assert_eq!(rows[0], vec!["Stroop Experiment:".to_string(), s.timestamp().to_string()]);
    assert_eq!(rows[1][0], "#Gültige Trials: 2");
    assert_eq!(rows[1][4], "Mittelwert: 0.600(s)");
    assert_eq!(rows[2], vec![String::new()]);
    assert_eq!(rows[3], headers);
    assert_eq!(rows.len(), 6);

    let plain = s.export_last_run(&headers, false);
    assert_eq!(plain[0], headers);
    assert_eq!(plain.len(), 3);
}

#[test]
fn loaded_data_sets_the_counter() {
    let (mut s, timer) = session(1);
    let mut data = stroop_store::ResultsMap::new();
    data.insert(record_key(1), vec!["2022.01.01-00::00::00".into()]);
    data.insert(record_key(2), vec!["2022.01.02-00::00::00".into()]);
    s.set_loaded_data(data);
    assert_eq!(s.dataset_count(), 2);

    s.start().unwrap();
    answer_correctly(&mut s, &timer, 100);
    assert_eq!(s.dataset_count(), 3);
    assert!(s.data_to_save().contains_key(&record_key(3)));
}

#[test]
fn colliding_record_key_leaves_loaded_data_intact() {
    let (mut s, timer) = session(1);
    let old = vec![
        "2022.01.02-00::00::00".to_string(),
        "Quads&Rot&rot&rot&1&0.100".to_string(),
    ];
    let mut data = stroop_store::ResultsMap::new();
    // One record whose key the next run would reuse.
    data.insert(record_key(2), old.clone());
    s.set_loaded_data(data.clone());

    s.start().unwrap();
    s.drain_events();
    let color = show_stimulus(&mut s, &timer);
    let err = s.respond(color).unwrap_err();
    assert_eq!(
        err,
        stroop_experiment::SessionError::RecordCountMismatch {
            records: 1,
            counter: 1
        }
    );

    assert_eq!(s.data_to_save(), &data);
    assert_eq!(s.data_to_save()[&record_key(2)], old);
    assert_eq!(s.dataset_count(), 1);
    assert_eq!(s.state(), SessionState::Stopped);
    let events = s.drain_events();
    assert_eq!(events.last(), Some(&SessionEvent::RunStopped(0)));
}

#[test]
fn english_exports_use_english_labels() {
    let timer = ManualTimer::new();
    let config = RunConfig {
        trials: 2,
        display_locale: Locale::English,
        ..RunConfig::default()
    };
    let mut s = StroopSession::new(0, config, timer.clone(), StdRng::seed_from_u64(3));
    s.start().unwrap();
    answer_correctly(&mut s, &timer, 500);
    answer_correctly(&mut s, &timer, 700);

    let headers = stroop_experiment::record::default_headers(Locale::English);
    let last = s.export_last_run(&headers, true);
    assert_eq!(last[1][0], "#Valid trials: 2");
    assert_eq!(last[1][1], "#executed trials: 2");
    assert_eq!(last[1][4], "mean: 0.600(s)");
    assert_eq!(last[3], headers);
    // Trial values keep the stored (German) labels.
    let chosen = &last[4][3];
    let color = Color::from_label(chosen).unwrap();
    assert_eq!(chosen, color.label(Locale::German));

    let all = s.export_all_runs(&headers);
    assert_eq!(all[0][..3], ["Participant", "Time Stamp", "Mode"]);
    assert_eq!(all.len(), 3);
}

#[test]
fn fully_random_policy_is_honoured() {
    let (mut s, _timer) = session(25);
    s.set_index_policy(IndexPolicy::FullyRandom).unwrap();
    s.start().unwrap();
    let idx: Vec<usize> = s.trials().iter().map(|t| t.stimulus).collect();
    assert_eq!(idx.len(), 25);
    assert!(idx.windows(2).all(|w| w[0] != w[1]));
}
