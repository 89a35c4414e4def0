//! Integration tests for the playback scheduler
//!
//! All tests run on a paused clock: virtual time only advances while every
//! task is idle, so speech and wait timings are exact.

mod helpers;

use helpers::{assert_at, drain, run_for, timing, words, TestSession};
use hzf_common::events::{RunEndReason, RunKind, StudyEvent};
use hzf_common::{DisplayMode, Language, PlaybackMode};
use hzf_player::playback::PlaybackActivity;
use tokio::time::Duration;

const INSTANT: Duration = Duration::ZERO;

#[tokio::test(start_paused = true)]
async fn test_autoplay_and_repeat_are_exclusive() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 1), INSTANT);
    let s = &session.scheduler;
    let state = &session.state;

    let steps: [(bool, PlaybackMode); 8] = [
        (true, PlaybackMode::Chinese),
        (false, PlaybackMode::English),
        (false, PlaybackMode::ChineseToEnglish),
        (true, PlaybackMode::EnglishToChinese),
        (true, PlaybackMode::Off),
        (false, PlaybackMode::Chinese),
        (false, PlaybackMode::Off),
        (true, PlaybackMode::English),
    ];

    for (autoplay, mode) in steps {
        if autoplay {
            s.set_autoplay_mode(mode);
        } else {
            s.set_repeat_mode(mode);
        }
        assert!(
            !(state.is_autoplay_active() && state.is_repeat_active()),
            "both active after {:?}",
            mode
        );
        assert_eq!(state.display_mode(), mode.display_mode());
        run_for(0.3).await;
    }

    assert_eq!(state.autoplay_mode(), PlaybackMode::English);
    assert_eq!(state.repeat_mode(), PlaybackMode::Off);
    s.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_dual_language_cycle_sequence() {
    let session = TestSession::new(words(1), timing(1.5, 2.0, 1), INSTANT);
    let mut events = session.state.subscribe_events();

    session.scheduler.set_repeat_mode(PlaybackMode::ChineseToEnglish);
    assert_eq!(session.state.display_mode(), DisplayMode::Chinese);
    run_for(3.0).await;

    let calls = session.speech.calls();
    assert_eq!(calls.len(), 2);

    assert_eq!(calls[0].language, Language::Chinese);
    assert_eq!(calls[0].text, "你好");
    assert_eq!(calls[0].display, DisplayMode::Chinese);
    assert_eq!(calls[0].spoken, Some(Language::Chinese));
    assert_at(calls[0].at, 0.0);

    assert_eq!(calls[1].language, Language::English);
    assert_eq!(calls[1].text, "Hello");
    assert_eq!(calls[1].display, DisplayMode::English);
    assert_eq!(calls[1].spoken, Some(Language::English));
    assert_at(calls[1].at, 1.5);

    assert_eq!(session.state.currently_spoken(), None);

    // Display changes interleave with speech in cycle order
    let trace: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            StudyEvent::DisplayModeChanged { display_mode, .. } => {
                Some(format!("display={}", display_mode))
            }
            StudyEvent::SpeechStarted { text, .. } => Some(format!("speak={}", text)),
            _ => None,
        })
        .collect();
    assert_eq!(
        trace,
        vec![
            "display=chinese",
            "speak=你好",
            "display=english",
            "speak=Hello",
            "display=both",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_walks_and_wraps() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 1), INSTANT);
    let mut events = session.state.subscribe_events();

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);

    run_for(1.0).await;
    assert_eq!(session.state.current_index(), 0);
    run_for(2.0).await; // t=3
    assert_eq!(session.state.current_index(), 1);
    run_for(2.0).await; // t=5
    assert_eq!(session.state.current_index(), 2);
    run_for(1.5).await; // t=6.5
    assert_eq!(session.state.current_index(), 0);

    let calls = session.speech.calls();
    assert_eq!(calls.len(), 4);
    for (i, (call, text)) in calls.iter().zip(["你好", "谢谢", "再见", "你好"]).enumerate() {
        assert_eq!(call.text, text);
        assert_eq!(call.language, Language::Chinese);
        assert_at(call.at, 2.0 * i as f64);
    }

    let indices: Vec<usize> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            StudyEvent::IndexChanged { index, .. } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![1, 2, 0]);

    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_repeat_runs_count_then_turns_off() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 3), INSTANT);
    let mut events = session.state.subscribe_events();

    session.scheduler.go_to_index(1);
    session.scheduler.set_repeat_mode(PlaybackMode::English);
    assert!(session.state.is_repeat_active());

    run_for(10.0).await;

    let calls = session.speech.calls();
    assert_eq!(calls.len(), 3);
    for (i, call) in calls.iter().enumerate() {
        assert_eq!(call.language, Language::English);
        assert_eq!(call.text, "Thank you");
        assert_at(call.at, 2.0 * i as f64);
    }

    assert_eq!(session.state.current_index(), 1);
    assert_eq!(session.state.repeat_mode(), PlaybackMode::Off);
    assert!(!session.state.is_repeat_active());
    assert_eq!(session.state.display_mode(), DisplayMode::Both);
    assert_eq!(session.state.currently_spoken(), None);

    let ended: Vec<RunEndReason> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            StudyEvent::RunEnded { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(ended, vec![RunEndReason::Completed]);
}

#[tokio::test(start_paused = true)]
async fn test_go_to_index_restarts_mid_autoplay() {
    let session = TestSession::new(words(5), timing(1.0, 2.0, 1), INSTANT);
    let mut events = session.state.subscribe_events();

    session.scheduler.set_autoplay_mode(PlaybackMode::EnglishToChinese);
    run_for(4.5).await;

    // Second word, Chinese side showing
    assert_eq!(session.state.current_index(), 1);
    assert_eq!(session.state.display_mode(), DisplayMode::Chinese);
    let first_run = drain(&mut events)
        .into_iter()
        .find_map(|e| match e {
            StudyEvent::RunStarted { run_id, .. } => Some(run_id),
            _ => None,
        })
        .unwrap();
    let calls_before = session.speech.call_count();

    session.scheduler.go_to_index(99);

    assert!(session.scheduler.current_run().value() > first_run);
    assert_eq!(session.state.current_index(), 4);
    assert_eq!(session.state.display_mode(), DisplayMode::English);
    assert_eq!(session.state.currently_spoken(), None);
    assert!(session.state.is_autoplay_active());

    run_for(1.7).await; // t=6.2

    let calls = session.speech.calls();
    let after: Vec<(&str, f64)> = calls[calls_before..]
        .iter()
        .map(|c| (c.text.as_str(), c.at.as_secs_f64()))
        .collect();
    assert_eq!(after.len(), 2, "unexpected calls: {:?}", after);
    assert_eq!(after[0].0, "Book");
    assert_at(calls[calls_before].at, 4.5);
    assert_eq!(after[1].0, "书");
    assert_at(calls[calls_before + 1].at, 5.5);

    let restarted = drain(&mut events).into_iter().find_map(|e| match e {
        StudyEvent::RunStarted {
            run_id,
            kind,
            start_index,
            ..
        } => Some((run_id, kind, start_index)),
        _ => None,
    });
    let (run_id, kind, start_index) = restarted.unwrap();
    assert!(run_id > first_run);
    assert_eq!(kind, RunKind::Autoplay);
    assert_eq!(start_index, 4);

    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_repeat_only_stops_externally() {
    let session = TestSession::new(words(3), timing(0.5, 1.0, 0), INSTANT);

    session.scheduler.set_repeat_mode(PlaybackMode::Chinese);
    run_for(60.5).await;

    assert!(session.state.is_repeat_active());
    assert_eq!(session.speech.call_count(), 61);
    assert!(session.speech.texts().iter().all(|t| t == "你好"));

    // Navigation restarts repeat on the new word
    session.scheduler.go_to_next();
    run_for(0.1).await;
    assert!(session.state.is_repeat_active());
    assert_eq!(session.speech.texts().last().map(String::as_str), Some("谢谢"));

    let mut events = session.state.subscribe_events();
    session.scheduler.stop_all();
    let stopped_at = session.speech.call_count();
    run_for(10.0).await;

    assert!(!session.state.is_repeat_active());
    assert_eq!(session.speech.call_count(), stopped_at);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        StudyEvent::RunEnded {
            reason: RunEndReason::Cancelled,
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_clears_spoken_and_silences_stale_run() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 1), Duration::from_secs(1));

    session.scheduler.set_autoplay_mode(PlaybackMode::ChineseToEnglish);
    run_for(0.5).await;
    assert_eq!(session.state.currently_spoken(), Some(Language::Chinese));
    let stops_before = session.speech.stop_count();

    let mut events = session.state.subscribe_events();
    session.scheduler.cancel();

    assert_eq!(session.state.currently_spoken(), None);
    assert_eq!(session.speech.stop_count(), stops_before + 1);

    run_for(10.0).await;

    assert_eq!(session.speech.call_count(), 1);
    assert_eq!(session.state.current_index(), 0);
    assert_eq!(session.state.display_mode(), DisplayMode::Chinese);
    assert_eq!(session.state.currently_spoken(), None);

    // The stale run reports its end and nothing else
    let events = drain(&mut events);
    assert!(
        events
            .iter()
            .all(|e| matches!(e, StudyEvent::RunEnded { reason: RunEndReason::Cancelled, .. })),
        "unexpected events after cancel: {:?}",
        events
    );
}

#[tokio::test(start_paused = true)]
async fn test_speech_failure_ends_run_softly() {
    let session = TestSession::new(words(2), timing(1.0, 2.0, 3), INSTANT);
    let mut events = session.state.subscribe_events();
    session.speech.fail_on(Some("Hello"));

    session.scheduler.set_repeat_mode(PlaybackMode::ChineseToEnglish);
    run_for(5.0).await;

    assert_eq!(session.speech.texts(), vec!["你好", "Hello"]);
    assert_eq!(session.state.currently_spoken(), None);
    let events = drain(&mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e, StudyEvent::SpeechFailed { language: Language::English, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        StudyEvent::RunEnded {
            reason: RunEndReason::SpeechFailed,
            ..
        }
    )));

    // Ready for a fresh run on the next action
    session.speech.fail_on(None);
    session.scheduler.go_to_index(1);
    run_for(0.1).await;
    assert_eq!(session.speech.texts().last().map(String::as_str), Some("谢谢"));
    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_toggle_autoplay_repeat_restarts_current_word() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 2), INSTANT);

    assert!(!session.scheduler.toggle_autoplay_repeat());

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(0.5).await;
    assert!(session.scheduler.toggle_autoplay_repeat());
    assert!(session.state.is_autoplay_repeating());
    run_for(3.6).await; // t=4.1

    let calls = session.speech.calls();
    let seen: Vec<&str> = calls.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(seen, vec!["你好", "你好", "你好", "谢谢"]);
    assert_at(calls[0].at, 0.0);
    assert_at(calls[1].at, 0.5);
    assert_at(calls[2].at, 2.0);
    assert_at(calls[3].at, 4.0);

    // Switching autoplay off clears the toggle
    session.scheduler.set_autoplay_mode(PlaybackMode::Off);
    assert!(!session.state.is_autoplay_repeating());
    assert_eq!(session.state.activity(), PlaybackActivity::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_releasing_word_hold_finishes_cycle_in_flight() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 0), Duration::from_secs(1));

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(0.2).await;
    assert!(session.scheduler.toggle_autoplay_repeat());
    run_for(0.3).await; // t=0.5, second run speaking the first word

    let run = session.scheduler.current_run();
    let stops = session.speech.stop_count();
    assert!(session.scheduler.toggle_autoplay_repeat());
    assert!(!session.state.is_autoplay_repeating());
    assert_eq!(session.scheduler.current_run(), run);
    assert_eq!(session.speech.stop_count(), stops);
    assert_eq!(session.state.currently_spoken(), Some(Language::Chinese));

    run_for(1.0).await; // t=1.5, utterance finished
    assert_eq!(session.state.currently_spoken(), None);
    assert_eq!(session.state.current_index(), 0);

    run_for(1.8).await; // t=3.3
    assert_eq!(session.state.current_index(), 1);

    let calls = session.speech.calls();
    let seen: Vec<&str> = calls.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(seen, vec!["你好", "你好", "谢谢"]);
    assert_at(calls[1].at, 0.2);
    assert_at(calls[2].at, 3.2);

    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_releasing_word_hold_after_failed_run_resumes() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 0), INSTANT);
    session.speech.fail_on(Some("你好"));

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(0.2).await;
    assert!(session.scheduler.toggle_autoplay_repeat());
    run_for(0.3).await; // t=0.5, both runs ended on the failure
    assert_eq!(session.speech.texts(), vec!["你好", "你好"]);
    assert!(session.state.is_autoplay_repeating());

    session.speech.fail_on(None);
    let key = session.scheduler.restart_key();
    let run = session.scheduler.current_run();
    assert!(session.scheduler.toggle_autoplay_repeat());
    assert!(!session.state.is_autoplay_repeating());
    assert!(session.scheduler.restart_key() > key);

    run_for(0.1).await; // t=0.6
    assert_ne!(session.scheduler.current_run(), run);
    assert_eq!(session.speech.texts(), vec!["你好", "你好", "你好"]);

    run_for(2.0).await; // t=2.6
    assert_eq!(session.state.current_index(), 1);

    let calls = session.speech.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[3].text, "谢谢");
    assert_at(calls[2].at, 0.5);
    assert_at(calls[3].at, 2.5);

    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_repeat_count_change_applies_from_next_word() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 3), INSTANT);

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(0.5).await;
    assert!(session.scheduler.toggle_autoplay_repeat());
    run_for(0.5).await; // t=1.0, first cycle of the restarted word done
    session.scheduler.set_repeat_count(1);
    run_for(7.0).await; // t=8.0

    let calls = session.speech.calls();
    let seen: Vec<&str> = calls.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(seen, vec!["你好", "你好", "你好", "你好", "谢谢", "再见"]);
    assert_at(calls[1].at, 0.5);
    assert_at(calls[2].at, 2.0);
    assert_at(calls[3].at, 3.5);
    assert_at(calls[4].at, 5.5);
    assert_at(calls[5].at, 7.5);

    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_navigation_wraps_and_resets_display() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 1), INSTANT);
    let s = &session.scheduler;
    let key = s.restart_key();

    s.go_to_previous();
    assert_eq!(session.state.current_index(), 2);
    s.go_to_next();
    assert_eq!(session.state.current_index(), 0);
    s.go_to_index(7);
    assert_eq!(session.state.current_index(), 2);
    assert_eq!(session.state.display_mode(), DisplayMode::Both);

    // Idle navigation never restarts playback
    assert_eq!(s.restart_key(), key);
    run_for(5.0).await;
    assert_eq!(session.speech.call_count(), 0);

    s.set_repeat_mode(PlaybackMode::English);
    let key = s.restart_key();
    s.go_to_next();
    assert_eq!(s.restart_key(), key + 1);
    assert_eq!(session.state.current_index(), 0);
    assert_eq!(session.state.display_mode(), DisplayMode::Both);
    s.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_empty_deck_is_inert() {
    let session = TestSession::new(Vec::new(), timing(1.5, 2.0, 1), INSTANT);

    session.scheduler.go_to_next();
    session.scheduler.go_to_previous();
    session.scheduler.go_to_index(3);
    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(5.0).await;

    assert_eq!(session.state.current_index(), 0);
    assert_eq!(session.speech.call_count(), 0);
    assert_eq!(session.scheduler.completion_percentage(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_timing_changes_apply_to_next_wait() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 1), INSTANT);

    session.scheduler.set_autoplay_mode(PlaybackMode::Chinese);
    run_for(0.5).await;
    // The wait already running keeps its 2s
    session.scheduler.set_next_delay(5.0);
    run_for(7.0).await; // t=7.5

    let calls = session.speech.calls();
    assert_eq!(calls.len(), 3);
    assert_at(calls[1].at, 2.0);
    assert_at(calls[2].at, 7.0);

    session.scheduler.set_next_delay(-3.0);
    assert_eq!(session.state.timing().next_delay, 0.0);
    session.scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_resets_session() {
    let session = TestSession::new(words(3), timing(1.5, 2.0, 2), INSTANT);

    session.scheduler.set_autoplay_mode(PlaybackMode::EnglishToChinese);
    run_for(0.1).await;
    session.scheduler.toggle_autoplay_repeat();
    run_for(0.1).await;

    session.scheduler.stop_all();

    assert_eq!(session.state.activity(), PlaybackActivity::Idle);
    assert!(!session.state.is_autoplay_repeating());
    assert_eq!(session.state.display_mode(), DisplayMode::Both);
    assert_eq!(session.state.currently_spoken(), None);

    let said = session.speech.call_count();
    run_for(10.0).await;
    assert_eq!(session.speech.call_count(), said);
}
