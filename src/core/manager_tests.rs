// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;

use crate::core::action::{Action, TimerKind};
use crate::core::config::MonitorConfig;
use crate::core::error::{Error, StateError};
use crate::core::events::{ActivitySource, Event, InputKind};
use crate::core::manager::Manager;
use crate::core::state::{Phase, State};

const LOGOUT: &str = "https://example.com/logout";

fn cfg(minutes: i64) -> Arc<MonitorConfig> {
    let cfg = MonitorConfig::from_params(minutes, ".example.com", LOGOUT, "Logging out soon");
    Arc::new(cfg.unwrap())
}

fn started(minutes: i64) -> (Manager, State) {
    let mut mgr = Manager::new(cfg(minutes));
    let mut state = State::new(0);
    mgr.handle_event(&mut state, Event::Start { now_ms: 0 }).unwrap();
    (mgr, state)
}

fn click(now_ms: u64) -> Event {
    Event::UserActivity {
        source: ActivitySource::Input {
            target: "window".to_string(),
            kind: InputKind::MouseDown,
        },
        now_ms,
    }
}

fn idle_check(now_ms: u64, shared_ms: u64) -> Event {
    Event::IdleCheck { now_ms, shared_ms: Some(shared_ms) }
}

fn countdown(now_ms: u64, shared_ms: u64) -> Event {
    Event::CountdownTick { now_ms, shared_ms: Some(shared_ms) }
}

#[test]
fn start_writes_activity_then_arms_idle_timer() {
    let mut mgr = Manager::new(cfg(1));
    let mut state = State::new(0);

    let actions = mgr
        .handle_event(&mut state, Event::Start { now_ms: 1234 })
        .unwrap();

    assert_eq!(
        actions,
        vec![
            Action::WriteActivity { at_ms: 1234 },
            Action::StartTimer(TimerKind::IdleCheck),
        ]
    );
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.last_action_ms(), 1234);
}

#[test]
fn second_start_is_rejected() {
    let (mut mgr, mut state) = started(1);
    let err = mgr
        .handle_event(&mut state, Event::Start { now_ms: 10 })
        .unwrap_err();
    assert_eq!(err, Error::InvalidState(StateError::AlreadyStarted));
}

#[test]
fn ticks_before_start_are_rejected() {
    let mut mgr = Manager::new(cfg(1));
    let mut state = State::new(0);
    let err = mgr.handle_event(&mut state, idle_check(1000, 0)).unwrap_err();
    assert_eq!(err, Error::InvalidState(StateError::NotStarted));
}

#[test]
fn idle_check_below_timeout_does_nothing() {
    let (mut mgr, mut state) = started(1);

    for now in (1000..5000).step_by(1000) {
        let actions = mgr.handle_event(&mut state, idle_check(now, 0)).unwrap();
        assert!(actions.is_empty(), "unexpected actions at {now}: {actions:?}");
    }
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn timeout_stops_idle_timer_before_starting_countdown() {
    let (mut mgr, mut state) = started(1);

    let actions = mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    assert_eq!(
        actions,
        vec![
            Action::StopTimer(TimerKind::IdleCheck),
            Action::ShowWarning { seconds: 60 },
            Action::StartTimer(TimerKind::Countdown),
        ]
    );
    assert_eq!(
        state.phase(),
        Phase::Warning { display_ms: 5000, remaining: 60 }
    );
}

#[test]
fn shared_activity_from_another_page_keeps_idle() {
    let (mut mgr, mut state) = started(1);

    // Another page wrote at 4000; at 8000 we are only 4s idle.
    let actions = mgr.handle_event(&mut state, idle_check(8000, 4000)).unwrap();
    assert!(actions.is_empty());
    assert_eq!(state.last_shared_ms(), Some(4000));

    let actions = mgr.handle_event(&mut state, idle_check(9000, 4000)).unwrap();
    assert!(matches!(actions[0], Action::StopTimer(TimerKind::IdleCheck)));
}

#[test]
fn missing_cookie_falls_back_to_local_action_and_reseeds() {
    let (mut mgr, mut state) = started(1);

    let actions = mgr
        .handle_event(&mut state, Event::IdleCheck { now_ms: 1000, shared_ms: None })
        .unwrap();
    assert_eq!(actions, vec![Action::WriteActivity { at_ms: 0 }]);
    assert_eq!(state.phase(), Phase::Idle);

    let actions = mgr
        .handle_event(&mut state, Event::IdleCheck { now_ms: 5000, shared_ms: None })
        .unwrap();
    assert_eq!(actions[0], Action::WriteActivity { at_ms: 0 });
    assert!(actions.contains(&Action::ShowWarning { seconds: 60 }));
}

#[test]
fn missing_cookie_never_rewinds_past_seen_shared_activity() {
    let (mut mgr, mut state) = started(1);

    // Another page was active at 3500.
    let actions = mgr.handle_event(&mut state, idle_check(4000, 3500)).unwrap();
    assert!(actions.is_empty());

    // Cookie vanished: the newer shared time is kept and written back.
    let actions = mgr
        .handle_event(&mut state, Event::IdleCheck { now_ms: 5000, shared_ms: None })
        .unwrap();
    assert_eq!(actions, vec![Action::WriteActivity { at_ms: 3500 }]);
    assert_eq!(state.phase(), Phase::Idle);

    let actions = mgr
        .handle_event(&mut state, Event::IdleCheck { now_ms: 8500, shared_ms: None })
        .unwrap();
    assert_eq!(actions[0], Action::WriteActivity { at_ms: 3500 });
    assert!(actions.contains(&Action::ShowWarning { seconds: 60 }));
}

#[test]
fn future_shared_timestamp_counts_as_fresh() {
    let (mut mgr, mut state) = started(1);
    let actions = mgr.handle_event(&mut state, idle_check(5000, 90_000)).unwrap();
    assert!(actions.is_empty());
}

#[test]
fn countdown_decrements_and_logs_out_exactly_at_zero() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    let mut now = 5000;
    for expected in (1..60).rev() {
        now += 1000;
        let actions = mgr.handle_event(&mut state, countdown(now, 0)).unwrap();
        assert_eq!(actions, vec![Action::UpdateCountdown { seconds: expected }]);
        assert_eq!(state.remaining(), Some(expected));
    }

    now += 1000;
    let actions = mgr.handle_event(&mut state, countdown(now, 0)).unwrap();
    assert_eq!(
        actions,
        vec![
            Action::StopTimer(TimerKind::Countdown),
            Action::Logout { url: LOGOUT.to_string() },
        ]
    );
    assert_eq!(state.phase(), Phase::Terminated);
    assert_eq!(now, 65_000);
}

#[test]
fn shared_write_newer_than_display_cancels_warning() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();
    mgr.handle_event(&mut state, countdown(6000, 0)).unwrap();

    // Some other page recorded activity at 6500.
    let actions = mgr.handle_event(&mut state, countdown(7000, 6500)).unwrap();
    assert_eq!(
        actions,
        vec![
            Action::StopTimer(TimerKind::Countdown),
            Action::HideWarning,
            Action::WriteActivity { at_ms: 7000 },
            Action::StartTimer(TimerKind::IdleCheck),
        ]
    );
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.last_action_ms(), 7000);
}

#[test]
fn shared_write_equal_to_display_does_not_cancel() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    let actions = mgr.handle_event(&mut state, countdown(6000, 5000)).unwrap();
    assert_eq!(actions, vec![Action::UpdateCountdown { seconds: 59 }]);
}

#[test]
fn local_activity_cancels_warning_immediately() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    let actions = mgr.handle_event(&mut state, click(5400)).unwrap();
    assert_eq!(
        actions,
        vec![
            Action::StopTimer(TimerKind::Countdown),
            Action::HideWarning,
            Action::WriteActivity { at_ms: 5400 },
            Action::StartTimer(TimerKind::IdleCheck),
        ]
    );
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn repeated_activity_in_one_tick_is_idempotent() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    let first = mgr.handle_event(&mut state, click(5400)).unwrap();
    assert!(first.contains(&Action::HideWarning));

    let second = mgr.handle_event(&mut state, click(5400)).unwrap();
    assert_eq!(second, vec![Action::WriteActivity { at_ms: 5400 }]);

    let third = mgr.handle_event(&mut state, click(5401)).unwrap();
    assert_eq!(third, vec![Action::WriteActivity { at_ms: 5401 }]);

    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.last_action_ms(), 5401);
}

#[test]
fn activity_while_idle_only_writes() {
    let (mut mgr, mut state) = started(1);
    let actions = mgr.handle_event(&mut state, click(2500)).unwrap();
    assert_eq!(actions, vec![Action::WriteActivity { at_ms: 2500 }]);
}

#[test]
fn stale_ticks_from_other_phase_are_ignored() {
    let (mut mgr, mut state) = started(1);

    // Countdown tick while idle.
    let actions = mgr.handle_event(&mut state, countdown(1000, 0)).unwrap();
    assert!(actions.is_empty());

    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    // Idle tick queued before the idle timer was stopped.
    let actions = mgr.handle_event(&mut state, idle_check(5001, 0)).unwrap();
    assert!(actions.is_empty());
    assert_eq!(state.remaining(), Some(60));
}

#[test]
fn everything_after_logout_is_rejected() {
    let (mut mgr, mut state) = started(-1);
    mgr.handle_event(&mut state, idle_check(10_000, 0)).unwrap();
    assert_eq!(state.remaining(), Some(10));

    let mut now = 10_000;
    for _ in 0..10 {
        now += 1000;
        mgr.handle_event(&mut state, countdown(now, 0)).unwrap();
    }
    assert!(state.is_terminated());

    let err = mgr.handle_event(&mut state, click(now + 1)).unwrap_err();
    assert_eq!(err, Error::InvalidState(StateError::Terminated));
    assert_eq!(err.to_string(), "session already terminated");
}

#[test]
fn dev_sentinel_uses_ten_second_window() {
    let (mut mgr, mut state) = started(-1);

    let actions = mgr.handle_event(&mut state, idle_check(9_999, 0)).unwrap();
    assert!(actions.is_empty());

    let actions = mgr.handle_event(&mut state, idle_check(10_000, 0)).unwrap();
    assert!(actions.contains(&Action::ShowWarning { seconds: 10 }));
}

#[test]
fn activity_at_second_thirty_restarts_fresh_window() {
    let (mut mgr, mut state) = started(1);
    mgr.handle_event(&mut state, idle_check(5000, 0)).unwrap();

    let mut now = 5000;
    for _ in 0..30 {
        now += 1000;
        mgr.handle_event(&mut state, countdown(now, 0)).unwrap();
    }
    assert_eq!(state.remaining(), Some(30));

    mgr.handle_event(&mut state, click(now)).unwrap();
    assert_eq!(state.phase(), Phase::Idle);

    // Fresh 5 second window starting at the click.
    let actions = mgr.handle_event(&mut state, idle_check(now + 4000, now)).unwrap();
    assert!(actions.is_empty());
    let actions = mgr.handle_event(&mut state, idle_check(now + 5000, now)).unwrap();
    assert!(actions.contains(&Action::ShowWarning { seconds: 60 }));
}
