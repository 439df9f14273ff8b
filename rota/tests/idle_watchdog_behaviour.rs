//! Behavioural tests for the idle watchdog running against a live session.
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rota::domain::{IdleConfig, IdleEvent, IdlePhase, IdleSupervisor, SessionTerminator};
use rota::test_support::{MutableClock, signed_in_session};
use rstest::{fixture, rstest};
use tokio::time::{sleep, timeout};

#[fixture]
fn clock() -> Arc<MutableClock> {
    let now = Utc
        .with_ymd_and_hms(2026, 2, 11, 9, 0, 0)
        .single()
        .expect("valid time");
    Arc::new(MutableClock::new(now))
}

/// Let the poll task observe the clock a few times.
async fn settle() {
    sleep(Duration::from_millis(600)).await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn idle_manager_is_warned_then_signed_out(clock: Arc<MutableClock>) {
    let (session, _manager) = signed_in_session(clock.clone()).await;
    let terminator: Arc<dyn SessionTerminator> = session.clone();
    let (idle, mut events) = IdleSupervisor::new(IdleConfig::default(), clock.clone(), terminator);
    let task = idle.spawn(session.subscribe());
    settle().await;

    clock.advance_seconds(60);
    settle().await;
    let warning = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("warning arrives");
    assert_eq!(
        warning,
        Some(IdleEvent::WarningStarted {
            remaining_seconds: 30
        })
    );
    assert!(session.is_signed_in());

    clock.advance_seconds(30);
    settle().await;
    let expired = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("expiry arrives");
    assert_eq!(expired, Some(IdleEvent::Expired));
    assert!(!session.is_signed_in());
    assert_eq!(idle.phase(), IdlePhase::Active);

    task.abort();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stay_keeps_the_session_alive(clock: Arc<MutableClock>) {
    let (session, _manager) = signed_in_session(clock.clone()).await;
    let terminator: Arc<dyn SessionTerminator> = session.clone();
    let (idle, mut events) = IdleSupervisor::new(IdleConfig::default(), clock.clone(), terminator);
    let task = idle.spawn(session.subscribe());
    settle().await;

    clock.advance_seconds(60);
    settle().await;
    assert!(matches!(
        events.recv().await,
        Some(IdleEvent::WarningStarted { .. })
    ));

    clock.advance_seconds(10);
    assert!(!idle.record_activity(), "typing does not dismiss the warning");
    assert_eq!(
        idle.phase(),
        IdlePhase::Warning {
            remaining_seconds: 20
        }
    );
    assert!(idle.stay());

    clock.advance_seconds(59);
    settle().await;
    assert!(session.is_signed_in());
    assert!(!idle.is_warning());

    task.abort();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn signing_out_stops_the_countdown(clock: Arc<MutableClock>) {
    let (session, _manager) = signed_in_session(clock.clone()).await;
    let terminator: Arc<dyn SessionTerminator> = session.clone();
    let (idle, mut events) = IdleSupervisor::new(IdleConfig::default(), clock.clone(), terminator);
    let task = idle.spawn(session.subscribe());
    settle().await;

    session.sign_out().await;
    clock.advance_seconds(600);
    settle().await;

    assert!(events.try_recv().is_err(), "no events while signed out");
    assert_eq!(idle.phase(), IdlePhase::Active);

    task.abort();
}
