//! Inactivity watchdog that forces sign-out after a warning countdown.
//!
//! [`IdleWatchdog`] is a pure state machine driven by explicit timestamps.
//! [`IdleSupervisor`] owns the poll loop and follows session changes.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

mod runtime;

pub use runtime::{IdleSupervisor, SessionTerminator};

/// Watchdog timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleConfig {
    /// Inactivity before the warning appears.
    pub idle_threshold: Duration,
    /// Length of the warning countdown, in whole seconds.
    pub countdown_seconds: u64,
    /// How often the poll loop checks the clock.
    pub poll_interval: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(60),
            countdown_seconds: 30,
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Observable watchdog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    Active,
    Warning { remaining_seconds: u64 },
}

/// Transition reported by [`IdleWatchdog::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// Inactivity crossed the threshold; the countdown has begun.
    WarningStarted { remaining_seconds: u64 },
    /// The visible countdown dropped to a new whole second.
    Countdown { remaining_seconds: u64 },
    /// The countdown finished; the session must end.
    Expired,
}

/// Render seconds as the countdown shows them (`0:30`, `1:05`).
pub fn countdown_label(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Activity tracker with an explicit warning phase.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use rota::domain::{IdleConfig, IdleEvent, IdleWatchdog};
///
/// let start = Utc.with_ymd_and_hms(2026, 2, 11, 9, 0, 0).unwrap();
/// let mut watchdog = IdleWatchdog::new(IdleConfig::default(), start);
/// assert_eq!(watchdog.poll(start + TimeDelta::seconds(59)), None);
/// assert_eq!(
///     watchdog.poll(start + TimeDelta::seconds(60)),
///     Some(IdleEvent::WarningStarted { remaining_seconds: 30 })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct IdleWatchdog {
    config: IdleConfig,
    last_activity: DateTime<Utc>,
    warning_started: Option<DateTime<Utc>>,
    last_reported: u64,
}

impl IdleWatchdog {
    pub fn new(config: IdleConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            last_activity: now,
            warning_started: None,
            last_reported: config.countdown_seconds,
        }
    }

    pub fn config(&self) -> IdleConfig {
        self.config
    }

    /// Note user input. Ignored while the warning is showing.
    ///
    /// Returns whether the activity was counted.
    pub fn record_activity(&mut self, now: DateTime<Utc>) -> bool {
        if self.warning_started.is_some() {
            return false;
        }
        self.last_activity = now;
        true
    }

    /// Dismiss the warning and count as activity.
    ///
    /// Returns whether a warning was showing.
    pub fn stay(&mut self, now: DateTime<Utc>) -> bool {
        let was_warning = self.warning_started.is_some();
        self.reset(now);
        was_warning
    }

    /// Back to `Active` with fresh activity.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
        self.warning_started = None;
        self.last_reported = self.config.countdown_seconds;
    }

    pub fn is_warning(&self) -> bool {
        self.warning_started.is_some()
    }

    /// Current phase as of `now`.
    pub fn phase(&self, now: DateTime<Utc>) -> IdlePhase {
        match self.warning_started {
            None => IdlePhase::Active,
            Some(started) => IdlePhase::Warning {
                remaining_seconds: self.remaining_seconds(started, now),
            },
        }
    }

    /// Compare the clock against the thresholds and advance the state.
    ///
    /// Remaining time is always derived from the warning start, so a late or
    /// skipped poll never stretches the countdown. `Expired` resets the
    /// watchdog for the next session.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<IdleEvent> {
        let Some(started) = self.warning_started else {
            let idle_for = elapsed(self.last_activity, now);
            if idle_for < self.config.idle_threshold {
                return None;
            }
            self.warning_started = Some(now);
            self.last_reported = self.config.countdown_seconds;
            return Some(IdleEvent::WarningStarted {
                remaining_seconds: self.config.countdown_seconds,
            });
        };

        let remaining = self.remaining_seconds(started, now);
        if remaining == 0 {
            self.reset(now);
            return Some(IdleEvent::Expired);
        }
        if remaining == self.last_reported {
            return None;
        }
        self.last_reported = remaining;
        Some(IdleEvent::Countdown {
            remaining_seconds: remaining,
        })
    }

    fn remaining_seconds(&self, started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        self.config
            .countdown_seconds
            .saturating_sub(elapsed(started, now).as_secs())
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .max(TimeDelta::zero())
        .to_std()
        .unwrap_or_default()
}
