//! Poll loop that drives the watchdog while a manager is signed in.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::domain::Session;

use super::{IdleConfig, IdleEvent, IdlePhase, IdleWatchdog};

/// Ends the session when the countdown runs out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    /// Sign the current manager out. Failures are the implementor's to log.
    async fn terminate(&self);
}

/// Shares one [`IdleWatchdog`] between the input loop and the poll task.
///
/// Events are delivered on the channel returned by [`IdleSupervisor::new`].
pub struct IdleSupervisor {
    watchdog: Mutex<IdleWatchdog>,
    clock: Arc<dyn Clock>,
    terminator: Arc<dyn SessionTerminator>,
    events: mpsc::UnboundedSender<IdleEvent>,
}

impl IdleSupervisor {
    pub fn new(
        config: IdleConfig,
        clock: Arc<dyn Clock>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<IdleEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let watchdog = Mutex::new(IdleWatchdog::new(config, clock.utc()));
        let supervisor = Arc::new(Self {
            watchdog,
            clock,
            terminator,
            events,
        });
        (supervisor, receiver)
    }

    /// Count user input as activity. Returns `false` during the warning.
    pub fn record_activity(&self) -> bool {
        let now = self.clock.utc();
        self.with_watchdog(|watchdog| watchdog.record_activity(now))
            .unwrap_or(false)
    }

    /// Dismiss the warning. Returns whether one was showing.
    pub fn stay(&self) -> bool {
        let now = self.clock.utc();
        self.with_watchdog(|watchdog| watchdog.stay(now))
            .unwrap_or(false)
    }

    pub fn reset(&self) {
        let now = self.clock.utc();
        self.with_watchdog(|watchdog| watchdog.reset(now));
    }

    pub fn is_warning(&self) -> bool {
        self.with_watchdog(|watchdog| watchdog.is_warning())
            .unwrap_or(false)
    }

    pub fn phase(&self) -> IdlePhase {
        let now = self.clock.utc();
        self.with_watchdog(|watchdog| watchdog.phase(now))
            .unwrap_or(IdlePhase::Active)
    }

    /// Run one poll: advance the watchdog, publish any event, and end the
    /// session on expiry.
    pub async fn tick(&self) -> Option<IdleEvent> {
        let now = self.clock.utc();
        let event = self.with_watchdog(|watchdog| watchdog.poll(now)).flatten()?;
        match event {
            IdleEvent::WarningStarted { remaining_seconds } => {
                info!(remaining_seconds, "idle warning started");
            }
            IdleEvent::Countdown { remaining_seconds } => {
                debug!(remaining_seconds, "idle countdown");
            }
            IdleEvent::Expired => info!("idle countdown expired; signing out"),
        }
        if self.events.send(event).is_err() {
            debug!("idle event receiver dropped");
        }
        if event == IdleEvent::Expired {
            self.terminator.terminate().await;
        }
        Some(event)
    }

    /// Follow session changes: poll while signed in, idle otherwise.
    ///
    /// The watchdog is reset on every change. The task ends when the session
    /// sender is dropped.
    pub fn spawn(
        self: &Arc<Self>,
        mut sessions: watch::Receiver<Option<Session>>,
    ) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let signed_in = sessions.borrow_and_update().is_some();
                supervisor.reset();
                if signed_in {
                    if !supervisor.poll_until_changed(&mut sessions).await {
                        return;
                    }
                } else if sessions.changed().await.is_err() {
                    return;
                }
            }
        })
    }

    async fn poll_until_changed(&self, sessions: &mut watch::Receiver<Option<Session>>) -> bool {
        let poll_interval = self
            .with_watchdog(|watchdog| watchdog.config().poll_interval)
            .unwrap_or_else(|| IdleConfig::default().poll_interval);
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                changed = sessions.changed() => return changed.is_ok(),
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    fn with_watchdog<R>(&self, f: impl FnOnce(&mut IdleWatchdog) -> R) -> Option<R> {
        match self.watchdog.lock() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(_) => {
                error!("idle watchdog state poisoned");
                None
            }
        }
    }
}
