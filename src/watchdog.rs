//! Liveness watchdog and the idle-loop supervisor that feeds it.
//!
//! The interrupt handlers have no retry path: if the debounce timer never
//! expires, input interrupts stay masked forever. The [`Supervisor`] runs
//! in the idle loop, watches for that and for hardware state drifting away
//! from the mode, and stops feeding the watchdog so the hardware resets the
//! device instead of leaving it latched.

use crate::config::TimingConfig;
use crate::controller::Health;
use crate::time::{TimeDuration, TimeInstant, TimeSource};

/// A hardware watchdog.
pub trait Watchdog {
    /// Arms the watchdog. It resets the system unless fed within
    /// `timeout_ms`.
    fn start(&mut self, timeout_ms: u32);

    /// Restarts the countdown.
    fn feed(&mut self);
}

/// Why the supervisor stopped feeding the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StallReason {
    /// A debounce window stayed open past its length plus one tick.
    DebounceStuck,

    /// Blink timer or input gate disagree with the controller state.
    Inconsistent,
}

/// Result of one supervisor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Liveness {
    /// The watchdog was fed.
    Fed,

    /// The watchdog was not fed and never will be again.
    Starving(StallReason),
}

/// Feeds the watchdog from the idle loop while the controller is healthy.
///
/// ```ignore
/// let mut supervisor = Supervisor::new(watchdog, &clock, &config);
/// loop {
///     if let Some(health) = CONTROLLER.with(|c| c.health()) {
///         supervisor.check(health);
///     }
/// }
/// ```
pub struct Supervisor<'t, W: Watchdog, I: TimeInstant, T: TimeSource<I>> {
    watchdog: W,
    time_source: &'t T,
    window_limit_ms: u64,
    open_window: Option<(u32, I)>,
    stalled: Option<StallReason>,
}

impl<'t, W: Watchdog, I: TimeInstant, T: TimeSource<I>> Supervisor<'t, W, I, T> {
    /// Arms the watchdog with the configured timeout.
    pub fn new(mut watchdog: W, time_source: &'t T, config: &TimingConfig) -> Self {
        watchdog.start(config.watchdog_timeout_ms());

        Self {
            watchdog,
            time_source,
            window_limit_ms: u64::from(config.debounce_window_ms())
                + u64::from(config.debounce_tick_ms()),
            open_window: None,
            stalled: None,
        }
    }

    /// Checks one health snapshot and feeds the watchdog if it passes.
    ///
    /// Once a stall is detected the supervisor latches it and never feeds
    /// again.
    pub fn check(&mut self, health: Health) -> Liveness {
        if let Some(reason) = self.stalled {
            return Liveness::Starving(reason);
        }

        if let Some(reason) = self.diagnose(health) {
            warn!("watchdog starved: {}", reason);
            self.stalled = Some(reason);
            return Liveness::Starving(reason);
        }

        self.watchdog.feed();
        Liveness::Fed
    }

    fn diagnose(&mut self, health: Health) -> Option<StallReason> {
        if !health.is_consistent() {
            return Some(StallReason::Inconsistent);
        }

        if !health.debounce_active {
            self.open_window = None;
            return None;
        }

        let now = self.time_source.now();
        let opened = match self.open_window {
            Some((window, opened)) if window == health.debounce_windows => opened,
            _ => {
                self.open_window = Some((health.debounce_windows, now));
                now
            }
        };

        if now.duration_since(opened).as_millis() > self.window_limit_ms {
            Some(StallReason::DebounceStuck)
        } else {
            None
        }
    }

    /// The latched stall, if any.
    pub fn stalled(&self) -> Option<StallReason> {
        self.stalled
    }

    /// Returns a reference to the watchdog.
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }
}
