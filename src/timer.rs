//! Interval timer capability and the tick counter layered on top of it.

/// A hardware interval timer that raises an expiry event once per tick.
///
/// The controller never relies on the timer producing its whole window in
/// one expiry: it counts ticks with a [`TickCounter`] so the same code works
/// whether the hardware can only overflow every few milliseconds or can be
/// programmed for the full window directly.
pub trait IntervalTimer {
    /// Programs the tick period. Called once while the controller boots.
    ///
    /// Timers with a fixed hardware tick may ignore this.
    fn set_period_ms(&mut self, period_ms: u32);

    /// Starts ticking from a fresh phase. Restarts if already running.
    fn start(&mut self);

    /// Stops ticking. No further expiry events are raised.
    fn stop(&mut self);

    /// Whether the timer is currently raising expiry events.
    fn is_running(&self) -> bool;

    /// Clears a pending expiry flag.
    ///
    /// Called at the top of every tick handler. Hardware that needs the
    /// interrupt flag cleared by software does it here.
    fn acknowledge(&mut self) {}
}

/// Counts hardware ticks up to a threshold.
///
/// ```
/// use indicator_fsm::TickCounter;
///
/// let mut counter = TickCounter::new(3);
/// assert!(!counter.tick());
/// assert!(!counter.tick());
/// assert!(counter.tick());
/// assert_eq!(counter.count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickCounter {
    count: u32,
    threshold: u32,
}

impl TickCounter {
    /// Creates a counter firing every `threshold` ticks (minimum 1).
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: if threshold == 0 { 1 } else { threshold },
        }
    }

    /// Records one tick. Returns `true` and rewinds to zero when the
    /// threshold is reached.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Rewinds to zero.
    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Ticks recorded since the last rewind.
    #[inline]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Ticks per firing.
    #[inline]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_every_threshold_ticks() {
        let mut counter = TickCounter::new(6);
        let mut fired = 0;
        for i in 1..=60 {
            if counter.tick() {
                fired += 1;
                assert_eq!(i % 6, 0);
            }
        }
        assert_eq!(fired, 10);
    }

    #[test]
    fn reset_restarts_phase() {
        let mut counter = TickCounter::new(4);
        counter.tick();
        counter.tick();
        counter.tick();
        assert_eq!(counter.count(), 3);

        counter.reset();
        assert_eq!(counter.count(), 0);
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert!(counter.tick());
    }

    #[test]
    fn zero_threshold_is_clamped_to_one() {
        let mut counter = TickCounter::new(0);
        assert_eq!(counter.threshold(), 1);
        assert!(counter.tick());
        assert!(counter.tick());
    }
}
