//! Time abstraction traits for platform-agnostic timing.
//!
//! Only the idle-loop [`Supervisor`](crate::Supervisor) reads the clock;
//! the interrupt handlers measure time purely by counting timer ticks.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations backed by a wrapping counter should use wrapping
    /// arithmetic so the result stays correct across one overflow.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}
