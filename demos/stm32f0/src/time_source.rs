//! SysTick uptime clock for the watchdog supervisor.
//!
//! The controller itself never reads this clock: debounce and blink timing
//! come from TIM14 / TIM16 tick counts. The supervisor uses it to notice a
//! debounce window that has stayed open past its deadline.

use core::cell::Cell;
use critical_section::Mutex;
use indicator_fsm::{TimeDuration, TimeInstant, TimeSource};

static UPTIME_MS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Advances uptime by one millisecond. Called from `SysTick`.
pub fn tick() {
    critical_section::with(|cs| {
        let uptime = UPTIME_MS.borrow(cs);
        uptime.set(uptime.get().wrapping_add(1));
    });
}

/// Elapsed uptime in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uptime(pub u64);

impl TimeDuration for Uptime {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Uptime sample. The counter wraps after about 49.7 days, and a window
/// deadline spans a few hundred milliseconds, so one wrap between samples
/// is all `duration_since` has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UptimeStamp(u32);

impl TimeInstant for UptimeStamp {
    type Duration = Uptime;

    fn duration_since(&self, earlier: Self) -> Uptime {
        Uptime(u64::from(self.0.wrapping_sub(earlier.0)))
    }
}

/// Clock handed to [`indicator_fsm::Supervisor`].
#[derive(Default)]
pub struct SysTickClock;

impl TimeSource<UptimeStamp> for SysTickClock {
    fn now(&self) -> UptimeStamp {
        critical_section::with(|cs| UptimeStamp(UPTIME_MS.borrow(cs).get()))
    }
}
