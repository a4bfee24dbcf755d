//! Shared test infrastructure for indicator-fsm integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};

use indicator_fsm::sim::{SimBoard, Simulation};
use indicator_fsm::{
    ButtonLines, IndicatorController, InputLine, InterruptGate, IntervalTimer, OutputLine,
    TimingConfig,
};

// ============================================================================
// Timing
// ============================================================================

/// Default debounce window in milliseconds.
pub const WINDOW_MS: u32 = 300;

/// Default blink half-period in milliseconds.
pub const BLINK_MS: u32 = 100;

/// Long enough for any open debounce window to close.
pub const SETTLE_MS: u32 = WINDOW_MS + 20;

/// Boots a simulation with the default timing.
pub fn boot(board: &SimBoard) -> Simulation<'_> {
    Simulation::new(board, TimingConfig::default()).unwrap()
}

/// Boots a simulation with custom timing.
pub fn boot_with(board: &SimBoard, config: TimingConfig) -> Simulation<'_> {
    Simulation::new(board, config).unwrap()
}

// ============================================================================
// Call Log
// ============================================================================

/// Hardware calls observed by the logging mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    OutputWrite(bool),
    OutputToggle,
    GateEnable,
    GateDisable,
    TimerPeriod(TimerId, u32),
    TimerStart(TimerId),
    TimerStop(TimerId),
    TimerAck(TimerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    Debounce,
    Blink,
}

/// Calls kept per log; enough for boot plus a full debounce window.
pub const CALL_LOG_CAPACITY: usize = 64;

/// Ordered record of hardware calls shared by the logging mocks.
#[derive(Default)]
pub struct CallLog {
    calls: RefCell<heapless::Vec<Call, CALL_LOG_CAPACITY>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        let _ = self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> heapless::Vec<Call, CALL_LOG_CAPACITY> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

// ============================================================================
// Logging Mocks
// ============================================================================

/// Input line whose level is set by the test.
pub struct MockInput<'a> {
    level: &'a Cell<bool>,
}

impl<'a> MockInput<'a> {
    pub fn new(level: &'a Cell<bool>) -> Self {
        Self { level }
    }
}

impl InputLine for MockInput<'_> {
    fn read(&mut self) -> bool {
        self.level.get()
    }
}

/// Output line that logs writes and toggles.
pub struct MockOutput<'a> {
    log: &'a CallLog,
    level: bool,
}

impl<'a> MockOutput<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self { log, level: false }
    }
}

impl OutputLine for MockOutput<'_> {
    fn write(&mut self, high: bool) {
        self.level = high;
        self.log.push(Call::OutputWrite(high));
    }

    fn toggle(&mut self) {
        self.level = !self.level;
        self.log.push(Call::OutputToggle);
    }

    fn is_set_high(&mut self) -> bool {
        self.level
    }
}

/// Interrupt gate that logs enable and disable.
pub struct MockGate<'a> {
    log: &'a CallLog,
    enabled: bool,
}

impl<'a> MockGate<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self {
            log,
            enabled: false,
        }
    }
}

impl InterruptGate for MockGate<'_> {
    fn enable(&mut self) {
        self.enabled = true;
        self.log.push(Call::GateEnable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.log.push(Call::GateDisable);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Interval timer that logs every call.
pub struct MockTimer<'a> {
    log: &'a CallLog,
    id: TimerId,
    running: bool,
}

impl<'a> MockTimer<'a> {
    pub fn new(log: &'a CallLog, id: TimerId) -> Self {
        Self {
            log,
            id,
            running: false,
        }
    }
}

impl IntervalTimer for MockTimer<'_> {
    fn set_period_ms(&mut self, period_ms: u32) {
        self.log.push(Call::TimerPeriod(self.id, period_ms));
    }

    fn start(&mut self) {
        self.running = true;
        self.log.push(Call::TimerStart(self.id));
    }

    fn stop(&mut self) {
        self.running = false;
        self.log.push(Call::TimerStop(self.id));
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn acknowledge(&mut self) {
        self.log.push(Call::TimerAck(self.id));
    }
}

/// Button levels for the logging rig, active-low and released.
pub struct Levels {
    pub reset: Cell<bool>,
    pub previous: Cell<bool>,
    pub next: Cell<bool>,
}

impl Levels {
    pub fn new() -> Self {
        Self {
            reset: Cell::new(true),
            previous: Cell::new(true),
            next: Cell::new(true),
        }
    }
}

pub type MockController<'a> = IndicatorController<
    MockInput<'a>,
    MockOutput<'a>,
    MockGate<'a>,
    MockTimer<'a>,
    MockTimer<'a>,
>;

/// Controller wired to the logging mocks.
pub fn mock_controller<'a>(levels: &'a Levels, log: &'a CallLog) -> MockController<'a> {
    IndicatorController::new(
        ButtonLines::new(
            MockInput::new(&levels.reset),
            MockInput::new(&levels.previous),
            MockInput::new(&levels.next),
        ),
        MockOutput::new(log),
        MockGate::new(log),
        MockTimer::new(log, TimerId::Debounce),
        MockTimer::new(log, TimerId::Blink),
        TimingConfig::default(),
    )
    .unwrap()
}
