//! Host-side simulation of the controller's hardware.
//!
//! [`SimBoard`] holds the simulated register state (pin levels, output
//! latch, interrupt mask, timers, watchdog, virtual clock) in cells, and the
//! `Sim*` types implement the capability traits against it. [`Simulation`]
//! wires a controller to a board and stands in for the interrupt
//! controller: edges and timer ticks become [`Event`]s processed strictly in
//! arrival order through a [`Dispatcher`].
//!
//! ```
//! use indicator_fsm::sim::{Button, SimBoard, Simulation};
//! use indicator_fsm::{Mode, TimingConfig};
//!
//! let board = SimBoard::new();
//! let mut sim = Simulation::new(&board, TimingConfig::default()).unwrap();
//!
//! sim.press(Button::Next);
//! assert_eq!(sim.controller().mode(), Mode::Blinking);
//!
//! sim.advance(1_000);
//! assert_eq!(board.toggle_times().len(), 10);
//! ```

use core::cell::{Cell, RefCell};
use heapless::{Deque, Vec};

use crate::config::{ConfigError, TimingConfig};
use crate::controller::IndicatorController;
use crate::dispatch::{Dispatcher, Event, QueueError};
use crate::line::{ButtonLines, InputLine, InterruptGate, OutputLine, Polarity};
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::timer::IntervalTimer;
use crate::watchdog::Watchdog;

/// Toggle timestamps kept by the board; older entries are discarded.
pub const TOGGLE_LOG_CAPACITY: usize = 64;

/// Pending-event capacity of a [`Simulation`].
pub const SIM_QUEUE_DEPTH: usize = 16;

/// One of the three simulated buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Reset,
    Previous,
    Next,
}

/// Simulated interval timer registers.
#[derive(Debug, Default)]
pub struct SimTimerState {
    running: Cell<bool>,
    period_ms: Cell<u32>,
    elapsed_ms: Cell<u32>,
    starts: Cell<u32>,
    acks: Cell<u32>,
}

impl SimTimerState {
    /// Advances one millisecond. Returns `true` when a tick expires.
    pub fn step(&self) -> bool {
        if !self.running.get() {
            return false;
        }

        let elapsed = self.elapsed_ms.get() + 1;
        if elapsed >= self.period_ms.get().max(1) {
            self.elapsed_ms.set(0);
            true
        } else {
            self.elapsed_ms.set(elapsed);
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms.get()
    }

    /// Number of `start` calls.
    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    /// Number of acknowledged expiries.
    pub fn acks(&self) -> u32 {
        self.acks.get()
    }
}

/// Simulated board state shared by all `Sim*` peripherals.
pub struct SimBoard {
    now_ms: Cell<u32>,
    polarity: Polarity,
    reset_level: Cell<bool>,
    previous_level: Cell<bool>,
    next_level: Cell<bool>,
    output_level: Cell<bool>,
    gate_enabled: Cell<bool>,
    masked_edges: Cell<u32>,
    debounce_timer: SimTimerState,
    blink_timer: SimTimerState,
    toggles: RefCell<Deque<u32, TOGGLE_LOG_CAPACITY>>,
    watchdog_timeout_ms: Cell<Option<u32>>,
    watchdog_feeds: Cell<u32>,
    watchdog_last_feed_ms: Cell<u32>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Board with active-low buttons, all released.
    pub fn new() -> Self {
        Self::with_polarity(Polarity::ActiveLow)
    }

    /// Board whose buttons use `polarity`, all released.
    pub fn with_polarity(polarity: Polarity) -> Self {
        let idle = polarity.idle_level();
        Self {
            now_ms: Cell::new(0),
            polarity,
            reset_level: Cell::new(idle),
            previous_level: Cell::new(idle),
            next_level: Cell::new(idle),
            output_level: Cell::new(false),
            gate_enabled: Cell::new(false),
            masked_edges: Cell::new(0),
            debounce_timer: SimTimerState::default(),
            blink_timer: SimTimerState::default(),
            toggles: RefCell::new(Deque::new()),
            watchdog_timeout_ms: Cell::new(None),
            watchdog_feeds: Cell::new(0),
            watchdog_last_feed_ms: Cell::new(0),
        }
    }

    /// Virtual time in milliseconds since the board was created.
    pub fn now_ms(&self) -> u32 {
        self.now_ms.get()
    }

    /// Moves the virtual clock without stepping any timer.
    pub fn advance_clock(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get().wrapping_add(ms));
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    fn level_cell(&self, button: Button) -> &Cell<bool> {
        match button {
            Button::Reset => &self.reset_level,
            Button::Previous => &self.previous_level,
            Button::Next => &self.next_level,
        }
    }

    /// Current electrical level of a button line.
    pub fn level(&self, button: Button) -> bool {
        self.level_cell(button).get()
    }

    /// Sets a button line level. Returns `true` if the level changed.
    pub fn set_level(&self, button: Button, level: bool) -> bool {
        self.level_cell(button).replace(level) != level
    }

    /// Level latched on the indicator output.
    pub fn output_high(&self) -> bool {
        self.output_level.get()
    }

    /// Whether the input-change interrupt is unmasked.
    pub fn gate_enabled(&self) -> bool {
        self.gate_enabled.get()
    }

    /// Edges that occurred while the input-change interrupt was masked.
    pub fn masked_edges(&self) -> u32 {
        self.masked_edges.get()
    }

    pub fn debounce_timer(&self) -> &SimTimerState {
        &self.debounce_timer
    }

    pub fn blink_timer(&self) -> &SimTimerState {
        &self.blink_timer
    }

    /// Timestamps of the most recent output toggles, oldest first.
    pub fn toggle_times(&self) -> Vec<u32, TOGGLE_LOG_CAPACITY> {
        self.toggles.borrow().iter().copied().collect()
    }

    pub fn clear_toggles(&self) {
        self.toggles.borrow_mut().clear();
    }

    fn record_toggle(&self) {
        let mut toggles = self.toggles.borrow_mut();
        if toggles.is_full() {
            toggles.pop_front();
        }
        let _ = toggles.push_back(self.now_ms());
    }

    /// True once an armed watchdog has gone unfed for longer than its
    /// timeout.
    pub fn watchdog_expired(&self) -> bool {
        match self.watchdog_timeout_ms.get() {
            Some(timeout) => {
                self.now_ms().wrapping_sub(self.watchdog_last_feed_ms.get()) > timeout
            }
            None => false,
        }
    }
}

/// Button input line on a [`SimBoard`].
pub struct SimInput<'a> {
    board: &'a SimBoard,
    button: Button,
}

impl<'a> SimInput<'a> {
    pub fn new(board: &'a SimBoard, button: Button) -> Self {
        Self { board, button }
    }
}

impl InputLine for SimInput<'_> {
    fn read(&mut self) -> bool {
        self.board.level(self.button)
    }
}

/// Indicator output on a [`SimBoard`]. Toggles are timestamped.
pub struct SimOutput<'a> {
    board: &'a SimBoard,
}

impl<'a> SimOutput<'a> {
    pub fn new(board: &'a SimBoard) -> Self {
        Self { board }
    }
}

impl OutputLine for SimOutput<'_> {
    fn write(&mut self, high: bool) {
        self.board.output_level.set(high);
    }

    fn toggle(&mut self) {
        self.board.output_level.set(!self.board.output_level.get());
        self.board.record_toggle();
    }

    fn is_set_high(&mut self) -> bool {
        self.board.output_level.get()
    }
}

/// Input-change interrupt mask on a [`SimBoard`].
pub struct SimGate<'a> {
    board: &'a SimBoard,
}

impl<'a> SimGate<'a> {
    pub fn new(board: &'a SimBoard) -> Self {
        Self { board }
    }
}

impl InterruptGate for SimGate<'_> {
    fn enable(&mut self) {
        self.board.gate_enabled.set(true);
    }

    fn disable(&mut self) {
        self.board.gate_enabled.set(false);
    }

    fn is_enabled(&self) -> bool {
        self.board.gate_enabled.get()
    }
}

/// Interval timer backed by a [`SimTimerState`].
pub struct SimTimer<'a> {
    state: &'a SimTimerState,
}

impl<'a> SimTimer<'a> {
    pub fn new(state: &'a SimTimerState) -> Self {
        Self { state }
    }
}

impl IntervalTimer for SimTimer<'_> {
    fn set_period_ms(&mut self, period_ms: u32) {
        self.state.period_ms.set(period_ms);
    }

    fn start(&mut self) {
        self.state.elapsed_ms.set(0);
        self.state.running.set(true);
        self.state.starts.set(self.state.starts.get() + 1);
    }

    fn stop(&mut self) {
        self.state.running.set(false);
    }

    fn is_running(&self) -> bool {
        self.state.running.get()
    }

    fn acknowledge(&mut self) {
        self.state.acks.set(self.state.acks.get() + 1);
    }
}

/// Watchdog on a [`SimBoard`]; records arming and feeds.
pub struct SimWatchdog<'a> {
    board: &'a SimBoard,
}

impl<'a> SimWatchdog<'a> {
    pub fn new(board: &'a SimBoard) -> Self {
        Self { board }
    }

    /// Timeout passed to `start`, `None` if never armed.
    pub fn timeout_ms(&self) -> Option<u32> {
        self.board.watchdog_timeout_ms.get()
    }

    pub fn feeds(&self) -> u32 {
        self.board.watchdog_feeds.get()
    }
}

impl Watchdog for SimWatchdog<'_> {
    fn start(&mut self, timeout_ms: u32) {
        self.board.watchdog_timeout_ms.set(Some(timeout_ms));
        self.board.watchdog_last_feed_ms.set(self.board.now_ms());
    }

    fn feed(&mut self) {
        self.board
            .watchdog_feeds
            .set(self.board.watchdog_feeds.get() + 1);
        self.board.watchdog_last_feed_ms.set(self.board.now_ms());
    }
}

/// Millisecond duration on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub u64);

impl TimeDuration for Millis {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Instant on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(pub u32);

impl TimeInstant for SimInstant {
    type Duration = Millis;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        Millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }
}

/// Time source reading the board's virtual clock.
pub struct SimClock<'a> {
    board: &'a SimBoard,
}

impl<'a> SimClock<'a> {
    pub fn new(board: &'a SimBoard) -> Self {
        Self { board }
    }
}

impl TimeSource<SimInstant> for SimClock<'_> {
    fn now(&self) -> SimInstant {
        SimInstant(self.board.now_ms())
    }
}

/// Controller wired to simulated peripherals.
pub type SimController<'a> =
    IndicatorController<SimInput<'a>, SimOutput<'a>, SimGate<'a>, SimTimer<'a>, SimTimer<'a>>;

/// A controller on a [`SimBoard`] plus the event loop standing in for the
/// interrupt controller.
pub struct Simulation<'a> {
    board: &'a SimBoard,
    controller: SimController<'a>,
    dispatcher: Dispatcher<SimController<'a>, SIM_QUEUE_DEPTH>,
}

impl<'a> Simulation<'a> {
    /// Boots a controller on `board`.
    ///
    /// The board's polarity overrides the one in `config`.
    pub fn new(board: &'a SimBoard, config: TimingConfig) -> Result<Self, ConfigError> {
        let buttons = ButtonLines::new(
            SimInput::new(board, Button::Reset),
            SimInput::new(board, Button::Previous),
            SimInput::new(board, Button::Next),
        );
        let controller = IndicatorController::new(
            buttons,
            SimOutput::new(board),
            SimGate::new(board),
            SimTimer::new(&board.debounce_timer),
            SimTimer::new(&board.blink_timer),
            config.with_polarity(board.polarity()),
        )?;

        Ok(Self {
            board,
            controller,
            dispatcher: Dispatcher::new(SimController::handlers()),
        })
    }

    pub fn board(&self) -> &'a SimBoard {
        self.board
    }

    pub fn controller(&mut self) -> &mut SimController<'a> {
        &mut self.controller
    }

    /// Virtual time in milliseconds.
    pub fn now_ms(&self) -> u32 {
        self.board.now_ms()
    }

    /// Presses one button.
    pub fn press(&mut self, button: Button) {
        self.press_together(&[button]);
    }

    /// Releases one button.
    pub fn release(&mut self, button: Button) {
        self.release_together(&[button]);
    }

    /// Presses several buttons within the same instant; at most one edge
    /// interrupt is raised.
    pub fn press_together(&mut self, buttons: &[Button]) {
        let level = !self.board.polarity.idle_level();
        self.set_levels(buttons, level);
    }

    /// Releases several buttons within the same instant.
    pub fn release_together(&mut self, buttons: &[Button]) {
        let level = self.board.polarity.idle_level();
        self.set_levels(buttons, level);
    }

    /// Presses, holds for `hold_ms`, releases.
    pub fn click(&mut self, button: Button, hold_ms: u32) {
        self.press(button);
        self.advance(hold_ms);
        self.release(button);
    }

    fn set_levels(&mut self, buttons: &[Button], level: bool) {
        let mut changed = false;
        for &button in buttons {
            changed |= self.board.set_level(button, level);
        }
        if changed {
            self.edge();
        }
    }

    fn edge(&mut self) {
        if self.board.gate_enabled() {
            self.raise(Event::InputChange);
        } else {
            self.board.masked_edges.set(self.board.masked_edges() + 1);
        }
    }

    /// Queues an event without running it.
    ///
    /// # Errors
    /// [`QueueError::Full`] once [`SIM_QUEUE_DEPTH`] events are pending.
    pub fn post(&mut self, event: Event) -> Result<(), QueueError> {
        self.dispatcher.post(event)
    }

    /// Runs an interrupt-raised event straight away, after anything already
    /// queued, so board events never wait on queue space.
    fn raise(&mut self, event: Event) {
        self.run_pending();
        self.dispatcher.table().dispatch(&mut self.controller, event);
    }

    /// Runs every queued event in arrival order.
    pub fn run_pending(&mut self) -> usize {
        self.dispatcher.run_pending(&mut self.controller)
    }

    /// Advances virtual time one millisecond at a time, raising timer ticks
    /// and running them as they expire.
    pub fn advance(&mut self, ms: u32) {
        for _ in 0..ms {
            self.board.advance_clock(1);
            if self.board.debounce_timer.step() {
                self.raise(Event::DebounceTick);
            }
            if self.board.blink_timer.step() {
                self.raise(Event::BlinkTick);
            }
            self.run_pending();
        }
    }
}
