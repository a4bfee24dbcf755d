//! Interrupt-driven indicator controller.
//!
//! Provides [`IndicatorController`], the single owned state object that all
//! three interrupt handlers operate on. It holds the current [`Mode`], the
//! debounce and blink tick counters and the debounce suppression flag, and
//! drives the output line, both timers and the input interrupt gate as a
//! function of mode.

use crate::config::{ConfigError, TimingConfig};
use crate::dispatch::{Event, HandlerTable};
use crate::line::{ButtonLines, InputLine, InterruptGate, OutputLine};
use crate::mode::{Buttons, Mode};
use crate::timer::{IntervalTimer, TickCounter};

/// Snapshot of the controller's liveness-relevant state.
///
/// Read by the idle loop (inside a critical section) and handed to the
/// [`Supervisor`](crate::Supervisor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Health {
    pub mode: Mode,
    /// Input interrupts are suppressed by an open debounce window.
    pub debounce_active: bool,
    /// Debounce windows opened since boot (wrapping).
    pub debounce_windows: u32,
    pub gate_enabled: bool,
    pub blink_timer_running: bool,
}

impl Health {
    /// True when the hardware state agrees with the logical state.
    ///
    /// The blink timer must run exactly while blinking, and the input gate
    /// must be open exactly while no debounce window is active.
    pub fn is_consistent(&self) -> bool {
        self.blink_timer_running == self.mode.is_blinking()
            && self.gate_enabled != self.debounce_active
    }
}

/// Controls one indicator output through `Off`, `Blinking` and `On`.
///
/// Every method here is meant to run inside a handler that already holds
/// exclusive access (an interrupt handler on single-core hardware, or a
/// closure passed to [`Shared::with`](crate::Shared::with)). Nothing blocks.
///
/// # Type Parameters
/// * `In` - Button input line type
/// * `Out` - Indicator output line type
/// * `G` - Input-change interrupt gate
/// * `D` - Debounce timer
/// * `B` - Blink timer
pub struct IndicatorController<In, Out, G, D, B>
where
    In: InputLine,
    Out: OutputLine,
    G: InterruptGate,
    D: IntervalTimer,
    B: IntervalTimer,
{
    buttons: ButtonLines<In>,
    output: Out,
    gate: G,
    debounce_timer: D,
    blink_timer: B,
    config: TimingConfig,
    mode: Mode,
    debounce_counter: TickCounter,
    blink_counter: TickCounter,
    suppressed: bool,
    windows: u32,
    transitions: u32,
    ignored_edges: u32,
}

impl<In, Out, G, D, B> IndicatorController<In, Out, G, D, B>
where
    In: InputLine,
    Out: OutputLine,
    G: InterruptGate,
    D: IntervalTimer,
    B: IntervalTimer,
{
    /// Validates `config` and boots the controller.
    ///
    /// Both timers are programmed with their tick periods and stopped, the
    /// output is driven low, input interrupts are unmasked and the mode is
    /// `Off`.
    pub fn new(
        buttons: ButtonLines<In>,
        mut output: Out,
        mut gate: G,
        mut debounce_timer: D,
        mut blink_timer: B,
        config: TimingConfig,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;

        debounce_timer.stop();
        debounce_timer.set_period_ms(config.debounce_tick_ms());
        blink_timer.stop();
        blink_timer.set_period_ms(config.blink_tick_ms());
        output.clear();
        gate.enable();

        info!(
            "controller ready: debounce {} ms, blink {} ms",
            config.debounce_window_ms(),
            config.blink_period_ms()
        );

        Ok(Self {
            buttons,
            output,
            gate,
            debounce_timer,
            blink_timer,
            config,
            mode: Mode::Off,
            debounce_counter: TickCounter::new(config.debounce_ticks()),
            blink_counter: TickCounter::new(config.blink_ticks()),
            suppressed: false,
            windows: 0,
            transitions: 0,
            ignored_edges: 0,
        })
    }

    /// Handler table routing each [`Event`] to its method.
    pub fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
            .with(Event::InputChange, Self::on_input_change)
            .with(Event::DebounceTick, Self::on_debounce_tick)
            .with(Event::BlinkTick, Self::on_blink_tick)
    }

    /// Runs the handler for `event` directly.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::InputChange => self.on_input_change(),
            Event::DebounceTick => self.on_debounce_tick(),
            Event::BlinkTick => self.on_blink_tick(),
        }
    }

    /// Input-change handler.
    ///
    /// Masks input interrupts, opens the debounce window and applies the
    /// sampled buttons to the mode, in that order. The window is shared by
    /// all three buttons, so an edge arriving while it is open is dropped
    /// and does not extend it.
    pub fn on_input_change(&mut self) {
        if self.suppressed {
            self.ignored_edges = self.ignored_edges.wrapping_add(1);
            trace!("edge ignored inside debounce window");
            return;
        }

        self.gate.disable();
        self.suppressed = true;
        self.windows = self.windows.wrapping_add(1);
        self.debounce_counter.reset();
        self.debounce_timer.start();

        let buttons = self.buttons.sample(self.config.polarity());
        debug!("edge: {}", buttons);
        self.apply(buttons);
    }

    /// Debounce timer expiry handler.
    ///
    /// Closes the window once a full window of ticks has elapsed: stops the
    /// debounce timer and unmasks input interrupts.
    pub fn on_debounce_tick(&mut self) {
        self.debounce_timer.acknowledge();

        if !self.suppressed {
            return;
        }

        if self.debounce_counter.tick() {
            self.debounce_timer.stop();
            self.suppressed = false;
            self.gate.enable();
            trace!("debounce window closed");
        }
    }

    /// Blink timer expiry handler.
    ///
    /// Toggles the output every `blink_ticks()` ticks while blinking. Ticks
    /// arriving in any other mode are ignored.
    pub fn on_blink_tick(&mut self) {
        self.blink_timer.acknowledge();

        if !self.mode.is_blinking() {
            return;
        }

        if self.blink_counter.tick() {
            self.output.toggle();
        }
    }

    /// Applies one button snapshot and re-synchronizes the outputs.
    ///
    /// Effects run when the mode changes and on every reset, so a reset
    /// always leaves the output low and the blink timer stopped.
    pub fn apply(&mut self, buttons: Buttons) -> Mode {
        let next = self.mode.transition(buttons);
        if buttons.reset || next != self.mode {
            self.enter(next);
        }
        self.mode
    }

    /// Forces `Off`. Idempotent.
    pub fn reset(&mut self) {
        self.enter(Mode::Off);
    }

    /// Restores a mode from a raw stored value.
    ///
    /// An undecodable value is handled as a reset.
    pub fn restore_raw(&mut self, raw: u8) -> Mode {
        match Mode::from_raw(raw) {
            Some(mode) => self.enter(mode),
            None => {
                warn!("invalid stored mode {}, resetting", raw);
                self.enter(Mode::Off);
            }
        }
        self.mode
    }

    fn enter(&mut self, mode: Mode) {
        let previous = self.mode;
        self.mode = mode;

        match mode {
            Mode::Off => {
                self.blink_timer.stop();
                self.output.clear();
                self.blink_counter.reset();
            }
            Mode::On => {
                self.blink_timer.stop();
                self.output.write(true);
            }
            Mode::Blinking => {
                // The output is left as is until the first toggle.
                self.blink_counter.reset();
                self.blink_timer.start();
            }
        }

        if previous != mode {
            self.transitions = self.transitions.wrapping_add(1);
            info!("mode {} -> {}", previous, mode);
        }
    }

    /// Returns the current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the liveness snapshot.
    pub fn health(&self) -> Health {
        Health {
            mode: self.mode,
            debounce_active: self.suppressed,
            debounce_windows: self.windows,
            gate_enabled: self.gate.is_enabled(),
            blink_timer_running: self.blink_timer.is_running(),
        }
    }

    /// True while input interrupts are suppressed by a debounce window.
    pub fn debounce_active(&self) -> bool {
        self.suppressed
    }

    /// Blink ticks counted since the last toggle or entry to `Blinking`.
    pub fn blink_count(&self) -> u32 {
        self.blink_counter.count()
    }

    /// Debounce ticks counted in the current window.
    pub fn debounce_count(&self) -> u32 {
        self.debounce_counter.count()
    }

    /// Number of mode changes since boot (wrapping).
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Input-change events delivered while a debounce window was open.
    pub fn ignored_edges(&self) -> u32 {
        self.ignored_edges
    }

    /// Level currently driven on the indicator.
    pub fn output_high(&mut self) -> bool {
        self.output.is_set_high()
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Whether the blink timer is running.
    pub fn blink_timer_running(&self) -> bool {
        self.blink_timer.is_running()
    }

    /// Whether the debounce timer is running.
    pub fn debounce_timer_running(&self) -> bool {
        self.debounce_timer.is_running()
    }
}
