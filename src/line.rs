//! Digital line capabilities.
//!
//! The controller only ever reads three input levels, drives one output,
//! and masks or unmasks the pin-change interrupt shared by the inputs.
//! Implement these traits for your board, or wrap `embedded-hal` pins in
//! [`HalInput`] / [`HalOutput`].

use crate::mode::Buttons;
use embedded_hal::digital::{InputPin, PinState, StatefulOutputPin};

/// A digital input sampled by the controller.
pub trait InputLine {
    /// Returns the current electrical level, `true` for high.
    ///
    /// Handle any hardware errors internally - this method cannot fail.
    fn read(&mut self) -> bool;
}

/// The digital output driving the indicator.
pub trait OutputLine {
    /// Drives the line high (`true`) or low (`false`).
    fn write(&mut self, high: bool);

    /// Inverts the current level.
    fn toggle(&mut self);

    /// Drives the line low.
    fn clear(&mut self) {
        self.write(false);
    }

    /// Returns the level currently driven.
    fn is_set_high(&mut self) -> bool;
}

/// Port-level mask for the input-change interrupt.
///
/// One gate covers all three buttons: while it is disabled no edge on any
/// of them reaches the controller.
pub trait InterruptGate {
    /// Unmasks input-change interrupts.
    fn enable(&mut self);

    /// Masks input-change interrupts.
    fn disable(&mut self);

    /// Whether input-change interrupts are currently unmasked.
    fn is_enabled(&self) -> bool;
}

/// Which electrical level means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Pulled up, pressed pulls the line low.
    #[default]
    ActiveLow,

    /// Pulled down, pressed pulls the line high.
    ActiveHigh,
}

impl Polarity {
    /// Interprets a raw level.
    #[inline]
    pub const fn is_pressed(self, level: bool) -> bool {
        match self {
            Polarity::ActiveLow => !level,
            Polarity::ActiveHigh => level,
        }
    }

    /// Level the line rests at when released.
    #[inline]
    pub const fn idle_level(self) -> bool {
        match self {
            Polarity::ActiveLow => true,
            Polarity::ActiveHigh => false,
        }
    }
}

/// The three button inputs.
pub struct ButtonLines<In: InputLine> {
    pub reset: In,
    pub previous: In,
    pub next: In,
}

impl<In: InputLine> ButtonLines<In> {
    /// Groups the three inputs.
    pub fn new(reset: In, previous: In, next: In) -> Self {
        Self {
            reset,
            previous,
            next,
        }
    }

    /// Reads all three lines once and converts them to pressed states.
    pub fn sample(&mut self, polarity: Polarity) -> Buttons {
        Buttons {
            reset: polarity.is_pressed(self.reset.read()),
            previous: polarity.is_pressed(self.previous.read()),
            next: polarity.is_pressed(self.next.read()),
        }
    }
}

/// [`InputLine`] over an `embedded-hal` input pin.
///
/// A failed read reports `fallback`, normally the line's idle level so an
/// unreadable button counts as released.
pub struct HalInput<P: InputPin> {
    pin: P,
    fallback: bool,
}

impl<P: InputPin> HalInput<P> {
    /// Wraps a pin whose failed reads report the idle level of `polarity`.
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self {
            pin,
            fallback: polarity.idle_level(),
        }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> InputLine for HalInput<P> {
    fn read(&mut self) -> bool {
        self.pin.is_high().unwrap_or(self.fallback)
    }
}

/// [`OutputLine`] over an `embedded-hal` stateful output pin.
///
/// Write errors are dropped; the next mode transition re-drives the line.
pub struct HalOutput<P: StatefulOutputPin> {
    pin: P,
}

impl<P: StatefulOutputPin> HalOutput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> OutputLine for HalOutput<P> {
    fn write(&mut self, high: bool) {
        let _ = self.pin.set_state(PinState::from(high));
    }

    fn toggle(&mut self) {
        let _ = self.pin.toggle();
    }

    fn is_set_high(&mut self) -> bool {
        self.pin.is_set_high().unwrap_or(false)
    }
}
