//! Operating modes and the pure transition function.

/// Operating mode of the indicator.
///
/// The discriminants are stable so a mode can be kept in retained RAM or a
/// backup register and restored with [`Mode::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Indicator off, blink timer stopped.
    #[default]
    Off = 0,

    /// Indicator toggled by the blink timer.
    Blinking = 1,

    /// Indicator on, blink timer stopped.
    On = 2,
}

impl Mode {
    /// All modes in cycle order.
    pub const ALL: [Mode; 3] = [Mode::Off, Mode::Blinking, Mode::On];

    /// Returns the raw discriminant.
    #[inline]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Decodes a raw discriminant, `None` for anything out of range.
    #[inline]
    pub const fn from_raw(raw: u8) -> Option<Mode> {
        match raw {
            0 => Some(Mode::Off),
            1 => Some(Mode::Blinking),
            2 => Some(Mode::On),
            _ => None,
        }
    }

    /// Next mode in the cycle `Off -> Blinking -> On -> Off`.
    #[inline]
    pub const fn next(self) -> Mode {
        match self {
            Mode::Off => Mode::Blinking,
            Mode::Blinking => Mode::On,
            Mode::On => Mode::Off,
        }
    }

    /// Previous mode in the cycle `Off -> On -> Blinking -> Off`.
    #[inline]
    pub const fn previous(self) -> Mode {
        match self {
            Mode::Off => Mode::On,
            Mode::Blinking => Mode::Off,
            Mode::On => Mode::Blinking,
        }
    }

    /// Applies one button snapshot to this mode.
    ///
    /// Reset wins over any directional input. With no reset, `next` or
    /// `previous` alone moves one step through the cycle; both together (or
    /// neither) leave the mode unchanged.
    pub const fn transition(self, buttons: Buttons) -> Mode {
        if buttons.reset {
            return Mode::Off;
        }

        match buttons.direction() {
            Some(Direction::Next) => self.next(),
            Some(Direction::Previous) => self.previous(),
            None => self,
        }
    }

    /// Like [`Mode::transition`], starting from a raw stored value.
    ///
    /// A value that does not decode to a mode is handled exactly like a
    /// reset so the indicator can never latch in an undefined state.
    pub const fn transition_raw(raw: u8, buttons: Buttons) -> Mode {
        match Mode::from_raw(raw) {
            Some(mode) => mode.transition(buttons),
            None => Mode::Off,
        }
    }

    /// Whether the indicator is driven by the blink timer in this mode.
    #[inline]
    pub const fn is_blinking(self) -> bool {
        matches!(self, Mode::Blinking)
    }
}

/// Direction of travel through the mode cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Forward: `Off -> Blinking -> On`.
    Next,

    /// Backward: `Off -> On -> Blinking`.
    Previous,
}

/// Pressed state of the three buttons, sampled once per input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons {
    pub reset: bool,
    pub previous: bool,
    pub next: bool,
}

impl Buttons {
    /// No button pressed.
    pub const NONE: Buttons = Buttons {
        reset: false,
        previous: false,
        next: false,
    };

    /// Only reset pressed.
    pub const RESET: Buttons = Buttons {
        reset: true,
        previous: false,
        next: false,
    };

    /// Only next pressed.
    pub const NEXT: Buttons = Buttons {
        reset: false,
        previous: false,
        next: true,
    };

    /// Only previous pressed.
    pub const PREVIOUS: Buttons = Buttons {
        reset: false,
        previous: true,
        next: false,
    };

    /// Creates a snapshot.
    #[inline]
    pub const fn new(reset: bool, previous: bool, next: bool) -> Self {
        Self {
            reset,
            previous,
            next,
        }
    }

    /// Directional signal carried by this snapshot.
    ///
    /// Next and previous pressed together cancel out: there is no
    /// meaningful direction, so this is `None` rather than an error.
    #[inline]
    pub const fn direction(&self) -> Option<Direction> {
        match (self.next, self.previous) {
            (true, false) => Some(Direction::Next),
            (false, true) => Some(Direction::Previous),
            _ => None,
        }
    }
}
