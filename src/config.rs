//! Timing configuration for the controller.
//!
//! All windows are expressed in milliseconds together with the hardware
//! tick of the timer that measures them. The controller counts ticks, so
//! each window must be an exact multiple of its tick; otherwise the
//! observed period would depend on tick granularity.

use crate::line::Polarity;

/// Debounce window after a button edge.
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u32 = 300;

/// Interval between indicator toggles while blinking.
pub const DEFAULT_BLINK_PERIOD_MS: u32 = 100;

/// Hardware tick of the debounce timer.
pub const DEFAULT_DEBOUNCE_TICK_MS: u32 = 10;

/// Hardware tick of the blink timer.
pub const DEFAULT_BLINK_TICK_MS: u32 = 10;

/// Liveness watchdog timeout.
pub const DEFAULT_WATCHDOG_TIMEOUT_MS: u32 = 1024;

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A window, period or tick is zero.
    ZeroDuration(&'static str),

    /// A window is not a whole number of ticks.
    NotTickAligned {
        /// Which window failed the check.
        field: &'static str,
        /// Window length in milliseconds.
        window_ms: u32,
        /// Tick length in milliseconds.
        tick_ms: u32,
    },

    /// The watchdog would expire during a healthy debounce window.
    WatchdogTooShort {
        timeout_ms: u32,
        debounce_window_ms: u32,
    },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroDuration(field) => {
                write!(f, "{} must be non-zero", field)
            }
            ConfigError::NotTickAligned {
                field,
                window_ms,
                tick_ms,
            } => {
                write!(
                    f,
                    "{} ({} ms) is not a multiple of its timer tick ({} ms)",
                    field, window_ms, tick_ms
                )
            }
            ConfigError::WatchdogTooShort {
                timeout_ms,
                debounce_window_ms,
            } => {
                write!(
                    f,
                    "watchdog timeout ({} ms) must exceed the debounce window ({} ms)",
                    timeout_ms, debounce_window_ms
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Timing and input configuration.
///
/// Build one from [`TimingConfig::default`] with the `with_*` methods and
/// finish with [`TimingConfig::validate`].
///
/// ```
/// use indicator_fsm::TimingConfig;
///
/// let config = TimingConfig::default()
///     .with_blink_period_ms(250)
///     .with_blink_tick_ms(5)
///     .validate()
///     .unwrap();
/// assert_eq!(config.blink_ticks(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    debounce_window_ms: u32,
    blink_period_ms: u32,
    debounce_tick_ms: u32,
    blink_tick_ms: u32,
    polarity: Polarity,
    watchdog_timeout_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TimingConfig {
    /// 300 ms debounce, 100 ms toggle period, 10 ms ticks, active-low buttons.
    pub const DEFAULT: TimingConfig = TimingConfig {
        debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
        blink_period_ms: DEFAULT_BLINK_PERIOD_MS,
        debounce_tick_ms: DEFAULT_DEBOUNCE_TICK_MS,
        blink_tick_ms: DEFAULT_BLINK_TICK_MS,
        polarity: Polarity::ActiveLow,
        watchdog_timeout_ms: DEFAULT_WATCHDOG_TIMEOUT_MS,
    };

    /// Sets the debounce window.
    pub const fn with_debounce_window_ms(mut self, ms: u32) -> Self {
        self.debounce_window_ms = ms;
        self
    }

    /// Sets the toggle period used while blinking.
    pub const fn with_blink_period_ms(mut self, ms: u32) -> Self {
        self.blink_period_ms = ms;
        self
    }

    /// Sets the hardware tick of the debounce timer.
    pub const fn with_debounce_tick_ms(mut self, ms: u32) -> Self {
        self.debounce_tick_ms = ms;
        self
    }

    /// Sets the hardware tick of the blink timer.
    pub const fn with_blink_tick_ms(mut self, ms: u32) -> Self {
        self.blink_tick_ms = ms;
        self
    }

    /// Sets the electrical level that means "pressed".
    pub const fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Sets the liveness watchdog timeout.
    pub const fn with_watchdog_timeout_ms(mut self, ms: u32) -> Self {
        self.watchdog_timeout_ms = ms;
        self
    }

    /// Checks the configuration and returns it unchanged if usable.
    pub const fn validate(self) -> Result<Self, ConfigError> {
        if self.debounce_window_ms == 0 {
            return Err(ConfigError::ZeroDuration("debounce window"));
        }
        if self.blink_period_ms == 0 {
            return Err(ConfigError::ZeroDuration("blink period"));
        }
        if self.debounce_tick_ms == 0 {
            return Err(ConfigError::ZeroDuration("debounce tick"));
        }
        if self.blink_tick_ms == 0 {
            return Err(ConfigError::ZeroDuration("blink tick"));
        }
        if self.watchdog_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("watchdog timeout"));
        }

        if self.debounce_window_ms % self.debounce_tick_ms != 0 {
            return Err(ConfigError::NotTickAligned {
                field: "debounce window",
                window_ms: self.debounce_window_ms,
                tick_ms: self.debounce_tick_ms,
            });
        }
        if self.blink_period_ms % self.blink_tick_ms != 0 {
            return Err(ConfigError::NotTickAligned {
                field: "blink period",
                window_ms: self.blink_period_ms,
                tick_ms: self.blink_tick_ms,
            });
        }

        if self.watchdog_timeout_ms <= self.debounce_window_ms {
            return Err(ConfigError::WatchdogTooShort {
                timeout_ms: self.watchdog_timeout_ms,
                debounce_window_ms: self.debounce_window_ms,
            });
        }

        Ok(self)
    }

    pub const fn debounce_window_ms(&self) -> u32 {
        self.debounce_window_ms
    }

    pub const fn blink_period_ms(&self) -> u32 {
        self.blink_period_ms
    }

    pub const fn debounce_tick_ms(&self) -> u32 {
        self.debounce_tick_ms
    }

    pub const fn blink_tick_ms(&self) -> u32 {
        self.blink_tick_ms
    }

    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub const fn watchdog_timeout_ms(&self) -> u32 {
        self.watchdog_timeout_ms
    }

    /// Debounce timer ticks that make up one window.
    #[inline]
    pub const fn debounce_ticks(&self) -> u32 {
        self.debounce_window_ms / self.debounce_tick_ms
    }

    /// Blink timer ticks between two toggles.
    #[inline]
    pub const fn blink_ticks(&self) -> u32 {
        self.blink_period_ms / self.blink_tick_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TimingConfig::default().validate().unwrap();
        assert_eq!(config.debounce_window_ms(), 300);
        assert_eq!(config.blink_period_ms(), 100);
        assert_eq!(config.debounce_ticks(), 30);
        assert_eq!(config.blink_ticks(), 10);
        assert_eq!(config.polarity(), Polarity::ActiveLow);
    }

    #[test]
    fn zero_durations_are_rejected() {
        let result = TimingConfig::default().with_blink_period_ms(0).validate();
        assert_eq!(result, Err(ConfigError::ZeroDuration("blink period")));

        let result = TimingConfig::default().with_debounce_tick_ms(0).validate();
        assert_eq!(result, Err(ConfigError::ZeroDuration("debounce tick")));
    }

    #[test]
    fn window_must_be_whole_number_of_ticks() {
        let result = TimingConfig::default()
            .with_debounce_tick_ms(16)
            .validate();
        assert_eq!(
            result,
            Err(ConfigError::NotTickAligned {
                field: "debounce window",
                window_ms: 300,
                tick_ms: 16,
            })
        );

        let result = TimingConfig::default().with_blink_tick_ms(30).validate();
        assert!(matches!(result, Err(ConfigError::NotTickAligned { .. })));
    }

    #[test]
    fn tick_equal_to_window_gives_single_tick_threshold() {
        let config = TimingConfig::default()
            .with_debounce_tick_ms(300)
            .with_blink_tick_ms(100)
            .validate()
            .unwrap();
        assert_eq!(config.debounce_ticks(), 1);
        assert_eq!(config.blink_ticks(), 1);
    }

    #[test]
    fn watchdog_must_outlast_debounce_window() {
        let result = TimingConfig::default()
            .with_watchdog_timeout_ms(300)
            .validate();
        assert_eq!(
            result,
            Err(ConfigError::WatchdogTooShort {
                timeout_ms: 300,
                debounce_window_ms: 300,
            })
        );
    }

    #[test]
    fn error_messages_name_the_field() {
        extern crate std;
        use std::string::ToString;

        let err = ConfigError::ZeroDuration("blink tick");
        assert_eq!(err.to_string(), "blink tick must be non-zero");
    }
}
