//! indicator-fsm hardware traits for the STM32F0.
//!
//! stm32f0xx-hal speaks embedded-hal 0.2, so the traits are implemented on
//! thin wrappers instead of going through `HalInput` / `HalOutput`.

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};
use embedded_hal::watchdog::{Watchdog as _, WatchdogEnable as _};
use indicator_fsm::{InputLine, InterruptGate, IntervalTimer, OutputLine, Watchdog};
use stm32f0xx_hal::{
    gpio::{Input, Pin, PullUp},
    pac,
    time::Hertz,
    watchdog,
};

/// EXTI lines of the reset, previous and next buttons (PB3, PB4, PB5).
pub const BUTTON_LINES: u32 = (1 << 3) | (1 << 4) | (1 << 5);

/// Button with internal pull-up (pressed = low)
pub struct ButtonPin(Pin<Input<PullUp>>);

impl ButtonPin {
    pub fn new(pin: Pin<Input<PullUp>>) -> Self {
        Self(pin)
    }
}

impl InputLine for ButtonPin {
    fn read(&mut self) -> bool {
        // Reads are infallible on this port; fall back to the idle level.
        self.0.is_high().unwrap_or(true)
    }
}

/// Push-pull indicator output
pub struct IndicatorPin<P>(P);

impl<P> IndicatorPin<P>
where
    P: OutputPin + StatefulOutputPin + ToggleableOutputPin,
{
    pub fn new(pin: P) -> Self {
        Self(pin)
    }
}

impl<P> OutputLine for IndicatorPin<P>
where
    P: OutputPin + StatefulOutputPin + ToggleableOutputPin,
{
    fn write(&mut self, high: bool) {
        let _ = if high {
            self.0.set_high()
        } else {
            self.0.set_low()
        };
    }

    fn toggle(&mut self) {
        let _ = self.0.toggle();
    }

    fn is_set_high(&mut self) -> bool {
        self.0.is_set_high().unwrap_or(false)
    }
}

/// Interrupt mask for the button EXTI lines.
pub struct ExtiGate {
    exti: pac::EXTI,
}

impl ExtiGate {
    /// Takes the EXTI block with both edges already armed on
    /// [`BUTTON_LINES`]. The lines start masked.
    pub fn new(exti: pac::EXTI) -> Self {
        exti.imr
            .modify(|r, w| unsafe { w.bits(r.bits() & !BUTTON_LINES) });
        Self { exti }
    }
}

impl InterruptGate for ExtiGate {
    fn enable(&mut self) {
        // Drop edges latched while masked before unmasking.
        self.exti.pr.write(|w| unsafe { w.bits(BUTTON_LINES) });
        self.exti
            .imr
            .modify(|r, w| unsafe { w.bits(r.bits() | BUTTON_LINES) });
    }

    fn disable(&mut self) {
        self.exti
            .imr
            .modify(|r, w| unsafe { w.bits(r.bits() & !BUTTON_LINES) });
    }

    fn is_enabled(&self) -> bool {
        self.exti.imr.read().bits() & BUTTON_LINES == BUTTON_LINES
    }
}

/// Update-interrupt timer counting at 1 kHz.
///
/// # Type Parameters
/// * `TIM` - General-purpose timer peripheral (TIM14 or TIM16)
pub struct TickTimer<TIM> {
    tim: TIM,
}

macro_rules! tick_timers {
    ($($TIM:ident: ($tim:ident, $apbenr:ident, $timen:ident),)+) => {
        $(
            impl TickTimer<pac::$TIM> {
                /// Enables the timer clock and sets the prescaler so the
                /// counter advances once per millisecond.
                pub fn $tim(tim: pac::$TIM, rcc: &mut stm32f0xx_hal::rcc::Rcc) -> Self {
                    rcc.regs.$apbenr.modify(|_, w| w.$timen().set_bit());

                    let prescaler = (rcc.clocks.pclk().0 / 1_000).saturating_sub(1);
                    tim.cr1.modify(|_, w| w.cen().clear_bit());
                    tim.psc.write(|w| unsafe { w.psc().bits(prescaler as u16) });
                    tim.dier.write(|w| w.uie().set_bit());

                    Self { tim }
                }
            }

            impl IntervalTimer for TickTimer<pac::$TIM> {
                fn set_period_ms(&mut self, period_ms: u32) {
                    let reload = period_ms.clamp(1, u32::from(u16::MAX)) - 1;
                    self.tim.arr.write(|w| unsafe { w.bits(reload) });
                }

                fn start(&mut self) {
                    self.tim.cr1.modify(|_, w| w.cen().clear_bit());
                    self.tim.cnt.reset();
                    // Load prescaler and reload, then drop the UG flag.
                    self.tim.egr.write(|w| w.ug().set_bit());
                    self.tim.sr.modify(|_, w| w.uif().clear_bit());
                    self.tim.cr1.modify(|_, w| w.cen().set_bit());
                }

                fn stop(&mut self) {
                    self.tim.cr1.modify(|_, w| w.cen().clear_bit());
                    self.tim.sr.modify(|_, w| w.uif().clear_bit());
                }

                fn is_running(&self) -> bool {
                    self.tim.cr1.read().cen().bit_is_set()
                }

                fn acknowledge(&mut self) {
                    self.tim.sr.modify(|_, w| w.uif().clear_bit());
                }
            }
        )+
    }
}

tick_timers! {
    TIM14: (tim14, apb1enr, tim14en),
    TIM16: (tim16, apb2enr, tim16en),
}

/// Independent watchdog
pub struct Iwdg(watchdog::Watchdog);

impl Iwdg {
    pub fn new(iwdg: pac::IWDG) -> Self {
        Self(watchdog::Watchdog::new(iwdg))
    }
}

impl Watchdog for Iwdg {
    fn start(&mut self, timeout_ms: u32) {
        // The IWDG period is given as a frequency; round to at least 1 Hz.
        let hz = (1_000 / timeout_ms.max(1)).max(1);
        self.0.start(Hertz(hz));
    }

    fn feed(&mut self) {
        self.0.feed();
    }
}
