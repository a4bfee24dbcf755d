use cortex_m::peripheral::{NVIC, SYST};
use indicator_fsm::{ButtonLines, IndicatorController};
use rtt_target::rprintln;
use stm32f0xx_hal::{
    gpio::{gpiob, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

use stm32f0_demos::board::{ButtonPin, ExtiGate, IndicatorPin, Iwdg, TickTimer, BUTTON_LINES};

/// Indicator LED on PB1
pub type Indicator = IndicatorPin<gpiob::PB1<Output<PushPull>>>;

/// Controller wired to the board peripherals
pub type Board = IndicatorController<
    ButtonPin,
    Indicator,
    ExtiGate,
    TickTimer<pac::TIM14>,
    TickTimer<pac::TIM16>,
>;

/// Container for all initialized hardware peripherals
pub struct HardwareContext {
    pub buttons: ButtonLines<ButtonPin>,
    pub indicator: Indicator,
    pub gate: ExtiGate,
    pub debounce_timer: TickTimer<pac::TIM14>,
    pub blink_timer: TickTimer<pac::TIM16>,
    pub watchdog: Iwdg,
}

/// Initialize all hardware peripherals
///
/// - System clock configuration
/// - SysTick timer setup (1ms interrupts, supervisor clock only)
/// - Buttons on PB3 (reset), PB4 (previous), PB5 (next) with pull-ups
/// - Indicator output on PB1
/// - EXTI lines 3-5 armed on both edges, left masked
/// - TIM14 (debounce) and TIM16 (blink) prescaled to 1 kHz
///
/// Interrupts stay disabled in the NVIC until [`enable_interrupts`].
///
/// # Returns
/// A `HardwareContext` containing all initialized peripherals ready for use
pub fn init_hardware() -> HardwareContext {
    let mut dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let mut rcc = configure_clock(&mut dp.FLASH, dp.RCC);
    configure_systick(&rcc, &mut cp.SYST);

    let gpiob = dp.GPIOB.split(&mut rcc);
    let buttons = setup_buttons(gpiob.pb3, gpiob.pb4, gpiob.pb5);
    let indicator = setup_indicator(gpiob.pb1);

    configure_exti(&mut rcc, &dp.SYSCFG, &dp.EXTI);
    let gate = ExtiGate::new(dp.EXTI);

    let debounce_timer = TickTimer::tim14(dp.TIM14, &mut rcc);
    let blink_timer = TickTimer::tim16(dp.TIM16, &mut rcc);
    rprintln!("TIM14 (debounce) and TIM16 (blink) configured at 1 kHz");

    HardwareContext {
        buttons,
        indicator,
        gate,
        debounce_timer,
        blink_timer,
        watchdog: Iwdg::new(dp.IWDG),
    }
}

/// Unmasks the button and timer interrupts in the NVIC.
///
/// Call after the controller is installed.
pub fn enable_interrupts() {
    unsafe {
        NVIC::unmask(pac::Interrupt::EXTI2_3);
        NVIC::unmask(pac::Interrupt::EXTI4_15);
        NVIC::unmask(pac::Interrupt::TIM14);
        NVIC::unmask(pac::Interrupt::TIM16);
    }
}

/// Configure the system clock
///
/// # Returns
/// The configured RCC (Reset and Clock Control) peripheral
fn configure_clock(flash: &mut pac::FLASH, rcc: pac::RCC) -> stm32f0xx_hal::rcc::Rcc {
    let rcc = rcc.configure().freeze(flash);

    let sysclk_freq = rcc.clocks.sysclk();
    rprintln!("System clock configured: {} Hz", sysclk_freq.0);

    rcc
}

/// Configure SysTick timer for 1ms interrupts
fn configure_systick(rcc: &stm32f0xx_hal::rcc::Rcc, syst: &mut SYST) {
    let sysclk_freq = rcc.clocks.sysclk();

    syst.set_clock_source(cortex_m::peripheral::syst::SystClkSource::Core);
    syst.set_reload((sysclk_freq.0 / 1_000) - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();

    rprintln!("SysTick configured for 1ms interrupts");
}

/// Configure the three buttons with pull-ups
fn setup_buttons(
    pb3: gpiob::PB3<Input<Floating>>,
    pb4: gpiob::PB4<Input<Floating>>,
    pb5: gpiob::PB5<Input<Floating>>,
) -> ButtonLines<ButtonPin> {
    let (reset, previous, next) = cortex_m::interrupt::free(|cs| {
        (
            pb3.into_pull_up_input(cs).downgrade(),
            pb4.into_pull_up_input(cs).downgrade(),
            pb5.into_pull_up_input(cs).downgrade(),
        )
    });

    rprintln!("Buttons configured on PB3 (reset), PB4 (previous), PB5 (next)");
    ButtonLines::new(
        ButtonPin::new(reset),
        ButtonPin::new(previous),
        ButtonPin::new(next),
    )
}

/// Configure the indicator (PB1) as push-pull output
fn setup_indicator(pb1: gpiob::PB1<Input<Floating>>) -> Indicator {
    let pin = cortex_m::interrupt::free(|cs| pb1.into_push_pull_output(cs));

    rprintln!("Indicator configured on PB1");
    IndicatorPin::new(pin)
}

/// Route PB3-PB5 to EXTI lines 3-5 and trigger on both edges
fn configure_exti(rcc: &mut stm32f0xx_hal::rcc::Rcc, syscfg: &pac::SYSCFG, exti: &pac::EXTI) {
    rcc.regs.apb2enr.modify(|_, w| w.syscfgen().set_bit());

    // Port B is source 1 in EXTICRx.
    syscfg.exticr1.modify(|_, w| unsafe { w.exti3().bits(1) });
    syscfg
        .exticr2
        .modify(|_, w| unsafe { w.exti4().bits(1).exti5().bits(1) });

    exti.rtsr
        .modify(|r, w| unsafe { w.bits(r.bits() | BUTTON_LINES) });
    exti.ftsr
        .modify(|r, w| unsafe { w.bits(r.bits() | BUTTON_LINES) });

    rprintln!("EXTI lines 3-5 armed on both edges");
}
