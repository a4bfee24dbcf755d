#![no_std]
#![no_main]

use cortex_m_rt::entry;
use panic_halt as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f0xx_hal::pac::{self, interrupt};

use indicator_fsm::{Event, IndicatorController, Liveness, Shared, Supervisor, TimingConfig};
use stm32f0_demos::board::BUTTON_LINES;
use stm32f0_demos::time_source::SysTickClock;

mod hardware_setup;

use hardware_setup::Board;

/// Controller shared by the interrupt handlers and the idle loop
static CONTROLLER: Shared<Board> = Shared::new();

/// 1 ms uptime tick for the supervisor
#[cortex_m_rt::exception]
fn SysTick() {
    stm32f0_demos::time_source::tick();
}

/// PB3 (reset)
#[interrupt]
fn EXTI2_3() {
    on_button_edge();
}

/// PB4 (previous) and PB5 (next)
#[interrupt]
fn EXTI4_15() {
    on_button_edge();
}

fn on_button_edge() {
    // PR is write-1-to-clear, so clearing through the raw pointer cannot
    // disturb the gate's mask bits.
    unsafe { (*pac::EXTI::ptr()).pr.write(|w| w.bits(BUTTON_LINES)) };
    CONTROLLER.dispatch(Event::InputChange);
}

#[interrupt]
fn TIM14() {
    CONTROLLER.dispatch(Event::DebounceTick);
}

#[interrupt]
fn TIM16() {
    CONTROLLER.dispatch(Event::BlinkTick);
}

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("=== Indicator FSM ===");
    rprintln!("Starting initialization...");

    let hw = hardware_setup::init_hardware();
    rprintln!("Hardware initialized successfully");

    let config = TimingConfig::default();
    let controller = match IndicatorController::new(
        hw.buttons,
        hw.indicator,
        hw.gate,
        hw.debounce_timer,
        hw.blink_timer,
        config,
    ) {
        Ok(controller) => controller,
        Err(err) => {
            rprintln!("Invalid timing configuration: {}", err);
            loop {
                cortex_m::asm::wfi();
            }
        }
    };

    CONTROLLER.install(controller, Board::handlers());
    hardware_setup::enable_interrupts();

    let clock = SysTickClock;
    let mut supervisor = Supervisor::new(hw.watchdog, &clock, &config);

    rprintln!("=== System Ready ===");
    rprintln!("  PB3: reset, PB4: previous, PB5: next");

    let mut reported = false;
    loop {
        if let Some(health) = CONTROLLER.with(|c| c.health()) {
            if let Liveness::Starving(reason) = supervisor.check(health) {
                if !reported {
                    rprintln!("Watchdog starved ({:?}), waiting for reset", reason);
                    reported = true;
                }
            }
        }

        // SysTick wakes the core every millisecond.
        cortex_m::asm::wfi();
    }
}
