//! Integration tests for watchdog supervision and shared controller access

mod common;

use common::*;
use indicator_fsm::sim::{
    Button, SimBoard, SimClock, SimInstant, SimTimer, SimWatchdog, Simulation,
};
use indicator_fsm::{
    Event, IntervalTimer, Liveness, Mode, Shared, StallReason, Supervisor, TimingConfig,
};

/// Advances one millisecond at a time, checking health after each step.
fn run_supervised(
    sim: &mut Simulation<'_>,
    supervisor: &mut Supervisor<'_, SimWatchdog<'_>, SimInstant, SimClock<'_>>,
    ms: u32,
) -> Liveness {
    let mut last = Liveness::Fed;
    for _ in 0..ms {
        sim.advance(1);
        last = supervisor.check(sim.controller().health());
    }
    last
}

#[test]
fn healthy_operation_keeps_watchdog_fed() {
    let board = SimBoard::new();
    let clock = SimClock::new(&board);
    let mut sim = boot(&board);
    let config = *sim.controller().config();
    let mut supervisor = Supervisor::new(SimWatchdog::new(&board), &clock, &config);

    for button in [Button::Next, Button::Next, Button::Reset, Button::Previous] {
        sim.press(button);
        assert_eq!(run_supervised(&mut sim, &mut supervisor, 40), Liveness::Fed);
        sim.release(button);
        assert_eq!(
            run_supervised(&mut sim, &mut supervisor, SETTLE_MS),
            Liveness::Fed
        );
    }

    assert_eq!(sim.controller().mode(), Mode::On);
    assert!(supervisor.stalled().is_none());
    assert!(!board.watchdog_expired());
    assert_eq!(supervisor.watchdog().feeds(), 4 * (40 + SETTLE_MS));
}

#[test]
fn stuck_debounce_timer_lets_watchdog_expire() {
    let board = SimBoard::new();
    let clock = SimClock::new(&board);
    let mut sim = boot(&board);
    let config = *sim.controller().config();
    let mut supervisor = Supervisor::new(SimWatchdog::new(&board), &clock, &config);

    sim.press(Button::Next);
    // The timer dies before the window can close.
    SimTimer::new(board.debounce_timer()).stop();

    let liveness = run_supervised(&mut sim, &mut supervisor, 2_000);

    assert_eq!(liveness, Liveness::Starving(StallReason::DebounceStuck));
    assert!(sim.controller().debounce_active());
    assert!(board.watchdog_expired());
}

#[test]
fn watchdog_timeout_is_configurable() {
    let board = SimBoard::new();
    let clock = SimClock::new(&board);
    let config = TimingConfig::default().with_watchdog_timeout_ms(2_048);
    let supervisor = Supervisor::new(SimWatchdog::new(&board), &clock, &config);

    assert_eq!(supervisor.watchdog().timeout_ms(), Some(2_048));
}

#[test]
fn watchdog_shorter_than_window_is_rejected() {
    let config = TimingConfig::default().with_watchdog_timeout_ms(200);
    assert!(config.validate().is_err());
}

#[test]
fn shared_slot_routes_interrupts_to_controller() {
    let levels = Levels::new();
    let log = CallLog::new();
    let shared: Shared<MockController<'_>> = Shared::new();
    shared.install(
        mock_controller(&levels, &log),
        MockController::handlers(),
    );

    levels.next.set(false);
    assert!(shared.dispatch(Event::InputChange));
    assert_eq!(shared.with(|c| c.mode()), Some(Mode::Blinking));

    for _ in 0..30 {
        assert!(shared.dispatch(Event::DebounceTick));
    }
    for _ in 0..10 {
        assert!(shared.dispatch(Event::BlinkTick));
    }

    let health = shared.with(|c| c.health()).unwrap();
    assert!(!health.debounce_active);
    assert!(health.is_consistent());
    assert_eq!(shared.with(|c| c.output_high()), Some(true));

    let controller = shared.take().unwrap();
    assert_eq!(controller.transitions(), 1);
    assert!(!shared.dispatch(Event::BlinkTick));
}
