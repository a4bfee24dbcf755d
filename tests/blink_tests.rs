//! Integration tests for the blink cadence

mod common;

use common::*;
use indicator_fsm::sim::{Button, SimBoard, SIM_QUEUE_DEPTH};
use indicator_fsm::{Event, Mode, QueueError, TimingConfig};

#[test]
fn blinking_toggles_every_period() {
    let board = SimBoard::new();
    let mut sim = boot(&board);

    sim.press(Button::Next);
    sim.advance(1_000);

    let expected: Vec<u32> = (1..=10).map(|n| n * BLINK_MS).collect();
    assert_eq!(board.toggle_times().as_slice(), expected.as_slice());
    assert!(!board.output_high());
}

#[test]
fn debounce_activity_does_not_shift_blink_phase() {
    let board = SimBoard::new();
    let mut sim = boot(&board);

    sim.click(Button::Next, 20);
    sim.advance(330);
    sim.press_together(&[Button::Next, Button::Previous]);
    assert!(sim.controller().debounce_active());
    sim.advance(50);

    assert_eq!(sim.controller().mode(), Mode::Blinking);
    assert_eq!(board.toggle_times().as_slice(), &[100, 200, 300, 400]);
}

#[test]
fn blink_counter_restarts_on_entry() {
    let board = SimBoard::new();
    let mut sim = boot(&board);

    sim.press(Button::Next);
    sim.advance(340);
    assert_eq!(sim.controller().blink_count(), 4);

    // On, then back to Blinking.
    sim.release(Button::Next);
    sim.advance(SETTLE_MS);
    sim.press(Button::Next);
    assert_eq!(sim.controller().mode(), Mode::On);
    sim.advance(20);
    sim.release(Button::Next);
    sim.advance(SETTLE_MS - 20);
    sim.press(Button::Previous);
    assert_eq!(sim.controller().mode(), Mode::Blinking);
    assert_eq!(sim.controller().blink_count(), 0);

    let entered = sim.now_ms();
    board.clear_toggles();
    sim.advance(BLINK_MS);
    assert_eq!(board.toggle_times().as_slice(), &[entered + BLINK_MS]);
}

#[test]
fn blinking_starts_from_current_output_level() {
    let board = SimBoard::new();
    let mut sim = boot(&board);

    sim.press(Button::Previous);
    assert_eq!(sim.controller().mode(), Mode::On);
    sim.release(Button::Previous);
    sim.advance(SETTLE_MS);

    sim.press(Button::Previous);
    assert_eq!(sim.controller().mode(), Mode::Blinking);
    assert!(board.output_high());

    sim.advance(BLINK_MS - 1);
    assert!(board.output_high());
    sim.advance(1);
    assert!(!board.output_high());
}

#[test]
fn finer_blink_ticks_keep_period() {
    let board = SimBoard::new();
    let config = TimingConfig::default().with_blink_tick_ms(1);
    let mut sim = boot_with(&board, config);
    assert_eq!(sim.controller().config().blink_ticks(), 100);

    sim.press(Button::Next);
    sim.advance(300);

    assert_eq!(board.toggle_times().as_slice(), &[100, 200, 300]);
}

#[test]
fn custom_blink_period() {
    let board = SimBoard::new();
    let config = TimingConfig::default()
        .with_blink_period_ms(250)
        .with_blink_tick_ms(50);
    let mut sim = boot_with(&board, config);

    sim.press(Button::Next);
    sim.advance(1_000);

    assert_eq!(board.toggle_times().as_slice(), &[250, 500, 750, 1_000]);
}

#[test]
fn stray_blink_tick_outside_blinking_is_ignored() {
    let board = SimBoard::new();
    let mut sim = boot(&board);
    sim.press(Button::Previous);
    assert!(board.output_high());

    for _ in 0..SIM_QUEUE_DEPTH {
        sim.post(Event::BlinkTick).unwrap();
    }
    assert_eq!(
        sim.post(Event::BlinkTick),
        Err(QueueError::Full(Event::BlinkTick))
    );
    assert_eq!(sim.run_pending(), SIM_QUEUE_DEPTH);

    assert!(board.output_high());
    assert!(board.toggle_times().is_empty());
    assert_eq!(sim.controller().blink_count(), 0);
    assert_eq!(board.blink_timer().acks(), SIM_QUEUE_DEPTH as u32);
}

#[test]
fn reset_while_blinking_stops_toggling() {
    let board = SimBoard::new();
    let mut sim = boot(&board);

    sim.press(Button::Next);
    sim.advance(SETTLE_MS);
    sim.release(Button::Next);
    sim.advance(SETTLE_MS);
    sim.press(Button::Reset);
    let toggles = board.toggle_times().len();

    sim.advance(1_000);

    assert_eq!(sim.controller().mode(), Mode::Off);
    assert_eq!(board.toggle_times().len(), toggles);
    assert!(!board.output_high());
}
