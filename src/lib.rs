#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Mode`**: The indicator state (`Off`, `Blinking`, `On`) and its pure transition function
//! - **`Buttons`**: One sample of the reset, previous and next buttons
//! - **`IndicatorController`**: Owns the mode and drives the output, timers and input gate from three handlers
//! - **`TimingConfig`**: Debounce window, blink period, tick granularity, polarity and watchdog timeout
//! - **`InputLine` / `OutputLine` / `InterruptGate` / `IntervalTimer`**: Traits to implement for your hardware
//! - **`HandlerTable` / `Dispatcher` / `Shared`**: Event routing from interrupt sources to the controller
//! - **`Supervisor`**: Feeds a `Watchdog` from the idle loop while the controller stays healthy
//!
//! Time inside the handlers is measured purely by counting timer ticks. Only
//! the `Supervisor` reads a `TimeSource`.

#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod line;
pub mod mode;
pub mod sim;
pub mod time;
pub mod timer;
pub mod watchdog;

pub use config::{ConfigError, TimingConfig};
pub use controller::{Health, IndicatorController};
pub use dispatch::{Dispatcher, Event, EventQueue, Handler, HandlerTable, QueueError, Shared};
pub use line::{ButtonLines, HalInput, HalOutput, InputLine, InterruptGate, OutputLine, Polarity};
pub use mode::{Buttons, Direction, Mode};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use timer::{IntervalTimer, TickCounter};
pub use watchdog::{Liveness, StallReason, Supervisor, Watchdog};
