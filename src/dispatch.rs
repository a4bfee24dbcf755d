//! Event routing between interrupt sources and the controller.
//!
//! Three pieces, usable independently:
//! - [`HandlerTable`] maps each [`Event`] kind to a handler, resolved once
//!   at initialization.
//! - [`Dispatcher`] adds a FIFO [`EventQueue`] in front of the table for
//!   hosts without real interrupts. Events run strictly in arrival order and
//!   each runs to completion before the next starts.
//! - [`Shared`] keeps the controller in a `critical_section::Mutex` so
//!   interrupt handlers and the idle loop can reach it with exclusive
//!   access.

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Deque;

/// Hardware event sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Edge on any of the button lines.
    InputChange,

    /// Debounce timer tick.
    DebounceTick,

    /// Blink timer tick.
    BlinkTick,
}

impl Event {
    /// Number of event kinds.
    pub const COUNT: usize = 3;

    #[inline]
    const fn index(self) -> usize {
        match self {
            Event::InputChange => 0,
            Event::DebounceTick => 1,
            Event::BlinkTick => 2,
        }
    }
}

/// Handler run to completion for one event.
pub type Handler<C> = fn(&mut C);

/// Maps each event kind to at most one handler.
pub struct HandlerTable<C> {
    handlers: [Option<Handler<C>>; Event::COUNT],
}

impl<C> Clone for HandlerTable<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for HandlerTable<C> {}

impl<C> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> HandlerTable<C> {
    /// Creates a table with no handlers.
    pub const fn new() -> Self {
        Self {
            handlers: [None; Event::COUNT],
        }
    }

    /// Registers `handler` for `event`, replacing any previous one.
    pub const fn with(mut self, event: Event, handler: Handler<C>) -> Self {
        self.handlers[event.index()] = Some(handler);
        self
    }

    /// Registers `handler` for `event` in place.
    pub fn register(&mut self, event: Event, handler: Handler<C>) {
        self.handlers[event.index()] = Some(handler);
    }

    /// Removes the handler for `event`.
    pub fn unregister(&mut self, event: Event) {
        self.handlers[event.index()] = None;
    }

    /// Runs the handler for `event`. Returns `false` if none is registered.
    pub fn dispatch(&self, ctx: &mut C, event: Event) -> bool {
        match self.handlers[event.index()] {
            Some(handler) => {
                handler(ctx);
                true
            }
            None => false,
        }
    }
}

/// Event queue errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// The queue is at capacity; the event was not queued.
    Full(Event),
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QueueError::Full(event) => write!(f, "event queue full, dropped {:?}", event),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QueueError {}

/// Bounded FIFO of pending events.
#[derive(Debug)]
pub struct EventQueue<const N: usize> {
    events: Deque<Event, N>,
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Appends an event.
    pub fn push(&mut self, event: Event) -> Result<(), QueueError> {
        self.events
            .push_back(event)
            .map_err(QueueError::Full)
    }

    /// Removes the oldest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Handler table plus event queue for cooperative (non-interrupt) hosts.
pub struct Dispatcher<C, const N: usize> {
    table: HandlerTable<C>,
    queue: EventQueue<N>,
}

impl<C, const N: usize> Dispatcher<C, N> {
    pub const fn new(table: HandlerTable<C>) -> Self {
        Self {
            table,
            queue: EventQueue::new(),
        }
    }

    /// Queues an event for the next [`Dispatcher::run_pending`].
    pub fn post(&mut self, event: Event) -> Result<(), QueueError> {
        let result = self.queue.push(event);
        if let Err(err) = result {
            warn!("{}", err);
        }
        result
    }

    /// Runs queued events in arrival order until the queue is empty,
    /// including events posted by the handlers themselves. Returns the
    /// number of events processed.
    pub fn run_pending(&mut self, ctx: &mut C) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.pop() {
            self.table.dispatch(ctx, event);
            processed += 1;
        }
        processed
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn table(&self) -> &HandlerTable<C> {
        &self.table
    }
}

struct Installed<C> {
    ctx: C,
    table: HandlerTable<C>,
}

/// Controller slot shared between interrupt handlers and the idle loop.
///
/// Every access goes through `critical_section::with`, which on single-core
/// targets masks interrupts for the duration of the closure.
///
/// ```ignore
/// static CONTROLLER: Shared<Board> = Shared::new();
///
/// #[interrupt]
/// fn EXTI4_15() {
///     CONTROLLER.dispatch(Event::InputChange);
/// }
/// ```
pub struct Shared<C> {
    slot: Mutex<RefCell<Option<Installed<C>>>>,
}

impl<C> Default for Shared<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Shared<C> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Moves the controller and its handler table into the slot.
    ///
    /// Replaces whatever was installed before.
    pub fn install(&self, ctx: C, table: HandlerTable<C>) {
        critical_section::with(|cs| {
            self.slot.borrow_ref_mut(cs).replace(Installed { ctx, table });
        });
    }

    /// Removes and returns the controller.
    pub fn take(&self) -> Option<C> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take().map(|i| i.ctx))
    }

    /// Runs `f` with exclusive access to the controller.
    ///
    /// Returns `None` if nothing is installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        critical_section::with(|cs| {
            self.slot
                .borrow_ref_mut(cs)
                .as_mut()
                .map(|installed| f(&mut installed.ctx))
        })
    }

    /// Routes `event` through the installed handler table.
    ///
    /// Returns `false` if nothing is installed or no handler is registered.
    pub fn dispatch(&self, event: Event) -> bool {
        critical_section::with(|cs| match self.slot.borrow_ref_mut(cs).as_mut() {
            Some(Installed { ctx, table }) => table.dispatch(ctx, event),
            None => false,
        })
    }
}
