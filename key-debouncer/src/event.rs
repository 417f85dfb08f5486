//! Key events and the hand-off to the application's event bus.

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::channel::{Channel, Sender};

/// The kind of a key event.
///
/// Per key the order is always `Pressed`, optionally `LongPressed` followed by
/// any number of `Repeated`, then `Released`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    /// A press was confirmed after the debounce window.
    Pressed = 1,
    /// The key has been held for the configured long-press delay.
    LongPressed = 2,
    /// The key is still held one repeat interval later.
    Repeated = 3,
    /// A release was confirmed after the debounce window.
    Released = 4,
}

/// An event of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// What happened.
    pub kind: KeyEventKind,
    /// The marker the key was registered with.
    pub marker: i32,
}

/// A channel suitable as the event bus of a [`KeyDebouncer`](crate::KeyDebouncer).
pub type KeyEventChannel<const Q: usize> = Channel<CriticalSectionRawMutex, KeyEvent, Q>;

/// Destination of finished key events.
///
/// `emit` runs in the timer context and must not block. When the event cannot
/// be delivered it is handed back and dropped by the caller.
pub trait EventSink {
    /// Delivers `event`, or returns it if the bus has no room.
    fn emit(&self, event: KeyEvent) -> Result<(), KeyEvent>;
}

impl<M: RawMutex, const Q: usize> EventSink for Channel<M, KeyEvent, Q> {
    fn emit(&self, event: KeyEvent) -> Result<(), KeyEvent> {
        self.try_send(event).map_err(|err| match err {
            embassy_sync::channel::TrySendError::Full(event) => event,
        })
    }
}

impl<M: RawMutex, const Q: usize> EventSink for Sender<'_, M, KeyEvent, Q> {
    fn emit(&self, event: KeyEvent) -> Result<(), KeyEvent> {
        self.try_send(event).map_err(|err| match err {
            embassy_sync::channel::TrySendError::Full(event) => event,
        })
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn emit(&self, event: KeyEvent) -> Result<(), KeyEvent> {
        (**self).emit(event)
    }
}
