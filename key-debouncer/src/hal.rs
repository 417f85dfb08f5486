//! Contracts the debouncer needs from the platform.
//!
//! The engine never talks to a peripheral directly. A clock, a one-shot alarm and
//! the key pins are supplied by the application; [`crate::runtime`] provides the
//! embassy based clock and alarm, and the `esp` feature implements [`KeyPin`] for
//! `esp_hal` inputs.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

use crate::Error;

/// A monotonic clock.
pub trait Clock {
    /// Returns the current instant. Must never go backwards.
    fn now(&self) -> Instant;
}

/// A single one-shot, re-armable alarm.
///
/// Expiry must end up in [`KeyDebouncer::on_alarm`](crate::KeyDebouncer::on_alarm).
pub trait Alarm {
    /// (Re)starts the alarm to fire once, `delay` from now.
    ///
    /// Any previously armed expiry is replaced.
    fn arm(&mut self, delay: Duration);

    /// Stops the alarm. Disarming a stopped alarm is a no-op.
    fn disarm(&mut self);
}

/// Pull resistor configuration of a key pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// Pull-up, for keys wired to ground.
    Up,
    /// Pull-down, for keys wired to VCC.
    Down,
}

/// A GPIO input a key is connected to.
///
/// The level is read through [`InputPin`].
pub trait KeyPin: InputPin {
    /// Configures the pull resistor.
    fn set_pull(&mut self, pull: Pull);

    /// Enables the interrupt on both edges.
    fn listen(&mut self) -> Result<(), Error>;

    /// Disables the interrupt. Once this returns, no new edge of this pin is reported.
    fn unlisten(&mut self);

    /// Returns `true` and acknowledges the interrupt if one is pending.
    fn take_interrupt(&mut self) -> bool;

    /// Returns the pin to its reset configuration.
    fn reset(&mut self);
}
