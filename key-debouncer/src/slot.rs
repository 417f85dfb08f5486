//! Per-key timing state and the debounce / long-press / repeat state machine.

use embassy_time::Instant;
use embedded_hal::digital::InputPin;
use log::warn;

use crate::{KeyConfig, KeyEventKind};

/// The confirmed state of a key as reported by
/// [`KeyDebouncer::get_state`](crate::KeyDebouncer::get_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// The last confirmed level was "released".
    Released,
    /// The last confirmed level was "pressed".
    Pressed,
    /// No key is registered under this pin.
    NotConfigured,
}

/// Where a key currently is in its press cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    /// Nothing pending, the key is released.
    Idle,
    /// An edge was seen and the debounce window is running.
    Debouncing,
    /// A press was confirmed, waiting for the long-press delay (if any).
    Pressed,
    /// Long-press was reported and no repeat is configured; waiting for release.
    Held,
    /// Long-press was reported, repeat events are running.
    Repeating,
}

/// Configuration and live timing state of one key.
///
/// A slot without a pin is unconfigured and carries no deadlines.
pub struct KeySlot<P> {
    pin: Option<P>,
    config: KeyConfig,
    last_state: bool,
    /// Long-press was reported for the press in progress.
    long_pressed: bool,
    debounce_deadline: Option<Instant>,
    longpress_deadline: Option<Instant>,
    repeat_deadline: Option<Instant>,
}

impl<P> Default for KeySlot<P> {
    fn default() -> Self {
        Self::vacant()
    }
}

impl<P> KeySlot<P> {
    /// Creates an unconfigured slot.
    pub fn vacant() -> Self {
        Self {
            pin: None,
            config: KeyConfig::default(),
            last_state: false,
            long_pressed: false,
            debounce_deadline: None,
            longpress_deadline: None,
            repeat_deadline: None,
        }
    }

    /// Returns `true` if a key is registered in this slot.
    pub fn is_configured(&self) -> bool {
        self.pin.is_some()
    }

    /// The configuration of the key.
    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut KeyConfig {
        &mut self.config
    }

    /// Returns the last confirmed state.
    pub fn state(&self) -> KeyState {
        match (self.is_configured(), self.last_state) {
            (false, _) => KeyState::NotConfigured,
            (true, true) => KeyState::Pressed,
            (true, false) => KeyState::Released,
        }
    }

    /// Returns the phase of the press cycle.
    pub fn phase(&self) -> KeyPhase {
        if self.debounce_deadline.is_some() {
            KeyPhase::Debouncing
        } else if self.repeat_deadline.is_some() {
            KeyPhase::Repeating
        } else if self.longpress_deadline.is_some() {
            KeyPhase::Pressed
        } else if !self.last_state {
            KeyPhase::Idle
        } else if self.long_pressed {
            KeyPhase::Held
        } else {
            KeyPhase::Pressed
        }
    }

    /// The earliest pending deadline of this slot.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.debounce_deadline,
            self.longpress_deadline,
            self.repeat_deadline,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub(crate) fn pin_mut(&mut self) -> Option<&mut P> {
        self.pin.as_mut()
    }

    /// Starts a fresh debounce window anchored at `now`.
    ///
    /// Any press in progress is void: long-press and repeat deadlines are dropped.
    pub(crate) fn arm_debounce(&mut self, now: Instant) {
        self.debounce_deadline = Some(now + self.config.debounce);
        self.longpress_deadline = None;
        self.repeat_deadline = None;
    }

    /// Empties the slot and returns its pin.
    pub(crate) fn vacate(&mut self) -> Option<P> {
        core::mem::take(self).pin
    }
}

impl<P: InputPin> KeySlot<P> {
    /// Puts `pin` into the slot with a clean timing state.
    ///
    /// The current level seeds the confirmed state, no event is produced.
    pub(crate) fn occupy(&mut self, pin: P, config: KeyConfig) {
        *self = Self {
            pin: Some(pin),
            config,
            ..Self::vacant()
        };
        self.last_state = self.read_pressed().unwrap_or(false);
    }

    fn read_pressed(&mut self) -> Option<bool> {
        let active_low = self.config.active_low;
        let pin = self.pin.as_mut()?;
        match pin.is_high() {
            Ok(high) => Some(high != active_low),
            Err(err) => {
                warn!("Error reading key {}: {err:?}", self.config.marker);
                None
            }
        }
    }

    /// Resolves the first deadline that is due at `now`.
    ///
    /// Deadlines armed by a resolution always lie after `now`, so a single call
    /// never yields more than one event.
    pub(crate) fn resolve(&mut self, now: Instant) -> Option<KeyEventKind> {
        if self.debounce_deadline.is_some_and(|d| d <= now) {
            return self.resolve_debounce(now);
        }

        if self.longpress_deadline.is_some_and(|d| d <= now) {
            self.longpress_deadline = None;
            if !self.config.long_press_enabled() {
                return None;
            }
            self.long_pressed = true;
            if self.config.repeat_enabled() {
                self.repeat_deadline = Some(now + self.config.repeat);
            }
            return Some(KeyEventKind::LongPressed);
        }

        if let Some(deadline) = self.repeat_deadline.filter(|d| *d <= now) {
            if !self.config.repeat_enabled() {
                self.repeat_deadline = None;
                return None;
            }
            self.repeat_deadline = Some(deadline + self.config.repeat);
            return Some(KeyEventKind::Repeated);
        }

        None
    }

    fn resolve_debounce(&mut self, now: Instant) -> Option<KeyEventKind> {
        self.debounce_deadline = None;
        self.longpress_deadline = None;
        self.repeat_deadline = None;

        // The level counts as of now, not as of the edge.
        let pressed = self.read_pressed()?;
        let was_pressed = core::mem::replace(&mut self.last_state, pressed);

        if !pressed {
            self.long_pressed = false;
            return was_pressed.then_some(KeyEventKind::Released);
        }

        if self.long_pressed {
            // Same press, long-press already reported: pick the repeats back up.
            if self.config.repeat_enabled() {
                self.repeat_deadline = Some(now + self.config.repeat);
            }
        } else if self.config.long_press_enabled() {
            self.longpress_deadline = Some(now + self.config.long_press);
        }
        (!was_pressed).then_some(KeyEventKind::Pressed)
    }
}
