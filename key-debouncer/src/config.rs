//! Per-key timing configuration.

use embassy_time::Duration;

use crate::Error;

/// Configuration of a single key.
///
/// A zero `long_press` or `repeat` duration turns the corresponding feature off.
/// Repeat is only ever reported after a long-press, so a nonzero `repeat` needs a
/// nonzero `long_press`.
///
/// ```
/// use embassy_time::Duration;
/// use key_debouncer::KeyConfig;
///
/// let config = KeyConfig::default()
///     .with_marker(10)
///     .with_active_low(true)
///     .with_debounce(Duration::from_micros(1_000))
///     .with_long_press(Duration::from_millis(500))
///     .with_repeat(Duration::from_millis(200));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyConfig {
    /// Opaque value handed back with every event of this key.
    pub marker: i32,
    /// The key pulls the pin to ground when pressed.
    pub active_low: bool,
    /// How long the level has to stay put after the last edge before it is reported.
    pub debounce: Duration,
    /// How long a confirmed press has to be held to count as a long-press.
    pub long_press: Duration,
    /// Interval of repeat events after a long-press.
    pub repeat: Duration,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            marker: 0,
            active_low: false,
            // Good enough for most tactile switches.
            debounce: Duration::from_millis(10),
            long_press: Duration::from_ticks(0),
            repeat: Duration::from_ticks(0),
        }
    }
}

impl KeyConfig {
    /// Sets the marker returned with every event.
    pub const fn with_marker(mut self, marker: i32) -> Self {
        self.marker = marker;
        self
    }

    /// Sets whether the key is wired to ground (`true`) or to VCC (`false`).
    pub const fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    /// Sets the debounce window.
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the long-press delay, zero to disable.
    pub const fn with_long_press(mut self, long_press: Duration) -> Self {
        self.long_press = long_press;
        self
    }

    /// Sets the repeat interval, zero to disable.
    pub const fn with_repeat(mut self, repeat: Duration) -> Self {
        self.repeat = repeat;
        self
    }

    /// Returns `true` if long-press detection is enabled.
    pub fn long_press_enabled(&self) -> bool {
        self.long_press.as_ticks() > 0
    }

    /// Returns `true` if repeat events are enabled.
    pub fn repeat_enabled(&self) -> bool {
        self.repeat.as_ticks() > 0
    }

    /// Checks that repeat is only requested together with long-press.
    pub fn validate(&self) -> Result<(), Error> {
        if self.repeat_enabled() && !self.long_press_enabled() {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}
