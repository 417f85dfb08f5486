//! Fixed-capacity table of key slots, indexed by pin number.

use embassy_time::{Duration, Instant};
use log::{debug, warn};

use crate::{Error, KeyConfig, KeyPin, KeySlot, KeyState, Pull};

/// A pin number, used as the index into the registry.
pub type PinId = u8;

/// `N` key slots, one per possible pin.
pub struct Registry<P, const N: usize> {
    slots: [KeySlot<P>; N],
}

impl<P, const N: usize> Default for Registry<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, const N: usize> Registry<P, N> {
    /// Creates a registry with all slots unconfigured.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| KeySlot::vacant()),
        }
    }

    /// Returns the slot of `id`, or `None` if `id` is out of range.
    pub fn slot(&self, id: PinId) -> Option<&KeySlot<P>> {
        self.slots.get(usize::from(id))
    }

    pub(crate) fn slot_mut(&mut self, id: PinId) -> Option<&mut KeySlot<P>> {
        self.slots.get_mut(usize::from(id))
    }

    fn configured_mut(&mut self, id: PinId) -> Result<&mut KeySlot<P>, Error> {
        let slot = self.slot_mut(id).ok_or(Error::InvalidArgument)?;
        if !slot.is_configured() {
            return Err(Error::InvalidState);
        }
        Ok(slot)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut KeySlot<P>> {
        self.slots.iter_mut()
    }

    /// The earliest pending deadline across all slots.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter_map(KeySlot::next_deadline).min()
    }

    /// Returns the confirmed state of `id`.
    pub fn state(&self, id: PinId) -> KeyState {
        self.slot(id).map_or(KeyState::NotConfigured, KeySlot::state)
    }

    /// Changes the long-press delay of a registered key.
    ///
    /// A zero delay is refused with [`Error::InvalidState`] while the key still repeats.
    pub fn set_long_press(&mut self, id: PinId, long_press: Duration) -> Result<(), Error> {
        let slot = self.configured_mut(id)?;
        if long_press.as_ticks() == 0 && slot.config().repeat_enabled() {
            return Err(Error::InvalidState);
        }
        slot.config_mut().long_press = long_press;
        Ok(())
    }

    /// Changes the repeat interval of a registered key.
    ///
    /// A nonzero interval is refused with [`Error::InvalidState`] while long-press is off.
    pub fn set_repeat(&mut self, id: PinId, repeat: Duration) -> Result<(), Error> {
        let slot = self.configured_mut(id)?;
        if repeat.as_ticks() > 0 && !slot.config().long_press_enabled() {
            return Err(Error::InvalidState);
        }
        slot.config_mut().repeat = repeat;
        Ok(())
    }
}

impl<P: KeyPin, const N: usize> Registry<P, N> {
    /// Registers `pin` as key `id`, replacing whatever was registered there.
    ///
    /// The pin gets a pull resistor matching its polarity, its current level
    /// becomes the confirmed state, and its interrupt is enabled. A failure to
    /// enable the interrupt is logged and otherwise ignored.
    ///
    /// Returns the pin previously registered under `id`, if any. On error
    /// nothing changes and `pin` is dropped.
    pub fn register(&mut self, id: PinId, mut pin: P, config: KeyConfig) -> Result<Option<P>, Error> {
        config.validate()?;
        if usize::from(id) >= N {
            return Err(Error::InvalidArgument);
        }
        let previous = self.unregister(id)?;

        pin.reset();
        pin.set_pull(if config.active_low { Pull::Up } else { Pull::Down });

        let slot = &mut self.slots[usize::from(id)];
        slot.occupy(pin, config);
        if let Some(pin) = slot.pin_mut() {
            if let Err(err) = pin.listen() {
                warn!("Could not enable interrupt of key {id}: {err}");
            }
        }
        debug!("Registered key {id} with marker {}", config.marker);

        Ok(previous)
    }

    /// Removes key `id` and hands its pin back.
    ///
    /// The interrupt is disabled before the slot is cleared. Returns `Ok(None)`
    /// if nothing was registered.
    pub fn unregister(&mut self, id: PinId) -> Result<Option<P>, Error> {
        let slot = self.slot_mut(id).ok_or(Error::InvalidArgument)?;
        let Some(pin) = slot.pin_mut() else {
            return Ok(None);
        };
        pin.unlisten();
        pin.reset();
        debug!("Unregistered key {id}");
        Ok(slot.vacate())
    }

    /// Unregisters every key, dropping their pins.
    pub fn unregister_all(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(pin) = slot.pin_mut() {
                pin.unlisten();
                pin.reset();
            }
            slot.vacate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, InputPin};

    #[derive(Debug, Default)]
    struct Pin {
        high: bool,
        pull: Option<Pull>,
        listening: bool,
        resets: u32,
        broken_interrupt: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high)
        }
    }

    impl KeyPin for Pin {
        fn set_pull(&mut self, pull: Pull) {
            self.pull = Some(pull);
        }

        fn listen(&mut self) -> Result<(), Error> {
            if self.broken_interrupt {
                return Err(Error::ResourceUnavailable);
            }
            self.listening = true;
            Ok(())
        }

        fn unlisten(&mut self) {
            self.listening = false;
        }

        fn take_interrupt(&mut self) -> bool {
            false
        }

        fn reset(&mut self) {
            self.resets += 1;
            self.pull = None;
        }
    }

    fn long_press() -> KeyConfig {
        KeyConfig::default().with_long_press(Duration::from_millis(500))
    }

    #[test]
    fn register_configures_the_pin() {
        let mut registry = Registry::<Pin, 4>::new();
        let pin = Pin::default();
        let config = KeyConfig::default().with_active_low(true).with_marker(3);
        assert!(matches!(registry.register(2, pin, config), Ok(None)));

        let slot = registry.slot_mut(2).unwrap();
        let pin = slot.pin_mut().unwrap();
        assert!(pin.listening);
        assert_eq!(pin.pull, Some(Pull::Up));
        // Active low and the line is low: pressed.
        assert_eq!(registry.state(2), KeyState::Pressed);
    }

    #[test]
    fn register_rejects_out_of_range_and_bad_config() {
        let mut registry = Registry::<Pin, 4>::new();
        assert_eq!(
            registry.register(4, Pin::default(), KeyConfig::default()).err(),
            Some(Error::InvalidArgument)
        );
        let config = KeyConfig::default().with_repeat(Duration::from_millis(200));
        assert_eq!(
            registry.register(0, Pin::default(), config).err(),
            Some(Error::InvalidArgument)
        );
        assert_eq!(registry.state(0), KeyState::NotConfigured);
    }

    #[test]
    fn register_survives_interrupt_failure() {
        let mut registry = Registry::<Pin, 4>::new();
        let pin = Pin {
            broken_interrupt: true,
            ..Pin::default()
        };
        assert!(registry.register(1, pin, KeyConfig::default()).is_ok());
        assert_eq!(registry.state(1), KeyState::Released);
    }

    #[test]
    fn reregister_returns_previous_pin() {
        let mut registry = Registry::<Pin, 4>::new();
        registry.register(1, Pin::default(), KeyConfig::default()).unwrap();
        let previous = registry
            .register(1, Pin::default(), KeyConfig::default().with_marker(9))
            .unwrap()
            .unwrap();
        assert!(!previous.listening);
        assert_eq!(registry.slot(1).unwrap().config().marker, 9);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = Registry::<Pin, 4>::new();
        registry.register(1, Pin::default(), KeyConfig::default()).unwrap();

        let pin = registry.unregister(1).unwrap().unwrap();
        assert!(!pin.listening);
        assert!(pin.resets >= 2);
        assert_eq!(registry.state(1), KeyState::NotConfigured);

        assert!(registry.unregister(1).unwrap().is_none());
        assert_eq!(registry.unregister(7).err(), Some(Error::InvalidArgument));
    }

    #[test]
    fn unregister_all_clears_every_slot() {
        let mut registry = Registry::<Pin, 4>::new();
        registry.register(0, Pin::default(), long_press()).unwrap();
        registry.register(3, Pin::default(), KeyConfig::default()).unwrap();
        registry.slot_mut(3).unwrap().arm_debounce(Instant::from_micros(0));

        registry.unregister_all();
        assert_eq!(registry.state(0), KeyState::NotConfigured);
        assert_eq!(registry.state(3), KeyState::NotConfigured);
        assert_eq!(registry.next_deadline(), None);
    }

    #[test]
    fn set_repeat_needs_long_press() {
        let mut registry = Registry::<Pin, 4>::new();
        registry.register(0, Pin::default(), KeyConfig::default()).unwrap();

        assert_eq!(
            registry.set_repeat(0, Duration::from_millis(200)),
            Err(Error::InvalidState)
        );
        assert_eq!(registry.slot(0).unwrap().config().repeat, Duration::from_ticks(0));

        registry.set_long_press(0, Duration::from_millis(500)).unwrap();
        registry.set_repeat(0, Duration::from_millis(200)).unwrap();
        assert_eq!(
            registry.set_long_press(0, Duration::from_ticks(0)),
            Err(Error::InvalidState)
        );

        registry.set_repeat(0, Duration::from_ticks(0)).unwrap();
        registry.set_long_press(0, Duration::from_ticks(0)).unwrap();
    }

    #[test]
    fn setters_need_a_configured_key() {
        let mut registry = Registry::<Pin, 4>::new();
        assert_eq!(
            registry.set_long_press(0, Duration::from_millis(500)),
            Err(Error::InvalidState)
        );
        assert_eq!(
            registry.set_repeat(9, Duration::from_millis(200)),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn next_deadline_is_the_minimum() {
        let mut registry = Registry::<Pin, 4>::new();
        registry.register(0, Pin::default(), long_press()).unwrap();
        registry.register(3, Pin::default(), KeyConfig::default()).unwrap();
        assert_eq!(registry.next_deadline(), None);

        registry.slot_mut(0).unwrap().arm_debounce(Instant::from_micros(5_000));
        registry.slot_mut(3).unwrap().arm_debounce(Instant::from_micros(1_000));
        assert_eq!(registry.next_deadline(), Some(Instant::from_micros(11_000)));
    }
}
