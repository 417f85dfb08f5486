//! The shared-timer engine tying keys, clock, alarm and event bus together.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::{debug, trace};

use crate::{
    Alarm, Clock, Error, EventSink, KeyConfig, KeyEvent, KeyPhase, KeyPin, KeyState, PinId,
    Registry,
};

/// State shared between the interrupt and the alarm context.
struct Engine<C, A, P, const N: usize> {
    clock: C,
    alarm: A,
    /// The deadline the alarm is currently armed for.
    armed: Option<Instant>,
    registry: Registry<P, N>,
}

impl<C: Clock, A: Alarm, P, const N: usize> Engine<C, A, P, N> {
    /// Points the alarm at the nearest pending deadline.
    ///
    /// The alarm is only touched when that deadline is earlier than the armed
    /// one, or when nothing is pending any more.
    fn reschedule(&mut self, now: Instant) {
        match self.registry.next_deadline() {
            None => {
                if self.armed.take().is_some() {
                    self.alarm.disarm();
                }
            }
            Some(next) => {
                if self.armed.is_none_or(|armed| next < armed) {
                    self.alarm.arm(next.saturating_duration_since(now));
                    self.armed = Some(next);
                }
            }
        }
    }
}

/// Debounces up to `N` keys on a single shared alarm.
///
/// The debouncer is meant to live in a `static`: it is created empty with
/// [`new`](Self::new), started with [`init`](Self::init), and fed from two
/// contexts:
///
/// * the GPIO interrupt, through [`on_interrupt`](Self::on_interrupt) or
///   [`on_edge`](Self::on_edge),
/// * the expiry of the alarm, through [`on_alarm`](Self::on_alarm).
///
/// Both run their slot updates and the alarm decision inside one critical
/// section. Finished events go to the sink `E` after that section is left.
///
/// # Type parameters
///
/// * `C` - the monotonic [`Clock`].
/// * `A` - the one-shot [`Alarm`].
/// * `P` - the [`KeyPin`] type of the keys.
/// * `E` - the [`EventSink`] events are delivered to.
/// * `N` - number of slots, i.e. the highest usable pin number plus one.
pub struct KeyDebouncer<C, A, P, E, const N: usize> {
    engine: Mutex<RefCell<Option<Engine<C, A, P, N>>>>,
    sink: E,
    dropped: Mutex<Cell<u32>>,
}

impl<C, A, P, E, const N: usize> KeyDebouncer<C, A, P, E, N> {
    /// Creates a stopped debouncer delivering to `sink`.
    pub const fn new(sink: E) -> Self {
        Self {
            engine: Mutex::new(RefCell::new(None)),
            sink,
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    /// Returns `true` between [`init`](Self::init) and [`deinit`](Self::deinit).
    pub fn is_initialized(&self) -> bool {
        critical_section::with(|cs| self.engine.borrow_ref(cs).is_some())
    }

    /// Number of events that were dropped because the sink was full.
    pub fn dropped_events(&self) -> u32 {
        critical_section::with(|cs| self.dropped.borrow(cs).get())
    }
}

impl<C, A, P, E, const N: usize> KeyDebouncer<C, A, P, E, N>
where
    C: Clock,
    A: Alarm,
    P: KeyPin,
    E: EventSink,
{
    /// Starts the debouncer with the given clock and alarm.
    ///
    /// Returns the event sink, which is where the application picks up key
    /// events. Fails with [`Error::InvalidState`] if already running.
    pub fn init(&self, clock: C, alarm: A) -> Result<&E, Error> {
        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs);
            if engine.is_some() {
                return Err(Error::InvalidState);
            }
            *engine = Some(Engine {
                clock,
                alarm,
                armed: None,
                registry: Registry::new(),
            });
            Ok(())
        })?;
        debug!("Key debouncer started with {} slots", N);
        Ok(&self.sink)
    }

    /// Stops the debouncer.
    ///
    /// Every key is unregistered before the alarm is stopped and released.
    /// Fails with [`Error::InvalidState`] if not running.
    pub fn deinit(&self) -> Result<(), Error> {
        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs).take().ok_or(Error::InvalidState)?;
            engine.registry.unregister_all();
            engine.alarm.disarm();
            Ok::<_, Error>(())
        })?;
        debug!("Key debouncer stopped");
        Ok(())
    }

    fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut Engine<C, A, P, N>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs);
            let engine = engine.as_mut().ok_or(Error::InvalidState)?;
            f(engine)
        })
    }

    /// Registers `pin` as key `id`.
    ///
    /// Any key previously registered under `id` is replaced and its pin is
    /// returned. See [`Registry::register`] for the details.
    pub fn register_key(&self, id: PinId, pin: P, config: KeyConfig) -> Result<Option<P>, Error> {
        self.with_engine(|engine| {
            let previous = engine.registry.register(id, pin, config)?;
            let now = engine.clock.now();
            engine.reschedule(now);
            Ok(previous)
        })
    }

    /// Unregisters key `id` and returns its pin.
    ///
    /// Returns `Ok(None)` if no key was registered under `id`. Pending
    /// deadlines of the key are dropped with it, so it produces no more events.
    pub fn unregister_key(&self, id: PinId) -> Result<Option<P>, Error> {
        self.with_engine(|engine| {
            let pin = engine.registry.unregister(id)?;
            let now = engine.clock.now();
            engine.reschedule(now);
            Ok(pin)
        })
    }

    /// Changes the long-press delay of key `id`. Zero disables long-press.
    pub fn set_long_press(&self, id: PinId, long_press: Duration) -> Result<(), Error> {
        self.with_engine(|engine| engine.registry.set_long_press(id, long_press))
    }

    /// Changes the repeat interval of key `id`. Zero disables repeat.
    pub fn set_repeat(&self, id: PinId, repeat: Duration) -> Result<(), Error> {
        self.with_engine(|engine| engine.registry.set_repeat(id, repeat))
    }

    /// Returns the last confirmed state of key `id`.
    ///
    /// Polling is rarely what you want; the events carry the same information.
    pub fn get_state(&self, id: PinId) -> KeyState {
        self.with_engine(|engine| Ok(engine.registry.state(id)))
            .unwrap_or(KeyState::NotConfigured)
    }

    /// Returns where key `id` is in its press cycle, `None` if not configured.
    pub fn phase(&self, id: PinId) -> Option<KeyPhase> {
        self.with_engine(|engine| {
            Ok(engine
                .registry
                .slot(id)
                .filter(|slot| slot.is_configured())
                .map(|slot| slot.phase()))
        })
        .ok()
        .flatten()
    }

    /// Handles an edge on key `id`. Call from the pin's interrupt handler.
    ///
    /// Restarts the debounce window of the key and drops any pending
    /// long-press or repeat. Edges of unknown keys are ignored.
    pub fn on_edge(&self, id: PinId) {
        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs);
            let Some(engine) = engine.as_mut() else {
                return;
            };
            let now = engine.clock.now();
            if let Some(slot) = engine.registry.slot_mut(id).filter(|s| s.is_configured()) {
                slot.arm_debounce(now);
                engine.reschedule(now);
            }
        });
    }

    /// Handles a shared GPIO interrupt.
    ///
    /// Every registered pin with a pending interrupt is acknowledged and treated
    /// as an edge.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs);
            let Some(engine) = engine.as_mut() else {
                return;
            };
            let now = engine.clock.now();
            let mut edges = false;
            for slot in engine.registry.iter_mut() {
                if slot.pin_mut().is_some_and(|pin| pin.take_interrupt()) {
                    slot.arm_debounce(now);
                    edges = true;
                }
            }
            if edges {
                engine.reschedule(now);
            }
        });
    }

    /// Handles expiry of the alarm.
    ///
    /// Resolves every deadline that is due, rearms the alarm for the next one and
    /// delivers the resulting events. Events the sink cannot take are dropped.
    pub fn on_alarm(&self) {
        let mut events: Vec<KeyEvent, N> = Vec::new();

        critical_section::with(|cs| {
            let mut engine = self.engine.borrow_ref_mut(cs);
            let Some(engine) = engine.as_mut() else {
                return;
            };
            let now = engine.clock.now();
            // One-shot: whatever was armed has fired.
            engine.armed = None;
            for slot in engine.registry.iter_mut() {
                if let Some(kind) = slot.resolve(now) {
                    let marker = slot.config().marker;
                    // At most one event per slot, so this never overflows.
                    let _ = events.push(KeyEvent { kind, marker });
                }
            }
            engine.reschedule(now);
            trace!("Alarm at {} resolved {} events", now.as_micros(), events.len());
        });

        for event in events {
            if let Err(event) = self.sink.emit(event) {
                debug!("Dropped {event:?}, event bus full");
                critical_section::with(|cs| {
                    let dropped = self.dropped.borrow(cs);
                    dropped.set(dropped.get().wrapping_add(1));
                });
            }
        }
    }
}
