//! A simulated clock, alarm and key pins to drive the debouncer from tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin};
use key_debouncer::{
    Alarm, Clock, Error, KeyConfig, KeyDebouncer, KeyEvent, KeyEventChannel, KeyPin, PinId, Pull,
};

pub const SLOTS: usize = 16;

pub struct FakeClock(Rc<Cell<u64>>);

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.0.get())
    }
}

#[derive(Debug, Default)]
pub struct AlarmState {
    pub armed_at: Option<u64>,
    pub arms: u32,
    pub disarms: u32,
}

pub struct FakeAlarm {
    now: Rc<Cell<u64>>,
    state: Rc<RefCell<AlarmState>>,
}

impl Alarm for FakeAlarm {
    fn arm(&mut self, delay: Duration) {
        let mut state = self.state.borrow_mut();
        state.armed_at = Some(self.now.get() + delay.as_micros());
        state.arms += 1;
    }

    fn disarm(&mut self) {
        let mut state = self.state.borrow_mut();
        state.armed_at = None;
        state.disarms += 1;
    }
}

/// The electrical side of a key: its level and interrupt flags.
#[derive(Debug, Default)]
pub struct LineState {
    pub high: Cell<bool>,
    pub pending: Cell<bool>,
    pub listening: Cell<bool>,
    pub pull: Cell<Option<Pull>>,
    pub broken_interrupt: Cell<bool>,
}

#[derive(Clone, Default)]
pub struct Line(pub Rc<LineState>);

impl Line {
    /// Changes the level, latching an interrupt if the pin listens.
    pub fn set(&self, high: bool) {
        if self.0.high.replace(high) != high && self.0.listening.get() {
            self.0.pending.set(true);
        }
    }

    pub fn pin(&self) -> FakePin {
        FakePin(self.clone())
    }
}

pub struct FakePin(pub Line);

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0 .0.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0 .0.high.get())
    }
}

impl KeyPin for FakePin {
    fn set_pull(&mut self, pull: Pull) {
        self.0 .0.pull.set(Some(pull));
    }

    fn listen(&mut self) -> Result<(), Error> {
        if self.0 .0.broken_interrupt.get() {
            return Err(Error::ResourceUnavailable);
        }
        self.0 .0.listening.set(true);
        Ok(())
    }

    fn unlisten(&mut self) {
        self.0 .0.listening.set(false);
        self.0 .0.pending.set(false);
    }

    fn take_interrupt(&mut self) -> bool {
        self.0 .0.pending.replace(false)
    }

    fn reset(&mut self) {
        self.0 .0.pull.set(None);
    }
}

pub type TestKeys<'a, const Q: usize> =
    KeyDebouncer<FakeClock, FakeAlarm, FakePin, &'a KeyEventChannel<Q>, SLOTS>;

/// A debouncer on simulated time, with every delivered event time-stamped.
pub struct Bench<'a, const Q: usize> {
    pub keys: TestKeys<'a, Q>,
    pub events: &'a KeyEventChannel<Q>,
    now: Rc<Cell<u64>>,
    alarm: Rc<RefCell<AlarmState>>,
}

impl<'a, const Q: usize> Bench<'a, Q> {
    /// Creates a stopped debouncer.
    pub fn stopped(events: &'a KeyEventChannel<Q>) -> Self {
        Self {
            keys: KeyDebouncer::new(events),
            events,
            now: Rc::new(Cell::new(0)),
            alarm: Rc::new(RefCell::new(AlarmState::default())),
        }
    }

    /// Creates a running debouncer.
    pub fn new(events: &'a KeyEventChannel<Q>) -> Self {
        let bench = Self::stopped(events);
        bench.start().unwrap();
        bench
    }

    pub fn start(&self) -> Result<(), Error> {
        let clock = FakeClock(self.now.clone());
        let alarm = FakeAlarm {
            now: self.now.clone(),
            state: self.alarm.clone(),
        };
        self.keys.init(clock, alarm).map(|_| ())
    }

    /// Registers a released key.
    pub fn key(&self, id: PinId, config: KeyConfig) -> Line {
        let line = Line::default();
        line.0.high.set(config.active_low);
        self.keys.register_key(id, line.pin(), config).unwrap();
        line
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn arms(&self) -> u32 {
        self.alarm.borrow().arms
    }

    pub fn disarms(&self) -> u32 {
        self.alarm.borrow().disarms
    }

    pub fn armed_at(&self) -> Option<u64> {
        self.alarm.borrow().armed_at
    }

    /// Moves to `t` and reports an edge of key `id` at the new level.
    pub fn edge(&self, t: u64, id: PinId, line: &Line, high: bool) -> Vec<(u64, KeyEvent)> {
        let events = self.run_until(t);
        line.set(high);
        self.keys.on_edge(id);
        events
    }

    /// Lets time pass up to `t`, firing the alarm whenever it is due.
    pub fn run_until(&self, t: u64) -> Vec<(u64, KeyEvent)> {
        let mut delivered = Vec::new();
        loop {
            let due = self.alarm.borrow().armed_at.filter(|at| *at <= t);
            let Some(at) = due else {
                break;
            };
            self.alarm.borrow_mut().armed_at = None;
            self.now.set(at.max(self.now.get()));
            self.keys.on_alarm();
            delivered.extend(self.drain().into_iter().map(|event| (self.now(), event)));
        }
        self.now.set(t.max(self.now.get()));
        delivered
    }

    /// Takes whatever is waiting in the event channel.
    pub fn drain(&self) -> Vec<KeyEvent> {
        std::iter::from_fn(|| self.events.try_receive().ok()).collect()
    }
}
