//! Running the debouncer on top of `embassy-time`.
//!
//! [`SystemClock`] and [`AlarmSignal`] implement [`Clock`] and [`Alarm`] with the
//! embassy time driver, and [`run_alarm`] is the body of the task that plays the
//! role of the timer callback.
//!
//! ```no_run
//! # use embassy_sync::channel::Channel;
//! # use key_debouncer::runtime::{run_alarm, AlarmSignal, SystemClock};
//! # use key_debouncer::{KeyDebouncer, KeyEventChannel, KeyPin};
//! static EVENTS: KeyEventChannel<16> = Channel::new();
//! static ALARM: AlarmSignal = AlarmSignal::new();
//!
//! type Keys<P> = KeyDebouncer<SystemClock, &'static AlarmSignal, P, &'static KeyEventChannel<16>, 49>;
//!
//! // Spawned once, next to the task that reads `EVENTS`.
//! async fn debounce<P: KeyPin + 'static>(keys: &'static Keys<P>) -> ! {
//!     run_alarm(keys, &ALARM).await
//! }
//! # fn main() {}
//! ```

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};

use crate::{Alarm, Clock, EventSink, KeyDebouncer, KeyPin};

/// The embassy time driver as a [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// An [`Alarm`] that hands its deadline to [`run_alarm`].
///
/// Arming and disarming only update a signal, so both are safe inside the
/// debouncer's critical section.
pub struct AlarmSignal {
    deadline: Signal<CriticalSectionRawMutex, Option<Instant>>,
}

impl Default for AlarmSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmSignal {
    /// Creates a disarmed alarm.
    pub const fn new() -> Self {
        Self {
            deadline: Signal::new(),
        }
    }

    #[cfg(test)]
    fn try_take(&self) -> Option<Option<Instant>> {
        self.deadline.try_take()
    }
}

impl Alarm for &AlarmSignal {
    fn arm(&mut self, delay: Duration) {
        self.deadline.signal(Some(Instant::now() + delay));
    }

    fn disarm(&mut self) {
        self.deadline.signal(None);
    }
}

/// Waits for the deadlines set through `alarm` and calls
/// [`KeyDebouncer::on_alarm`] when they pass.
///
/// `alarm` must be the same signal the debouncer was initialized with.
pub async fn run_alarm<'a, C, P, E, const N: usize>(
    debouncer: &KeyDebouncer<C, &'a AlarmSignal, P, E, N>,
    alarm: &'a AlarmSignal,
) -> !
where
    C: Clock,
    P: KeyPin,
    E: EventSink,
{
    let mut deadline = None;
    loop {
        match deadline {
            None => deadline = alarm.deadline.wait().await,
            Some(at) => match select(alarm.deadline.wait(), Timer::at(at)).await {
                Either::First(next) => deadline = next,
                Either::Second(()) => {
                    deadline = None;
                    debouncer.on_alarm();
                }
            },
        }
    }
}
