//! Interrupt-driven, `no_std` key debouncing with long-press and auto-repeat.
//!
//! Keys are GPIO inputs whose every edge raises an interrupt. The interrupt
//! handler only restarts the key's debounce window; a single shared one-shot
//! alarm, always pointed at the nearest pending deadline of all keys, then
//! confirms presses and releases and produces long-press and repeat events.
//! Events are posted to an application supplied [`EventSink`], usually an
//! `embassy-sync` channel.
//!
//! Per key the events come in the order `Pressed`, optionally `LongPressed`
//! and any number of `Repeated`, then `Released`. Each event carries the
//! marker the key was registered with.
//!
//! # Usage
//!
//! The debouncer lives in a `static` next to its event channel and alarm. The
//! GPIO interrupt handler calls [`KeyDebouncer::on_interrupt`], and
//! [`runtime::run_alarm`] runs as a task of its own. The `simple_keys` example
//! wires this up on an ESP32-S3 (feature `esp`).
//!
//! ```no_run
//! # use embassy_futures::join::join;
//! # use embassy_sync::channel::Channel;
//! # use embassy_time::Duration;
//! # use key_debouncer::runtime::{run_alarm, AlarmSignal, SystemClock};
//! # use key_debouncer::{KeyConfig, KeyDebouncer, KeyEventChannel, KeyPin};
//! static EVENTS: KeyEventChannel<16> = Channel::new();
//! static ALARM: AlarmSignal = AlarmSignal::new();
//!
//! type Keys<P> = KeyDebouncer<SystemClock, &'static AlarmSignal, P, &'static KeyEventChannel<16>, 49>;
//!
//! async fn keys_task<P: KeyPin + 'static>(keys: &'static Keys<P>, pin: P) {
//!     let events = keys.init(SystemClock, &ALARM).unwrap();
//!     let config = KeyConfig::default()
//!         .with_marker(10)
//!         .with_active_low(true)
//!         .with_debounce(Duration::from_millis(1))
//!         .with_long_press(Duration::from_millis(500))
//!         .with_repeat(Duration::from_millis(200));
//!     keys.register_key(10, pin, config).unwrap();
//!
//!     join(run_alarm(keys, &ALARM), async {
//!         loop {
//!             let event = events.receive().await;
//!             log::info!("Key event {event:?}");
//!         }
//!     })
//!     .await;
//! }
//! # fn main() {}
//! ```

#![cfg_attr(not(test), no_std)]

mod config;
mod engine;
mod error;
mod event;
mod hal;
mod registry;
mod slot;

pub mod runtime;

#[cfg(feature = "esp")]
pub mod esp;

pub use config::KeyConfig;
pub use engine::KeyDebouncer;
pub use error::Error;
pub use event::{EventSink, KeyEvent, KeyEventChannel, KeyEventKind};
pub use hal::{Alarm, Clock, KeyPin, Pull};
pub use registry::{PinId, Registry};
pub use slot::{KeyPhase, KeySlot, KeyState};
