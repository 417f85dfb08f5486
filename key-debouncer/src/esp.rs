//! [`KeyPin`] for `esp_hal` GPIO inputs.
//!
//! All GPIOs of an ESP32 share one interrupt, so register
//! [`KeyDebouncer::on_interrupt`](crate::KeyDebouncer::on_interrupt) as the IO
//! interrupt handler:
//!
//! ```no_run
//! # use esp_hal::gpio::{Input, Io};
//! # use esp_hal::handler;
//! # use key_debouncer::runtime::{AlarmSignal, SystemClock};
//! # use key_debouncer::{KeyDebouncer, KeyEventChannel};
//! # static EVENTS: KeyEventChannel<16> = embassy_sync::channel::Channel::new();
//! # static KEYS: KeyDebouncer<SystemClock, &'static AlarmSignal, Input<'static>, &'static KeyEventChannel<16>, 49> =
//! #     KeyDebouncer::new(&EVENTS);
//! #[handler]
//! fn gpio_interrupt() {
//!     KEYS.on_interrupt();
//! }
//!
//! # fn main() {
//! # let peripherals = esp_hal::init(esp_hal::Config::default());
//! let mut io = Io::new(peripherals.IO_MUX);
//! io.set_interrupt_handler(gpio_interrupt);
//! # }
//! ```

use esp_hal::gpio::{Event, Input, InputConfig};

use crate::{Error, KeyPin, Pull};

impl KeyPin for Input<'_> {
    fn set_pull(&mut self, pull: Pull) {
        let pull = match pull {
            Pull::Up => esp_hal::gpio::Pull::Up,
            Pull::Down => esp_hal::gpio::Pull::Down,
        };
        self.apply_config(&InputConfig::default().with_pull(pull));
    }

    fn listen(&mut self) -> Result<(), Error> {
        self.clear_interrupt();
        Input::listen(self, Event::AnyEdge);
        Ok(())
    }

    fn unlisten(&mut self) {
        Input::unlisten(self);
        self.clear_interrupt();
    }

    fn take_interrupt(&mut self) -> bool {
        if !self.is_interrupt_set() {
            return false;
        }
        self.clear_interrupt();
        true
    }

    fn reset(&mut self) {
        Input::unlisten(self);
        self.apply_config(&InputConfig::default());
    }
}
