#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those     holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_sync::channel::Channel;
use embassy_time::Duration;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Io},
    handler,
    timer::systimer::SystemTimer,
};
use esp_println::println;
use key_debouncer::runtime::{run_alarm, AlarmSignal, SystemClock};
use key_debouncer::{KeyConfig, KeyDebouncer, KeyEventChannel, KeyEventKind};
use log::{info, warn};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

type Keys = KeyDebouncer<
    SystemClock,
    &'static AlarmSignal,
    Input<'static>,
    &'static KeyEventChannel<16>,
    49,
>;

static EVENTS: KeyEventChannel<16> = Channel::new();
static ALARM: AlarmSignal = AlarmSignal::new();
static KEYS: Keys = KeyDebouncer::new(&EVENTS);

#[handler]
fn gpio_interrupt() {
    KEYS.on_interrupt();
}

/// The main entry point of the application.
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    // Init logging
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let mut io = Io::new(peripherals.IO_MUX);
    io.set_interrupt_handler(gpio_interrupt);

    let events = KEYS.init(SystemClock, &ALARM).unwrap();

    let key = KeyConfig::default()
        .with_active_low(true)
        .with_debounce(Duration::from_micros(1_000))
        .with_long_press(Duration::from_micros(500_000))
        .with_repeat(Duration::from_micros(200_000));
    let pins = [
        (10, Input::new(peripherals.GPIO10, InputConfig::default())),
        (11, Input::new(peripherals.GPIO11, InputConfig::default())),
        (12, Input::new(peripherals.GPIO12, InputConfig::default())),
        (13, Input::new(peripherals.GPIO13, InputConfig::default())),
        (14, Input::new(peripherals.GPIO14, InputConfig::default())),
    ];
    for (id, pin) in pins {
        match KEYS.register_key(id, pin, key.with_marker(i32::from(id))) {
            Ok(_) => info!("Key {id} registered."),
            Err(err) => warn!("Error registering key {id}: {err}"),
        }
    }

    spawner.spawn(debounce()).unwrap();

    loop {
        let event = events.receive().await;
        match event.kind {
            KeyEventKind::Pressed => info!("Key pressed: {}", event.marker),
            KeyEventKind::Released => info!("Key released: {}", event.marker),
            KeyEventKind::LongPressed => info!("Key long-pressed: {}", event.marker),
            KeyEventKind::Repeated => info!("Key repeated: {}", event.marker),
        }
    }
}

/// Fires the debouncer's deadlines.
#[embassy_executor::task]
async fn debounce() {
    run_alarm(&KEYS, &ALARM).await
}
