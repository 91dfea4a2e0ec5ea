//! Touchscreen echo
//!
//! Polls the XPT2046 and prints every touch, mapped to screen pixels, to the
//! log and as three centered lines on the panel.

#![no_std]
#![no_main]

extern crate alloc;

use cyd_core::touch::{Calibration, TouchEcho};
use cyd_core::traits::DisplayExt;
use cyd_drivers::display::TextScreen;
use cyd_firmware::board::{self, DisplayPins, TouchPins};
use cyd_firmware::{config, halt};
use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use {esp_backtrace as _, esp_println as _};

esp_bootloader_esp_idf::esp_app_desc!();

/// Touch poll period while idle
const POLL_INTERVAL_MS: u64 = 10;

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 64 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Touch echo starting...");
    let config = config::load();

    let display_pins = DisplayPins {
        spi: peripherals.SPI2,
        sck: peripherals.GPIO14,
        mosi: peripherals.GPIO13,
        miso: peripherals.GPIO12,
        cs: peripherals.GPIO15,
        dc: peripherals.GPIO2,
        backlight: peripherals.GPIO21,
    };

    let (mut panel, _backlight) = match board::init_display(display_pins, &config.display) {
        Ok(display) => display,
        Err(e) => {
            error!("Display init failed: {}", e);
            halt().await
        }
    };

    let touch_pins = TouchPins {
        clk: peripherals.GPIO25,
        mosi: peripherals.GPIO32,
        miso: peripherals.GPIO39,
        cs: peripherals.GPIO33,
    };

    let mut screen = TextScreen::new(&mut panel);

    let mut touch = match board::init_touch_hw(peripherals.SPI3, touch_pins, &config.touch) {
        Ok(touch) => touch,
        Err(e) => {
            error!("Touch init failed: {}", e);
            cyd_firmware::report_fatal(&mut screen, &["Touch init failed"]);
            halt().await
        }
    };

    if screen.draw_message(&["Touch Screen to Start"]).is_err() {
        warn!("Display unavailable");
    }

    let echo = TouchEcho::new(Calibration::from_config(&config.touch, &config.display));
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    info!("Touch the screen");

    loop {
        match echo.poll(&mut touch, &mut screen) {
            Ok(Some(point)) => {
                info!(
                    "X = {=i32} | Y = {=i32} | Pressure = {=u16}",
                    point.x,
                    point.y,
                    point.pressure
                );
                Timer::after_millis(config.touch.debounce_ms as u64).await;
                ticker.reset();
            }
            Ok(None) => ticker.next().await,
            Err(e) => {
                warn!("Touch echo failed: {}", e);
                ticker.next().await;
            }
        }
    }
}
