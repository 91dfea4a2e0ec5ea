//! SD card JPEG slideshow
//!
//! Shows the `*.JPG` files in the card's root directory in filesystem order.
//! The next image comes up after the configured interval, on a BOOT button
//! press, or while the panel is touched.

#![no_std]
#![no_main]

extern crate alloc;

use cyd_core::catalog::{CatalogError, Selection};
use cyd_core::slideshow::{AdvanceReport, Slideshow};
use cyd_core::traits::TouchSensor;
use cyd_drivers::display::TextScreen;
use cyd_drivers::image::JpegPresenter;
use cyd_drivers::storage::{FixedTime, SdStorage};
use cyd_firmware::board::{self, DisplayPins, SdPins, TouchPins};
use cyd_firmware::tasks::{button_task, BUTTON};
use cyd_firmware::{config, halt, report_fatal};
use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Ticker};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use {esp_backtrace as _, esp_println as _};

esp_bootloader_esp_idf::esp_app_desc!();

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn log_report(report: &AdvanceReport) {
    for failure in report.failures() {
        match failure {
            Selection::Failed { index, name, error } => {
                warn!("Skipping {=str} (#{}): {}", name.as_str(), index, error)
            }
            Selection::Missing { index } => {
                error!("Image #{} not found, root directory changed", index)
            }
            Selection::Unavailable(e) => error!("Failed to open root directory: {}", e),
            Selection::Shown { .. } => {}
        }
    }

    if let Some(Selection::Shown { index, name }) = report.shown() {
        info!("Showing {=str} (#{}, {})", name.as_str(), index, report.reason);
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    // The compressed file (up to `max_file_bytes`) needs the larger region;
    // the decoded MCU row and directory snapshots fit in either
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 64 * 1024);
    esp_alloc::heap_allocator!(size: 96 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Slideshow starting...");
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

    let (panel, _backlight) = match board::init_display(display_pins, &config.display) {
        Ok(display) => display,
        Err(e) => {
            error!("Display init failed: {}", e);
            halt().await
        }
    };

    let mut presenter = JpegPresenter::new(panel, config.slideshow.max_file_bytes as usize);

    let sd_pins = SdPins {
        spi: peripherals.SPI3,
        sck: peripherals.GPIO18,
        miso: peripherals.GPIO19,
        mosi: peripherals.GPIO23,
        cs: peripherals.GPIO5,
    };

    let card = match board::init_sd(sd_pins, &config.storage) {
        Ok(card) => card,
        Err(e) => {
            error!("Card init failed: {}", e);
            report_fatal(
                &mut TextScreen::new(presenter.target_mut()),
                &["Card Mount Failed"],
            );
            halt().await
        }
    };

    let mut storage = match SdStorage::mount(card, FixedTime) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Volume open failed: {}", e);
            report_fatal(
                &mut TextScreen::new(presenter.target_mut()),
                &["Card Mount Failed"],
            );
            halt().await
        }
    };

    let touch_pins = TouchPins {
        clk: peripherals.GPIO25,
        mosi: peripherals.GPIO32,
        miso: peripherals.GPIO39,
        cs: peripherals.GPIO33,
    };

    let mut touch = match board::init_touch_soft(touch_pins, &config.touch) {
        Ok(touch) => touch,
        Err(e) => {
            error!("Touch init failed: {}", e);
            report_fatal(
                &mut TextScreen::new(presenter.target_mut()),
                &["Touch init failed"],
            );
            halt().await
        }
    };

    let button = board::init_button(peripherals.GPIO0);
    spawner
        .spawn(button_task(button, config.slideshow.button_debounce_ms))
        .unwrap();

    let mut slideshow = match Slideshow::start(&mut storage, &BUTTON, &config.slideshow, now_ms()) {
        Ok(slideshow) => slideshow,
        Err(CatalogError::RootUnavailable(e)) => {
            error!("Root directory: {}", e);
            report_fatal(
                &mut TextScreen::new(presenter.target_mut()),
                &["Failed to open", "root directory"],
            );
            halt().await
        }
        Err(CatalogError::Empty) => {
            report_fatal(
                &mut TextScreen::new(presenter.target_mut()),
                &["No JPG files found"],
            );
            halt().await
        }
    };

    info!("Found {} JPG files", slideshow.len());

    let report = slideshow.show_current(&mut storage, &mut presenter, now_ms());
    log_report(&report);

    let mut ticker = Ticker::every(Duration::from_millis(config.slideshow.tick_ms as u64));

    loop {
        ticker.next().await;

        let pressure = match touch.pressure() {
            Ok(pressure) => pressure,
            Err(e) => {
                debug!("Touch read failed: {}", e);
                0
            }
        };

        if let Some(report) = slideshow.tick(&mut storage, &mut presenter, now_ms(), pressure) {
            log_report(&report);
        }
    }
}
