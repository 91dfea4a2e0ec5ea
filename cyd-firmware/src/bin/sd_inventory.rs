//! SD card inventory
//!
//! Mounts the card, logs its type and size, then lists the root directory
//! down to `storage.list_levels` levels with a closing summary.

#![no_std]
#![no_main]

extern crate alloc;

use cyd_core::inventory::{list_dir, size_mib, ListingSummary};
use cyd_drivers::storage::{card_kind, FixedTime, SdStorage};
use cyd_firmware::board::{self, SdPins};
use cyd_firmware::log::LogSink;
use cyd_firmware::{config, halt};
use defmt::*;
use embassy_executor::Spawner;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use {esp_backtrace as _, esp_println as _};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 64 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("SD inventory starting...");
    let config = config::load();

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
            error!("Card Mount Failed: {}", e);
            halt().await
        }
    };

    let kind = card_kind(card.get_card_type());
    info!("SD Card Type: {=str}", kind.label());

    match card.num_bytes() {
        Ok(bytes) => info!("SD Card Size: {=u64}MB", size_mib(bytes)),
        Err(_) => warn!("SD Card Size: unknown"),
    }

    let mut storage = match SdStorage::mount(card, FixedTime) {
        Ok(storage) => storage,
        Err(e) => {
            error!("No FAT volume on card: {}", e);
            halt().await
        }
    };

    let mut summary = ListingSummary::new(LogSink);
    list_dir(&mut storage, "/", config.storage.list_levels, &mut summary);

    info!(
        "{=u32} files, {=u32} directories, {=u64} bytes ({=u32} unreadable)",
        summary.files,
        summary.dirs,
        summary.bytes,
        summary.failures
    );

    halt().await
}
