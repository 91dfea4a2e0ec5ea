//! Shared support for the Cheap Yellow Display demo binaries
//!
//! Each binary in `src/bin` is an independent firmware image. This library
//! holds what they have in common: the board pin map and peripheral
//! bring-up, the embedded configuration, the button task and the fatal
//! error path.

#![no_std]

pub mod board;
pub mod config;
pub mod log;
pub mod tasks;

use cyd_core::traits::{DisplayExt, TextDisplay};
use defmt::*;
use embassy_time::Timer;

/// Park the firmware forever
///
/// Used after a fatal startup error; the message stays on the panel and the
/// executor keeps servicing other tasks.
pub async fn halt() -> ! {
    loop {
        Timer::after_secs(3600).await;
    }
}

/// Log a fatal error and show it on the panel
pub fn report_fatal<D: TextDisplay>(display: &mut D, lines: &[&str]) {
    for line in lines {
        error!("{=str}", line);
    }

    if display.draw_message(lines).is_err() {
        error!("Display unavailable for error message");
    }
}
