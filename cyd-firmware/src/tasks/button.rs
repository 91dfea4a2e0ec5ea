//! BOOT button task
//!
//! Turns falling edges on GPIO0 into presses on [`BUTTON`]. The slideshow
//! loop takes the flag on its next tick; presses inside the debounce window
//! are ignored.

use cyd_core::button::ButtonFlag;
use defmt::*;
use embassy_time::Timer;
use esp_hal::gpio::Input;

/// Press flag shared with the slideshow loop
pub static BUTTON: ButtonFlag = ButtonFlag::new();

#[embassy_executor::task]
pub async fn button_task(mut button: Input<'static>, debounce_ms: u32) {
    info!("Button task started");

    loop {
        button.wait_for_falling_edge().await;
        debug!("Button pressed");
        BUTTON.set();

        Timer::after_millis(debounce_ms as u64).await;
    }
}
