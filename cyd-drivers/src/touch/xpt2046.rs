//! XPT2046 resistive touch controller (SPI)
//!
//! # SPI Protocol
//!
//! Each conversion is one 3-byte transaction: a control byte followed by two
//! dummy bytes. The 12-bit result is left-aligned in the last two bytes
//! received (`(hi << 8 | lo) >> 3`).
//!
//! A full sample reads both pressure plates, then X and Y three times each.
//! The final conversion uses a control byte with the power-down bits clear so
//! the controller returns to its low-power, IRQ-enabled state.

use cyd_core::config::TouchConfig;
use cyd_core::traits::{RawPoint, TouchError, TouchSensor};
use embedded_hal::spi::SpiDevice;

/// Control bytes (start bit, channel, 12-bit, differential, reference off / ADC on)
pub mod cmd {
    /// Z1 pressure plate
    pub const Z1: u8 = 0xB1;
    /// Z2 pressure plate
    pub const Z2: u8 = 0xC1;
    /// X position
    pub const X: u8 = 0xD1;
    /// Y position
    pub const Y: u8 = 0x91;
    /// X position, then power down with IRQ enabled
    pub const X_POWER_DOWN: u8 = 0xD0;
}

/// Full-scale ADC value
pub const ADC_MAX: u16 = 4095;

/// XPT2046 driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Xpt2046Config {
    /// Minimum pressure reported as a touch
    pub pressure_threshold: u16,
    /// Coordinate rotation (0-3)
    pub rotation: u8,
}

impl Default for Xpt2046Config {
    fn default() -> Self {
        Self {
            pressure_threshold: 300,
            rotation: 1,
        }
    }
}

impl From<&TouchConfig> for Xpt2046Config {
    fn from(config: &TouchConfig) -> Self {
        Self {
            pressure_threshold: config.pressure_threshold,
            rotation: config.rotation,
        }
    }
}

/// XPT2046 driver over an SPI device (chip select handled by the device)
pub struct Xpt2046<SPI> {
    spi: SPI,
    config: Xpt2046Config,
}

impl<SPI: SpiDevice> Xpt2046<SPI> {
    pub fn new(spi: SPI, config: Xpt2046Config) -> Self {
        Self { spi, config }
    }

    /// Release the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Run one conversion
    fn convert(&mut self, command: u8) -> Result<u16, TouchError> {
        let mut buf = [command, 0, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| TouchError::Bus)?;
        Ok(((buf[1] as u16) << 8 | buf[2] as u16) >> 3)
    }

    /// Pressure estimate from the two plates (0 below the threshold)
    fn read_pressure(&mut self) -> Result<u16, TouchError> {
        let z1 = self.convert(cmd::Z1)? as i32;
        let z2 = self.convert(cmd::Z2)? as i32;
        let z = (z1 + ADC_MAX as i32 - z2).clamp(0, u16::MAX as i32) as u16;

        if z < self.config.pressure_threshold {
            return Ok(0);
        }
        Ok(z)
    }
}

impl<SPI: SpiDevice> TouchSensor for Xpt2046<SPI> {
    fn touched(&mut self) -> Result<bool, TouchError> {
        Ok(self.read_pressure()? > 0)
    }

    fn read_raw(&mut self) -> Result<RawPoint, TouchError> {
        let z = self.read_pressure()?;
        if z == 0 {
            self.convert(cmd::X_POWER_DOWN)?;
            return Ok(RawPoint::default());
        }

        let y0 = self.convert(cmd::Y)?;
        let x0 = self.convert(cmd::X)?;
        let y1 = self.convert(cmd::Y)?;
        let x1 = self.convert(cmd::X)?;
        let y2 = self.convert(cmd::Y)?;
        let x2 = self.convert(cmd::X_POWER_DOWN)?;

        let x = best_two_average(x0, x1, x2);
        let y = best_two_average(y0, y1, y2);
        let (x, y) = rotate(x, y, self.config.rotation);

        Ok(RawPoint { x, y, z })
    }

    fn pressure(&mut self) -> Result<u16, TouchError> {
        self.read_pressure()
    }
}

/// Average of the two closest samples
pub fn best_two_average(a: u16, b: u16, c: u16) -> u16 {
    let ab = a.abs_diff(b);
    let ac = a.abs_diff(c);
    let bc = b.abs_diff(c);

    let (p, q) = if ab <= ac && ab <= bc {
        (a, b)
    } else if ac <= ab && ac <= bc {
        (a, c)
    } else {
        (b, c)
    };
    ((p as u32 + q as u32) / 2) as u16
}

/// Map controller axes to panel axes
pub fn rotate(x: u16, y: u16, rotation: u8) -> (u16, u16) {
    match rotation {
        0 => (ADC_MAX.saturating_sub(y), x),
        1 => (x, y),
        2 => (y, ADC_MAX.saturating_sub(x)),
        _ => (ADC_MAX.saturating_sub(x), ADC_MAX.saturating_sub(y)),
    }
}
