//! Touch sensor trait

/// Errors that can occur reading the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchError {
    /// SPI transfer failed
    Bus,
}

/// A raw touch sample in controller units
///
/// `x` and `y` are 12-bit ADC values (0-4095) after rotation.
/// `z` is the pressure estimate; 0 means no touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawPoint {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

/// Trait for resistive/capacitive touch sensors
pub trait TouchSensor {
    /// Check whether the panel is currently touched
    fn touched(&mut self) -> Result<bool, TouchError>;

    /// Read a raw point
    ///
    /// Returns a point with `z == 0` when the panel is not touched.
    fn read_raw(&mut self) -> Result<RawPoint, TouchError>;

    /// Read the current pressure (0 when untouched)
    fn pressure(&mut self) -> Result<u16, TouchError> {
        self.read_raw().map(|p| p.z)
    }
}
