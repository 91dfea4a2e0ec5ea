//! Bit-banged SPI bus (mode 0, MSB first)
//!
//! The CYD wires the touch controller to its own pins. When both hardware
//! SPI peripherals are taken by the panel and the SD card, the touch
//! controller is clocked from GPIO instead. Wrap the bus in an
//! `embedded-hal-bus` device to add chip select.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};

/// Software SPI bus
pub struct SoftSpi<SCK, MOSI, MISO, D> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    delay: D,
    half_period_ns: u32,
}

impl<SCK, MOSI, MISO, D> SoftSpi<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    /// Create a bus clocked at roughly `freq_khz`
    ///
    /// The clock idles low. The actual rate is lower than requested because
    /// pin writes take time of their own.
    pub fn new(mut sck: SCK, mosi: MOSI, miso: MISO, delay: D, freq_khz: u32) -> Self {
        // Idle state; a failing pin surfaces on the first transfer
        let _ = sck.set_low();
        Self {
            sck,
            mosi,
            miso,
            delay,
            half_period_ns: half_period_ns(freq_khz),
        }
    }

    /// Shift one byte out and one byte in
    fn exchange(&mut self, out: u8) -> Result<u8, ErrorKind> {
        let mut input = 0u8;

        for bit in (0..8).rev() {
            if out & (1 << bit) != 0 {
                self.mosi.set_high().map_err(|_| ErrorKind::Other)?;
            } else {
                self.mosi.set_low().map_err(|_| ErrorKind::Other)?;
            }
            self.delay.delay_ns(self.half_period_ns);

            self.sck.set_high().map_err(|_| ErrorKind::Other)?;
            if self.miso.is_high().map_err(|_| ErrorKind::Other)? {
                input |= 1 << bit;
            }
            self.delay.delay_ns(self.half_period_ns);

            self.sck.set_low().map_err(|_| ErrorKind::Other)?;
        }

        Ok(input)
    }
}

/// Half clock period for a frequency in kHz (at least 1 ns)
fn half_period_ns(freq_khz: u32) -> u32 {
    let freq_khz = freq_khz.max(1);
    (500_000 / freq_khz).max(1)
}

impl<SCK, MOSI, MISO, D> ErrorType for SoftSpi<SCK, MOSI, MISO, D> {
    type Error = ErrorKind;
}

impl<SCK, MOSI, MISO, D> SpiBus<u8> for SoftSpi<SCK, MOSI, MISO, D>
where
    SCK: OutputPin,
    MOSI: OutputPin,
    MISO: InputPin,
    D: DelayNs,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange(0)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &word in words {
            self.exchange(word)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let input = self.exchange(write.get(i).copied().unwrap_or(0))?;
            if let Some(slot) = read.get_mut(i) {
                *slot = input;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words {
            *word = self.exchange(*word)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
