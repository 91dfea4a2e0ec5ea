//! ESP32-2432S028 ("Cheap Yellow Display") pin map and peripheral bring-up
//!
//! | Peripheral       | Bus          | Pins                                      |
//! |------------------|--------------|-------------------------------------------|
//! | ILI9341 panel    | SPI2         | SCK 14, MOSI 13, MISO 12, CS 15, DC 2     |
//! | Backlight        | GPIO         | 21 (active high)                          |
//! | XPT2046 touch    | SPI3 or GPIO | CLK 25, MOSI 32, MISO 39, CS 33, IRQ 36   |
//! | SD card slot     | SPI3         | SCK 18, MISO 19, MOSI 23, CS 5            |
//! | BOOT button      | GPIO         | 0 (active low, external pull-up)          |
//!
//! The touch controller and the SD slot sit on different pins but the chip
//! only has two general purpose SPI hosts. The slideshow, which needs all
//! three devices, clocks the touch controller from GPIO.

use cyd_core::config::{DisplayConfig, StorageConfig, TouchConfig};
use cyd_drivers::spi::SoftSpi;
use cyd_drivers::touch::{Xpt2046, Xpt2046Config};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{
    GPIO0, GPIO12, GPIO13, GPIO14, GPIO15, GPIO18, GPIO19, GPIO2, GPIO21, GPIO23, GPIO25, GPIO32,
    GPIO33, GPIO39, GPIO5, SPI2, SPI3,
};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use esp_hal::Blocking;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{ColorInversion, ColorOrder, Orientation, Rotation};
use mipidsi::{Builder, NoResetPin};
use static_cell::StaticCell;

/// SD cards must be initialized at 400 kHz or less
const SD_INIT_KHZ: u32 = 400;

/// Bring-up failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BoardError {
    /// SPI host rejected the clock configuration
    SpiConfig,
    /// Panel did not accept the init sequence
    Display,
    /// Card did not answer the init sequence
    Card,
}

/// Hardware SPI device with an exclusive chip select
pub type SpiDev = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;

/// Initialized ILI9341 panel, landscape
pub type Panel =
    mipidsi::Display<SpiInterface<'static, SpiDev, Output<'static>>, ILI9341Rgb565, NoResetPin>;

/// SD card on its own SPI host
pub type Card = SdCard<SpiDev, Delay>;

/// Touch controller on a hardware SPI host
pub type HwTouch = Xpt2046<SpiDev>;

/// Bit-banged touch bus
pub type SoftTouchBus = SoftSpi<Output<'static>, Output<'static>, Input<'static>, Delay>;

/// Touch controller on the bit-banged bus
pub type SoftTouch = Xpt2046<ExclusiveDevice<SoftTouchBus, Output<'static>, Delay>>;

static DISPLAY_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();

pub struct DisplayPins {
    pub spi: SPI2<'static>,
    pub sck: GPIO14<'static>,
    pub mosi: GPIO13<'static>,
    pub miso: GPIO12<'static>,
    pub cs: GPIO15<'static>,
    pub dc: GPIO2<'static>,
    pub backlight: GPIO21<'static>,
}

pub struct SdPins {
    pub spi: SPI3<'static>,
    pub sck: GPIO18<'static>,
    pub miso: GPIO19<'static>,
    pub mosi: GPIO23<'static>,
    pub cs: GPIO5<'static>,
}

pub struct TouchPins {
    pub clk: GPIO25<'static>,
    pub mosi: GPIO32<'static>,
    pub miso: GPIO39<'static>,
    pub cs: GPIO33<'static>,
}

fn spi_config(frequency: Rate) -> SpiConfig {
    SpiConfig::default()
        .with_frequency(frequency)
        .with_mode(Mode::_0)
}

fn chip_select<'d>(pin: impl esp_hal::gpio::OutputPin + 'd) -> Output<'d> {
    Output::new(pin, Level::High, OutputConfig::default())
}

/// Bring up the panel and switch the backlight on
///
/// Call once per boot; the interface buffer is a `StaticCell`. The backlight
/// pin is returned so the caller keeps it driven.
pub fn init_display(
    pins: DisplayPins,
    config: &DisplayConfig,
) -> Result<(Panel, Output<'static>), BoardError> {
    let spi = Spi::new(pins.spi, spi_config(Rate::from_mhz(config.spi_mhz)))
        .map_err(|_| BoardError::SpiConfig)?
        .with_sck(pins.sck)
        .with_mosi(pins.mosi)
        .with_miso(pins.miso);

    let device = ExclusiveDevice::new(spi, chip_select(pins.cs), Delay::new())
        .map_err(|_| BoardError::Display)?;
    let dc = Output::new(pins.dc, Level::Low, OutputConfig::default());
    let buffer = DISPLAY_BUFFER.init([0; 512]);

    let inversion = if config.invert_colors {
        ColorInversion::Inverted
    } else {
        ColorInversion::Normal
    };

    // Native size is portrait; the rotation yields the configured landscape size
    let panel = Builder::new(ILI9341Rgb565, SpiInterface::new(device, dc, buffer))
        .display_size(config.height, config.width)
        .orientation(Orientation::new().rotate(Rotation::Deg90).flip_horizontal())
        .color_order(ColorOrder::Bgr)
        .invert_colors(inversion)
        .init(&mut Delay::new())
        .map_err(|_| BoardError::Display)?;

    let backlight = Output::new(pins.backlight, Level::High, OutputConfig::default());

    Ok((panel, backlight))
}

/// Initialize the SD card at 400 kHz, then raise the clock
pub fn init_sd(pins: SdPins, config: &StorageConfig) -> Result<Card, BoardError> {
    let spi = Spi::new(pins.spi, spi_config(Rate::from_khz(SD_INIT_KHZ)))
        .map_err(|_| BoardError::SpiConfig)?
        .with_sck(pins.sck)
        .with_mosi(pins.mosi)
        .with_miso(pins.miso);

    let device = ExclusiveDevice::new(spi, chip_select(pins.cs), Delay::new())
        .map_err(|_| BoardError::Card)?;
    let card = SdCard::new(device, Delay::new());

    // First command runs the card init sequence
    card.num_bytes().map_err(|_| BoardError::Card)?;

    let fast = spi_config(Rate::from_mhz(config.spi_mhz));
    card.spi(|device| device.bus_mut().apply_config(&fast))
        .map_err(|_| BoardError::SpiConfig)?;

    Ok(card)
}

/// Touch controller on SPI3 (free when the SD card is unused)
pub fn init_touch_hw(
    spi: SPI3<'static>,
    pins: TouchPins,
    config: &TouchConfig,
) -> Result<HwTouch, BoardError> {
    let spi = Spi::new(spi, spi_config(Rate::from_khz(config.spi_khz)))
        .map_err(|_| BoardError::SpiConfig)?
        .with_sck(pins.clk)
        .with_mosi(pins.mosi)
        .with_miso(pins.miso);

    let device = ExclusiveDevice::new(spi, chip_select(pins.cs), Delay::new())
        .map_err(|_| BoardError::SpiConfig)?;

    Ok(Xpt2046::new(device, Xpt2046Config::from(config)))
}

/// Touch controller on a bit-banged bus
pub fn init_touch_soft(pins: TouchPins, config: &TouchConfig) -> Result<SoftTouch, BoardError> {
    let bus = SoftSpi::new(
        Output::new(pins.clk, Level::Low, OutputConfig::default()),
        Output::new(pins.mosi, Level::Low, OutputConfig::default()),
        Input::new(pins.miso, InputConfig::default()),
        Delay::new(),
        config.spi_khz,
    );

    let device = ExclusiveDevice::new(bus, chip_select(pins.cs), Delay::new())
        .map_err(|_| BoardError::SpiConfig)?;

    Ok(Xpt2046::new(device, Xpt2046Config::from(config)))
}

/// BOOT button input
pub fn init_button(pin: GPIO0<'static>) -> Input<'static> {
    Input::new(pin, InputConfig::default().with_pull(Pull::Up))
}
