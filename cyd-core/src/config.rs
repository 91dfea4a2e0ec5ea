//! Board configuration
//!
//! Tunables for the three demos. The firmware embeds `cyd.toml` and parses it
//! at boot with [`parse_board_config`]; every field has a default matching the
//! stock ESP32-2432S028 board, so an empty file is valid.

use serde::Deserialize;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML syntax or type error
    Parse,
    /// Value out of range (names the offending key)
    Invalid(&'static str),
}

/// Panel geometry and bus settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Logical width after rotation
    pub width: u16,
    /// Logical height after rotation
    pub height: u16,
    /// SPI clock in MHz
    pub spi_mhz: u32,
    /// Invert panel colors
    pub invert_colors: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            spi_mhz: 40,
            invert_colors: false,
        }
    }
}

/// Touch controller calibration and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct TouchConfig {
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
    /// Minimum raw pressure reported as a touch
    pub pressure_threshold: u16,
    /// Controller rotation (0-3)
    pub rotation: u8,
    /// Delay after each handled touch in the echo demo
    pub debounce_ms: u32,
    /// SPI clock in kHz
    pub spi_khz: u32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            x_min: 200,
            x_max: 3700,
            y_min: 240,
            y_max: 3800,
            pressure_threshold: 300,
            rotation: 1,
            debounce_ms: 100,
            spi_khz: 2000,
        }
    }
}

/// SD card settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SPI clock in MHz once the card is initialized
    pub spi_mhz: u32,
    /// Recursion levels for the inventory listing
    pub list_levels: u8,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            spi_mhz: 20,
            list_levels: 0,
        }
    }
}

/// Slideshow timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct SlideshowConfig {
    /// Advance after this long without another trigger
    pub interval_ms: u32,
    /// Main loop poll period
    pub tick_ms: u32,
    /// Ignore further button edges for this long after a press
    pub button_debounce_ms: u32,
    /// Largest JPEG file read into memory
    pub max_file_bytes: u32,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            tick_ms: 20,
            button_debounce_ms: 50,
            max_file_bytes: 64 * 1024,
        }
    }
}

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub display: DisplayConfig,
    pub touch: TouchConfig,
    pub storage: StorageConfig,
    pub slideshow: SlideshowConfig,
}

impl BoardConfig {
    /// Check value ranges the TOML types cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width == 0 {
            return Err(ConfigError::Invalid("display.width"));
        }
        if self.display.height == 0 {
            return Err(ConfigError::Invalid("display.height"));
        }
        if self.touch.x_min >= self.touch.x_max {
            return Err(ConfigError::Invalid("touch.x_min"));
        }
        if self.touch.y_min >= self.touch.y_max {
            return Err(ConfigError::Invalid("touch.y_min"));
        }
        if self.touch.rotation > 3 {
            return Err(ConfigError::Invalid("touch.rotation"));
        }
        if self.slideshow.interval_ms == 0 {
            return Err(ConfigError::Invalid("slideshow.interval_ms"));
        }
        if self.slideshow.tick_ms == 0 {
            return Err(ConfigError::Invalid("slideshow.tick_ms"));
        }
        Ok(())
    }
}

/// Parse and validate a TOML board configuration
pub fn parse_board_config(input: &str) -> Result<BoardConfig, ConfigError> {
    let config: BoardConfig = toml::from_str(input).map_err(|_| ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
}
