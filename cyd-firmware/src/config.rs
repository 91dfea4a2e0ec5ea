//! Embedded board configuration
//!
//! `cyd.toml` is compiled into every binary and checked by the build
//! script, so a parse failure here means the file and the parser disagree.

use cyd_core::config::{parse_board_config, BoardConfig};
use defmt::*;

/// Embedded configuration (edit cyd.toml and rebuild to customize)
pub const EMBEDDED_CONFIG: &str = include_str!("../cyd.toml");

/// Parse the embedded configuration, falling back to the board defaults
pub fn load() -> BoardConfig {
    match parse_board_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded cyd.toml ({} bytes)", EMBEDDED_CONFIG.len());
            config
        }
        Err(e) => {
            warn!("cyd.toml rejected ({}), using defaults", e);
            BoardConfig::default()
        }
    }
}
