//! Build script for cyd-firmware
//!
//! - Passes the esp-hal and defmt linker scripts to the binaries
//! - Validates cyd.toml at compile time

use std::fs;
use std::path::Path;

use cyd_core::config::{parse_board_config, ConfigError};

fn main() {
    setup_linker();
    validate_config();
}

/// Linker scripts for the ESP32 binaries
fn setup_linker() {
    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate cyd.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=cyd.toml");

    let config_path = Path::new("cyd.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: cyd.toml not found!                                      ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds cyd.toml from the cyd-firmware directory.   ║\n\
            ║  An empty file selects the stock board defaults.                 ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read cyd.toml                                  ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let message = match parse_board_config(&content) {
        Ok(_) => {
            println!("cargo:warning=cyd.toml validated successfully");
            return;
        }
        Err(ConfigError::Parse) => {
            String::from("Invalid TOML, unknown key, or wrong value type")
        }
        Err(ConfigError::Invalid(key)) => format!("Value out of range: {}", key),
    };

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid cyd.toml                                         ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        ║  • {:<62} ║\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        message
    );
}
