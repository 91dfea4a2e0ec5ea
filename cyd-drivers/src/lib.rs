//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in cyd-core for the Cheap Yellow Display peripherals:
//!
//! - XPT2046 resistive touch controller (SPI)
//! - Bit-banged SPI bus for the touch controller
//! - SD card storage over `embedded-sdmmc`
//! - Streaming baseline JPEG decoder and a presenter drawing its strips
//!   into an `embedded-graphics` target
//! - Text screen for status and readout lines

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod display;
pub mod image;
pub mod spi;
pub mod storage;
pub mod touch;
