//! Board-agnostic core logic for the Cheap Yellow Display demos
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (storage, touch, text display, image presenter)
//! - Recursive directory lister for the SD inventory demo
//! - JPEG catalog scan and selection
//! - Slideshow state machine and advance loop
//! - Touch calibration and the touch echo loop body
//! - Board configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod button;
pub mod catalog;
pub mod config;
pub mod inventory;
pub mod slideshow;
pub mod touch;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;
