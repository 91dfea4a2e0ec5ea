//! SPI bus implementations

pub mod soft;

pub use soft::SoftSpi;
