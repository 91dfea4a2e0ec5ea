//! Image presenters

pub mod decoder;
pub mod jpeg;

pub use decoder::{JpegDecoder, JpegError, Strip};
pub use jpeg::{rgb888_to_rgb565, JpegPresenter};
