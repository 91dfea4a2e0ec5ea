//! JPEG presenter
//!
//! Reads the whole compressed file into a reusable buffer, then decodes it
//! one MCU row at a time, pushing each strip with `fill_contiguous` at its
//! place in the centered image. Peak memory is the file plus one strip, so
//! full-screen images fit the heap. Images larger than the target are
//! rejected before anything is drawn.
//!
//! Header errors leave the panel untouched. Corrupt entropy-coded data is
//! only found while drawing, so a part of the image may already be on the
//! panel when [`PresentError::Decode`] is returned.

use alloc::vec::Vec;

use cyd_core::traits::{ImagePresenter, PresentError, ReadFile};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::decoder::{JpegDecoder, JpegError, Strip};

/// Convert an RGB888 pixel to the panel format
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

/// Top-left corner that centers `image` on `screen`
pub fn centered(screen: Size, image: Size) -> Point {
    Point::new(
        (screen.width.saturating_sub(image.width) / 2) as i32,
        (screen.height.saturating_sub(image.height) / 2) as i32,
    )
}

impl From<JpegError> for PresentError {
    fn from(_: JpegError) -> Self {
        PresentError::Decode
    }
}

/// JPEG presenter drawing into an `embedded-graphics` target
pub struct JpegPresenter<D> {
    target: D,
    file: Vec<u8>,
    max_file_bytes: usize,
}

impl<D> JpegPresenter<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    /// Create a presenter reading files of at most `max_file_bytes`
    pub fn new(target: D, max_file_bytes: usize) -> Self {
        Self {
            target,
            file: Vec::new(),
            max_file_bytes,
        }
    }

    /// Borrow the draw target (for status screens between images)
    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    /// Release the draw target
    pub fn release(self) -> D {
        self.target
    }

    fn draw(&mut self) -> Result<(), PresentError> {
        let jpeg = JpegDecoder::parse(&self.file)?;

        let screen = self.target.size();
        let size = jpeg.size();
        if size.width > screen.width || size.height > screen.height {
            return Err(PresentError::TooLarge);
        }

        if size != screen {
            self.target
                .clear(Rgb565::BLACK)
                .map_err(|_| PresentError::Display)?;
        }

        let origin = centered(screen, size);
        let target = &mut self.target;

        jpeg.decode(|strip: Strip<'_>| {
            let area = Rectangle::new(
                origin + Point::new(0, strip.y as i32),
                Size::new(strip.width as u32, strip.rows as u32),
            );
            target
                .fill_contiguous(&area, strip.pixels.iter().copied())
                .map_err(|_| PresentError::Display)
        })
    }
}

impl<D> ImagePresenter for JpegPresenter<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    fn present<F: ReadFile>(&mut self, _name: &str, file: &mut F) -> Result<(), PresentError> {
        if file.read_to_end(&mut self.file, self.max_file_bytes)?.is_none() {
            return Err(PresentError::TooLarge);
        }

        let result = self.draw();
        self.file.clear();
        result
    }
}
