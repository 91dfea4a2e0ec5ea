//! Text screen on an `embedded-graphics` target
//!
//! Rows are 20 px tall (10x20 font). Every line is horizontally centered
//! and drawn over a background-filled band, so shorter text replaces longer
//! text cleanly.

use cyd_core::traits::{DisplayError, TextDisplay};
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

const FONT: &MonoFont<'static> = &FONT_10X20;

/// Line-oriented text renderer
pub struct TextScreen<'d, D> {
    target: &'d mut D,
    foreground: Rgb565,
    background: Rgb565,
}

impl<'d, D> TextScreen<'d, D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    /// White on black
    pub fn new(target: &'d mut D) -> Self {
        Self::with_colors(target, Rgb565::WHITE, Rgb565::BLACK)
    }

    pub fn with_colors(target: &'d mut D, foreground: Rgb565, background: Rgb565) -> Self {
        Self {
            target,
            foreground,
            background,
        }
    }

    fn row_height() -> u32 {
        FONT.character_size.height
    }
}

impl<D> TextDisplay for TextScreen<'_, D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.target
            .clear(self.background)
            .map_err(|_| DisplayError::Draw)
    }

    fn text_centered(&mut self, row: u8, text: &str) -> Result<(), DisplayError> {
        let size = self.target.size();
        let top = row as i32 * Self::row_height() as i32;

        Rectangle::new(Point::new(0, top), Size::new(size.width, Self::row_height()))
            .into_styled(PrimitiveStyle::with_fill(self.background))
            .draw(&mut *self.target)
            .map_err(|_| DisplayError::Draw)?;

        let character_style = MonoTextStyle::new(FONT, self.foreground);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();

        Text::with_text_style(
            text,
            Point::new(size.width as i32 / 2, top),
            character_style,
            text_style,
        )
        .draw(&mut *self.target)
        .map_err(|_| DisplayError::Draw)?;

        Ok(())
    }

    fn rows(&self) -> u8 {
        (self.target.size().height / Self::row_height()).min(u8::MAX as u32) as u8
    }
}
