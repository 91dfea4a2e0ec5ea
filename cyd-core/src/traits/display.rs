//! Text display trait for status and readout screens

use core::fmt::Write;
use heapless::String;

/// Errors that can occur drawing to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Pixel transfer to the panel failed
    Draw,
}

/// Longest line the helpers format
pub const MAX_LINE_LEN: usize = 40;

/// Trait for drawing lines of text
///
/// Rows are text rows of the implementation's font, counted from the top.
pub trait TextDisplay {
    /// Fill the whole screen with the background color
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw text horizontally centered on a row
    fn text_centered(&mut self, row: u8, text: &str) -> Result<(), DisplayError>;

    /// Number of text rows that fit on the screen
    fn rows(&self) -> u8;
}

/// Helper trait for drawing common screens
pub trait DisplayExt: TextDisplay {
    /// Draw a labelled integer value, centered: `"Label = value"`
    fn draw_value(&mut self, row: u8, label: &str, value: i32) -> Result<(), DisplayError> {
        let mut line: String<MAX_LINE_LEN> = String::new();
        // Overflow only truncates the line
        let _ = write!(line, "{} = {}", label, value);
        self.text_centered(row, &line)
    }

    /// Clear the screen and show a centered message block
    ///
    /// Lines are placed around the middle row. Lines that do not fit are dropped.
    fn draw_message(&mut self, lines: &[&str]) -> Result<(), DisplayError> {
        self.clear()?;

        let rows = self.rows();
        let count = lines.len().min(rows as usize) as u8;
        let first = (rows - count) / 2;

        for (i, line) in lines.iter().take(count as usize).enumerate() {
            self.text_centered(first + i as u8, line)?;
        }

        Ok(())
    }
}

// Blanket implementation for all TextDisplay types
impl<T: TextDisplay> DisplayExt for T {}
