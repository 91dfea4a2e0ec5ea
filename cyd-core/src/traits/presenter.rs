//! Image presenter trait
//!
//! A presenter turns an open image file into pixels on the panel.
//! Decoding and blitting both live behind this seam.

use super::storage::{ReadFile, StorageError};

/// Errors that can occur presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresentError {
    /// Reading the file failed
    Read(StorageError),
    /// File or decoded image exceeds the memory budget
    TooLarge,
    /// Bitstream could not be decoded
    Decode,
    /// Pixel transfer to the panel failed
    Display,
}

impl From<StorageError> for PresentError {
    fn from(e: StorageError) -> Self {
        PresentError::Read(e)
    }
}

/// Trait for showing an image file on the display
pub trait ImagePresenter {
    /// Decode `file` and draw it, replacing the previous image
    ///
    /// On error the panel may hold a partially drawn image.
    fn present<F: ReadFile>(&mut self, name: &str, file: &mut F) -> Result<(), PresentError>;
}
