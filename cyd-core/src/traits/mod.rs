//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod display;
pub mod presenter;
pub mod storage;
pub mod touch;

pub use display::{DisplayError, DisplayExt, TextDisplay};
pub use presenter::{ImagePresenter, PresentError};
pub use storage::{DirEntry, Directory, ReadFile, Storage, StorageError};
pub use touch::{RawPoint, TouchError, TouchSensor};
