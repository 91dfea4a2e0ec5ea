//! Async tasks

pub mod button;

pub use button::{button_task, BUTTON};
