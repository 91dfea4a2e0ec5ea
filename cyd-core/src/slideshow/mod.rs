//! Slideshow advance loop
//!
//! The slideshow is one owned context ([`Slideshow`]) driven by a
//! cooperative loop. Each tick evaluates the three advance triggers and, if
//! any fired, moves the cursor and presents the next catalog entry.

pub mod context;
pub mod events;
pub mod machine;

pub use context::{AdvanceReport, Slideshow};
pub use events::{AdvanceReason, Event};
pub use machine::State;
