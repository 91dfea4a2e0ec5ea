//! Text rendering on pixel displays

pub mod text;

pub use text::TextScreen;
