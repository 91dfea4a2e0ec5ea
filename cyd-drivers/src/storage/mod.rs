//! Storage backends

pub mod sdmmc;

pub use sdmmc::{card_kind, FixedTime, SdDir, SdFile, SdStorage};
