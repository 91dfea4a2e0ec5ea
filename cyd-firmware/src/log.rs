//! Log output for the directory lister

use cyd_core::inventory::ListingSink;
use cyd_core::traits::StorageError;
use defmt::*;

const INDENT: &str = "                ";

fn indent(depth: u8) -> &'static str {
    let width = (depth as usize * 2).min(INDENT.len());
    &INDENT[..width]
}

/// Writes listing entries as log lines, indented by depth
#[derive(Debug, Default)]
pub struct LogSink;

impl ListingSink for LogSink {
    fn listing(&mut self, path: &str, depth: u8) {
        info!("{=str}Listing directory: {=str}", indent(depth), path);
    }

    fn directory(&mut self, name: &str, depth: u8) {
        info!("{=str}  DIR : {=str}", indent(depth), name);
    }

    fn file(&mut self, name: &str, size: u32, depth: u8) {
        info!("{=str}  FILE: {=str}  SIZE: {=u32}", indent(depth), name, size);
    }

    fn open_failed(&mut self, path: &str, error: StorageError) {
        warn!("Failed to open directory {=str}: {}", path, error);
    }
}
