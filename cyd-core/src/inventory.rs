//! SD card inventory: card metadata and a recursive directory listing
//!
//! The lister only produces output through a [`ListingSink`]; the firmware
//! sink writes log lines, the tests record calls.

use heapless::String;

use crate::traits::storage::{join_path, MAX_PATH_LEN};
use crate::traits::{Directory, Storage, StorageError};

/// Card type as reported by the SD driver
///
/// The SPI-mode driver only initializes SD cards, so there is no MMC kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardKind {
    Sdsc,
    Sdhc,
    Unknown,
}

impl CardKind {
    /// Label printed by the inventory demo
    pub fn label(&self) -> &'static str {
        match self {
            CardKind::Sdsc => "SDSC",
            CardKind::Sdhc => "SDHC",
            CardKind::Unknown => "UNKNOWN",
        }
    }
}

/// Card size in whole MiB
pub fn size_mib(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Receiver for listing output
pub trait ListingSink {
    /// A directory is about to be listed (`depth` 0 is the starting path)
    fn listing(&mut self, _path: &str, _depth: u8) {}

    /// A sub-directory entry, reported whether or not it is descended into
    fn directory(&mut self, name: &str, depth: u8);

    /// A file entry
    fn file(&mut self, name: &str, size: u32, depth: u8);

    /// A directory could not be opened; the listing skips it
    fn open_failed(&mut self, path: &str, error: StorageError);
}

/// List `path`, descending at most `levels` directory levels
///
/// With `levels == 0` only the immediate children of `path` are reported.
/// An unopenable directory is reported to the sink and skipped.
pub fn list_dir<S: Storage, K: ListingSink>(storage: &mut S, path: &str, levels: u8, sink: &mut K) {
    list_level(storage, path, levels, 0, sink);
}

fn list_level<S: Storage, K: ListingSink>(
    storage: &mut S,
    path: &str,
    levels: u8,
    depth: u8,
    sink: &mut K,
) {
    let mut dir = match storage.open_dir(path) {
        Ok(dir) => dir,
        Err(e) => {
            sink.open_failed(path, e);
            return;
        }
    };

    sink.listing(path, depth);

    while let Some(entry) = dir.next_entry() {
        if entry.is_dot() {
            continue;
        }

        if !entry.is_directory() {
            sink.file(entry.name(), entry.size, depth);
            continue;
        }

        sink.directory(entry.name(), depth);
        if levels == 0 {
            continue;
        }

        let mut child: String<MAX_PATH_LEN> = String::new();
        match join_path(path, entry.name(), &mut child) {
            Ok(()) => list_level(storage, &child, levels - 1, depth + 1, sink),
            Err(e) => sink.open_failed(entry.name(), e),
        }
    }
}

/// Sink wrapper that totals what it forwards
#[derive(Debug)]
pub struct ListingSummary<K> {
    inner: K,
    pub files: u32,
    pub dirs: u32,
    pub bytes: u64,
    pub failures: u32,
}

impl<K: ListingSink> ListingSummary<K> {
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            files: 0,
            dirs: 0,
            bytes: 0,
            failures: 0,
        }
    }

    /// Unwrap the forwarded sink
    pub fn into_inner(self) -> K {
        self.inner
    }
}

impl<K: ListingSink> ListingSink for ListingSummary<K> {
    fn listing(&mut self, path: &str, depth: u8) {
        self.inner.listing(path, depth);
    }

    fn directory(&mut self, name: &str, depth: u8) {
        self.dirs += 1;
        self.inner.directory(name, depth);
    }

    fn file(&mut self, name: &str, size: u32, depth: u8) {
        self.files += 1;
        self.bytes += size as u64;
        self.inner.file(name, size, depth);
    }

    fn open_failed(&mut self, path: &str, error: StorageError) {
        self.failures += 1;
        self.inner.open_failed(path, error);
    }
}
