//! SD card storage over `embedded-sdmmc`
//!
//! The volume manager only iterates directories through a callback, so an
//! opened directory is read into memory once and the card handle is closed
//! immediately. Only files stay open on the card while in use; they are
//! closed when the [`SdFile`] guard drops.

use alloc::vec::Vec;
use core::fmt::Write;

use cyd_core::inventory::CardKind;
use cyd_core::traits::storage::{path_components, split_parent, MAX_NAME_LEN};
use cyd_core::traits::{DirEntry, Directory, ReadFile, Storage, StorageError};
use embedded_sdmmc::sdcard::CardType;
use embedded_sdmmc::{
    BlockDevice, Error, Mode, RawDirectory, RawFile, RawVolume, TimeSource, Timestamp,
    VolumeIdx, VolumeManager,
};
use heapless::String;

/// Map a volume manager error onto the storage error set
pub fn map_error<E: core::fmt::Debug>(error: Error<E>) -> StorageError {
    match error {
        Error::DeviceError(_) => StorageError::Device,
        Error::NotFound => StorageError::NotFound,
        Error::OpenedFileAsDir => StorageError::NotADirectory,
        Error::OpenedDirAsFile => StorageError::NotAFile,
        Error::TooManyOpenDirs | Error::TooManyOpenFiles | Error::TooManyOpenVolumes => {
            StorageError::TooManyOpen
        }
        Error::FilenameError(_) => StorageError::InvalidName,
        _ => StorageError::Other,
    }
}

/// Map the card type reported after initialization
pub fn card_kind(card_type: Option<CardType>) -> CardKind {
    match card_type {
        Some(CardType::SD1) | Some(CardType::SD2) => CardKind::Sdsc,
        Some(CardType::SDHC) => CardKind::Sdhc,
        None => CardKind::Unknown,
    }
}

/// Fixed timestamp source (the demos never write to the card)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 54,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

/// First FAT volume of a block device
pub struct SdStorage<D: BlockDevice, T: TimeSource> {
    volumes: VolumeManager<D, T>,
    volume: RawVolume,
}

impl<D: BlockDevice, T: TimeSource> SdStorage<D, T> {
    /// Open the first partition of the device
    pub fn mount(device: D, time: T) -> Result<Self, StorageError> {
        let mut volumes = VolumeManager::new(device, time);
        let volume = volumes.open_raw_volume(VolumeIdx(0)).map_err(map_error)?;
        Ok(Self { volumes, volume })
    }

    /// Open the directory at `path`, closing intermediate handles on the way
    fn walk(&mut self, path: &str) -> Result<RawDirectory, StorageError> {
        let mut dir = self.volumes.open_root_dir(self.volume).map_err(map_error)?;

        for part in path_components(path) {
            let child = self.volumes.open_dir(dir, part);
            let _ = self.volumes.close_dir(dir);
            dir = child.map_err(map_error)?;
        }

        Ok(dir)
    }

    /// Read every entry of an open directory and close it
    fn snapshot(&mut self, dir: RawDirectory) -> Result<SdDir, StorageError> {
        let mut entries = Vec::new();
        let result = self.volumes.iterate_dir(dir, |entry| {
            if entry.attributes.is_volume() {
                return;
            }

            let mut name: String<MAX_NAME_LEN> = String::new();
            // 8.3 names always fit
            let _ = write!(name, "{}", entry.name);

            entries.push(if entry.attributes.is_directory() {
                DirEntry::dir(&name)
            } else {
                DirEntry::file(&name, entry.size)
            });
        });

        let _ = self.volumes.close_dir(dir);
        result.map_err(map_error)?;

        Ok(SdDir { entries, pos: 0 })
    }
}

impl<D: BlockDevice, T: TimeSource> Storage for SdStorage<D, T> {
    type Dir = SdDir;
    type File<'a>
        = SdFile<'a, D, T>
    where
        Self: 'a;

    fn open_root(&mut self) -> Result<SdDir, StorageError> {
        let dir = self.volumes.open_root_dir(self.volume).map_err(map_error)?;
        self.snapshot(dir)
    }

    fn open_dir(&mut self, path: &str) -> Result<SdDir, StorageError> {
        let dir = self.walk(path)?;
        self.snapshot(dir)
    }

    fn open_file(&mut self, path: &str) -> Result<SdFile<'_, D, T>, StorageError> {
        let (parent, name) = split_parent(path);
        let dir = self.walk(parent)?;

        let file = self.volumes.open_file_in_dir(dir, name, Mode::ReadOnly);
        let _ = self.volumes.close_dir(dir);
        let raw = file.map_err(map_error)?;

        let len = match self.volumes.file_length(raw) {
            Ok(len) => len,
            Err(e) => {
                let _ = self.volumes.close_file(raw);
                return Err(map_error(e));
            }
        };

        Ok(SdFile {
            volumes: &mut self.volumes,
            raw,
            len,
        })
    }
}

/// Directory contents read at open time
#[derive(Debug, Clone)]
pub struct SdDir {
    entries: Vec<DirEntry>,
    pos: usize,
}

impl SdDir {
    /// Number of entries read
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Directory for SdDir {
    fn next_entry(&mut self) -> Option<DirEntry> {
        let entry = self.entries.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }
}

/// Open file; closed on drop
///
/// Holds the volume manager exclusively, so no other handle can be opened
/// until the guard is gone.
pub struct SdFile<'a, D: BlockDevice, T: TimeSource> {
    volumes: &'a mut VolumeManager<D, T>,
    raw: RawFile,
    len: u32,
}

impl<D: BlockDevice, T: TimeSource> ReadFile for SdFile<'_, D, T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.volumes.read(self.raw, buf) {
            Ok(n) => Ok(n),
            Err(Error::EndOfFile) => Ok(0),
            Err(e) => Err(map_error(e)),
        }
    }

    fn len(&self) -> u32 {
        self.len
    }
}

impl<D: BlockDevice, T: TimeSource> Drop for SdFile<'_, D, T> {
    fn drop(&mut self) {
        let _ = self.volumes.close_file(self.raw);
    }
}
