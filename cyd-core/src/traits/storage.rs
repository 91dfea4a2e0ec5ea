//! Filesystem capability traits
//!
//! The lister and the catalog only ever see a root directory, a stream of
//! entries and read-only files. Backends (SD card, in-memory tree) provide
//! these through [`Storage`].

use alloc::vec::Vec;
use heapless::String;

/// Maximum entry name length (long names are truncated by the backend)
pub const MAX_NAME_LEN: usize = 64;

/// Maximum path length handled by the lister
pub const MAX_PATH_LEN: usize = 128;

/// Errors that can occur with filesystem access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Path does not exist
    NotFound,
    /// Path exists but is a file
    NotADirectory,
    /// Path exists but is a directory
    NotAFile,
    /// Backend handle pool exhausted
    TooManyOpen,
    /// Block device (card) error
    Device,
    /// Name cannot be represented by the backend
    InvalidName,
    /// Any other backend failure
    Other,
}

/// A single directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirEntry {
    /// Entry name without any parent path
    pub name: String<MAX_NAME_LEN>,
    /// Size in bytes (0 for directories)
    pub size: u32,
    /// Entry is a directory
    pub is_dir: bool,
}

impl DirEntry {
    /// Create a file entry
    pub fn file(name: &str, size: u32) -> Self {
        Self {
            name: truncated(name),
            size,
            is_dir: false,
        }
    }

    /// Create a directory entry
    pub fn dir(name: &str) -> Self {
        Self {
            name: truncated(name),
            size: 0,
            is_dir: true,
        }
    }

    /// Entry name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Check if the entry is a directory
    pub fn is_directory(&self) -> bool {
        self.is_dir
    }

    /// Check if the entry is `.` or `..`
    pub fn is_dot(&self) -> bool {
        matches!(self.name.as_str(), "." | "..")
    }
}

fn truncated(name: &str) -> String<MAX_NAME_LEN> {
    let mut out = String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// An open directory, yielding entries in filesystem iteration order
///
/// The handle is released when dropped.
pub trait Directory {
    /// Return the next entry, or `None` once the directory is exhausted
    fn next_entry(&mut self) -> Option<DirEntry>;
}

/// An open read-only file
///
/// The handle is released when dropped, so every exit path closes it.
pub trait ReadFile {
    /// Read up to `buf.len()` bytes, returning 0 at end of file
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Total file length in bytes
    fn len(&self) -> u32;

    /// Check if the file is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the whole file into `out`
    ///
    /// Returns `Ok(None)` without reading if the file is larger than `limit`.
    fn read_to_end(&mut self, out: &mut Vec<u8>, limit: usize) -> Result<Option<usize>, StorageError> {
        let len = self.len() as usize;
        if len > limit {
            return Ok(None);
        }

        out.clear();
        out.resize(len, 0);

        let mut filled = 0;
        while filled < len {
            let n = self.read(&mut out[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        out.truncate(filled);

        Ok(Some(filled))
    }
}

/// Filesystem capability
///
/// Paths are `/`-separated and root-relative (`"/"` is the root).
pub trait Storage {
    /// Directory handle type
    type Dir: Directory;

    /// File handle type; may borrow the storage while open
    type File<'a>: ReadFile
    where
        Self: 'a;

    /// Open the root directory
    fn open_root(&mut self) -> Result<Self::Dir, StorageError>;

    /// Open a directory by path
    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError>;

    /// Open a file by path for reading
    ///
    /// A bare name refers to a file in the root directory.
    fn open_file(&mut self, path: &str) -> Result<Self::File<'_>, StorageError>;
}

/// Iterate path components, ignoring empty segments
pub fn path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// Split a path into its parent directory and final component
pub fn split_parent(path: &str) -> (&str, &str) {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Join a parent path and a child name into `out`
pub fn join_path(parent: &str, name: &str, out: &mut String<MAX_PATH_LEN>) -> Result<(), StorageError> {
    out.clear();
    if !parent.starts_with('/') {
        out.push('/').map_err(|_| StorageError::InvalidName)?;
    }
    out.push_str(parent).map_err(|_| StorageError::InvalidName)?;
    if !out.ends_with('/') {
        out.push('/').map_err(|_| StorageError::InvalidName)?;
    }
    out.push_str(name).map_err(|_| StorageError::InvalidName)
}
