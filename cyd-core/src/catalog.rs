//! JPEG image catalog
//!
//! The catalog is the ordered list of `*.JPG` files in the root directory,
//! defined by filesystem iteration order plus the extension filter. The
//! default [`Catalog`] never stores that list: it caches only the count and
//! walks the root directory again for every selection. Indices therefore stay
//! meaningful only while the root directory is not modified.
//!
//! [`CachedCatalog`] keeps the names instead and answers the same queries
//! without touching the card.

use alloc::vec::Vec;
use heapless::String;

use crate::traits::storage::MAX_NAME_LEN;
use crate::traits::{DirEntry, Directory, ImagePresenter, PresentError, Storage, StorageError};

/// Extension that marks catalog entries (compared case-insensitively)
pub const IMAGE_EXTENSION: &str = "JPG";

/// Errors building a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// Root directory could not be opened
    RootUnavailable(StorageError),
    /// No matching files in the root directory
    Empty,
}

/// Check whether a file name belongs to the catalog
///
/// Only the last three characters are compared, so `photo.jpg` and
/// `PHOTO.JPG` match while `photo.jpeg` does not.
pub fn is_jpeg_name(name: &str) -> bool {
    let ext_len = IMAGE_EXTENSION.len();
    if name.len() < ext_len {
        return false;
    }

    let start = name.len() - ext_len;
    // A non-ASCII tail cannot match and may not be a char boundary
    if !name.is_char_boundary(start) {
        return false;
    }

    name[start..].eq_ignore_ascii_case(IMAGE_EXTENSION)
}

/// Check whether a directory entry belongs to the catalog
pub fn is_catalog_entry(entry: &DirEntry) -> bool {
    !entry.is_directory() && is_jpeg_name(entry.name())
}

/// Clamp an out-of-range index back to the first image
pub fn wrap_index(index: usize, count: usize) -> usize {
    if index >= count {
        0
    } else {
        index
    }
}

/// Count catalog entries in the root directory
pub fn count_images<S: Storage>(storage: &mut S) -> Result<usize, CatalogError> {
    let mut root = storage.open_root().map_err(CatalogError::RootUnavailable)?;

    let mut count = 0;
    while let Some(entry) = root.next_entry() {
        if is_catalog_entry(&entry) {
            count += 1;
        }
    }

    if count == 0 {
        return Err(CatalogError::Empty);
    }

    Ok(count)
}

/// Find the catalog entry at `index` by walking the root directory
///
/// The walk stops at the first match. Returns `Ok(None)` if the directory
/// holds fewer matching entries than `index + 1`.
pub fn find_image<S: Storage>(storage: &mut S, index: usize) -> Result<Option<DirEntry>, StorageError> {
    let mut root = storage.open_root()?;

    let mut seen = 0;
    while let Some(entry) = root.next_entry() {
        if !is_catalog_entry(&entry) {
            continue;
        }
        if seen == index {
            return Ok(Some(entry));
        }
        seen += 1;
    }

    Ok(None)
}

/// Result of selecting and presenting one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Selection {
    /// Image decoded and drawn
    Shown { index: usize, name: String<MAX_NAME_LEN> },
    /// Entry found but could not be opened or presented
    Failed {
        index: usize,
        name: String<MAX_NAME_LEN>,
        error: PresentError,
    },
    /// Walk ended before reaching the index (directory changed)
    Missing { index: usize },
    /// Root directory could not be opened
    Unavailable(StorageError),
}

impl Selection {
    /// Check if the image was drawn
    pub fn is_shown(&self) -> bool {
        matches!(self, Selection::Shown { .. })
    }
}

/// A source of catalog entries addressed by index
pub trait ImageSource {
    /// Number of images counted when the source was built
    fn len(&self) -> usize;

    /// Check if the source is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve an index (already wrapped) to a root-relative file name
    fn locate<S: Storage>(
        &self,
        storage: &mut S,
        index: usize,
    ) -> Result<Option<String<MAX_NAME_LEN>>, StorageError>;

    /// Select the image at `index` and hand it to the presenter
    ///
    /// Out-of-range indices wrap to 0. The file is closed before returning.
    fn select<S: Storage, P: ImagePresenter>(
        &self,
        storage: &mut S,
        presenter: &mut P,
        index: usize,
    ) -> Selection {
        let index = wrap_index(index, self.len());

        let name = match self.locate(storage, index) {
            Ok(Some(name)) => name,
            Ok(None) => return Selection::Missing { index },
            Err(e) => return Selection::Unavailable(e),
        };

        let result = match storage.open_file(&name) {
            Ok(mut file) => presenter.present(&name, &mut file),
            Err(e) => Err(PresentError::Read(e)),
        };

        match result {
            Ok(()) => Selection::Shown { index, name },
            Err(error) => Selection::Failed { index, name, error },
        }
    }
}

/// Catalog that re-walks the root directory for every selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    count: usize,
}

impl Catalog {
    /// Count the catalog entries once
    pub fn scan<S: Storage>(storage: &mut S) -> Result<Self, CatalogError> {
        count_images(storage).map(|count| Self { count })
    }
}

impl ImageSource for Catalog {
    fn len(&self) -> usize {
        self.count
    }

    fn locate<S: Storage>(
        &self,
        storage: &mut S,
        index: usize,
    ) -> Result<Option<String<MAX_NAME_LEN>>, StorageError> {
        find_image(storage, index).map(|entry| entry.map(|e| e.name))
    }
}

/// Catalog that keeps every matching name in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCatalog {
    names: Vec<String<MAX_NAME_LEN>>,
}

impl CachedCatalog {
    /// Walk the root directory once and keep the matching names
    pub fn scan<S: Storage>(storage: &mut S) -> Result<Self, CatalogError> {
        let mut root = storage.open_root().map_err(CatalogError::RootUnavailable)?;

        let mut names = Vec::new();
        while let Some(entry) = root.next_entry() {
            if is_catalog_entry(&entry) {
                names.push(entry.name);
            }
        }

        if names.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { names })
    }

    /// Names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }
}

impl ImageSource for CachedCatalog {
    fn len(&self) -> usize {
        self.names.len()
    }

    fn locate<S: Storage>(
        &self,
        _storage: &mut S,
        index: usize,
    ) -> Result<Option<String<MAX_NAME_LEN>>, StorageError> {
        Ok(self.names.get(index).cloned())
    }
}
