//! In-memory test doubles for the core traits

use std::cell::Cell;
use std::string::String;
use std::vec::Vec;

use crate::traits::storage::{path_components, split_parent};
use crate::traits::{
    DirEntry, Directory, DisplayError, ImagePresenter, PresentError, RawPoint, ReadFile, Storage,
    StorageError, TextDisplay, TouchError, TouchSensor,
};

enum Node {
    File(String, Vec<u8>),
    Dir(String, Vec<Node>),
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::File(name, _) | Node::Dir(name, _) => name,
        }
    }
}

/// In-memory directory tree with open-handle accounting
pub struct MemStorage {
    root: Vec<Node>,
    open_files: Cell<usize>,
    pub files_opened: usize,
    pub root_opens: usize,
    pub root_unavailable: bool,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            root: Vec::new(),
            open_files: Cell::new(0),
            files_opened: 0,
            root_opens: 0,
            root_unavailable: false,
        }
    }

    /// Root directory with the given files, in order
    pub fn with_root_files(names: &[&str]) -> Self {
        let mut storage = Self::new();
        for name in names {
            storage.add_file(name, name.as_bytes());
        }
        storage
    }

    /// Add a file, creating parent directories as needed
    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        let (parent, name) = split_parent(path);
        let dir = self.make_dir(parent);
        dir.push(Node::File(name.into(), data.to_vec()));
    }

    /// Add a directory, creating parents as needed
    pub fn add_dir(&mut self, path: &str) {
        self.make_dir(path);
    }

    /// Remove a root-level entry by name
    pub fn remove(&mut self, name: &str) {
        self.root.retain(|n| n.name() != name);
    }

    /// Number of file handles currently open
    pub fn open_files(&self) -> usize {
        self.open_files.get()
    }

    fn make_dir(&mut self, path: &str) -> &mut Vec<Node> {
        let mut dir = &mut self.root;
        for part in path_components(path) {
            let pos = match dir.iter().position(|n| matches!(n, Node::Dir(name, _) if name == part)) {
                Some(pos) => pos,
                None => {
                    dir.push(Node::Dir(part.into(), Vec::new()));
                    dir.len() - 1
                }
            };
            dir = match &mut dir[pos] {
                Node::Dir(_, children) => children,
                Node::File(..) => panic!("{} is a file", part),
            };
        }
        dir
    }
}

fn find_dir<'a>(root: &'a [Node], path: &str) -> Result<&'a [Node], StorageError> {
    let mut dir = root;
    for part in path_components(path) {
        dir = match dir.iter().find(|n| n.name() == part) {
            Some(Node::Dir(_, children)) => children.as_slice(),
            Some(Node::File(..)) => return Err(StorageError::NotADirectory),
            None => return Err(StorageError::NotFound),
        };
    }
    Ok(dir)
}

fn snapshot(nodes: &[Node]) -> MemDir {
    let entries = nodes
        .iter()
        .map(|n| match n {
            Node::File(name, data) => DirEntry::file(name, data.len() as u32),
            Node::Dir(name, _) => DirEntry::dir(name),
        })
        .collect();
    MemDir { entries, pos: 0 }
}

pub struct MemDir {
    entries: Vec<DirEntry>,
    pos: usize,
}

impl Directory for MemDir {
    fn next_entry(&mut self) -> Option<DirEntry> {
        let entry = self.entries.get(self.pos).cloned();
        self.pos += 1;
        entry
    }
}

pub struct MemFile<'a> {
    data: &'a [u8],
    pos: usize,
    open: &'a Cell<usize>,
}

impl ReadFile for MemFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn len(&self) -> u32 {
        self.data.len() as u32
    }
}

impl Drop for MemFile<'_> {
    fn drop(&mut self) {
        self.open.set(self.open.get() - 1);
    }
}

impl Storage for MemStorage {
    type Dir = MemDir;
    type File<'a> = MemFile<'a>;

    fn open_root(&mut self) -> Result<MemDir, StorageError> {
        self.root_opens += 1;
        if self.root_unavailable {
            return Err(StorageError::Device);
        }
        Ok(snapshot(&self.root))
    }

    fn open_dir(&mut self, path: &str) -> Result<MemDir, StorageError> {
        if path_components(path).next().is_none() {
            return self.open_root();
        }
        find_dir(&self.root, path).map(snapshot)
    }

    fn open_file(&mut self, path: &str) -> Result<MemFile<'_>, StorageError> {
        let (parent, name) = split_parent(path);
        let dir = find_dir(&self.root, parent)?;
        let data = match dir.iter().find(|n| n.name() == name) {
            Some(Node::File(_, data)) => data,
            Some(Node::Dir(..)) => return Err(StorageError::NotAFile),
            None => return Err(StorageError::NotFound),
        };
        self.files_opened += 1;
        self.open_files.set(self.open_files.get() + 1);
        Ok(MemFile {
            data,
            pos: 0,
            open: &self.open_files,
        })
    }
}

/// Presenter that records shown names and fails on request
pub struct RecordingPresenter {
    pub shown: Vec<String>,
    pub attempts: Vec<String>,
    pub failing: Vec<String>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self {
            shown: Vec::new(),
            attempts: Vec::new(),
            failing: Vec::new(),
        }
    }

    pub fn failing(names: &[&str]) -> Self {
        let mut p = Self::new();
        p.failing = names.iter().map(|n| String::from(*n)).collect();
        p
    }
}

impl ImagePresenter for RecordingPresenter {
    fn present<F: ReadFile>(&mut self, name: &str, file: &mut F) -> Result<(), PresentError> {
        self.attempts.push(name.into());
        let mut data = Vec::new();
        file.read_to_end(&mut data, 1024)?;
        if self.failing.iter().any(|n| n == name) {
            return Err(PresentError::Decode);
        }
        self.shown.push(name.into());
        Ok(())
    }
}

/// Text display that records drawn lines
pub struct RecordingDisplay {
    pub rows: u8,
    pub clears: usize,
    pub lines: Vec<(u8, String)>,
}

impl RecordingDisplay {
    pub fn new(rows: u8) -> Self {
        Self {
            rows,
            clears: 0,
            lines: Vec::new(),
        }
    }
}

impl TextDisplay for RecordingDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.clears += 1;
        self.lines.clear();
        Ok(())
    }

    fn text_centered(&mut self, row: u8, text: &str) -> Result<(), DisplayError> {
        self.lines.push((row, text.into()));
        Ok(())
    }

    fn rows(&self) -> u8 {
        self.rows
    }
}

/// Touch sensor replaying a fixed point
pub struct MockTouch {
    pub point: RawPoint,
    pub fail: bool,
}

impl MockTouch {
    pub fn idle() -> Self {
        Self {
            point: RawPoint::default(),
            fail: false,
        }
    }

    pub fn pressed(x: u16, y: u16, z: u16) -> Self {
        Self {
            point: RawPoint { x, y, z },
            fail: false,
        }
    }
}

impl TouchSensor for MockTouch {
    fn touched(&mut self) -> Result<bool, TouchError> {
        if self.fail {
            return Err(TouchError::Bus);
        }
        Ok(self.point.z > 0)
    }

    fn read_raw(&mut self) -> Result<RawPoint, TouchError> {
        if self.fail {
            return Err(TouchError::Bus);
        }
        Ok(self.point)
    }
}
