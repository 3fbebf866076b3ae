//! The file reader collaborator.
//!
//! The compiler core never touches the filesystem directly: the path-to-source
//! pass asks a [`FileReader`] for the bytes of an absolute path, exactly once
//! per module. The driver supplies a [`DiskReader`]; tests supply a
//! [`MemoryReader`] with an in-memory module tree.

use std::{collections::HashMap, io, path::Path};

/// Reads source files on behalf of the compiler.
pub trait FileReader {
    /// Reads the contents of `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Returns `true` when `path` refers to an existing file.
    fn exists(&self, path: &Path) -> bool;
}

/// A [`FileReader`] backed by the real filesystem.
#[derive(Debug, Default)]
pub struct DiskReader;

impl FileReader for DiskReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// A [`FileReader`] serving files from memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryReader {
    files: HashMap<std::path::PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<std::path::PathBuf>, code: impl Into<String>) {
        self.files.insert(path.into(), code.into());
    }
}

impl FileReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|code| code.clone().into_bytes())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
