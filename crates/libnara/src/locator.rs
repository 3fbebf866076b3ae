//! The source locator.
//!
//! Maps a logical module path (slash-delimited components ending in the
//! source extension, e.g. `std/fs.nara`) to the absolute path of the first
//! source directory containing it. Results, including misses, are cached for
//! the lifetime of the run. The locator never reads file contents.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;

use crate::reader::FileReader;

/// The result of locating a module: its absolute path and the source
/// directory it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub directory: PathBuf,
}

/// Resolves logical module paths against an ordered list of source
/// directories.
#[derive(Debug, Default)]
pub struct SourceLocator {
    cache: IndexMap<PathBuf, Option<Located>>,
}

impl SourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds `relative` under the first directory in `directories` that
    /// contains it. A candidate whose normalised path escapes its source
    /// directory (via `..` components) is treated as not found.
    pub fn locate(
        &mut self,
        reader: &dyn FileReader,
        directories: &[PathBuf],
        relative: &Path,
    ) -> Option<Located> {
        if let Some(cached) = self.cache.get(relative) {
            return cached.clone();
        }

        let mut found = None;

        for directory in directories {
            let candidate = normalize(&directory.join(relative));

            if !candidate.starts_with(directory) {
                continue;
            }

            if reader.exists(&candidate) {
                found = Some(Located {
                    path: candidate,
                    directory: directory.clone(),
                });
                break;
            }
        }

        self.cache.insert(relative.to_path_buf(), found.clone());
        found
    }
}

/// Lexically resolves `.` and `..` components without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(Component::ParentDir);
                }
            }
            other => result.push(other),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::SourceLocator;
    use crate::reader::MemoryReader;
    use std::path::{Path, PathBuf};

    fn reader() -> MemoryReader {
        let mut reader = MemoryReader::new();
        reader.add("/src/std/fs.nara", "");
        reader.add("/vendor/std/fs.nara", "");
        reader.add("/vendor/extra.nara", "");
        reader
    }

    #[test]
    fn first_directory_wins() {
        let reader = reader();
        let mut locator = SourceLocator::new();
        let dirs = vec![PathBuf::from("/src"), PathBuf::from("/vendor")];

        let located = locator
            .locate(&reader, &dirs, Path::new("std/fs.nara"))
            .unwrap();

        assert_eq!(located.path, PathBuf::from("/src/std/fs.nara"));
        assert_eq!(located.directory, PathBuf::from("/src"));

        let extra = locator
            .locate(&reader, &dirs, Path::new("extra.nara"))
            .unwrap();

        assert_eq!(extra.directory, PathBuf::from("/vendor"));
    }

    #[test]
    fn missing_files_are_cached_misses() {
        let reader = reader();
        let mut locator = SourceLocator::new();
        let dirs = vec![PathBuf::from("/src")];

        assert!(locator
            .locate(&reader, &dirs, Path::new("nope.nara"))
            .is_none());
        assert!(locator
            .locate(&reader, &dirs, Path::new("nope.nara"))
            .is_none());
    }

    #[test]
    fn escaping_the_source_directory_is_not_found() {
        let mut reader = MemoryReader::new();
        reader.add("/secrets/key.nara", "");

        let mut locator = SourceLocator::new();
        let dirs = vec![PathBuf::from("/src")];

        assert!(locator
            .locate(&reader, &dirs, Path::new("../secrets/key.nara"))
            .is_none());
    }
}
