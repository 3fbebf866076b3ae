//! Source file representation and handling for the Nara compiler.
//!
//! This module provides the [`SourceFile`] handle used throughout the compiler
//! to track source files. A handle is cheap to clone (the contents live behind
//! an `Arc`) and carries a lazily built line index so diagnostics can be
//! rendered without re-scanning the file.

use std::{
    fmt,
    ops::Range,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

/// File extension for Nara source files.
pub static SOURCE_EXTENSION: &str = "nara";

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    code: String,
    line_index: OnceLock<Vec<usize>>,
}

/// A handle to a source file: its path and contents.
///
/// Every [`Span`](crate::span::Span) produced by the lexer holds one of these,
/// keeping the bytes alive for as long as any token or diagnostic refers to
/// them.
#[derive(Debug, Clone)]
pub struct SourceFile {
    inner: Arc<Inner>,
}

impl SourceFile {
    /// Creates a new source file with the given path and source code.
    pub fn new(path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                code: code.into(),
                line_index: OnceLock::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    /// Byte offsets at which each line starts, built on first use.
    pub fn line_index(&self) -> &[usize] {
        self.inner.line_index.get_or_init(|| {
            let mut starts = vec![0];

            for (offset, byte) in self.inner.code.bytes().enumerate() {
                if byte == b'\n' {
                    starts.push(offset + 1);
                }
            }

            starts
        })
    }

    /// The byte range of a 1-based line, excluding its terminating newline.
    pub fn line_range(&self, line: u32) -> Range<usize> {
        let index = self.line_index();
        let start = index
            .get(line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(0);
        let end = index
            .get(line as usize)
            .map(|offset| offset.saturating_sub(1))
            .unwrap_or(self.inner.code.len());

        start..end
    }
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.path == other.inner.path && self.inner.code == other.inner.code)
    }
}

impl Eq for SourceFile {}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::SourceFile;
    use pretty_assertions::assert_eq;

    #[test]
    fn line_index_is_built_lazily_and_correct() {
        let file = SourceFile::new("test.nara", "foo\nbar\n\nbaz");

        assert_eq!(file.line_index(), &[0, 4, 8, 9]);
        assert_eq!(file.line_range(1), 0..3);
        assert_eq!(file.line_range(2), 4..7);
        assert_eq!(file.line_range(3), 8..8);
        assert_eq!(file.line_range(4), 9..12);
    }

    #[test]
    fn handles_compare_by_identity_or_contents() {
        let a = SourceFile::new("a.nara", "10");
        let b = a.clone();
        let c = SourceFile::new("a.nara", "10");
        let d = SourceFile::new("a.nara", "20");

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(a != d);
    }
}
