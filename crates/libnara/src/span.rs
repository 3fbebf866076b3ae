//! Source locations for tokens, AST nodes, and diagnostics.
//!
//! A [`Span`] pairs a `(line, column)` position with the byte range it covers
//! and the [`SourceFile`] it points into. Spans are cheap to clone and every
//! token and AST node owns one.

use std::{fmt, ops::Range};

use crate::file::SourceFile;

/// A location within a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: SourceFile,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// The byte range this span covers in the file's contents.
    pub range: Range<usize>,
}

impl Span {
    pub fn new(file: SourceFile, line: u32, column: u32, range: Range<usize>) -> Self {
        Self {
            file,
            line,
            column,
            range,
        }
    }

    /// A zero-width span at the very start of a file, used for synthetic
    /// nodes such as implicit imports.
    pub fn start_of(file: SourceFile) -> Self {
        Self {
            file,
            line: 1,
            column: 1,
            range: 0..0,
        }
    }

    /// The source text this span covers.
    pub fn fragment(&self) -> &str {
        &self.file.code()[self.range.clone()]
    }

    pub fn to_range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// True when `other` starts on the same line as this span.
    pub fn same_line(&self, other: &Span) -> bool {
        self.line == other.line
    }

    /// True when `other` begins at the byte immediately after this span ends.
    pub fn adjacent_to(&self, other: &Span) -> bool {
        self.range.end == other.range.start
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
