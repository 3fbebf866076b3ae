//! Pass 1: path to source.
//!
//! Reads the module's bytes through the file reader collaborator, exactly
//! once per module, and wraps them in a [`SourceFile`] handle.

use std::path::Path;

use crate::{diagnostics::Diagnostics, file::SourceFile, reader::FileReader, span::Span};

pub fn run<R: FileReader>(
    reader: &R,
    diagnostics: &mut Diagnostics,
    path: &Path,
    origin: Option<&Span>,
) -> Option<SourceFile> {
    let failure = |diagnostics: &mut Diagnostics, message: String| {
        let location = origin
            .cloned()
            .unwrap_or_else(|| Span::start_of(SourceFile::new(path, "")));

        diagnostics.error(message, location);
    };

    match reader.read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(code) => Some(SourceFile::new(path, code)),
            Err(_) => {
                failure(
                    diagnostics,
                    format!("{} is not valid UTF-8", path.display()),
                );
                None
            }
        },
        Err(error) => {
            failure(
                diagnostics,
                format!("failed to read {}: {}", path.display(), error),
            );
            None
        }
    }
}
