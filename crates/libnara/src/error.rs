//! Run-level errors and diagnostic rendering.
//!
//! [`CompilerError`] covers the failures that abort a run before the pipeline
//! can produce diagnostics: a missing entry module, unreadable files, or bad
//! configuration values. Everything that happens *inside* the pipeline is a
//! diagnostic record instead (see [`crate::diagnostics`]).
//!
//! [`render_diagnostics`] is the display collaborator: it converts the sink's
//! ordered records into `codespan-reporting` diagnostics and emits them to a
//! terminal stream. The compiler core never calls it.

use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use indexmap::IndexMap;

use crate::diagnostics::{Diagnostics, Level};

/// Errors that abort a compilation run before diagnostics are produced.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CompilerError {
    #[error("the module {module:?} could not be found in any source directory")]
    #[diagnostic(
        code(nara::module_not_found),
        help("check the module name and the configured source directories")
    )]
    ModuleNotFound { module: String },

    #[error("failed to read {path:?}: {source}")]
    #[diagnostic(code(nara::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} is not valid UTF-8")]
    #[diagnostic(code(nara::invalid_encoding))]
    InvalidEncoding { path: String },

    #[error("{value:?} is not a valid value for the compiler option {option:?}")]
    #[diagnostic(code(nara::invalid_option))]
    InvalidOption { option: String, value: String },
}

/// Renders all diagnostics in `diagnostics` to standard error.
pub fn render_diagnostics(diagnostics: &Diagnostics) {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let mut files = SimpleFiles::new();
    let mut file_ids = IndexMap::new();

    for entry in diagnostics.iter() {
        let file = &entry.location.file;
        let file_id = *file_ids
            .entry(file.path().to_path_buf())
            .or_insert_with(|| {
                files.add(file.path().display().to_string(), file.code().to_string())
            });

        let diagnostic = match entry.level {
            Level::Error => Diagnostic::error(),
            Level::Warning => Diagnostic::warning(),
        }
        .with_message(entry.message.clone())
        .with_labels(vec![Label::primary(file_id, entry.location.to_range())]);

        // Rendering failures only affect the display collaborator, never the
        // compilation result.
        let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic);
    }
}
