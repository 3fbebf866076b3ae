//! Compiler configuration.
//!
//! A [`Config`] is supplied by the embedding driver and consumed, read-only,
//! by the compiler core. It carries the ordered source search path, the build
//! mode, and the target path the downstream bytecode passes write to.

use std::path::PathBuf;

use strum_macros::{Display, EnumString};

use crate::error::CompilerError;

/// Name of the module implicitly imported first into every other module.
pub static BOOTSTRAP_MODULE: &str = "std::bootstrap";

/// Name of the module whose symbols are implicitly imported into every other
/// module.
pub static PRELUDE_MODULE: &str = "std::prelude";

/// Build mode. Only `debug` and `release` are valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Debug,
    Release,
}

impl Mode {
    /// Parses a mode name as supplied on the command line.
    pub fn parse(value: &str) -> Result<Self, CompilerError> {
        value
            .parse()
            .map_err(|_| CompilerError::InvalidOption {
                option: "mode".to_string(),
                value: value.to_string(),
            })
    }
}

/// Configuration for a single compilation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ordered list of directories to search for source files.
    pub source_directories: Vec<PathBuf>,
    pub mode: Mode,
    /// Path the bytecode serializer writes to. Unused by the front-end.
    pub target: PathBuf,
    /// Whether the bootstrap and prelude modules are imported implicitly.
    /// The standard library build turns this off.
    pub implicit_imports: bool,
}

impl Config {
    pub fn new(source_directories: Vec<PathBuf>) -> Self {
        Self {
            source_directories,
            mode: Mode::Debug,
            target: PathBuf::new(),
            implicit_imports: true,
        }
    }

    pub fn add_source_directory(&mut self, directory: impl Into<PathBuf>) {
        self.source_directories.push(directory.into());
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn without_implicit_imports(mut self) -> Self {
        self.implicit_imports = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Mode;
    use crate::error::CompilerError;

    #[test]
    fn valid_modes_parse() {
        assert_eq!(Mode::parse("debug").unwrap(), Mode::Debug);
        assert_eq!(Mode::parse("release").unwrap(), Mode::Release);
    }

    #[test]
    fn invalid_modes_are_rejected() {
        match Mode::parse("fast") {
            Err(CompilerError::InvalidOption { option, value }) => {
                assert_eq!(option, "mode");
                assert_eq!(value, "fast");
            }
            other => panic!("expected an invalid option error, got {other:?}"),
        }
    }
}
