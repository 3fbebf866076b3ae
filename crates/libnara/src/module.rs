//! Module records.
//!
//! A module is a compilation unit identified by a `::`-separated qualified
//! name. Its record is inserted into the run's module table *before* its
//! body is compiled, so cyclic imports short-circuit on the in-flight record.

use std::path::PathBuf;

use crate::{
    file::{SourceFile, SOURCE_EXTENSION},
    span::Span,
    symbol::TableId,
    tir,
    types::TypeId,
    ast::Body,
};

/// A compiled (or in-flight) module.
#[derive(Debug)]
pub struct Module {
    /// The qualified name, e.g. `std::fs`.
    pub name: String,
    pub file: SourceFile,
    pub location: Span,
    /// The module's object type; its attributes are the module's top-level
    /// definitions.
    pub module_type: TypeId,
    /// Imported and builtin symbols addressable as globals.
    pub globals: TableId,
    /// The module body's symbol table, attached by the symbol table pass.
    pub root_table: TableId,
    /// Qualified names of imported modules, in declaration order.
    pub imports: Vec<String>,
    /// The module body; unset while the module is being compiled.
    pub body: Option<Body>,
    /// The lowered typed IR of the body.
    pub body_tir: Option<tir::Block>,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        file: SourceFile,
        module_type: TypeId,
        globals: TableId,
    ) -> Self {
        let location = Span::start_of(file.clone());

        Self {
            name: name.into(),
            file,
            location,
            module_type,
            globals,
            root_table: TableId::UNDEFINED,
            imports: Vec::new(),
            body: None,
            body_tir: None,
        }
    }
}

/// The relative source path of a qualified module name: `std::fs` maps to
/// `std/fs.nara`.
pub fn relative_source_path(name: &str) -> PathBuf {
    let mut path: PathBuf = name.split("::").collect();

    path.set_extension(SOURCE_EXTENSION);
    path
}

#[cfg(test)]
mod tests {
    use super::relative_source_path;
    use std::path::PathBuf;

    #[test]
    fn qualified_names_map_to_slash_paths() {
        assert_eq!(
            relative_source_path("std::fs"),
            PathBuf::from("std/fs.nara")
        );
        assert_eq!(relative_source_path("main"), PathBuf::from("main.nara"));
    }
}
