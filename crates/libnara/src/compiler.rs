//! The module compiler: pass pipeline orchestration.
//!
//! [`Compiler::compile_module`] runs the fixed-order pass pipeline for one
//! module. Passes share state only through the [`CompilerState`] (modules,
//! type database, symbol tables, diagnostics) and the module body being
//! transformed. The pipeline stops at a pass boundary as soon as the
//! diagnostics sink reports any errors; whatever was built so far stays
//! available for inspection.
//!
//! Imports recursively re-enter [`Compiler::compile_module`]. The
//! register-before-compile protocol (the module record is inserted before
//! dependency passes run) makes cyclic imports terminate: an in-flight
//! module looks compiled to its importers.

use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::{
    ast::Body,
    config::Config,
    diagnostics::Diagnostics,
    error::CompilerError,
    locator::SourceLocator,
    module::{relative_source_path, Module},
    passes,
    reader::FileReader,
    span::Span,
    symbol::SymbolTables,
    tir,
    types::TypeDatabase,
};

/// All state of a single compilation run.
#[derive(Debug)]
pub struct CompilerState {
    pub config: Config,
    pub diagnostics: Diagnostics,
    pub modules: IndexMap<String, Module>,
    pub types: TypeDatabase,
    pub tables: SymbolTables,
    pub locator: SourceLocator,
}

impl CompilerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            diagnostics: Diagnostics::new(),
            modules: IndexMap::new(),
            types: TypeDatabase::new(),
            tables: SymbolTables::new(),
            locator: SourceLocator::new(),
        }
    }
}

/// Compiles modules by name, reading sources through a [`FileReader`].
pub struct Compiler<R: FileReader> {
    pub state: CompilerState,
    reader: R,
}

impl<R: FileReader> Compiler<R> {
    pub fn new(config: Config, reader: R) -> Self {
        Self {
            state: CompilerState::new(config),
            reader,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Consumes the compiler, returning the run's state.
    pub fn into_state(self) -> CompilerState {
        self.state
    }

    /// Compiles the entry module and, transitively, everything it imports.
    /// The caller inspects `state.diagnostics` for the outcome.
    pub fn compile_main(&mut self, name: &str) -> Result<(), CompilerError> {
        let relative = relative_source_path(name);
        let located = self
            .state
            .locator
            .locate(&self.reader, &self.state.config.source_directories, &relative)
            .ok_or_else(|| CompilerError::ModuleNotFound {
                module: name.to_string(),
            })?;

        self.compile_module(name, &located.path, None);
        Ok(())
    }

    /// Runs the pass pipeline for a single module. Already compiled (or
    /// in-flight) modules return immediately.
    pub fn compile_module(&mut self, name: &str, path: &Path, origin: Option<&Span>) {
        if self.state.modules.contains_key(name) {
            return;
        }

        debug!("compiling module {name:?}");

        // Pass 1: path -> source.
        let Some(file) =
            passes::source::run(&self.reader, &mut self.state.diagnostics, path, origin)
        else {
            return;
        };

        // Pass 2: source -> AST.
        let mut body = passes::parse::run(&mut self.state.diagnostics, &file);

        if self.halted() {
            return;
        }

        // Pass 3: desugar definitions into their canonical shape.
        passes::desugar::run(&mut body);

        // Pass 4: define the module's type. Pass 5: track the module in the
        // run's module table, before any dependency pass runs.
        passes::module_type::define_module(&mut self.state, name, &file);

        // Pass 6: insert the implicit bootstrap and prelude imports.
        passes::imports::insert_implicit(&mut self.state, name, &mut body);

        // Pass 7: collect the imports.
        let imports = passes::imports::collect(&mut self.state, name, &body);

        // Pass 8: ensure each imported module's self-symbol binding exists.
        passes::imports::add_self_symbols(&mut body);

        // Pass 9: compile imported modules depth-first.
        for import in &imports {
            self.compile_import(&import.name, &import.location);
        }

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 10: attach symbol tables to every scope-introducing node.
        passes::symbols::run(&mut self.state, name, &mut body);

        // Pass 11: bind ThisModule and the module-level `self`.
        passes::module_type::define_this_module(&mut self.state, name);

        // Pass 12: copy imported symbols into the module's globals.
        passes::imports::define_import_types(&mut self.state, name, &body);

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 13: declared type signatures for objects, traits and methods.
        passes::signatures::run(&mut self.state, name, &mut body);

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 14: register trait implementations.
        passes::traits::run(&mut self.state, name, &mut body);

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 15: full type inference and checking.
        passes::infer::run(&mut self.state, name, &mut body);

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 16: validate throws and reachability.
        passes::throws::run(&mut self.state, name, &body);

        if self.halted() {
            self.finish(name, body, None);
            return;
        }

        // Pass 17: lower into the typed IR. Pass 18: rewrite self-recursive
        // tail sends into backward jumps.
        let lowered = tir::lower::run(&mut self.state, name, &body);
        let lowered = tir::tail_calls::run(lowered);

        self.finish(name, body, Some(lowered));
    }

    /// Resolves and compiles one imported module.
    fn compile_import(&mut self, name: &str, location: &Span) {
        if self.state.modules.contains_key(name) {
            return;
        }

        let relative = relative_source_path(name);

        match self
            .state
            .locator
            .locate(&self.reader, &self.state.config.source_directories, &relative)
        {
            Some(located) => {
                let path = located.path.clone();

                self.compile_module(name, &path, Some(location));
            }
            None => {
                self.state
                    .diagnostics
                    .module_not_found(name, location.clone());
            }
        }
    }

    fn halted(&self) -> bool {
        self.state.diagnostics.has_errors()
    }

    /// Stores the (possibly partial) results on the module record.
    fn finish(&mut self, name: &str, body: Body, lowered: Option<tir::Block>) {
        if let Some(module) = self.state.modules.get_mut(name) {
            module.body = Some(body);
            module.body_tir = lowered;
        }
    }
}
