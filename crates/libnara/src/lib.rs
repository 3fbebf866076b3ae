//! Nara Language Compiler Library
//!
//! This is the core library for the Nara programming language compiler: the
//! pipeline from source code to a type-checked intermediate representation
//! (TIR) ready for bytecode generation.
//!
//! # Overview
//!
//! A compilation run proceeds per module through a fixed pass pipeline:
//!
//! 1. **Locate and read**: map the module name to a file and read it
//! 2. **Lex and parse**: byte stream → tokens → AST
//! 3. **Resolve**: imports, symbol tables, declared type signatures, traits
//! 4. **Type check**: infer and verify the type of every expression
//! 5. **Lower**: produce the TIR with resolved symbol indices and
//!    tail-call-eliminated self recursion
//!
//! Imports recursively compile their target modules; cyclic imports are
//! handled by registering each module before compiling its body.
//!
//! # Architecture
//!
//! - [`lexer`]: byte-level state machine producing tokens
//! - [`parser`]: recursive descent over tokens producing the AST
//! - [`ast`]: the AST node kinds
//! - [`symbol`]: symbol tables with lexical nesting and unique-names mode
//! - [`types`]: the type union, the type database, raw instructions
//! - [`passes`]: the semantic pass pipeline
//! - [`tir`]: the typed IR, lowering, and tail-call elimination
//! - [`compiler`]: per-run state and the module compiler
//! - [`diagnostics`]: the append-only diagnostics sink
//! - [`locator`], [`reader`], [`config`], [`error`]: collaborator surfaces
//!
//! # Usage
//!
//! ```ignore
//! use libnara::{compile, config::Config, reader::DiskReader};
//!
//! let config = Config::new(vec!["src".into()]);
//! let state = compile(config, DiskReader, "main")?;
//!
//! if state.diagnostics.has_errors() {
//!     libnara::error::render_diagnostics(&state.diagnostics);
//! }
//! ```
//!
//! # Error Handling
//!
//! Problems inside the pipeline are reported into the diagnostics sink and
//! never abort the process; [`CompilerError`](error::CompilerError) covers
//! only run-level failures such as a missing entry module.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod file;
pub mod lexer;
pub mod locator;
pub mod module;
pub mod parser;
pub mod passes;
pub mod reader;
pub mod span;
pub mod symbol;
pub mod tir;
pub mod types;

#[cfg(test)]
mod tests;

use compiler::{Compiler, CompilerState};
use config::Config;
use error::CompilerError;
use reader::FileReader;

/// Compiles the module named `module` and everything it imports, returning
/// the run's state. The caller inspects `state.diagnostics` for errors and
/// warnings; the per-module results live in `state.modules`.
pub fn compile<R: FileReader>(
    config: Config,
    reader: R,
    module: &str,
) -> Result<CompilerState, CompilerError> {
    let mut compiler = Compiler::new(config, reader);

    compiler.compile_main(module)?;
    Ok(compiler.into_state())
}
