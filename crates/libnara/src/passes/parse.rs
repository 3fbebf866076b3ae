//! Pass 2: source to AST.
//!
//! Runs the lexer and parser, producing the module's body. Syntax errors
//! land in the diagnostics sink; the parser recovers at top-level boundaries
//! so multiple errors per file are reported.

use crate::{ast::Body, diagnostics::Diagnostics, file::SourceFile, parser::Parser};

pub fn run(diagnostics: &mut Diagnostics, file: &SourceFile) -> Body {
    Parser::new(file.clone(), diagnostics).parse_module()
}
