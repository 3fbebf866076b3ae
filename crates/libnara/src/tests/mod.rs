//! Cross-module test suites.
//!
//! Leaf data structures carry their own inline tests; the suites here cover
//! the parser's output shapes and full pipeline runs over in-memory module
//! trees.

mod parser;
mod pipeline;

use crate::{
    ast::Body,
    compiler::{Compiler, CompilerState},
    config::Config,
    diagnostics::Diagnostics,
    file::SourceFile,
    module::relative_source_path,
    parser::Parser,
    reader::MemoryReader,
};

/// Parses a source string, returning the body and the diagnostics produced.
pub(crate) fn parse(code: &str) -> (Body, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let body =
        Parser::new(SourceFile::new("test.nara", code), &mut diagnostics).parse_module();

    (body, diagnostics)
}

/// Parses a source string that must not produce any diagnostics.
pub(crate) fn parse_ok(code: &str) -> Body {
    let (body, diagnostics) = parse(code);
    let messages: Vec<String> = diagnostics.iter().map(|entry| entry.to_string()).collect();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
    body
}

/// Compiles an in-memory module tree, starting from `main`. Implicit
/// imports are disabled so the tests do not need a standard library.
pub(crate) fn compile_modules(modules: &[(&str, &str)], main: &str) -> CompilerState {
    let mut reader = MemoryReader::new();

    for (name, code) in modules {
        let path = std::path::Path::new("/src").join(relative_source_path(name));

        reader.add(path, *code);
    }

    let config = Config::new(vec!["/src".into()]).without_implicit_imports();
    let mut compiler = Compiler::new(config, reader);

    compiler
        .compile_main(main)
        .expect("the main module should be locatable");
    compiler.into_state()
}

/// Compiles a single module named `main`.
pub(crate) fn compile_main(code: &str) -> CompilerState {
    compile_modules(&[("main", code)], "main")
}

/// Asserts that a run produced no diagnostics at all.
pub(crate) fn assert_clean(state: &CompilerState) {
    let messages: Vec<String> = state
        .diagnostics
        .iter()
        .map(|entry| entry.to_string())
        .collect();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
}

/// Asserts that some error message contains `fragment`.
pub(crate) fn assert_error_containing(state: &CompilerState, fragment: &str) {
    assert!(
        state
            .diagnostics
            .iter()
            .any(|entry| entry.message.contains(fragment)),
        "no diagnostic contains {fragment:?}; got: {:?}",
        state
            .diagnostics
            .iter()
            .map(|entry| entry.message.clone())
            .collect::<Vec<_>>()
    );
}
