//! Integration tests for the Nara compiler.
//!
//! These tests drive the public API end to end: multi-module programs with
//! objects, traits, implementations, generics, and error handling, compiled
//! from an in-memory module tree.

use libnara::{
    compile,
    config::Config,
    module::relative_source_path,
    reader::MemoryReader,
    types::Type,
};

fn compile_tree(modules: &[(&str, &str)], main: &str) -> libnara::compiler::CompilerState {
    let mut reader = MemoryReader::new();

    for (name, code) in modules {
        let path = std::path::Path::new("/src").join(relative_source_path(name));

        reader.add(path, *code);
    }

    let config = Config::new(vec!["/src".into()]).without_implicit_imports();

    compile(config, reader, main).expect("the main module should exist")
}

#[test]
fn a_complete_program_compiles_cleanly() {
    let state = compile_tree(
        &[(
            "main",
            r#"
trait ToText {
  def text -> String
}

object Person {
  def init(name: String) {
    let @name: String = name
  }

  def name -> String { @name }
}

impl ToText for Person {
  def text -> String { self.name }
}

def describe(value: ?Person) -> ?String {
  value.text
}

def greeting(person: Person) -> String {
  `hello {person.text}`
}
"#,
        )],
        "main",
    );

    let messages: Vec<String> = state
        .diagnostics
        .iter()
        .map(|entry| entry.to_string())
        .collect();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");

    let module = state.modules.get("main").unwrap();

    assert!(module.body.is_some());
    assert!(module.body_tir.is_some());

    // The module type exposes its top-level definitions as attributes.
    assert!(state.types.lookup_attribute(module.module_type, "Person").is_some());
    assert!(state.types.lookup_attribute(module.module_type, "ToText").is_some());
    assert!(state.types.lookup_method(module.module_type, "describe").is_some());
}

#[test]
fn modules_share_types_across_imports() {
    let state = compile_tree(
        &[
            (
                "shapes",
                r#"
object Circle {
  def area -> Integer { 314 }
}
"#,
            ),
            (
                "main",
                r#"
import shapes::(Circle)

def measure(shape: Circle) -> Integer {
  shape.area
}
"#,
            ),
        ],
        "main",
    );

    let messages: Vec<String> = state
        .diagnostics
        .iter()
        .map(|entry| entry.to_string())
        .collect();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");
    assert_eq!(state.modules.len(), 2);

    // Both modules resolve Circle to the same type.
    let shapes = state.modules.get("shapes").unwrap();
    let main = state.modules.get("main").unwrap();
    let original = state
        .types
        .lookup_attribute(shapes.module_type, "Circle")
        .unwrap();
    let imported = state.tables.get(main.globals).get("Circle").unwrap();

    assert_eq!(imported.value_type, original);
}

#[test]
fn throwing_methods_are_checked_end_to_end() {
    let state = compile_tree(
        &[(
            "main",
            r#"
def risky(flag: Integer) !! String -> Integer {
  throw 'boom'
}

def careful -> Integer {
  try risky(1) else (message) { 0 }
}
"#,
        )],
        "main",
    );

    let messages: Vec<String> = state
        .diagnostics
        .iter()
        .map(|entry| entry.to_string())
        .collect();

    assert!(messages.is_empty(), "unexpected diagnostics: {messages:?}");

    // The throw type made it into the method's block type.
    let module = state.modules.get("main").unwrap();
    let risky = state
        .types
        .lookup_method(module.module_type, "risky")
        .unwrap();

    match state.types.get(risky.block) {
        Type::Block(block) => {
            assert_eq!(block.throw_type, Some(state.types.string_type()));
        }
        other => panic!("expected a block type, got {other:?}"),
    }
}

#[test]
fn broken_programs_report_and_keep_partial_results() {
    let state = compile_tree(
        &[(
            "main",
            r#"
def check(value: Integer) -> String { value }
"#,
        )],
        "main",
    );

    assert!(state.diagnostics.has_errors());

    // The module record and its AST survive for inspection.
    let module = state.modules.get("main").unwrap();

    assert!(module.body.is_some());
    assert!(module.body_tir.is_none());
}
