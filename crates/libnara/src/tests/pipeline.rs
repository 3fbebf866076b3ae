//! Full pipeline tests over in-memory module trees.

use pretty_assertions::assert_eq;

use crate::{
    error::CompilerError,
    tir,
    types::{Type, TypeId},
};

use super::{assert_clean, assert_error_containing, compile_main, compile_modules};

#[test]
fn cyclic_imports_terminate_with_both_modules_registered() {
    let state = compile_modules(
        &[("a", "import b"), ("b", "import a")],
        "a",
    );

    assert_clean(&state);
    assert_eq!(state.modules.len(), 2);
    assert!(state.modules.contains_key("a"));
    assert!(state.modules.contains_key("b"));
    assert_eq!(state.modules.get("a").unwrap().imports, vec!["b"]);
    assert_eq!(state.modules.get("b").unwrap().imports, vec!["a"]);
}

#[test]
fn missing_imports_are_diagnosed_at_the_import() {
    let state = compile_main("import nope");

    assert_error_containing(&state, "the module \"nope\" could not be found");
}

#[test]
fn a_missing_entry_module_is_a_run_level_error() {
    let error = crate::compile(
        crate::config::Config::new(vec!["/src".into()]).without_implicit_imports(),
        crate::reader::MemoryReader::new(),
        "main",
    )
    .unwrap_err();

    assert!(matches!(
        error,
        CompilerError::ModuleNotFound { module } if module == "main"
    ));
}

#[test]
fn value_producing_nodes_are_typed_after_an_error_free_run() {
    let state = compile_main("let x = 10\nlet y = 'text'\n`a {x} b`");

    assert_clean(&state);

    let module = state.modules.get("main").unwrap();
    let body = module.body.as_ref().unwrap();

    for node in &body.expressions {
        if node.produces_value() {
            let resolved = node.resolved_type();

            assert_ne!(resolved, TypeId::UNDEFINED, "untyped node: {node:?}");
            assert!(
                !matches!(state.types.get(resolved), Type::Error),
                "error-typed node: {node:?}"
            );
        }
    }
}

#[test]
fn imported_symbols_become_globals() {
    let state = compile_modules(
        &[
            ("lib", "object Thing { def run -> Integer { 10 } }"),
            (
                "main",
                "import lib::(Thing as T)\ndef make(value: T) -> T { value }",
            ),
        ],
        "main",
    );

    assert_clean(&state);

    let main = state.modules.get("main").unwrap();

    assert!(state.tables.get(main.globals).contains("T"));
}

#[test]
fn glob_imports_copy_public_attributes() {
    let state = compile_modules(
        &[
            ("lib", "object Visible { }\nobject _Hidden { }"),
            ("main", "import lib::(*)\ndef make(value: Visible) -> Visible { value }"),
        ],
        "main",
    );

    assert_clean(&state);

    let main = state.modules.get("main").unwrap();

    assert!(state.tables.get(main.globals).contains("Visible"));
    assert!(!state.tables.get(main.globals).contains("_Hidden"));
}

#[test]
fn unknown_import_symbols_are_diagnosed() {
    let state = compile_modules(
        &[("lib", "object Thing { }"), ("main", "import lib::(Missing)")],
        "main",
    );

    assert_error_containing(&state, "does not define the symbol \"Missing\"");
}

#[test]
fn diagnostics_grow_monotonically_and_keep_order() {
    let state = compile_main("let x = unknown_one\nlet y = unknown_two");

    assert!(state.diagnostics.has_errors());
    assert!(state.diagnostics.len() >= 2);

    let messages: Vec<&str> = state
        .diagnostics
        .iter()
        .map(|entry| entry.message.as_str())
        .collect();
    let one = messages
        .iter()
        .position(|message| message.contains("unknown_one"))
        .unwrap();
    let two = messages
        .iter()
        .position(|message| message.contains("unknown_two"))
        .unwrap();

    assert!(one < two);
}

#[test]
fn return_type_mismatches_point_at_the_body() {
    let state = compile_main("def f(x: Integer) -> String { x }");

    assert_error_containing(
        &state,
        "expected a value of type String to be returned, found Integer",
    );
}

#[test]
fn raw_instructions_type_through_the_closed_set() {
    let state = compile_main("def add(a: Integer, b: Integer) -> Integer { _INKOC.integer_add(a, b) }");

    assert_clean(&state);
}

#[test]
fn unknown_raw_instructions_are_diagnosed() {
    let state = compile_main("_INKOC.make_coffee(1)");

    assert_error_containing(&state, "the raw instruction \"make_coffee\" is unknown");
}

#[test]
fn argument_count_ranges_include_rest_arguments() {
    let state = compile_main("def f(a, b = 1, *rest) { a }\nf()");

    assert_error_containing(&state, "incorrect number of arguments: expected 1.., found 0");
}

#[test]
fn reserved_constants_can_not_be_redefined() {
    for code in ["let ThisModule = 10", "let _INKOC = 10", "let Self = 10"] {
        let state = compile_main(code);

        assert_error_containing(&state, "cannot be redefined");
    }

    let state = compile_main("object ThisModule { }");

    assert_error_containing(&state, "cannot be redefined");
}

#[test]
fn optionals_wrap_send_results_unless_nil_responds() {
    // Nil does not define `name`: the result of the send is re-wrapped.
    let wrapped = compile_main(
        "object Person { def name -> String { 'x' } }\n\
         def test(p: ?Person) -> ?String { p.name }",
    );

    assert_clean(&wrapped);

    // Nil does define `text` (through a trait implementation): the result
    // type is used as-is.
    let unwrapped = compile_main(
        "object Person { }\n\
         trait ToText { def text -> String }\n\
         impl ToText for Nil { def text -> String { 'nil' } }\n\
         impl ToText for Person { def text -> String { 'person' } }\n\
         def test(p: ?Person) -> String { p.text }",
    );

    assert_clean(&unwrapped);
}

#[test]
fn optional_senders_report_the_optional_type() {
    let state = compile_main(
        "object Person { }\n\
         def test(p: ?Person) { p.missing }",
    );

    assert_error_containing(&state, "?Person does not respond to the message \"missing\"");
}

#[test]
fn traits_require_their_methods() {
    let state = compile_main(
        "trait ToText { def text -> String }\n\
         object Person { }\n\
         impl ToText for Person { }",
    );

    assert_error_containing(&state, "the required method \"text\" is not implemented");
}

#[test]
fn traits_require_their_required_traits() {
    let state = compile_main(
        "trait A { }\n\
         trait B: A { }\n\
         object Person { }\n\
         impl B for Person { }",
    );

    assert_error_containing(&state, "requires the trait A to be implemented first");
}

#[test]
fn trait_bounds_are_enforced_on_generic_methods() {
    let state = compile_main(
        "trait ToText { def text -> String }\n\
         def show!(T)(value: T) -> T where T: ToText { value }\n\
         show(10)",
    );

    assert_error_containing(&state, "the type Integer does not implement the trait ToText");
}

#[test]
fn array_literals_produce_shallow_instances() {
    let state = compile_main("let numbers = [10, 20]");

    assert_clean(&state);

    let module = state.modules.get("main").unwrap();
    let body = module.body.as_ref().unwrap();
    let resolved = body.expressions[0].resolved_type();

    assert_eq!(state.types.canonical(resolved), state.types.array_type());
    assert_eq!(state.types.type_name(resolved), "Array!(Integer)");
}

#[test]
fn throw_at_the_module_top_level_is_an_error() {
    let state = compile_main("throw 10");

    assert_error_containing(&state, "throw can not be used at the top level");
}

#[test]
fn throws_require_a_declared_throw_type() {
    let state = compile_main("def f { throw 10 }");

    assert_error_containing(
        &state,
        "throw can only be used in a block that declares a type to throw",
    );
}

#[test]
fn sends_to_throwing_methods_require_a_try() {
    let state = compile_main(
        "def risky !! Integer -> Integer { throw 10 }\n\
         def run -> Integer { risky() }",
    );

    assert_error_containing(&state, "may throw and requires a try");
}

#[test]
fn tried_sends_to_throwing_methods_are_fine() {
    let state = compile_main(
        "def risky !! Integer -> Integer { throw 10 }\n\
         def run -> Integer { try risky else (code) { code } }",
    );

    assert_clean(&state);
}

#[test]
fn unused_throw_types_warn_without_halting() {
    let state = compile_main("def quiet !! Integer { 10 }");

    assert!(!state.diagnostics.has_errors());
    assert!(state
        .diagnostics
        .iter()
        .any(|entry| entry.message.contains("nothing is ever thrown")));
}

#[test]
fn unreachable_code_after_return_warns() {
    let state = compile_main("def f -> Integer { return 10\n20 }");

    assert!(!state.diagnostics.has_errors());
    assert!(state
        .diagnostics
        .iter()
        .any(|entry| entry.message.contains("unreachable")));
}

#[test]
fn reassigning_immutable_locals_is_an_error() {
    let state = compile_main("let x = 10\nx = 20");

    assert_error_containing(&state, "cannot reassign the immutable local variable \"x\"");
}

#[test]
fn reassigning_mutable_locals_checks_the_type() {
    let clean = compile_main("let mut x = 10\nx = 20");

    assert_clean(&clean);

    let state = compile_main("let mut x = 10\nx = 'oops'");

    assert_error_containing(&state, "expected a value of type Integer, found String");
}

#[test]
fn closures_infer_their_return_type_and_can_be_called() {
    let state = compile_main(
        "let double = do (x: Integer) -> Integer { _INKOC.integer_mul(x, 2) }\n\
         double(5)",
    );

    assert_clean(&state);
}

#[test]
fn closure_argument_types_are_checked() {
    let state = compile_main(
        "let double = do (x: Integer) -> Integer { x }\n\
         double('text')",
    );

    assert_error_containing(&state, "expected a value of type Integer, found String");
}

#[test]
fn self_recursive_tail_sends_become_jumps() {
    let state = compile_main("def spin(n: Integer) -> Integer { self.spin(n) }");

    assert_clean(&state);

    let module = state.modules.get("main").unwrap();
    let lowered = module.body_tir.as_ref().unwrap();

    let method = lowered
        .body
        .iter()
        .find_map(|expression| match expression {
            tir::Expr::DefineMethod { name, block } if name == "spin" => Some(block),
            _ => None,
        })
        .expect("the method should be lowered");

    assert!(matches!(
        method.body.last(),
        Some(tir::Expr::TailJump { arguments }) if arguments.len() == 1
    ));
}

#[test]
fn capturing_closures_hoist_their_locals() {
    let state = compile_main(
        "def run -> Integer {\n\
           let base = 10\n\
           let add = do (x: Integer) -> Integer { let stored = x\n_INKOC.integer_add(base, stored) }\n\
           add(1)\n\
         }",
    );

    assert_clean(&state);

    let module = state.modules.get("main").unwrap();
    let lowered = module.body_tir.as_ref().unwrap();
    let method = lowered
        .body
        .iter()
        .find_map(|expression| match expression {
            tir::Expr::DefineMethod { name, block } if name == "run" => Some(block),
            _ => None,
        })
        .unwrap();

    let closure = method
        .body
        .iter()
        .find_map(|expression| match expression {
            tir::Expr::DefineLocal { value, .. } => match value.as_ref() {
                tir::Expr::Block(block) if block.kind == crate::types::BlockKind::Closure => {
                    Some(block)
                }
                _ => None,
            },
            _ => None,
        })
        .expect("the closure should be lowered");

    assert!(closure.captures);
    assert!(closure.hoisted_offset.is_some());
    // The hoisted slots land after the method's own locals.
    assert!(method.locals > 2);
}

#[test]
fn module_methods_are_module_attributes() {
    let state = compile_main("def helper -> Integer { 10 }\nhelper()");

    assert_clean(&state);

    let module = state.modules.get("main").unwrap();
    let found = state
        .types
        .lookup_method(module.module_type, "helper")
        .expect("the module should respond to helper");

    match state.types.get(found.block) {
        Type::Block(block) => {
            assert_eq!(block.return_type, state.types.integer_type());
        }
        other => panic!("expected a block type, got {other:?}"),
    }
}

#[test]
fn generic_objects_instantiate_through_type_arguments() {
    let state = compile_main(
        "object Box!(T) {\n\
           def put(value: T) -> T { value }\n\
         }\n\
         def test(box: Box!(Integer)) -> Integer { box.put(10) }",
    );

    assert_clean(&state);
}

#[test]
fn generic_argument_mismatches_are_reported() {
    let state = compile_main(
        "object Box!(T) {\n\
           def put(value: T) -> T { value }\n\
         }\n\
         def test(box: Box!(String)) -> String { box.put(10) }",
    );

    assert_error_containing(&state, "expected a value of type String, found Integer");
}

#[test]
fn keyword_arguments_must_name_a_parameter() {
    let state = compile_main("def greet(name: String) -> String { name }\ngreet(nome: 'x')");

    assert_error_containing(&state, "the keyword argument \"nome\" is unknown");
}

#[test]
fn lambdas_do_not_capture_locals() {
    let state = compile_main(
        "def run {\n\
           let outer = 10\n\
           let callback = lambda -> Integer { outer }\n\
           callback()\n\
         }",
    );

    assert_error_containing(&state, "the local variable \"outer\" is undefined");
}

#[test]
fn dereferencing_non_optionals_is_an_error() {
    let state = compile_main("let x = 10\nx!");

    assert_error_containing(&state, "is not an optional and can not be dereferenced");
}

#[test]
fn dereferencing_optionals_unwraps() {
    let state = compile_main("def unwrap(value: ?Integer) -> Integer { value! }");

    assert_clean(&state);
}
