//! Tests for definition and import parsing.

use pretty_assertions::assert_eq;

use crate::ast::{ImportSymbol, Node};
use crate::tests::parse_ok;

#[test]
fn imports_with_symbols_aliases_and_globs() {
    let body = parse_ok("import foo::bar::(Baz as Bla, *)");

    match &body.expressions[0] {
        Node::Import(import) => {
            assert_eq!(import.steps, vec!["foo", "bar"]);
            assert_eq!(import.symbols.len(), 2);

            match &import.symbols[0] {
                ImportSymbol::Symbol { name, alias, .. } => {
                    assert_eq!(name, "Baz");
                    assert_eq!(alias.as_deref(), Some("Bla"));
                }
                other => panic!("expected a named symbol, got {other:?}"),
            }

            assert!(matches!(import.symbols[1], ImportSymbol::Glob { .. }));
        }
        other => panic!("expected an import, got {other:?}"),
    }
}

#[test]
fn plain_imports_have_no_symbols_until_pass_eight() {
    let body = parse_ok("import std::fs");

    match &body.expressions[0] {
        Node::Import(import) => {
            assert_eq!(import.steps, vec!["std", "fs"]);
            assert_eq!(import.module_name(), "std::fs");
            assert!(import.symbols.is_empty());
        }
        other => panic!("expected an import, got {other:?}"),
    }
}

#[test]
fn imports_can_import_the_module_itself() {
    let body = parse_ok("import foo::(self as f, Bar)");

    match &body.expressions[0] {
        Node::Import(import) => {
            assert!(matches!(
                &import.symbols[0],
                ImportSymbol::SelfModule { alias: Some(alias), .. } if alias == "f"
            ));
        }
        other => panic!("expected an import, got {other:?}"),
    }
}

#[test]
fn full_method_definitions_parse() {
    let body = parse_ok(
        "def insert!(K, V)(key: K, value: V = value, *rest) !! Error -> K where K: Hash + Equal { key }",
    );

    match &body.expressions[0] {
        Node::MethodDefinition(def) => {
            assert_eq!(def.name, "insert");
            assert!(!def.static_method);
            assert_eq!(def.type_parameters.len(), 2);
            assert_eq!(def.type_parameters[0].name, "K");
            assert_eq!(def.type_parameters[0].bounds.len(), 2);
            assert_eq!(def.type_parameters[1].bounds.len(), 0);

            let names: Vec<&str> = def
                .arguments
                .iter()
                .map(|argument| argument.name.as_str())
                .collect();

            assert_eq!(names, vec!["key", "value", "rest"]);
            assert!(def.arguments[1].default.is_some());
            assert!(def.arguments[2].rest);
            assert!(def.throw_annotation.is_some());
            assert!(def.return_annotation.is_some());
            assert!(def.body.is_some());
        }
        other => panic!("expected a method definition, got {other:?}"),
    }
}

#[test]
fn operator_method_names() {
    let body = parse_ok("def +(other: Self) -> Self { other }\ndef [](index: Integer) { index }");

    match &body.expressions[0] {
        Node::MethodDefinition(def) => assert_eq!(def.name, "+"),
        other => panic!("expected a method definition, got {other:?}"),
    }

    match &body.expressions[1] {
        Node::MethodDefinition(def) => assert_eq!(def.name, "[]"),
        other => panic!("expected a method definition, got {other:?}"),
    }
}

#[test]
fn methods_without_bodies_are_required() {
    let body = parse_ok("trait ToText {\n  def text -> String\n  def inspect -> String { text }\n}");

    match &body.expressions[0] {
        Node::TraitDefinition(def) => {
            assert_eq!(def.name, "ToText");

            match &def.body.expressions[0] {
                Node::MethodDefinition(required) => {
                    assert_eq!(required.name, "text");
                    assert!(required.body.is_none());
                }
                other => panic!("expected a method definition, got {other:?}"),
            }

            match &def.body.expressions[1] {
                Node::MethodDefinition(provided) => assert!(provided.body.is_some()),
                other => panic!("expected a method definition, got {other:?}"),
            }
        }
        other => panic!("expected a trait definition, got {other:?}"),
    }
}

#[test]
fn objects_with_type_parameters() {
    let body = parse_ok("object Box!(T) {\n  def unwrap -> T { @value }\n}");

    match &body.expressions[0] {
        Node::ObjectDefinition(def) => {
            assert_eq!(def.name, "Box");
            assert_eq!(def.type_parameters.len(), 1);
            assert_eq!(def.type_parameters[0].name, "T");
        }
        other => panic!("expected an object definition, got {other:?}"),
    }
}

#[test]
fn traits_with_required_traits() {
    let body = parse_ok("trait Number: Add + Multiply { }");

    match &body.expressions[0] {
        Node::TraitDefinition(def) => {
            assert_eq!(def.required_traits.len(), 2);
        }
        other => panic!("expected a trait definition, got {other:?}"),
    }
}

#[test]
fn trait_implementations_take_one_target() {
    let body = parse_ok("impl ToText for Person {\n  def text -> String { 'person' }\n}");

    match &body.expressions[0] {
        Node::TraitImplementation(implementation) => {
            assert_eq!(implementation.object_name, "Person");
            assert_eq!(implementation.body.expressions.len(), 1);
        }
        other => panic!("expected a trait implementation, got {other:?}"),
    }
}

#[test]
fn let_bindings_classify_by_target() {
    let body = parse_ok("let x = 1\nlet mut y = 2\nlet Max = 3\nlet @attr = 4");
    let kinds: Vec<crate::ast::VariableKind> = body
        .expressions
        .iter()
        .map(|node| match node {
            Node::DefineVariable(define) => define.kind,
            other => panic!("expected a variable definition, got {other:?}"),
        })
        .collect();

    use crate::ast::VariableKind::*;

    assert_eq!(kinds, vec![Local, Local, Constant, Attribute]);

    match &body.expressions[1] {
        Node::DefineVariable(define) => assert!(define.mutable),
        _ => unreachable!(),
    }
}

#[test]
fn type_expressions_cover_optionals_generics_and_blocks() {
    let body = parse_ok(
        "def apply(callback: do (Integer) !! Error -> String, fallback: ?String, pairs: Map!(String, Integer)) { fallback }",
    );

    match &body.expressions[0] {
        Node::MethodDefinition(def) => {
            use crate::ast::TypeExpr;

            // The implicit self is inserted by the desugar pass, not here.
            assert_eq!(def.arguments.len(), 3);

            assert!(matches!(
                def.arguments[0].annotation,
                Some(TypeExpr::Block(_))
            ));
            assert!(matches!(
                def.arguments[1].annotation,
                Some(TypeExpr::Optional(_))
            ));

            match &def.arguments[2].annotation {
                Some(TypeExpr::Named(named)) => {
                    assert_eq!(named.steps, vec!["Map"]);
                    assert_eq!(named.type_arguments.len(), 2);
                }
                other => panic!("expected a named type, got {other:?}"),
            }
        }
        other => panic!("expected a method definition, got {other:?}"),
    }
}

#[test]
fn global_references_parse() {
    let body = parse_ok("::Thing");

    match &body.expressions[0] {
        Node::Global(global) => assert_eq!(global.name, "Thing"),
        other => panic!("expected a global, got {other:?}"),
    }
}
