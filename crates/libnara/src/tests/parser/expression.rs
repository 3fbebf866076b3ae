//! Tests for expression parsing: operator sends, call rules, literals, and
//! their desugarings.

use pretty_assertions::assert_eq;

use crate::ast::{Node, VariableKind};
use crate::tests::{parse, parse_ok};

fn integer(node: &Node) -> i64 {
    match node {
        Node::IntegerLiteral(literal) => literal.value,
        other => panic!("expected an integer literal, got {other:?}"),
    }
}

fn send(node: &Node) -> &crate::ast::Send {
    match node {
        Node::Send(send) => send,
        other => panic!("expected a send, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let body = parse_ok("10 + 20 * 30");
    let add = send(&body.expressions[0]);

    assert_eq!(add.name, "+");
    assert_eq!(integer(add.receiver.as_ref().unwrap()), 10);

    let mul = send(&add.arguments[0]);

    assert_eq!(mul.name, "*");
    assert_eq!(integer(mul.receiver.as_ref().unwrap()), 20);
    assert_eq!(integer(&mul.arguments[0]), 30);
}

#[test]
fn binary_operators_are_left_associative() {
    let body = parse_ok("1 + 2 + 3");
    let outer = send(&body.expressions[0]);

    assert_eq!(outer.name, "+");
    assert_eq!(integer(&outer.arguments[0]), 3);

    let inner = send(outer.receiver.as_ref().unwrap());

    assert_eq!(inner.name, "+");
    assert_eq!(integer(inner.receiver.as_ref().unwrap()), 1);
    assert_eq!(integer(&inner.arguments[0]), 2);
}

#[test]
fn identifier_followed_by_values_is_a_call() {
    let body = parse_ok("foo 10, 20\n30");

    assert_eq!(body.expressions.len(), 2);

    let call = send(&body.expressions[0]);

    assert_eq!(call.name, "foo");
    assert!(call.receiver.is_none());
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(integer(&call.arguments[0]), 10);
    assert_eq!(integer(&call.arguments[1]), 20);
    assert_eq!(integer(&body.expressions[1]), 30);
}

#[test]
fn send_chain_continues_a_binary_expression_across_lines() {
    let body = parse_ok("x == y\n  .if_true { }");

    assert_eq!(body.expressions.len(), 1);

    let chained = send(&body.expressions[0]);

    assert_eq!(chained.name, "if_true");

    let receiver = send(chained.receiver.as_ref().unwrap());

    assert_eq!(receiver.name, "==");
    assert!(matches!(chained.arguments[0], Node::Block(_)));
}

#[test]
fn array_literals_desugar_to_array_new() {
    let body = parse_ok("[10, 20]");
    let call = send(&body.expressions[0]);

    assert_eq!(call.name, "new");

    match call.receiver.as_ref().unwrap() {
        Node::Global(global) => assert_eq!(global.name, "Array"),
        other => panic!("expected the Array global, got {other:?}"),
    }

    assert_eq!(integer(&call.arguments[0]), 10);
    assert_eq!(integer(&call.arguments[1]), 20);
}

#[test]
fn map_literals_desugar_to_map_from_array() {
    let body = parse_ok("%['a': 10, 'b': 20]");
    let call = send(&body.expressions[0]);

    assert_eq!(call.name, "from_array");

    match call.receiver.as_ref().unwrap() {
        Node::Global(global) => assert_eq!(global.name, "Map"),
        other => panic!("expected the Map global, got {other:?}"),
    }

    let keys = send(&call.arguments[0]);
    let values = send(&call.arguments[1]);

    assert_eq!(keys.name, "new");
    assert_eq!(values.name, "new");
    assert_eq!(keys.arguments.len(), 2);
    assert_eq!(integer(&values.arguments[0]), 10);
}

#[test]
fn bracket_access_requires_the_same_line() {
    let body = parse_ok("[10][0]");
    let index = send(&body.expressions[0]);

    assert_eq!(index.name, "[]");
    assert_eq!(integer(&index.arguments[0]), 0);

    let split = parse_ok("[10]\n[20]");

    assert_eq!(split.expressions.len(), 2);
    assert_eq!(send(&split.expressions[0]).name, "new");
    assert_eq!(send(&split.expressions[1]).name, "new");
}

#[test]
fn bracket_assignment_desugars_to_index_set() {
    let body = parse_ok("items[0] = 10");
    let set = send(&body.expressions[0]);

    assert_eq!(set.name, "[]=");
    assert_eq!(set.arguments.len(), 2);
    assert_eq!(integer(&set.arguments[0]), 0);
    assert_eq!(integer(&set.arguments[1]), 10);
}

#[test]
fn compound_assignment_rewrites_to_a_send_and_reassignment() {
    let body = parse_ok("total += 5");

    match &body.expressions[0] {
        Node::ReassignVariable(reassign) => {
            assert_eq!(reassign.name, "total");
            assert_eq!(reassign.kind, VariableKind::Local);

            let operator = send(&reassign.value);

            assert_eq!(operator.name, "+");
            assert_eq!(integer(&operator.arguments[0]), 5);

            match operator.receiver.as_ref().unwrap() {
                Node::Identifier(identifier) => assert_eq!(identifier.name, "total"),
                other => panic!("expected an identifier receiver, got {other:?}"),
            }
        }
        other => panic!("expected a reassignment, got {other:?}"),
    }
}

#[test]
fn try_with_else_handler() {
    let body = parse_ok("try foo else (e) { e }");

    match &body.expressions[0] {
        Node::Try(node) => {
            assert_eq!(send(&node.expression).name, "foo");
            assert_eq!(node.else_argument.as_deref(), Some("e"));

            let else_body = node.else_body.as_ref().unwrap();

            match &else_body.expressions[0] {
                Node::Identifier(identifier) => assert_eq!(identifier.name, "e"),
                other => panic!("expected an identifier, got {other:?}"),
            }
        }
        other => panic!("expected a try, got {other:?}"),
    }
}

#[test]
fn try_bang_desugars_to_a_panicking_handler() {
    let body = parse_ok("try! foo");

    match &body.expressions[0] {
        Node::Try(node) => {
            assert_eq!(send(&node.expression).name, "foo");
            assert_eq!(node.else_argument.as_deref(), Some("error"));

            let else_body = node.else_body.as_ref().unwrap();
            let panic = send(&else_body.expressions[0]);

            assert_eq!(panic.name, "panic");

            match panic.receiver.as_ref().unwrap() {
                Node::Constant(constant) => assert_eq!(constant.name, "_INKOC"),
                other => panic!("expected the raw receiver constant, got {other:?}"),
            }

            let to_string = send(&panic.arguments[0]);

            assert_eq!(to_string.name, "to_string");

            match to_string.receiver.as_ref().unwrap() {
                Node::Identifier(identifier) => assert_eq!(identifier.name, "error"),
                other => panic!("expected the error identifier, got {other:?}"),
            }
        }
        other => panic!("expected a try, got {other:?}"),
    }
}

#[test]
fn template_strings_parse_into_parts() {
    let body = parse_ok("`a {b} c`");

    match &body.expressions[0] {
        Node::TemplateString(template) => {
            assert_eq!(template.parts.len(), 3);
            assert!(matches!(template.parts[0], Node::StringLiteral(_)));
            assert!(matches!(template.parts[1], Node::Identifier(_)));
            assert!(matches!(template.parts[2], Node::StringLiteral(_)));
        }
        other => panic!("expected a template string, got {other:?}"),
    }
}

#[test]
fn casts_have_the_lowest_precedence() {
    let body = parse_ok("1 + 2 as Float");

    match &body.expressions[0] {
        Node::TypeCast(cast) => {
            assert_eq!(send(&cast.value).name, "+");
        }
        other => panic!("expected a cast, got {other:?}"),
    }
}

#[test]
fn postfix_bang_dereferences() {
    let body = parse_ok("value!");

    match &body.expressions[0] {
        Node::Dereference(dereference) => match &dereference.value {
            Node::Identifier(identifier) => assert_eq!(identifier.name, "value"),
            other => panic!("expected an identifier, got {other:?}"),
        },
        other => panic!("expected a dereference, got {other:?}"),
    }
}

#[test]
fn keyword_arguments_parse_in_call_lists() {
    let body = parse_ok("foo(name: 10)");
    let call = send(&body.expressions[0]);

    match &call.arguments[0] {
        Node::KeywordArgument(argument) => {
            assert_eq!(argument.name, "name");
            assert_eq!(integer(&argument.value), 10);
        }
        other => panic!("expected a keyword argument, got {other:?}"),
    }
}

#[test]
fn trailing_blocks_attach_to_the_call() {
    let body = parse_ok("foo(10) { 20 }");
    let call = send(&body.expressions[0]);

    assert_eq!(call.arguments.len(), 2);
    assert!(matches!(call.arguments[1], Node::Block(_)));
}

#[test]
fn syntax_errors_recover_at_blank_lines() {
    let (body, diagnostics) = parse("let = 10\n\nlet x = 20\nlet = 30");

    assert!(diagnostics.has_errors());
    assert!(diagnostics.len() >= 2);
    assert!(body
        .expressions
        .iter()
        .any(|node| matches!(node, Node::DefineVariable(_))));
}

#[test]
fn unexpected_end_of_input_is_fatal() {
    let (_, diagnostics) = parse("foo(1,");

    assert!(diagnostics.has_errors());
    assert!(diagnostics
        .iter()
        .any(|entry| entry.message.contains("unexpected end of input")));
}
