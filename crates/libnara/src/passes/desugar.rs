//! Pass 3: desugar definitions into their canonical AST shape.
//!
//! Instance methods receive an explicit `self` as their first argument, and
//! documentation nodes preceding a definition are attached to it. Literal
//! desugarings (arrays, maps, compound assignments, `try!`) already happened
//! in the parser.

use crate::ast::{Body, MethodArgument, MethodDefinition, Node};

pub fn run(body: &mut Body) {
    desugar_body(body);
}

fn desugar_body(body: &mut Body) {
    attach_documentation(body);

    for node in &mut body.expressions {
        desugar_node(node);
    }
}

fn desugar_node(node: &mut Node) {
    match node {
        Node::MethodDefinition(def) => {
            add_implicit_self(def);

            if let Some(body) = &mut def.body {
                desugar_body(body);
            }
        }
        Node::ObjectDefinition(def) => desugar_body(&mut def.body),
        Node::TraitDefinition(def) => desugar_body(&mut def.body),
        Node::TraitImplementation(def) => desugar_body(&mut def.body),
        Node::Block(block) => desugar_body(&mut block.body),
        Node::Try(node) => {
            desugar_node(&mut node.expression);

            if let Some(body) = &mut node.else_body {
                desugar_body(body);
            }
        }
        Node::Send(send) => {
            if let Some(receiver) = &mut send.receiver {
                desugar_node(receiver);
            }

            for argument in &mut send.arguments {
                desugar_node(argument);
            }
        }
        Node::KeywordArgument(argument) => desugar_node(&mut argument.value),
        Node::TemplateString(template) => {
            for part in &mut template.parts {
                desugar_node(part);
            }
        }
        Node::DefineVariable(define) => desugar_node(&mut define.value),
        Node::ReassignVariable(reassign) => desugar_node(&mut reassign.value),
        Node::TypeCast(cast) => desugar_node(&mut cast.value),
        Node::Dereference(dereference) => desugar_node(&mut dereference.value),
        Node::Return(node) => {
            if let Some(value) = &mut node.value {
                desugar_node(value);
            }
        }
        Node::Throw(node) => desugar_node(&mut node.value),
        Node::Constant(constant) => {
            if let Some(receiver) = &mut constant.receiver {
                desugar_node(receiver);
            }
        }
        Node::Body(body) => desugar_body(body),
        _ => {}
    }
}

/// Instance methods take `self` as their explicit first argument.
fn add_implicit_self(def: &mut MethodDefinition) {
    if def.static_method {
        return;
    }

    if def.arguments.first().map(|argument| argument.name.as_str()) == Some("self") {
        return;
    }

    def.arguments.insert(
        0,
        MethodArgument {
            name: "self".to_string(),
            annotation: None,
            default: None,
            rest: false,
            mutable: false,
            location: def.location.clone(),
        },
    );
}

/// Moves a documentation node onto the definition that follows it.
fn attach_documentation(body: &mut Body) {
    let mut index = 0;

    while index + 1 < body.expressions.len() {
        let text = match &body.expressions[index] {
            Node::Documentation(doc) => match &body.expressions[index + 1] {
                Node::MethodDefinition(_) | Node::ObjectDefinition(_) | Node::TraitDefinition(_) => {
                    Some(doc.text.clone())
                }
                _ => None,
            },
            _ => None,
        };

        if let Some(text) = text {
            body.expressions.remove(index);

            match &mut body.expressions[index] {
                Node::MethodDefinition(def) => def.documentation = Some(text),
                Node::ObjectDefinition(def) => def.documentation = Some(text),
                Node::TraitDefinition(def) => def.documentation = Some(text),
                _ => {}
            }
        } else {
            index += 1;
        }
    }
}
