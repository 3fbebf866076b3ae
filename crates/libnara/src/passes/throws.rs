//! Pass 16: throw validation.
//!
//! Structural rules for `throw` and throwing sends: a `throw` must appear in
//! a block whose signature declares a throw type (and never at the module's
//! top level), a send to a throwing method must be wrapped in a `try`, and a
//! block declaring a throw type it never uses gets a warning. This pass also
//! flags unreachable code after a terminating expression.

use log::debug;

use crate::{
    ast::{Body, Node},
    compiler::CompilerState,
    types::{Type, TypeId},
};

pub fn run(state: &mut CompilerState, name: &str, body: &Body) {
    debug!("validating throws for module {name:?}");

    let mut validator = Validator {
        state,
        blocks: Vec::new(),
        try_depth: 0,
    };

    validator.check_body(body);
}

/// The throw-relevant facts of an enclosing block.
struct EnclosingBlock {
    declared_throw: Option<TypeId>,
    location: crate::span::Span,
    /// Whether a throw (or a forwarded throwing send) was seen.
    throws: bool,
}

struct Validator<'a> {
    state: &'a mut CompilerState,
    blocks: Vec<EnclosingBlock>,
    try_depth: usize,
}

impl Validator<'_> {
    fn check_body(&mut self, body: &Body) {
        let mut terminated_at: Option<usize> = None;

        for (index, node) in body.expressions.iter().enumerate() {
            if let Some(previous) = terminated_at {
                if index == previous + 1 && node.produces_value() {
                    self.state
                        .diagnostics
                        .unreachable_code(node.location().clone());
                }
            }

            self.check_node(node);

            if node.terminates_block() {
                terminated_at = Some(index);
            }
        }
    }

    fn enter_block(&mut self, block_type: TypeId, location: &crate::span::Span, body: &Body) {
        let declared_throw = match self.state.types.get(block_type) {
            Type::Block(block) => block.throw_type,
            _ => None,
        };

        self.blocks.push(EnclosingBlock {
            declared_throw,
            location: location.clone(),
            throws: false,
        });

        let outer_tries = std::mem::take(&mut self.try_depth);

        self.check_body(body);
        self.try_depth = outer_tries;

        let finished = self.blocks.pop().unwrap();

        if finished.declared_throw.is_some() && !finished.throws {
            self.state.diagnostics.unused_throw_type(finished.location);
        }
    }

    fn check_node(&mut self, node: &Node) {
        match node {
            Node::Throw(throw) => {
                self.check_node(&throw.value);

                match self.blocks.last_mut() {
                    None => {
                        self.state
                            .diagnostics
                            .throw_at_top_level(throw.location.clone());
                    }
                    Some(block) => {
                        block.throws = true;

                        if block.declared_throw.is_none() {
                            self.state
                                .diagnostics
                                .throw_without_throw_type(throw.location.clone());
                        }
                    }
                }
            }
            Node::Send(send) => {
                if let Some(receiver) = &send.receiver {
                    self.check_node(receiver);
                }

                for argument in &send.arguments {
                    self.check_node(argument);
                }

                if send.throw_type.is_some() && self.try_depth == 0 {
                    self.state
                        .diagnostics
                        .missing_try(&send.name, send.location.clone());
                }
            }
            Node::Try(node) => {
                self.try_depth += 1;
                self.check_node(&node.expression);
                self.try_depth -= 1;

                match &node.else_body {
                    Some(body) => self.check_body(body),
                    None => {
                        // A `try` without an else handler rethrows, which
                        // counts as the enclosing block throwing.
                        let rethrows = matches!(
                            &node.expression,
                            Node::Send(send) if send.throw_type.is_some()
                        );

                        if rethrows {
                            if let Some(block) = self.blocks.last_mut() {
                                block.throws = true;
                            }
                        }
                    }
                }
            }
            Node::MethodDefinition(def) => {
                if let Some(body) = &def.body {
                    self.enter_block(def.resolved_type, &def.location, body);
                }
            }
            Node::Block(block) => {
                self.enter_block(block.resolved_type, &block.location, &block.body);
            }
            Node::ObjectDefinition(def) => self.check_body(&def.body),
            Node::TraitDefinition(def) => self.check_body(&def.body),
            Node::TraitImplementation(def) => self.check_body(&def.body),
            Node::KeywordArgument(argument) => self.check_node(&argument.value),
            Node::TemplateString(template) => {
                for part in &template.parts {
                    self.check_node(part);
                }
            }
            Node::DefineVariable(define) => self.check_node(&define.value),
            Node::ReassignVariable(reassign) => self.check_node(&reassign.value),
            Node::TypeCast(cast) => self.check_node(&cast.value),
            Node::Dereference(dereference) => self.check_node(&dereference.value),
            Node::Return(node) => {
                if let Some(value) = &node.value {
                    self.check_node(value);
                }
            }
            Node::Constant(constant) => {
                if let Some(receiver) = &constant.receiver {
                    self.check_node(receiver);
                }
            }
            Node::Body(body) => self.check_body(body),
            _ => {}
        }
    }
}
