//! Pass 17: lower the annotated AST into the typed IR.
//!
//! The interesting work happened in the type pass: every name carries its
//! binding and every node its type. Lowering maps node shapes onto
//! [`Expr`]s, inserts the explicit `self` receiver for self-method sends,
//! and hoists the locals of capturing closures into the enclosing method's
//! symbol table through its unique-names mode.

use log::debug;

use crate::{
    ast::{Binding, BlockLiteral, Body, MethodDefinition, Node, VariableKind},
    compiler::CompilerState,
    symbol::TableId,
    types::BlockKind,
};

use super::{Block, Expr};

pub fn run(state: &mut CompilerState, name: &str, body: &Body) -> Block {
    debug!("lowering module {name:?} to TIR");

    let globals = state
        .modules
        .get(name)
        .map(|module| module.globals)
        .unwrap_or(TableId::UNDEFINED);
    let mut lowering = Lower { state, globals };
    let expressions = lowering.lower_body(body, body.table);
    let locals = if body.table == TableId::UNDEFINED {
        0
    } else {
        lowering.state.tables.get(body.table).len()
    };

    Block {
        kind: BlockKind::Method,
        name: Some(name.to_string()),
        arguments: Vec::new(),
        locals,
        captures: false,
        hoisted_offset: None,
        body: expressions,
    }
}

struct Lower<'a> {
    state: &'a mut CompilerState,
    globals: TableId,
}

impl Lower<'_> {
    /// Lowers a body; `method_table` is the hoisting target for capturing
    /// closures.
    fn lower_body(&mut self, body: &Body, method_table: TableId) -> Vec<Expr> {
        body.expressions
            .iter()
            .filter_map(|node| self.lower_node(node, method_table))
            .collect()
    }

    fn global_index(&self, name: &str) -> i32 {
        if self.globals == TableId::UNDEFINED {
            return -1;
        }

        self.state
            .tables
            .get(self.globals)
            .get(name)
            .map(|symbol| symbol.index)
            .unwrap_or(-1)
    }

    fn lower_node(&mut self, node: &Node, method_table: TableId) -> Option<Expr> {
        let lowered = match node {
            Node::IntegerLiteral(literal) => Expr::Integer {
                value: literal.value,
            },
            Node::FloatLiteral(literal) => Expr::Float {
                value: literal.value,
            },
            Node::StringLiteral(literal) => Expr::String {
                value: literal.value.clone(),
            },
            Node::TemplateString(template) => Expr::Template {
                parts: template
                    .parts
                    .iter()
                    .filter_map(|part| self.lower_node(part, method_table))
                    .collect(),
            },
            Node::SelfObject(_) => Expr::GetSelf,
            Node::Identifier(identifier) => match identifier.binding {
                Binding::Local { depth, index } => Expr::GetLocal { depth, index },
                Binding::SelfMethod => Expr::SendMessage {
                    receiver: Box::new(Expr::GetSelf),
                    name: identifier.name.clone(),
                    arguments: Vec::new(),
                },
                Binding::Global { index } => Expr::GetGlobal {
                    index,
                    name: identifier.name.clone(),
                },
                Binding::Unresolved => Expr::GetGlobal {
                    index: -1,
                    name: identifier.name.clone(),
                },
            },
            Node::Constant(constant) => match &constant.receiver {
                Some(receiver) => Expr::GetAttributeOf {
                    receiver: Box::new(self.lower_node(receiver, method_table)?),
                    name: constant.name.clone(),
                },
                None => Expr::GetGlobal {
                    index: self.global_index(&constant.name),
                    name: constant.name.clone(),
                },
            },
            Node::Global(global) => Expr::GetGlobal {
                index: match global.binding {
                    Binding::Global { index } => index,
                    _ => self.global_index(&global.name),
                },
                name: global.name.clone(),
            },
            Node::Attribute(attribute) => Expr::GetAttribute {
                name: attribute.name.clone(),
            },
            Node::Send(send) => self.lower_send(send, method_table)?,
            Node::KeywordArgument(argument) => Expr::Keyword {
                name: argument.name.clone(),
                value: Box::new(self.lower_node(&argument.value, method_table)?),
            },
            Node::Block(block) => Expr::Block(self.lower_block(block, method_table)),
            Node::MethodDefinition(def) => Expr::DefineMethod {
                name: def.name.clone(),
                block: self.lower_method(def),
            },
            Node::ObjectDefinition(def) => Expr::DefineObject {
                name: def.name.clone(),
                body: self.lower_body(&def.body, method_table),
            },
            Node::TraitDefinition(def) => Expr::DefineTrait {
                name: def.name.clone(),
                body: self.lower_body(&def.body, method_table),
            },
            Node::TraitImplementation(def) => Expr::ImplementTrait {
                trait_name: self.state.types.type_name(def.resolved_type),
                object_name: def.object_name.clone(),
                body: self.lower_body(&def.body, method_table),
            },
            Node::Import(import) => Expr::LoadModule {
                name: import.module_name(),
            },
            Node::Return(node) => Expr::Return {
                value: node
                    .value
                    .as_ref()
                    .and_then(|value| self.lower_node(value, method_table))
                    .map(Box::new),
            },
            Node::Throw(node) => Expr::Throw {
                value: Box::new(self.lower_node(&node.value, method_table)?),
            },
            Node::Try(node) => Expr::Try {
                expression: Box::new(self.lower_node(&node.expression, method_table)?),
                else_argument: node.else_argument.as_ref().map(|_| 0),
                else_body: node
                    .else_body
                    .as_ref()
                    .map(|body| self.lower_body(body, method_table))
                    .unwrap_or_default(),
            },
            Node::DefineVariable(define) => {
                let value = Box::new(self.lower_node(&define.value, method_table)?);

                match define.kind {
                    VariableKind::Local => Expr::DefineLocal {
                        index: match define.binding {
                            Binding::Local { index, .. } => index,
                            _ => -1,
                        },
                        value,
                    },
                    VariableKind::Attribute => Expr::DefineAttribute {
                        name: define.name.clone(),
                        value,
                    },
                    VariableKind::Constant => Expr::DefineConstant {
                        name: define.name.clone(),
                        value,
                    },
                }
            }
            Node::ReassignVariable(reassign) => {
                let value = Box::new(self.lower_node(&reassign.value, method_table)?);

                match reassign.kind {
                    VariableKind::Local => match reassign.binding {
                        Binding::Local { depth, index } => Expr::SetLocal {
                            depth,
                            index,
                            value,
                        },
                        _ => Expr::SetLocal {
                            depth: -1,
                            index: -1,
                            value,
                        },
                    },
                    _ => Expr::SetAttribute {
                        name: reassign.name.clone(),
                        value,
                    },
                }
            }
            Node::TypeCast(cast) => Expr::Cast {
                value: Box::new(self.lower_node(&cast.value, method_table)?),
            },
            Node::Dereference(dereference) => Expr::Dereference {
                value: Box::new(self.lower_node(&dereference.value, method_table)?),
            },
            Node::Body(body) => {
                let mut lowered = self.lower_body(body, method_table);

                match lowered.len() {
                    0 => Expr::Nil,
                    1 => lowered.remove(0),
                    _ => Expr::Sequence { expressions: lowered },
                }
            }
            Node::Documentation(_) => return None,
        };

        Some(lowered)
    }

    fn lower_send(&mut self, send: &crate::ast::Send, method_table: TableId) -> Option<Expr> {
        let arguments: Vec<Expr> = send
            .arguments
            .iter()
            .filter_map(|argument| self.lower_node(argument, method_table))
            .collect();

        // Raw instruction sends keep their instruction name.
        if let Some(Node::Constant(constant)) = &send.receiver {
            if constant.name == crate::types::RAW_RECEIVER && constant.receiver.is_none() {
                return Some(Expr::RawInstruction {
                    name: send.name.clone(),
                    arguments,
                });
            }
        }

        let lowered = match &send.receiver {
            Some(receiver) => Expr::SendMessage {
                receiver: Box::new(self.lower_node(receiver, method_table)?),
                name: send.name.clone(),
                arguments,
            },
            None => match send.callee {
                Binding::Local { depth, index } => Expr::SendMessage {
                    receiver: Box::new(Expr::GetLocal { depth, index }),
                    name: "call".to_string(),
                    arguments,
                },
                Binding::Global { index } => Expr::SendMessage {
                    receiver: Box::new(Expr::GetGlobal {
                        index,
                        name: send.name.clone(),
                    }),
                    name: "call".to_string(),
                    arguments,
                },
                // The explicit self receiver of a self-method send.
                _ => Expr::SendMessage {
                    receiver: Box::new(Expr::GetSelf),
                    name: send.name.clone(),
                    arguments,
                },
            },
        };

        Some(lowered)
    }

    fn lower_method(&mut self, def: &MethodDefinition) -> Block {
        let body = def
            .body
            .as_ref()
            .map(|body| self.lower_body(body, def.table))
            .unwrap_or_default();
        let locals = if def.table == TableId::UNDEFINED {
            0
        } else {
            self.state.tables.get(def.table).len()
        };

        Block {
            kind: BlockKind::Method,
            name: Some(def.name.clone()),
            arguments: def
                .arguments
                .iter()
                .map(|argument| argument.name.clone())
                .collect(),
            locals,
            captures: false,
            hoisted_offset: None,
            body,
        }
    }

    /// Lowers a closure or lambda literal. A capturing closure has its
    /// locals hoisted into the enclosing method's table under unique names.
    fn lower_block(&mut self, block: &BlockLiteral, method_table: TableId) -> Block {
        let kind = match block.kind {
            crate::ast::BlockKind::Closure => BlockKind::Closure,
            crate::ast::BlockKind::Lambda => BlockKind::Lambda,
        };
        let body = self.lower_body(&block.body, method_table);
        let locals = if block.table == TableId::UNDEFINED {
            0
        } else {
            self.state.tables.get(block.table).len()
        };

        let hoisted_offset = if block.captures
            && method_table != TableId::UNDEFINED
            && block.table != TableId::UNDEFINED
        {
            Some(self.hoist_locals(block.table, method_table))
        } else {
            None
        };

        Block {
            kind,
            name: None,
            arguments: block
                .arguments
                .iter()
                .map(|argument| argument.name.clone())
                .collect(),
            locals,
            captures: block.captures,
            hoisted_offset,
            body,
        }
    }

    /// Re-defines a capturing closure's locals in the enclosing method's
    /// table, in unique-names mode so different closures' locals never
    /// collide. Returns the index of the first hoisted slot.
    fn hoist_locals(&mut self, closure_table: TableId, method_table: TableId) -> usize {
        let offset = self.state.tables.get(method_table).len();
        let symbols: Vec<(String, crate::types::TypeId, bool)> = self
            .state
            .tables
            .get(closure_table)
            .symbols()
            .map(|symbol| (symbol.name.clone(), symbol.value_type, symbol.mutable))
            .collect();

        self.state.tables.with_unique_names(method_table, |tables| {
            for (name, value_type, mutable) in symbols {
                tables.define(method_table, name, value_type, mutable);
            }
        });

        offset
    }
}
