//! Pass 10: attach a symbol table to every scope-introducing node.
//!
//! The module body gets the root table. Closures and `try` else handlers
//! chain to their enclosing scope; methods root their own chain, since they
//! do not capture the surrounding locals. Symbols themselves are defined by
//! later passes as they are encountered.

use crate::{
    ast::{Body, Node},
    compiler::CompilerState,
    symbol::{SymbolTables, TableId},
};

pub fn run(state: &mut CompilerState, name: &str, body: &mut Body) {
    let root = state.tables.alloc(None);

    body.table = root;

    if let Some(module) = state.modules.get_mut(name) {
        module.root_table = root;
    }

    for node in &mut body.expressions {
        attach(&mut state.tables, node, root);
    }
}

fn attach_body(tables: &mut SymbolTables, body: &mut Body, table: TableId) {
    body.table = table;

    for node in &mut body.expressions {
        attach(tables, node, table);
    }
}

fn attach(tables: &mut SymbolTables, node: &mut Node, current: TableId) {
    match node {
        Node::Block(block) => {
            let table = tables.alloc(Some(current));

            block.table = table;

            for argument in &mut block.arguments {
                if let Some(default) = &mut argument.default {
                    attach(tables, default, table);
                }
            }

            attach_body(tables, &mut block.body, table);
        }
        Node::MethodDefinition(def) => {
            let table = tables.alloc(None);

            def.table = table;

            for argument in &mut def.arguments {
                if let Some(default) = &mut argument.default {
                    attach(tables, default, table);
                }
            }

            if let Some(body) = &mut def.body {
                attach_body(tables, body, table);
            }
        }
        Node::ObjectDefinition(def) => {
            let table = tables.alloc(Some(current));

            attach_body(tables, &mut def.body, table);
        }
        Node::TraitDefinition(def) => {
            let table = tables.alloc(Some(current));

            attach_body(tables, &mut def.body, table);
        }
        Node::TraitImplementation(def) => {
            let table = tables.alloc(Some(current));

            attach_body(tables, &mut def.body, table);
        }
        Node::Try(node) => {
            attach(tables, &mut node.expression, current);

            if let Some(body) = &mut node.else_body {
                let table = tables.alloc(Some(current));

                node.else_table = table;
                attach_body(tables, body, table);
            }
        }
        Node::Send(send) => {
            if let Some(receiver) = &mut send.receiver {
                attach(tables, receiver, current);
            }

            for argument in &mut send.arguments {
                attach(tables, argument, current);
            }
        }
        Node::KeywordArgument(argument) => attach(tables, &mut argument.value, current),
        Node::TemplateString(template) => {
            for part in &mut template.parts {
                attach(tables, part, current);
            }
        }
        Node::DefineVariable(define) => attach(tables, &mut define.value, current),
        Node::ReassignVariable(reassign) => attach(tables, &mut reassign.value, current),
        Node::TypeCast(cast) => attach(tables, &mut cast.value, current),
        Node::Dereference(dereference) => attach(tables, &mut dereference.value, current),
        Node::Return(node) => {
            if let Some(value) = &mut node.value {
                attach(tables, value, current);
            }
        }
        Node::Throw(node) => attach(tables, &mut node.value, current),
        Node::Constant(constant) => {
            if let Some(receiver) = &mut constant.receiver {
                attach(tables, receiver, current);
            }
        }
        Node::Body(body) => attach_body(tables, body, current),
        _ => {}
    }
}
