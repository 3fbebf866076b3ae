//! Pass 15: type inference and checking.
//!
//! Walks every expression, annotates each value-producing node with its
//! resolved type, and reports type mismatches, unknown names, arity errors,
//! optional-chain violations, and trait-bound violations. Symbol bindings
//! (local depth and index, self methods, globals) are recorded on the nodes
//! for the TIR lowering pass.

use log::debug;

use crate::{
    ast::{
        AttributeRef, Binding, BlockLiteral, Body, Constant, DefineVariable, Dereference,
        Global, Identifier, MethodDefinition, Node, ReassignVariable, Return, Send, Throw, Try,
        TypeCast, VariableKind,
    },
    compiler::CompilerState,
    symbol::TableId,
    types::{
        raw::RawInstruction, reserved_constant, BlockKind, BlockType, Type, TypeId,
        TypeParameterTable, RAW_RECEIVER,
    },
};

use super::signatures::{resolve_type_expr, TypeScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Module,
    ObjectBody,
    Method,
    Closure,
    Lambda,
}

/// The innermost block being inferred.
#[derive(Debug, Clone)]
struct BlockContext {
    table: TableId,
    self_type: TypeId,
    /// The block type of the enclosing method or closure;
    /// [`TypeId::UNDEFINED`] for module and object bodies.
    block: TypeId,
    kind: ContextKind,
    parameters: Vec<(String, TypeId)>,
    captured: bool,
}

pub fn run(state: &mut CompilerState, name: &str, body: &mut Body) {
    let Some(module) = state.modules.get(name) else {
        return;
    };

    debug!("inferring types for module {name:?}");

    let mut infer = Infer {
        module_type: module.module_type,
        globals: module.globals,
        contexts: vec![BlockContext {
            table: body.table,
            self_type: module.module_type,
            block: TypeId::UNDEFINED,
            kind: ContextKind::Module,
            parameters: Vec::new(),
            captured: false,
        }],
        state,
    };

    infer.infer_body(body);
}

struct Infer<'a> {
    state: &'a mut CompilerState,
    module_type: TypeId,
    globals: TableId,
    contexts: Vec<BlockContext>,
}

impl Infer<'_> {
    fn ctx(&self) -> &BlockContext {
        self.contexts.last().unwrap()
    }

    fn type_scope(&self) -> TypeScope {
        TypeScope {
            module_type: self.module_type,
            globals: self.globals,
            self_type: Some(self.ctx().self_type),
            parameters: self
                .contexts
                .iter()
                .flat_map(|context| context.parameters.iter().cloned())
                .collect(),
        }
    }

    fn resolve_annotation(&mut self, expr: &crate::ast::TypeExpr) -> TypeId {
        let scope = self.type_scope();

        resolve_type_expr(self.state, &scope, expr)
    }

    fn infer_body(&mut self, body: &mut Body) -> TypeId {
        let mut last = self.state.types.nil_type();

        for node in &mut body.expressions {
            let inferred = self.infer_node(node);

            if node.produces_value() {
                last = inferred;
            }
        }

        body.resolved_type = last;
        last
    }

    /// True when the body's value is produced by a terminating expression,
    /// in which case the implicit return type check does not apply.
    fn body_terminates(body: &Body) -> bool {
        body.expressions
            .last()
            .map(|node| node.terminates_block())
            .unwrap_or(false)
    }

    fn infer_node(&mut self, node: &mut Node) -> TypeId {
        match node {
            Node::IntegerLiteral(literal) => {
                literal.resolved_type = self.state.types.integer_type();
                literal.resolved_type
            }
            Node::FloatLiteral(literal) => {
                literal.resolved_type = self.state.types.float_type();
                literal.resolved_type
            }
            Node::StringLiteral(literal) => {
                literal.resolved_type = self.state.types.string_type();
                literal.resolved_type
            }
            Node::TemplateString(template) => {
                for part in &mut template.parts {
                    self.infer_node(part);
                }

                template.resolved_type = self.state.types.string_type();
                template.resolved_type
            }
            Node::SelfObject(this) => {
                this.resolved_type = self.ctx().self_type;
                this.resolved_type
            }
            Node::Identifier(identifier) => self.infer_identifier(identifier),
            Node::Constant(constant) => self.infer_constant(constant),
            Node::Attribute(attribute) => self.infer_attribute(attribute),
            Node::Global(global) => self.infer_global(global),
            Node::Send(send) => self.infer_send(send),
            Node::KeywordArgument(argument) => self.infer_node(&mut argument.value),
            Node::Block(block) => self.infer_block(block),
            Node::MethodDefinition(def) => self.infer_method(def),
            Node::ObjectDefinition(def) => {
                let object = def.resolved_type;

                if object.is_undefined() {
                    self.state.diagnostics.error(
                        "objects may only be defined at the top level of a module",
                        def.location.clone(),
                    );
                    return self.state.types.error_type();
                }

                self.contexts.push(BlockContext {
                    table: def.body.table,
                    self_type: object,
                    block: TypeId::UNDEFINED,
                    kind: ContextKind::ObjectBody,
                    parameters: def.parameter_types.clone(),
                    captured: false,
                });
                self.infer_body(&mut def.body);
                self.contexts.pop();
                object
            }
            Node::TraitDefinition(def) => {
                let trait_type = def.resolved_type;

                if trait_type.is_undefined() {
                    self.state.diagnostics.error(
                        "traits may only be defined at the top level of a module",
                        def.location.clone(),
                    );
                    return self.state.types.error_type();
                }

                self.contexts.push(BlockContext {
                    table: def.body.table,
                    self_type: trait_type,
                    block: TypeId::UNDEFINED,
                    kind: ContextKind::ObjectBody,
                    parameters: def.parameter_types.clone(),
                    captured: false,
                });
                self.infer_body(&mut def.body);
                self.contexts.pop();
                trait_type
            }
            Node::TraitImplementation(def) => {
                let object = self
                    .state
                    .tables
                    .get(self.globals)
                    .get(&def.object_name)
                    .map(|symbol| symbol.value_type);

                if let Some(object) = object {
                    self.contexts.push(BlockContext {
                        table: def.body.table,
                        self_type: object,
                        block: TypeId::UNDEFINED,
                        kind: ContextKind::ObjectBody,
                        parameters: Vec::new(),
                        captured: false,
                    });
                    self.infer_body(&mut def.body);
                    self.contexts.pop();
                }

                def.resolved_type
            }
            Node::Import(_) | Node::Documentation(_) => TypeId::UNDEFINED,
            Node::Return(node) => self.infer_return(node),
            Node::Throw(node) => self.infer_throw(node),
            Node::Try(node) => self.infer_try(node),
            Node::DefineVariable(node) => self.infer_define_variable(node),
            Node::ReassignVariable(node) => self.infer_reassign(node),
            Node::TypeCast(node) => self.infer_cast(node),
            Node::Dereference(node) => self.infer_dereference(node),
            Node::Body(body) => self.infer_body(body),
        }
    }

    // Names

    /// Identifier lookup order: block arguments and locals (through the
    /// lexical chain), then methods on `self`, then module globals.
    fn infer_identifier(&mut self, identifier: &mut Identifier) -> TypeId {
        let ctx = self.ctx().clone();
        let (depth, symbol) = self
            .state
            .tables
            .lookup_with_parent(ctx.table, &identifier.name);

        // Lambdas do not capture enclosing locals.
        if !symbol.is_null() && (depth == -1 || ctx.kind != ContextKind::Lambda) {
            if depth >= 0 && ctx.kind == ContextKind::Closure {
                self.contexts.last_mut().unwrap().captured = true;
            }

            identifier.binding = Binding::Local {
                depth,
                index: symbol.index,
            };
            identifier.resolved_type = symbol.value_type;
            return identifier.resolved_type;
        }

        if let Some(found) = self.state.types.lookup_method(ctx.self_type, &identifier.name) {
            let return_type = match self.state.types.get(found.block) {
                Type::Block(block) => block.return_type,
                _ => self.state.types.dynamic_type(),
            };

            identifier.binding = Binding::SelfMethod;
            identifier.resolved_type = return_type;
            return identifier.resolved_type;
        }

        if let Some(symbol) = self.state.tables.get(self.globals).get(&identifier.name) {
            identifier.binding = Binding::Global {
                index: symbol.index,
            };
            identifier.resolved_type = symbol.value_type;
            return identifier.resolved_type;
        }

        self.state
            .diagnostics
            .undefined_local(&identifier.name, identifier.location.clone());
        identifier.resolved_type = self.state.types.error_type();
        identifier.resolved_type
    }

    /// Constant lookup: locals, attributes of `self`, then globals; `A::B`
    /// chains through the receiver's attributes.
    fn infer_constant(&mut self, constant: &mut Constant) -> TypeId {
        if let Some(receiver) = &mut constant.receiver {
            let receiver_type = self.infer_node(receiver);

            constant.resolved_type =
                match self.state.types.lookup_attribute(receiver_type, &constant.name) {
                    Some(found) => found,
                    None => {
                        self.state
                            .diagnostics
                            .undefined_constant(&constant.name, constant.location.clone());
                        self.state.types.error_type()
                    }
                };
            return constant.resolved_type;
        }

        if constant.name == RAW_RECEIVER {
            constant.resolved_type = self.state.types.dynamic_type();
            return constant.resolved_type;
        }

        let ctx = self.ctx().clone();
        let (_, symbol) = self.state.tables.lookup_with_parent(ctx.table, &constant.name);

        if !symbol.is_null() {
            constant.resolved_type = symbol.value_type;
            return constant.resolved_type;
        }

        if let Some(found) = self
            .state
            .types
            .lookup_attribute(ctx.self_type, &constant.name)
        {
            constant.resolved_type = found;
            return constant.resolved_type;
        }

        if let Some(symbol) = self.state.tables.get(self.globals).get(&constant.name) {
            constant.resolved_type = symbol.value_type;
            return constant.resolved_type;
        }

        self.state
            .diagnostics
            .undefined_constant(&constant.name, constant.location.clone());
        constant.resolved_type = self.state.types.error_type();
        constant.resolved_type
    }

    fn infer_attribute(&mut self, attribute: &mut AttributeRef) -> TypeId {
        let self_type = self.ctx().self_type;

        attribute.resolved_type =
            match self.state.types.lookup_attribute(self_type, &attribute.name) {
                Some(found) => found,
                None => {
                    self.state
                        .diagnostics
                        .undefined_attribute(&attribute.name, attribute.location.clone());
                    self.state.types.error_type()
                }
            };
        attribute.resolved_type
    }

    fn infer_global(&mut self, global: &mut Global) -> TypeId {
        global.resolved_type = match self.state.tables.get(self.globals).get(&global.name) {
            Some(symbol) => {
                global.binding = Binding::Global {
                    index: symbol.index,
                };
                symbol.value_type
            }
            None => {
                self.state
                    .diagnostics
                    .undefined_constant(&global.name, global.location.clone());
                self.state.types.error_type()
            }
        };
        global.resolved_type
    }

    // Variables

    fn infer_define_variable(&mut self, node: &mut DefineVariable) -> TypeId {
        let found = self.infer_node(&mut node.value);
        let declared = node
            .annotation
            .as_ref()
            .cloned()
            .map(|annotation| self.resolve_annotation(&annotation));

        if let Some(declared) = declared {
            if !self.state.types.compatible(found, declared) {
                let expected = self.state.types.type_name(declared);
                let found_name = self.state.types.type_name(found);

                self.state.diagnostics.type_mismatch(
                    &expected,
                    &found_name,
                    node.value.location().clone(),
                );
            }
        }

        let value_type = declared.unwrap_or(found);
        let ctx = self.ctx().clone();

        match node.kind {
            VariableKind::Local => {
                if self.state.tables.get(ctx.table).contains(&node.name) {
                    self.state
                        .diagnostics
                        .redefine_local(&node.name, node.location.clone());
                } else {
                    let symbol =
                        self.state
                            .tables
                            .define(ctx.table, &node.name, value_type, node.mutable);

                    node.binding = Binding::Local {
                        depth: -1,
                        index: symbol.index,
                    };
                }
            }
            VariableKind::Attribute => {
                let exists = self
                    .state
                    .types
                    .lookup_attribute(ctx.self_type, &node.name)
                    .is_some();

                if exists {
                    self.state
                        .diagnostics
                        .redefine_attribute(&node.name, node.location.clone());
                } else if let Type::Object(object) = self.state.types.get_mut(ctx.self_type) {
                    object.attributes.define(&node.name, value_type, node.mutable);
                }
            }
            VariableKind::Constant => {
                if reserved_constant(&node.name) {
                    self.state
                        .diagnostics
                        .redefine_reserved_constant(&node.name, node.location.clone());
                } else {
                    let exists = self
                        .state
                        .types
                        .lookup_attribute(ctx.self_type, &node.name)
                        .is_some();

                    if exists {
                        self.state
                            .diagnostics
                            .redefine_constant(&node.name, node.location.clone());
                    } else {
                        match self.state.types.get_mut(ctx.self_type) {
                            Type::Object(object) => {
                                object.attributes.define(&node.name, value_type, false);
                            }
                            Type::Trait(trait_type) => {
                                trait_type.attributes.define(&node.name, value_type, false);
                            }
                            _ => {}
                        }

                        if ctx.kind == ContextKind::Module
                            && !self.state.tables.get(self.globals).contains(&node.name)
                        {
                            self.state
                                .tables
                                .define(self.globals, &node.name, value_type, false);
                        }
                    }
                }
            }
        }

        node.resolved_type = value_type;
        value_type
    }

    fn infer_reassign(&mut self, node: &mut ReassignVariable) -> TypeId {
        let found = self.infer_node(&mut node.value);
        let ctx = self.ctx().clone();

        match node.kind {
            VariableKind::Local => {
                let (depth, symbol) = self.state.tables.lookup_with_parent(ctx.table, &node.name);

                if symbol.is_null() {
                    self.state
                        .diagnostics
                        .reassign_undefined_local(&node.name, node.location.clone());
                } else if !symbol.mutable {
                    self.state
                        .diagnostics
                        .reassign_immutable_local(&node.name, node.location.clone());
                } else {
                    if !self.state.types.compatible(found, symbol.value_type) {
                        let expected = self.state.types.type_name(symbol.value_type);
                        let found_name = self.state.types.type_name(found);

                        self.state.diagnostics.type_mismatch(
                            &expected,
                            &found_name,
                            node.value.location().clone(),
                        );
                    }

                    if depth >= 0 && ctx.kind == ContextKind::Closure {
                        self.contexts.last_mut().unwrap().captured = true;
                    }

                    node.binding = Binding::Local {
                        depth,
                        index: symbol.index,
                    };
                }
            }
            VariableKind::Attribute | VariableKind::Constant => {
                match self.state.types.lookup_attribute(ctx.self_type, &node.name) {
                    Some(existing) => {
                        if !self.state.types.compatible(found, existing) {
                            let expected = self.state.types.type_name(existing);
                            let found_name = self.state.types.type_name(found);

                            self.state.diagnostics.type_mismatch(
                                &expected,
                                &found_name,
                                node.value.location().clone(),
                            );
                        }
                    }
                    None => {
                        self.state
                            .diagnostics
                            .reassign_undefined_attribute(&node.name, node.location.clone());
                    }
                }
            }
        }

        node.resolved_type = found;
        found
    }

    // Blocks and methods

    fn infer_block(&mut self, block: &mut BlockLiteral) -> TypeId {
        let dynamic = self.state.types.dynamic_type();
        let mut arguments = Vec::new();

        for argument in &block.arguments.clone() {
            let value_type = argument
                .annotation
                .as_ref()
                .map(|annotation| self.resolve_annotation(annotation))
                .unwrap_or(dynamic);

            arguments.push(crate::types::BlockArgument {
                name: argument.name.clone(),
                value_type,
                has_default: argument.default.is_some(),
                rest: argument.rest,
            });
        }

        for (argument, typed) in block.arguments.iter().zip(&arguments) {
            self.state
                .tables
                .define(block.table, &argument.name, typed.value_type, argument.mutable);
        }

        let throw_type = block
            .throw_annotation
            .as_ref()
            .cloned()
            .map(|annotation| self.resolve_annotation(&annotation));
        let declared_return = block
            .return_annotation
            .as_ref()
            .cloned()
            .map(|annotation| self.resolve_annotation(&annotation));
        let (kind, context_kind) = match block.kind {
            crate::ast::BlockKind::Closure => (BlockKind::Closure, ContextKind::Closure),
            crate::ast::BlockKind::Lambda => (BlockKind::Lambda, ContextKind::Lambda),
        };

        let block_type = self.state.types.alloc(Type::Block(BlockType {
            kind,
            name: None,
            arguments,
            throw_type,
            return_type: declared_return.unwrap_or(dynamic),
            type_parameters: TypeParameterTable::new(),
            captures: false,
            required: false,
            static_method: false,
        }));

        self.contexts.push(BlockContext {
            table: block.table,
            self_type: self.ctx().self_type,
            block: block_type,
            kind: context_kind,
            parameters: Vec::new(),
            captured: false,
        });

        for argument in &mut block.arguments {
            if let Some(default) = &mut argument.default {
                self.infer_node(default);
            }
        }

        let found = self.infer_body(&mut block.body);
        let context = self.contexts.pop().unwrap();

        block.captures = context.captured;

        if context.captured {
            if let Type::Block(this) = self.state.types.get_mut(block_type) {
                this.captures = true;
            }
        }

        match declared_return {
            Some(declared) => {
                if !Self::body_terminates(&block.body)
                    && !self.state.types.compatible(found, declared)
                {
                    let expected = self.state.types.type_name(declared);
                    let found_name = self.state.types.type_name(found);

                    self.state.diagnostics.return_type_mismatch(
                        &expected,
                        &found_name,
                        block.body.location.clone(),
                    );
                }
            }
            None => {
                // The return type of an unannotated closure is inferred from
                // its body.
                if let Type::Block(this) = self.state.types.get_mut(block_type) {
                    this.return_type = found;
                }
            }
        }

        block.resolved_type = block_type;
        block_type
    }

    fn infer_method(&mut self, def: &mut MethodDefinition) -> TypeId {
        let block_type = def.resolved_type;

        if block_type.is_undefined() {
            self.state.diagnostics.error(
                "methods may only be defined at the top level of a module, object, or trait",
                def.location.clone(),
            );
            return self.state.types.error_type();
        }

        let block = match self.state.types.get(block_type) {
            Type::Block(block) => block.clone(),
            _ => return self.state.types.error_type(),
        };

        for (index, argument) in block.arguments.iter().enumerate() {
            let mutable = def
                .arguments
                .get(index)
                .map(|argument| argument.mutable)
                .unwrap_or(false);

            self.state
                .tables
                .define(def.table, &argument.name, argument.value_type, mutable);
        }

        self.contexts.push(BlockContext {
            table: def.table,
            self_type: self.ctx().self_type,
            block: block_type,
            kind: ContextKind::Method,
            parameters: def.parameter_types.clone(),
            captured: false,
        });

        for (index, argument) in def.arguments.iter_mut().enumerate() {
            if let Some(default) = &mut argument.default {
                let found = self.infer_node(default);
                let expected = block
                    .arguments
                    .get(index)
                    .map(|argument| argument.value_type)
                    .unwrap_or(found);

                if !self.state.types.compatible(found, expected) {
                    let expected_name = self.state.types.type_name(expected);
                    let found_name = self.state.types.type_name(found);

                    self.state.diagnostics.type_mismatch(
                        &expected_name,
                        &found_name,
                        default.location().clone(),
                    );
                }
            }
        }

        if let Some(body) = &mut def.body {
            let found = self.infer_body(body);

            if !Self::body_terminates(body)
                && !self.state.types.compatible(found, block.return_type)
            {
                let expected = self.state.types.type_name(block.return_type);
                let found_name = self.state.types.type_name(found);

                self.state.diagnostics.return_type_mismatch(
                    &expected,
                    &found_name,
                    body.location.clone(),
                );
            }
        }

        self.contexts.pop();
        block_type
    }

    // Control flow

    fn infer_return(&mut self, node: &mut Return) -> TypeId {
        let found = match &mut node.value {
            Some(value) => self.infer_node(value),
            None => self.state.types.nil_type(),
        };

        let method = self
            .contexts
            .iter()
            .rev()
            .find(|context| context.kind == ContextKind::Method)
            .map(|context| context.block);

        match method {
            Some(block_type) => {
                let declared = match self.state.types.get(block_type) {
                    Type::Block(block) => block.return_type,
                    _ => self.state.types.dynamic_type(),
                };

                if !self.state.types.compatible(found, declared) {
                    let expected = self.state.types.type_name(declared);
                    let found_name = self.state.types.type_name(found);

                    self.state.diagnostics.return_type_mismatch(
                        &expected,
                        &found_name,
                        node.location.clone(),
                    );
                }
            }
            None => {
                self.state.diagnostics.error(
                    "return can only be used inside a method",
                    node.location.clone(),
                );
            }
        }

        node.resolved_type = found;
        found
    }

    fn infer_throw(&mut self, node: &mut Throw) -> TypeId {
        let found = self.infer_node(&mut node.value);
        let enclosing = self
            .contexts
            .iter()
            .rev()
            .find(|context| !context.block.is_undefined())
            .map(|context| context.block);

        // Structural rules (throw at the top level, throw without a declared
        // type) are enforced by the throw validation pass.
        if let Some(block_type) = enclosing {
            if let Type::Block(block) = self.state.types.get(block_type) {
                if let Some(declared) = block.throw_type {
                    if !self.state.types.compatible(found, declared) {
                        let expected = self.state.types.type_name(declared);
                        let found_name = self.state.types.type_name(found);

                        self.state.diagnostics.throw_type_mismatch(
                            &expected,
                            &found_name,
                            node.value.location().clone(),
                        );
                    }
                }
            }
        }

        node.resolved_type = found;
        found
    }

    fn infer_try(&mut self, node: &mut Try) -> TypeId {
        let expression_type = self.infer_node(&mut node.expression);
        let throw_type = match &node.expression {
            Node::Send(send) => send.throw_type,
            _ => None,
        };

        if let Some(body) = &mut node.else_body {
            let dynamic = self.state.types.dynamic_type();

            if let Some(argument) = &node.else_argument {
                self.state.tables.define(
                    node.else_table,
                    argument,
                    throw_type.unwrap_or(dynamic),
                    false,
                );
            }

            let mut context = self.ctx().clone();

            context.table = node.else_table;
            self.contexts.push(context);

            let else_type = self.infer_body(body);
            let popped = self.contexts.pop().unwrap();

            if popped.captured {
                self.contexts.last_mut().unwrap().captured = true;
            }

            if !Self::body_terminates(body)
                && !self.state.types.compatible(else_type, expression_type)
            {
                let expected = self.state.types.type_name(expression_type);
                let found_name = self.state.types.type_name(else_type);

                self.state
                    .diagnostics
                    .type_mismatch(&expected, &found_name, body.location.clone());
            }
        }

        node.resolved_type = expression_type;
        expression_type
    }

    fn infer_cast(&mut self, node: &mut TypeCast) -> TypeId {
        self.infer_node(&mut node.value);

        let target = node.target.clone();

        node.resolved_type = self.resolve_annotation(&target);
        node.resolved_type
    }

    fn infer_dereference(&mut self, node: &mut Dereference) -> TypeId {
        let found = self.infer_node(&mut node.value);

        node.resolved_type = if let Some(inner) = self.state.types.optional_inner(found) {
            inner
        } else if matches!(self.state.types.get(found), Type::Dynamic | Type::Error) {
            found
        } else {
            let found_name = self.state.types.type_name(found);

            self.state.diagnostics.error(
                format!("a value of type {found_name} is not an optional and can not be dereferenced"),
                node.location.clone(),
            );
            self.state.types.error_type()
        };
        node.resolved_type
    }

    // Sends

    fn infer_send(&mut self, send: &mut Send) -> TypeId {
        if Self::is_raw_receiver(&send.receiver) {
            let resolved = self.infer_raw(send);

            send.resolved_type = resolved;
            return resolved;
        }

        let receiver_type = match &mut send.receiver {
            Some(receiver) => self.infer_node(receiver),
            None => match self.resolve_callee(send) {
                Callee::Closure(block_type) => {
                    let resolved = self.closure_call(send, block_type);

                    send.resolved_type = resolved;
                    return resolved;
                }
                Callee::Receiver(receiver_type) => receiver_type,
                Callee::Failed(error) => {
                    self.infer_remaining_arguments(send, 0);
                    send.resolved_type = error;
                    return error;
                }
            },
        };

        let resolved = self.dispatch(send, receiver_type);

        send.resolved_type = resolved;
        resolved
    }

    fn is_raw_receiver(receiver: &Option<Node>) -> bool {
        match receiver {
            Some(Node::Constant(constant)) => {
                constant.name == RAW_RECEIVER && constant.receiver.is_none()
            }
            Some(Node::Global(global)) => global.name == RAW_RECEIVER,
            _ => false,
        }
    }

    /// Sends to the raw instruction receiver dispatch on the closed
    /// instruction set.
    fn infer_raw(&mut self, send: &mut Send) -> TypeId {
        if let Some(receiver) = &mut send.receiver {
            self.infer_node(receiver);
        }

        self.infer_remaining_arguments(send, 0);

        match RawInstruction::parse(&send.name) {
            Some(instruction) => {
                let (minimum, maximum) = instruction.argument_range();
                let given = send.arguments.len();

                if given < minimum || maximum.map(|max| given > max).unwrap_or(false) {
                    self.state.diagnostics.argument_count(
                        given,
                        minimum,
                        maximum,
                        send.location.clone(),
                    );
                }

                instruction.return_type(&self.state.types)
            }
            None => {
                self.state
                    .diagnostics
                    .unknown_raw_instruction(&send.name, send.location.clone());
                self.state.types.error_type()
            }
        }
    }

    /// Resolves a receiver-less send: a block-typed local, a method on
    /// `self`, or a block-typed global.
    fn resolve_callee(&mut self, send: &mut Send) -> Callee {
        let ctx = self.ctx().clone();
        let (depth, symbol) = self.state.tables.lookup_with_parent(ctx.table, &send.name);

        if !symbol.is_null() && (depth == -1 || ctx.kind != ContextKind::Lambda) {
            if depth >= 0 && ctx.kind == ContextKind::Closure {
                self.contexts.last_mut().unwrap().captured = true;
            }

            send.callee = Binding::Local {
                depth,
                index: symbol.index,
            };

            return match self.state.types.get(symbol.value_type) {
                Type::Block(_) => Callee::Closure(symbol.value_type),
                Type::Dynamic | Type::Error => Callee::Failed(symbol.value_type),
                _ => {
                    let found = self.state.types.type_name(symbol.value_type);

                    self.state.diagnostics.error(
                        format!(
                            "the local variable {:?} is a {found}, not a block, and can not be called",
                            send.name
                        ),
                        send.location.clone(),
                    );
                    Callee::Failed(self.state.types.error_type())
                }
            };
        }

        if self
            .state
            .types
            .lookup_method(ctx.self_type, &send.name)
            .is_some()
        {
            send.callee = Binding::SelfMethod;
            return Callee::Receiver(ctx.self_type);
        }

        if let Some(symbol) = self.state.tables.get(self.globals).get(&send.name) {
            send.callee = Binding::Global {
                index: symbol.index,
            };

            return match self.state.types.get(symbol.value_type) {
                Type::Block(_) => Callee::Closure(symbol.value_type),
                Type::Dynamic | Type::Error => Callee::Failed(symbol.value_type),
                _ => Callee::Receiver(symbol.value_type),
            };
        }

        let type_name = self.state.types.type_name(ctx.self_type);

        self.state
            .diagnostics
            .undefined_method(&send.name, &type_name, send.location.clone());
        Callee::Failed(self.state.types.error_type())
    }

    /// Dispatches a send on the receiver's type.
    fn dispatch(&mut self, send: &mut Send, receiver_type: TypeId) -> TypeId {
        match self.state.types.get(receiver_type) {
            Type::Dynamic => {
                self.infer_remaining_arguments(send, 0);
                self.state.types.dynamic_type()
            }
            Type::Error => {
                self.infer_remaining_arguments(send, 0);
                self.state.types.error_type()
            }
            Type::Optional(inner) => {
                let inner = *inner;
                let nil = self.state.types.nil_type();

                // A send on an optional succeeds through Nil when Nil
                // defines the message; otherwise the message is looked up on
                // the wrapped type and the result re-wrapped. The wrapping is
                // applied after every other substitution.
                if let Some(found) = self.state.types.lookup_method(nil, &send.name) {
                    self.check_call(send, nil, found.block)
                } else if let Some(found) = self.state.types.lookup_method(inner, &send.name) {
                    let resolved = self.check_call(send, inner, found.block);

                    self.state.types.optional(resolved)
                } else {
                    let type_name = self.state.types.type_name(receiver_type);

                    self.state
                        .diagnostics
                        .undefined_method(&send.name, &type_name, send.location.clone());
                    self.infer_remaining_arguments(send, 0);
                    self.state.types.error_type()
                }
            }
            Type::Block(_) if send.name == "call" => self.closure_call(send, receiver_type),
            _ => match self.state.types.lookup_method(receiver_type, &send.name) {
                Some(found) => self.check_call(send, receiver_type, found.block),
                None => {
                    let type_name = self.state.types.type_name(receiver_type);

                    self.state
                        .diagnostics
                        .undefined_method(&send.name, &type_name, send.location.clone());
                    self.infer_remaining_arguments(send, 0);
                    self.state.types.error_type()
                }
            },
        }
    }

    /// Calling a closure or lambda through `call` (or by name).
    fn closure_call(&mut self, send: &mut Send, block_type: TypeId) -> TypeId {
        let block = match self.state.types.get(block_type) {
            Type::Block(block) => block.clone(),
            _ => return self.state.types.error_type(),
        };

        let (minimum, maximum) = block.argument_range();
        let given = send.arguments.len();

        if given < minimum || maximum.map(|max| given > max).unwrap_or(false) {
            self.state
                .diagnostics
                .argument_count(given, minimum, maximum, send.location.clone());
        }

        let parameters = block.message_arguments().to_vec();

        for (index, argument) in send.arguments.iter_mut().enumerate() {
            let found = self.infer_node(argument);

            if let Some(parameter) = parameters.get(index) {
                if !self.state.types.compatible(found, parameter.value_type) {
                    let expected = self.state.types.type_name(parameter.value_type);
                    let found_name = self.state.types.type_name(found);

                    self.state.diagnostics.type_mismatch(
                        &expected,
                        &found_name,
                        argument.location().clone(),
                    );
                }
            }
        }

        send.throw_type = block.throw_type;
        block.return_type
    }

    /// Checks a resolved method call: arity, argument types against the
    /// parameters (resolved through the receiver's and the method's type
    /// parameter tables), and computes the initialised return type.
    fn check_call(&mut self, send: &mut Send, receiver_type: TypeId, block_type: TypeId) -> TypeId {
        let block = match self.state.types.get(block_type) {
            Type::Block(block) => block.clone(),
            _ => return self.state.types.error_type(),
        };

        let (minimum, maximum) = block.argument_range();
        let given = send.arguments.len();

        if given < minimum || maximum.map(|max| given > max).unwrap_or(false) {
            self.state
                .diagnostics
                .argument_count(given, minimum, maximum, send.location.clone());
        }

        let receiver_parameters = self
            .state
            .types
            .type_parameters(receiver_type)
            .cloned()
            .unwrap_or_default();
        let mut call_parameters = block.type_parameters.clone();

        // Explicit type arguments initialise the method's parameters by
        // position.
        if !send.type_arguments.is_empty() {
            let explicit = send.type_arguments.clone();
            let resolved: Vec<TypeId> = explicit
                .iter()
                .map(|argument| self.resolve_annotation(argument))
                .collect();
            let names: Vec<String> = call_parameters.names().cloned().collect();

            if names.len() != resolved.len() {
                let name = self.state.types.type_name(block_type);

                self.state.diagnostics.generic_arity_mismatch(
                    &name,
                    names.len(),
                    resolved.len(),
                    send.location.clone(),
                );
            } else {
                for (name, argument) in names.into_iter().zip(resolved) {
                    call_parameters.initialise(&name, argument);
                }
            }
        }

        let parameters = block.message_arguments().to_vec();

        for (index, argument) in send.arguments.iter_mut().enumerate() {
            let (parameter, value) = match argument {
                Node::KeywordArgument(keyword) => {
                    let parameter = parameters
                        .iter()
                        .find(|parameter| parameter.name == keyword.name)
                        .cloned();

                    if parameter.is_none() {
                        self.state
                            .diagnostics
                            .unknown_keyword_argument(&keyword.name, keyword.location.clone());
                    }

                    (parameter, &mut keyword.value)
                }
                other => {
                    let parameter = parameters.get(index).cloned().or_else(|| {
                        parameters
                            .last()
                            .filter(|parameter| parameter.rest)
                            .cloned()
                    });

                    (parameter, other)
                }
            };

            let found = self.infer_node(value);

            let Some(parameter) = parameter else { continue };
            let expected = self
                .state
                .types
                .substitute(parameter.value_type, &[&call_parameters, &receiver_parameters]);

            match self.state.types.get(expected).clone() {
                Type::TypeParameter(type_parameter) => {
                    for bound in &type_parameter.required_traits {
                        if !matches!(self.state.types.get(found), Type::Dynamic | Type::Error)
                            && !self.state.types.implements_trait(found, *bound)
                        {
                            let trait_name = self.state.types.type_name(*bound);
                            let found_name = self.state.types.type_name(found);

                            self.state.diagnostics.trait_not_implemented(
                                &trait_name,
                                &found_name,
                                value.location().clone(),
                            );
                        }
                    }

                    // First binding wins; later arguments must match it.
                    call_parameters.initialise(&type_parameter.name, found);
                }
                _ => {
                    if !self.state.types.compatible(found, expected) {
                        let expected_name = self.state.types.type_name(expected);
                        let found_name = self.state.types.type_name(found);

                        self.state.diagnostics.type_mismatch(
                            &expected_name,
                            &found_name,
                            value.location().clone(),
                        );
                    }
                }
            }
        }

        // The initialised return type: substitute the method's and the
        // receiver's type parameters, instantiating a shallow instance when
        // the declared return type is a generic that still needs one.
        let mut merged = call_parameters.clone();

        merged.merge(&receiver_parameters);

        let mut resolved = self.state.types.substitute(block.return_type, &[&merged]);

        if self.state.types.needs_instance(resolved) {
            let names: Vec<String> = self
                .state
                .types
                .type_parameters(resolved)
                .map(|parameters| parameters.names().cloned().collect())
                .unwrap_or_default();
            let mut table = TypeParameterTable::new();

            for name in names {
                match merged.instance(&name) {
                    Some(instance) => table.initialise(&name, instance),
                    None => table.define(&name),
                }
            }

            resolved = self.state.types.new_shallow_instance(resolved, table);
        }

        send.throw_type = block
            .throw_type
            .map(|throw| self.state.types.substitute(throw, &[&merged]));

        resolved
    }

    /// Infers argument nodes that were not consumed by a parameter check, so
    /// every node ends up annotated even on failed sends.
    fn infer_remaining_arguments(&mut self, send: &mut Send, from: usize) {
        for argument in send.arguments.iter_mut().skip(from) {
            self.infer_node(argument);
        }
    }
}

enum Callee {
    /// A block-typed local or global to call directly.
    Closure(TypeId),
    /// Dispatch continues on this receiver type (`self` or a module).
    Receiver(TypeId),
    /// Resolution failed or the target is dynamic; the send has this type.
    Failed(TypeId),
}
