//! Pass 13: declared type signatures.
//!
//! Computes the declared type of every top-level object, trait, and method
//! (arguments, throw and return types, type parameters with their trait
//! bounds) without touching bodies. Bodies are checked by the type pass.
//!
//! This module also hosts [`resolve_type_expr`], the resolver shared with
//! the trait and type passes.

use log::debug;

use crate::{
    ast::{Body, MethodDefinition, Node, ObjectDefinition, TraitDefinition, TypeExpr},
    compiler::CompilerState,
    symbol::TableId,
    types::{
        reserved_constant, BlockArgument, BlockKind, BlockType, Type, TypeId,
        TypeParameterTable, SELF_TYPE,
    },
};

/// The names visible to a type expression: the module's globals, the
/// enclosing `Self`, and any generic parameters in scope.
#[derive(Debug, Clone)]
pub struct TypeScope {
    pub module_type: TypeId,
    pub globals: TableId,
    pub self_type: Option<TypeId>,
    /// Generic parameters in scope, innermost last.
    pub parameters: Vec<(String, TypeId)>,
}

impl TypeScope {
    pub fn module(state: &CompilerState, name: &str) -> Option<Self> {
        let module = state.modules.get(name)?;

        Some(Self {
            module_type: module.module_type,
            globals: module.globals,
            self_type: Some(module.module_type),
            parameters: Vec::new(),
        })
    }

    pub fn parameter(&self, name: &str) -> Option<TypeId> {
        self.parameters
            .iter()
            .rev()
            .find(|(parameter, _)| parameter == name)
            .map(|(_, id)| *id)
    }

    pub fn with_self(&self, self_type: TypeId) -> Self {
        let mut scope = self.clone();

        scope.self_type = Some(self_type);
        scope
    }
}

/// Resolves a type expression to a [`TypeId`], reporting problems into the
/// diagnostics sink and yielding the error type for unresolvable parts.
pub fn resolve_type_expr(
    state: &mut CompilerState,
    scope: &TypeScope,
    expr: &TypeExpr,
) -> TypeId {
    match expr {
        TypeExpr::Optional(optional) => {
            let inner = resolve_type_expr(state, scope, &optional.inner);

            state.types.optional(inner)
        }
        TypeExpr::Block(block) => {
            let arguments = block
                .arguments
                .iter()
                .enumerate()
                .map(|(index, argument)| BlockArgument {
                    name: format!("arg{index}"),
                    value_type: resolve_type_expr(state, scope, argument),
                    has_default: false,
                    rest: false,
                })
                .collect();
            let throw_type = block
                .throw_annotation
                .as_ref()
                .map(|annotation| resolve_type_expr(state, scope, annotation));
            let return_type = block
                .return_annotation
                .as_ref()
                .map(|annotation| resolve_type_expr(state, scope, annotation))
                .unwrap_or_else(|| state.types.dynamic_type());
            let kind = match block.kind {
                crate::ast::BlockKind::Closure => BlockKind::Closure,
                crate::ast::BlockKind::Lambda => BlockKind::Lambda,
            };

            state.types.alloc(Type::Block(BlockType {
                kind,
                name: None,
                arguments,
                throw_type,
                return_type,
                type_parameters: TypeParameterTable::new(),
                captures: false,
                required: false,
                static_method: false,
            }))
        }
        TypeExpr::Named(named) => {
            let first = &named.steps[0];
            let mut current = if first == SELF_TYPE {
                match scope.self_type {
                    Some(id) => id,
                    None => {
                        state
                            .diagnostics
                            .undefined_constant(first, named.location.clone());
                        return state.types.error_type();
                    }
                }
            } else if let Some(id) = scope.parameter(first) {
                id
            } else if let Some(symbol) = state.tables.get(scope.globals).get(first) {
                symbol.value_type
            } else {
                state
                    .diagnostics
                    .undefined_constant(first, named.location.clone());
                return state.types.error_type();
            };

            for step in &named.steps[1..] {
                match state.types.lookup_attribute(current, step) {
                    Some(found) => current = found,
                    None => {
                        state
                            .diagnostics
                            .undefined_constant(step, named.location.clone());
                        return state.types.error_type();
                    }
                }
            }

            if named.type_arguments.is_empty() {
                return current;
            }

            let arguments: Vec<TypeId> = named
                .type_arguments
                .iter()
                .map(|argument| resolve_type_expr(state, scope, argument))
                .collect();
            let parameter_names: Vec<String> = state
                .types
                .type_parameters(current)
                .map(|parameters| parameters.names().cloned().collect())
                .unwrap_or_default();

            if parameter_names.len() != arguments.len() {
                let name = state.types.type_name(current);

                state.diagnostics.generic_arity_mismatch(
                    &name,
                    parameter_names.len(),
                    arguments.len(),
                    named.location.clone(),
                );
                return state.types.error_type();
            }

            let mut table = TypeParameterTable::new();

            for (name, argument) in parameter_names.into_iter().zip(arguments) {
                table.initialise(&name, argument);
            }

            state.types.new_shallow_instance(current, table)
        }
    }
}

pub fn run(state: &mut CompilerState, name: &str, body: &mut Body) {
    let Some(scope) = TypeScope::module(state, name) else {
        return;
    };

    debug!("defining type signatures for module {name:?}");

    for node in &mut body.expressions {
        match node {
            Node::ObjectDefinition(def) => define_object(state, &scope, def),
            Node::TraitDefinition(def) => define_trait(state, &scope, def),
            Node::MethodDefinition(def) => {
                let block = method_signature(state, &scope, def);

                require_body(state, def);
                define_module_member(state, &scope, &def.name, block, def.location.clone());
            }
            _ => {}
        }
    }
}

/// Defines `name` as an attribute of the module's type and as a global.
fn define_module_member(
    state: &mut CompilerState,
    scope: &TypeScope,
    name: &str,
    value_type: TypeId,
    location: crate::span::Span,
) {
    if reserved_constant(name) {
        state.diagnostics.redefine_reserved_constant(name, location);
        return;
    }

    let exists = match state.types.get(scope.module_type) {
        Type::Object(object) => object.attributes.contains(name),
        _ => false,
    };

    if exists {
        state.diagnostics.redefine_constant(name, location);
        return;
    }

    if let Type::Object(object) = state.types.get_mut(scope.module_type) {
        object.attributes.define(name, value_type, false);
    }

    if !state.tables.get(scope.globals).contains(name) {
        state.tables.define(scope.globals, name, value_type, false);
    }
}

fn define_object(state: &mut CompilerState, scope: &TypeScope, def: &mut ObjectDefinition) {
    let prototype = state.types.object_type();
    let object = state.types.new_object(&def.name, Some(prototype));
    let mut object_scope = scope.with_self(object);

    def.parameter_types =
        define_type_parameters(state, &mut object_scope, &def.type_parameters, object);
    define_module_member(state, scope, &def.name, object, def.location.clone());
    def.resolved_type = object;

    for node in &mut def.body.expressions {
        if let Node::MethodDefinition(method) = node {
            let block = method_signature(state, &object_scope, method);

            require_body(state, method);
            define_method_attribute(state, object, method, block);
        }
    }
}

fn define_trait(state: &mut CompilerState, scope: &TypeScope, def: &mut TraitDefinition) {
    let trait_type = state.types.new_trait(&def.name);
    let mut trait_scope = scope.with_self(trait_type);

    def.parameter_types =
        define_type_parameters(state, &mut trait_scope, &def.type_parameters, trait_type);

    for required in &def.required_traits {
        let resolved = resolve_type_expr(state, &trait_scope, required);

        match state.types.get(resolved) {
            Type::Trait(_) | Type::Error => {
                if let Type::Trait(this) = state.types.get_mut(trait_type) {
                    this.required_traits.push(resolved);
                }
            }
            _ => {
                let found = state.types.type_name(resolved);

                state.diagnostics.error(
                    format!("{found} is not a trait and can not be required by one"),
                    required.location().clone(),
                );
            }
        }
    }

    define_module_member(state, scope, &def.name, trait_type, def.location.clone());
    def.resolved_type = trait_type;

    for node in &mut def.body.expressions {
        if let Node::MethodDefinition(method) = node {
            let block = method_signature(state, &trait_scope, method);

            define_method_attribute(state, trait_type, method, block);
        }
    }
}

/// Defines generic parameters both as resolvable names in the scope and as
/// entries in the type's parameter table.
fn define_type_parameters(
    state: &mut CompilerState,
    scope: &mut TypeScope,
    definitions: &[crate::ast::TypeParameterDef],
    target: TypeId,
) -> Vec<(String, TypeId)> {
    let mut defined = Vec::new();

    for definition in definitions {
        let bounds = resolve_bounds(state, scope, &definition.bounds);
        let parameter = state.types.new_type_parameter(&definition.name, bounds);

        scope.parameters.push((definition.name.clone(), parameter));
        defined.push((definition.name.clone(), parameter));

        match state.types.get_mut(target) {
            Type::Object(object) => object.type_parameters.define(&definition.name),
            Type::Trait(trait_type) => trait_type.type_parameters.define(&definition.name),
            _ => {}
        }
    }

    defined
}

fn resolve_bounds(
    state: &mut CompilerState,
    scope: &TypeScope,
    bounds: &[TypeExpr],
) -> Vec<TypeId> {
    bounds
        .iter()
        .filter_map(|bound| {
            let resolved = resolve_type_expr(state, scope, bound);

            match state.types.get(resolved) {
                Type::Trait(_) => Some(resolved),
                Type::Error => None,
                _ => {
                    let found = state.types.type_name(resolved);

                    state.diagnostics.error(
                        format!("{found} is not a trait and can not be used as a bound"),
                        bound.location().clone(),
                    );
                    None
                }
            }
        })
        .collect()
}

/// Computes the declared block type of a method definition.
pub fn method_signature(
    state: &mut CompilerState,
    scope: &TypeScope,
    def: &mut MethodDefinition,
) -> TypeId {
    let mut method_scope = scope.clone();
    let mut method_parameters = TypeParameterTable::new();

    def.parameter_types.clear();

    for parameter in &def.type_parameters {
        let bounds = resolve_bounds(state, &method_scope, &parameter.bounds);
        let id = state.types.new_type_parameter(&parameter.name, bounds);

        method_scope.parameters.push((parameter.name.clone(), id));
        def.parameter_types.push((parameter.name.clone(), id));
        method_parameters.define(&parameter.name);
    }

    let dynamic = state.types.dynamic_type();
    let arguments: Vec<BlockArgument> = def
        .arguments
        .iter()
        .map(|argument| {
            let value_type = if argument.name == "self" && argument.annotation.is_none() {
                scope.self_type.unwrap_or(dynamic)
            } else {
                argument
                    .annotation
                    .as_ref()
                    .map(|annotation| resolve_type_expr(state, &method_scope, annotation))
                    .unwrap_or(dynamic)
            };

            BlockArgument {
                name: argument.name.clone(),
                value_type,
                has_default: argument.default.is_some(),
                rest: argument.rest,
            }
        })
        .collect();

    let throw_type = def
        .throw_annotation
        .as_ref()
        .map(|annotation| resolve_type_expr(state, &method_scope, annotation));
    let return_type = def
        .return_annotation
        .as_ref()
        .map(|annotation| resolve_type_expr(state, &method_scope, annotation))
        .unwrap_or(dynamic);

    let block = state.types.alloc(Type::Block(BlockType {
        kind: BlockKind::Method,
        name: Some(def.name.clone()),
        arguments,
        throw_type,
        return_type,
        type_parameters: method_parameters,
        captures: false,
        required: def.body.is_none(),
        static_method: def.static_method,
    }));

    def.resolved_type = block;
    block
}

/// Methods outside traits must have a body.
fn require_body(state: &mut CompilerState, def: &MethodDefinition) {
    if def.body.is_none() {
        state.diagnostics.error(
            format!(
                "the method {:?} requires a body, only trait methods may omit it",
                def.name
            ),
            def.location.clone(),
        );
    }
}

/// Defines a method on an object or trait, diagnosing redefinitions.
fn define_method_attribute(
    state: &mut CompilerState,
    target: TypeId,
    def: &MethodDefinition,
    block: TypeId,
) {
    let exists = match state.types.get(target) {
        Type::Object(object) => object.attributes.contains(&def.name),
        Type::Trait(trait_type) => trait_type.attributes.contains(&def.name),
        _ => false,
    };

    if exists {
        state
            .diagnostics
            .redefine_attribute(&def.name, def.location.clone());
        return;
    }

    match state.types.get_mut(target) {
        Type::Object(object) => {
            object.attributes.define(&def.name, block, false);
        }
        Type::Trait(trait_type) => {
            trait_type.attributes.define(&def.name, block, false);
        }
        _ => {}
    }
}
