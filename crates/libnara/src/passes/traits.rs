//! Pass 14: trait implementations.
//!
//! For each `impl T for U` block: register `T` as implemented by `U`, check
//! `T`'s required traits transitively, bind the provided methods on `U`, and
//! verify every required method is implemented with a compatible signature.

use log::debug;

use crate::{
    ast::{Body, Node, TraitImplementation},
    compiler::CompilerState,
    types::{Type, TypeId},
};

use super::signatures::{method_signature, resolve_type_expr, TypeScope};

pub fn run(state: &mut CompilerState, name: &str, body: &mut Body) {
    let Some(scope) = TypeScope::module(state, name) else {
        return;
    };

    for node in &mut body.expressions {
        if let Node::TraitImplementation(implementation) = node {
            implement(state, &scope, implementation);
        }
    }
}

fn implement(state: &mut CompilerState, scope: &TypeScope, node: &mut TraitImplementation) {
    let trait_type = resolve_type_expr(state, scope, &node.trait_type);

    match state.types.get(trait_type) {
        Type::Trait(_) => {}
        Type::Error => return,
        _ => {
            let found = state.types.type_name(trait_type);

            state.diagnostics.error(
                format!("{found} is not a trait and can not be implemented"),
                node.trait_type.location().clone(),
            );
            return;
        }
    }

    let object = match state.tables.get(scope.globals).get(&node.object_name) {
        Some(symbol) => symbol.value_type,
        None => {
            state
                .diagnostics
                .undefined_constant(&node.object_name, node.object_location.clone());
            return;
        }
    };

    if !matches!(state.types.get(object), Type::Object(_)) {
        let found = state.types.type_name(object);

        state.diagnostics.error(
            format!("traits can only be implemented for objects, {found} is not one"),
            node.object_location.clone(),
        );
        return;
    }

    let trait_name = state.types.type_name(trait_type);

    debug!(
        "implementing trait {trait_name:?} for {:?}",
        node.object_name
    );

    // The trait's own required traits must already be implemented.
    let required_traits: Vec<TypeId> = match state.types.get(trait_type) {
        Type::Trait(this) => this.required_traits.clone(),
        _ => Vec::new(),
    };

    for required in required_traits {
        if !state.types.implements_trait(object, required) {
            let required_name = state.types.type_name(required);

            state.diagnostics.required_traits_not_implemented(
                &trait_name,
                &required_name,
                node.location.clone(),
            );
        }
    }

    // Bind the provided methods on the object.
    let object_scope = scope.with_self(object);

    for expression in &mut node.body.expressions {
        if let Node::MethodDefinition(method) = expression {
            let block = method_signature(state, &object_scope, method);

            if method.body.is_none() {
                state.diagnostics.error(
                    format!(
                        "the method {:?} requires a body, only trait methods may omit it",
                        method.name
                    ),
                    method.location.clone(),
                );
            }

            if let Type::Object(this) = state.types.get_mut(object) {
                this.attributes.define(&method.name, block, false);
            }
        }
    }

    if let Type::Object(this) = state.types.get_mut(object) {
        this.implemented_traits.push(trait_type);
    }

    node.resolved_type = trait_type;

    // Every required method must now resolve on the object with a
    // compatible signature.
    let required_methods: Vec<(String, TypeId)> = match state.types.get(trait_type) {
        Type::Trait(this) => this
            .attributes
            .symbols()
            .filter(|symbol| match state.types.get(symbol.value_type) {
                Type::Block(block) => block.required,
                _ => false,
            })
            .map(|symbol| (symbol.name.clone(), symbol.value_type))
            .collect(),
        _ => Vec::new(),
    };

    for (method_name, required_block) in required_methods {
        match state.types.lookup_method(object, &method_name) {
            Some(found) => {
                let provided = match state.types.get(found.block) {
                    Type::Block(block) => block.required,
                    _ => true,
                };

                if provided {
                    state
                        .diagnostics
                        .required_method_not_implemented(&method_name, node.location.clone());
                } else if !state.types.compatible(found.block, required_block) {
                    let expected = state.types.type_name(required_block);
                    let found_name = state.types.type_name(found.block);

                    state.diagnostics.type_mismatch(
                        &expected,
                        &found_name,
                        node.location.clone(),
                    );
                }
            }
            None => {
                state
                    .diagnostics
                    .required_method_not_implemented(&method_name, node.location.clone());
            }
        }
    }
}
