//! Passes 6, 7, 8, and 12: import handling.
//!
//! Pass 6 prepends the implicit bootstrap and prelude imports, pass 7
//! enumerates the module's imports, pass 8 gives symbol-less imports their
//! implicit self binding, and pass 12 (after the dependencies compiled)
//! copies the imported symbols into the module's globals table.

use log::debug;

use crate::{
    ast::{Body, Import, ImportSymbol, Node},
    compiler::CompilerState,
    config::{BOOTSTRAP_MODULE, PRELUDE_MODULE},
    span::Span,
    types::Type,
};

/// An import gathered by pass 7: the module to compile and the location to
/// blame when it cannot be found.
#[derive(Debug, Clone)]
pub struct CollectedImport {
    pub name: String,
    pub location: Span,
}

/// Pass 6: prepend `import std::bootstrap` and `import std::prelude::(*)`
/// unless this module is one of them or implicit imports are off.
pub fn insert_implicit(state: &mut CompilerState, name: &str, body: &mut Body) {
    if !state.config.implicit_imports {
        return;
    }

    if name == BOOTSTRAP_MODULE || name == PRELUDE_MODULE {
        return;
    }

    let location = body.location.clone();
    let prelude = Node::Import(Box::new(Import {
        steps: vec!["std".to_string(), "prelude".to_string()],
        symbols: vec![ImportSymbol::Glob {
            location: location.clone(),
        }],
        location: location.clone(),
    }));
    let bootstrap = Node::Import(Box::new(Import {
        steps: vec!["std".to_string(), "bootstrap".to_string()],
        symbols: Vec::new(),
        location,
    }));

    body.expressions.insert(0, prelude);
    body.expressions.insert(0, bootstrap);
}

/// Pass 7: enumerate the imports, in declaration order, recording the unique
/// module names on the module record.
pub fn collect(state: &mut CompilerState, name: &str, body: &Body) -> Vec<CollectedImport> {
    let mut found: Vec<CollectedImport> = Vec::new();

    for node in &body.expressions {
        if let Node::Import(import) = node {
            let module_name = import.module_name();

            if found.iter().any(|existing| existing.name == module_name) {
                continue;
            }

            found.push(CollectedImport {
                name: module_name,
                location: import.location.clone(),
            });
        }
    }

    if let Some(module) = state.modules.get_mut(name) {
        module.imports = found.iter().map(|import| import.name.clone()).collect();
    }

    found
}

/// Pass 8: `import a::b` without a symbol list imports the module itself
/// under its last step.
pub fn add_self_symbols(body: &mut Body) {
    for node in &mut body.expressions {
        if let Node::Import(import) = node {
            if import.symbols.is_empty() {
                import.symbols.push(ImportSymbol::SelfModule {
                    alias: None,
                    location: import.location.clone(),
                });
            }
        }
    }
}

/// Pass 12: resolve every import symbol against the imported module's type
/// and copy it into this module's globals.
pub fn define_import_types(state: &mut CompilerState, name: &str, body: &Body) {
    let Some(module) = state.modules.get(name) else {
        return;
    };
    let globals = module.globals;

    for node in &body.expressions {
        let Node::Import(import) = node else {
            continue;
        };
        let imported_name = import.module_name();

        // A module that could not be found was already diagnosed in pass 9.
        let Some(imported) = state.modules.get(&imported_name) else {
            continue;
        };
        let imported_type = imported.module_type;

        debug!("defining import symbols of {imported_name:?} into {name:?}");

        for symbol in &import.symbols {
            match symbol {
                ImportSymbol::SelfModule { alias, location } => {
                    let bound = alias
                        .clone()
                        .or_else(|| import.steps.last().cloned())
                        .unwrap_or_else(|| imported_name.clone());

                    if state.tables.get(globals).contains(&bound) {
                        state.diagnostics.redefine_constant(&bound, location.clone());
                    } else {
                        state.tables.define(globals, bound, imported_type, false);
                    }
                }
                ImportSymbol::Symbol {
                    name: symbol_name,
                    alias,
                    location,
                } => match state.types.lookup_attribute(imported_type, symbol_name) {
                    Some(value_type) => {
                        let bound = alias.clone().unwrap_or_else(|| symbol_name.clone());

                        if state.tables.get(globals).contains(&bound) {
                            state.diagnostics.redefine_constant(&bound, location.clone());
                        } else {
                            state.tables.define(globals, bound, value_type, false);
                        }
                    }
                    None => {
                        state.diagnostics.error(
                            format!(
                                "the module {imported_name:?} does not define the symbol {symbol_name:?}"
                            ),
                            location.clone(),
                        );
                    }
                },
                ImportSymbol::Glob { .. } => {
                    let public: Vec<(String, crate::types::TypeId)> =
                        match state.types.get(imported_type) {
                            Type::Object(object) => object
                                .attributes
                                .symbols()
                                .filter(|symbol| !symbol.name.starts_with('_'))
                                .map(|symbol| (symbol.name.clone(), symbol.value_type))
                                .collect(),
                            _ => Vec::new(),
                        };

                    for (attribute, value_type) in public {
                        // Existing bindings win over glob imports.
                        if !state.tables.get(globals).contains(&attribute) {
                            state.tables.define(globals, attribute, value_type, false);
                        }
                    }
                }
            }
        }
    }
}
