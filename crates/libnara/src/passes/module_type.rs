//! Pass 4, 5, and 11: module type definition and registration.
//!
//! Pass 4 installs the module's `Object` type in the type database, pass 5
//! tracks the module in the run's module table (before the dependency passes
//! run, so cycles short-circuit), and pass 11 binds the reserved
//! `ThisModule` global and the module-level `self`.

use log::debug;

use crate::{
    compiler::CompilerState,
    file::SourceFile,
    module::Module,
    types::{BuiltinKind, THIS_MODULE, RAW_RECEIVER},
};

/// Passes 4 and 5.
pub fn define_module(state: &mut CompilerState, name: &str, file: &SourceFile) {
    let module_prototype = state.types.module_type();
    let module_type = state.types.new_object(name, Some(module_prototype));
    let globals = state.tables.alloc(None);

    // Every module can address the builtin prototypes, the map prototype,
    // and the raw instruction receiver without importing them.
    for kind in BuiltinKind::ALL {
        let value_type = state.types.builtin(kind);

        state
            .tables
            .define(globals, kind.constant_name(), value_type, false);
    }

    let map = state.types.map_prototype();
    let dynamic = state.types.dynamic_type();

    state.tables.define(globals, "Map", map, false);
    state.tables.define(globals, RAW_RECEIVER, dynamic, false);

    debug!("tracking module {name:?}");
    state.modules.insert(
        name.to_string(),
        Module::new(name, file.clone(), module_type, globals),
    );
}

/// Pass 11.
pub fn define_this_module(state: &mut CompilerState, name: &str) {
    let Some(module) = state.modules.get(name) else {
        return;
    };

    let module_type = module.module_type;
    let globals = module.globals;
    let root_table = module.root_table;

    state.tables.define(globals, THIS_MODULE, module_type, false);

    if root_table != crate::symbol::TableId::UNDEFINED {
        state.tables.define(root_table, "self", module_type, false);
    }
}
