//! Symbol tables: named bindings with lexical nesting and index assignment.
//!
//! Tables live in a [`SymbolTables`] arena and refer to their parents by
//! [`TableId`], following the same stable-index pattern the type database
//! uses. A table maps names to [`Symbol`]s in insertion order; each symbol's
//! index is its insertion position within the defining table.
//!
//! A table can temporarily operate in *unique-names mode*
//! ([`SymbolTables::with_unique_names`]): every definition stores a globally
//! unique name (the original name with the table identity appended) while a
//! per-scope redirect map keeps the original name resolvable. Closure
//! hoisting uses this so locals from different closures do not collide when
//! merged into the enclosing method's table.

use indexmap::IndexMap;

use crate::types::TypeId;

/// Stable identifier of a symbol table in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl TableId {
    /// Sentinel for nodes whose table has not been attached yet.
    pub const UNDEFINED: Self = TableId(u32::MAX);
}

/// A named binding. Two symbols compare equal iff all fields compare equal;
/// symbols carry no identity of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub value_type: TypeId,
    /// Insertion order within the defining table; `-1` marks the null
    /// symbol.
    pub index: i32,
    pub mutable: bool,
}

impl Symbol {
    /// The null symbol, returned for absent lookups.
    pub fn null() -> Self {
        Self {
            name: String::new(),
            value_type: TypeId::UNDEFINED,
            index: -1,
            mutable: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.index == -1
    }
}

/// A single symbol table. Tables compare equal iff their contents and parent
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
    pub parent: Option<TableId>,
    unique_names: bool,
    redirects: IndexMap<String, String>,
}

impl SymbolTable {
    pub fn new(parent: Option<TableId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// Defines `name` with the next index. In unique-names mode the stored
    /// name is rewritten to a unique form and a redirect is recorded.
    pub fn define(&mut self, name: impl Into<String>, value_type: TypeId, mutable: bool) -> Symbol {
        let name = name.into();
        let index = self.symbols.len() as i32;

        let stored = if self.unique_names {
            let unique = format!("{}${}", name, index);

            self.redirects.insert(name, unique.clone());
            unique
        } else {
            name
        };

        let symbol = Symbol {
            name: stored.clone(),
            value_type,
            index,
            mutable,
        };

        self.symbols.insert(stored, symbol.clone());
        symbol
    }

    fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.redirects.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Looks up a name in this table only.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(self.resolve_name(name))
    }

    /// Looks up a symbol by its index.
    pub fn get_index(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get_index(index).map(|(_, symbol)| symbol)
    }

    /// Replaces the type of an already defined symbol.
    pub fn reassign(&mut self, name: &str, value_type: TypeId) {
        let key = self.resolve_name(name).to_string();

        if let Some(symbol) = self.symbols.get_mut(&key) {
            symbol.value_type = value_type;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(self.resolve_name(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.symbols.keys()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// The symbols whose indices fall in `range`, in order.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Vec<Symbol> {
        range
            .filter_map(|index| self.get_index(index).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The arena owning every lexical symbol table of a run.
#[derive(Debug, Default)]
pub struct SymbolTables {
    tables: Vec<SymbolTable>,
}

impl SymbolTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, parent: Option<TableId>) -> TableId {
        let id = TableId(self.tables.len() as u32);

        self.tables.push(SymbolTable::new(parent));
        id
    }

    pub fn get(&self, id: TableId) -> &SymbolTable {
        &self.tables[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TableId) -> &mut SymbolTable {
        &mut self.tables[id.0 as usize]
    }

    pub fn define(
        &mut self,
        id: TableId,
        name: impl Into<String>,
        value_type: TypeId,
        mutable: bool,
    ) -> Symbol {
        self.get_mut(id).define(name, value_type, mutable)
    }

    /// Walks this table and its parents. Returns `(depth, symbol)` where a
    /// depth of `-1` means the symbol was found in the starting table, `0` in
    /// its parent, and so on. An absent name yields `(-1, null symbol)`.
    pub fn lookup_with_parent(&self, id: TableId, name: &str) -> (i32, Symbol) {
        let mut depth = -1;
        let mut current = Some(id);

        while let Some(table_id) = current {
            let table = self.get(table_id);

            if let Some(symbol) = table.get(name) {
                return (depth, symbol.clone());
            }

            depth += 1;
            current = table.parent;
        }

        (-1, Symbol::null())
    }

    /// Looks up a name in the outermost table of the parent chain.
    pub fn lookup_in_root(&self, id: TableId, name: &str) -> Symbol {
        let mut current = id;

        while let Some(parent) = self.get(current).parent {
            current = parent;
        }

        self.get(current).get(name).cloned().unwrap_or_else(Symbol::null)
    }

    /// Runs `block` with the table in unique-names mode, restoring the
    /// previous mode and discarding the scope's redirects afterwards. The
    /// uniquified symbols themselves remain defined.
    pub fn with_unique_names<R>(
        &mut self,
        id: TableId,
        block: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = {
            let table = self.get_mut(id);
            std::mem::replace(&mut table.unique_names, true)
        };

        let result = block(self);

        let table = self.get_mut(id);

        table.unique_names = previous;

        if !previous {
            table.redirects.clear();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::{Symbol, SymbolTables, TableId};
    use crate::types::TypeId;
    use pretty_assertions::assert_eq;

    #[test]
    fn indices_follow_insertion_order() {
        let mut tables = SymbolTables::new();
        let table = tables.alloc(None);

        let a = tables.define(table, "a", TypeId(1), false);
        let b = tables.define(table, "b", TypeId(2), true);

        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(
            tables.get(table).names().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(tables.get(table).get_index(1).unwrap().name, "b");
    }

    #[test]
    fn lookup_with_parent_reports_depth() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        let middle = tables.alloc(Some(root));
        let inner = tables.alloc(Some(middle));

        tables.define(root, "x", TypeId(1), false);
        tables.define(inner, "y", TypeId(2), false);

        let (depth, symbol) = tables.lookup_with_parent(inner, "y");

        assert_eq!(depth, -1);
        assert_eq!(symbol.name, "y");

        let (depth, symbol) = tables.lookup_with_parent(inner, "x");

        assert_eq!(depth, 1);
        assert_eq!(symbol.name, "x");

        let (depth, symbol) = tables.lookup_with_parent(inner, "missing");

        assert_eq!(depth, -1);
        assert!(symbol.is_null());
        assert_eq!(symbol, Symbol::null());
    }

    #[test]
    fn lookup_in_root_skips_to_the_outermost_table() {
        let mut tables = SymbolTables::new();
        let root = tables.alloc(None);
        let inner = tables.alloc(Some(root));

        tables.define(root, "x", TypeId(1), false);
        tables.define(inner, "x", TypeId(2), false);

        assert_eq!(tables.lookup_in_root(inner, "x").value_type, TypeId(1));
    }

    #[test]
    fn unique_names_mode_rewrites_and_redirects() {
        let mut tables = SymbolTables::new();
        let table = tables.alloc(None);

        tables.define(table, "plain", TypeId(1), false);

        tables.with_unique_names(table, |tables| {
            let symbol = tables.define(table, "x", TypeId(2), false);

            assert_eq!(symbol.name, "x$1");
            // The original name still resolves inside the scope.
            assert_eq!(tables.get(table).get("x").unwrap().index, 1);
        });

        // Outside the scope the redirect is gone but the symbol remains.
        let table_ref = tables.get(table);

        assert!(table_ref.get("x").is_none());
        assert!(table_ref.get("x$1").is_some());
        assert_eq!(table_ref.len(), 2);
    }

    #[test]
    fn reassign_replaces_the_type() {
        let mut tables = SymbolTables::new();
        let table = tables.alloc(None);

        tables.define(table, "x", TypeId(1), true);
        tables.get_mut(table).reassign("x", TypeId(9));

        assert_eq!(tables.get(table).get("x").unwrap().value_type, TypeId(9));
    }

    #[test]
    fn undefined_table_id_is_a_sentinel() {
        assert_eq!(TableId::UNDEFINED, TableId(u32::MAX));
    }
}
