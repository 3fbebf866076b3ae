//! The type database: the global registry of built-in prototypes and derived
//! types.
//!
//! The database is an arena of [`Type`]s. The built-in prototypes are
//! installed exactly once at creation, in wire-id order, so a builtin's
//! [`TypeId`] equals its [`BuiltinKind`] id. Everything else (objects,
//! traits, blocks, optionals, type parameters) is allocated on demand.

use log::debug;

use crate::symbol::SymbolTable;

use super::{
    BlockArgument, BlockKind, BlockType, BuiltinKind, ObjectType, TraitType, Type, TypeId,
    TypeParameterTable, TypeParameterType,
};

/// The result of looking up a method on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodLookup {
    /// The block type of the method.
    pub block: TypeId,
    /// The type the method was found on (the receiver itself, a prototype,
    /// or a trait).
    pub defined_on: TypeId,
}

#[derive(Debug)]
pub struct TypeDatabase {
    types: Vec<Type>,
    dynamic: TypeId,
    error: TypeId,
    map_prototype: TypeId,
}

impl Default for TypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDatabase {
    pub fn new() -> Self {
        let mut database = Self {
            types: Vec::new(),
            dynamic: TypeId::UNDEFINED,
            error: TypeId::UNDEFINED,
            map_prototype: TypeId::UNDEFINED,
        };

        database.install_builtins();
        database
    }

    fn install_builtins(&mut self) {
        for kind in BuiltinKind::ALL {
            let prototype = if kind == BuiltinKind::Object {
                None
            } else {
                Some(TypeId(BuiltinKind::Object.id() as u32))
            };

            let id = self.alloc(Type::Object(ObjectType {
                name: Some(kind.constant_name().to_string()),
                prototype,
                attributes: SymbolTable::new(None),
                type_parameters: TypeParameterTable::new(),
                implemented_traits: Vec::new(),
                builtin: Some(kind),
                instance_of: None,
            }));

            debug_assert_eq!(id.0, kind.id() as u32);
        }

        self.dynamic = self.alloc(Type::Dynamic);
        self.error = self.alloc(Type::Error);

        self.seed_array_prototype();
        self.seed_map_prototype();
    }

    /// `Array` is generic over its element type and carries a static
    /// `new(*values: T) -> Array!(T)` so array literals type without the
    /// standard library loaded.
    fn seed_array_prototype(&mut self) {
        let array = self.array_type();
        let element = self.new_type_parameter("T", Vec::new());

        if let Type::Object(object) = self.get_mut(array) {
            object.type_parameters.define("T");
        }

        let new_method = self.alloc(Type::Block(BlockType {
            kind: BlockKind::Method,
            name: Some("new".to_string()),
            arguments: vec![BlockArgument {
                name: "values".to_string(),
                value_type: element,
                has_default: false,
                rest: true,
            }],
            throw_type: None,
            return_type: array,
            type_parameters: TypeParameterTable::new(),
            captures: false,
            required: false,
            static_method: true,
        }));

        if let Type::Object(object) = self.get_mut(array) {
            object.attributes.define("new", new_method, false);
        }
    }

    /// `Map` is the well-known receiver of hash-map literal desugaring.
    fn seed_map_prototype(&mut self) {
        let object_proto = self.object_type();
        let map = self.new_object("Map", Some(object_proto));
        let array = self.array_type();

        let from_array = self.alloc(Type::Block(BlockType {
            kind: BlockKind::Method,
            name: Some("from_array".to_string()),
            arguments: vec![
                BlockArgument {
                    name: "keys".to_string(),
                    value_type: array,
                    has_default: false,
                    rest: false,
                },
                BlockArgument {
                    name: "values".to_string(),
                    value_type: array,
                    has_default: false,
                    rest: false,
                },
            ],
            throw_type: None,
            return_type: map,
            type_parameters: TypeParameterTable::new(),
            captures: false,
            required: false,
            static_method: true,
        }));

        if let Type::Object(object) = self.get_mut(map) {
            object.attributes.define("from_array", from_array, false);
        }

        self.map_prototype = map;
    }

    pub fn alloc(&mut self, value: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);

        self.types.push(value);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // Well-known types

    pub fn builtin(&self, kind: BuiltinKind) -> TypeId {
        TypeId(kind.id() as u32)
    }

    pub fn object_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Object)
    }

    pub fn integer_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Integer)
    }

    pub fn float_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Float)
    }

    pub fn string_type(&self) -> TypeId {
        self.builtin(BuiltinKind::String)
    }

    pub fn array_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Array)
    }

    pub fn block_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Block)
    }

    pub fn boolean_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Boolean)
    }

    pub fn byte_array_type(&self) -> TypeId {
        self.builtin(BuiltinKind::ByteArray)
    }

    pub fn nil_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Nil)
    }

    pub fn module_type(&self) -> TypeId {
        self.builtin(BuiltinKind::Module)
    }

    pub fn dynamic_type(&self) -> TypeId {
        self.dynamic
    }

    pub fn error_type(&self) -> TypeId {
        self.error
    }

    pub fn map_prototype(&self) -> TypeId {
        self.map_prototype
    }

    // Constructors

    pub fn new_object(&mut self, name: impl Into<String>, prototype: Option<TypeId>) -> TypeId {
        let name = name.into();

        debug!("defining object type {name:?}");

        self.alloc(Type::Object(ObjectType {
            name: Some(name),
            prototype,
            attributes: SymbolTable::new(None),
            type_parameters: TypeParameterTable::new(),
            implemented_traits: Vec::new(),
            builtin: None,
            instance_of: None,
        }))
    }

    pub fn new_trait(&mut self, name: impl Into<String>) -> TypeId {
        let name = name.into();

        debug!("defining trait type {name:?}");

        self.alloc(Type::Trait(TraitType {
            name,
            required_traits: Vec::new(),
            type_parameters: TypeParameterTable::new(),
            attributes: SymbolTable::new(None),
            instance_of: None,
        }))
    }

    pub fn new_type_parameter(
        &mut self,
        name: impl Into<String>,
        required_traits: Vec<TypeId>,
    ) -> TypeId {
        self.alloc(Type::TypeParameter(TypeParameterType {
            name: name.into(),
            required_traits,
        }))
    }

    /// Wraps `inner` in an optional, collapsing `??T` into `?T`.
    pub fn optional(&mut self, inner: TypeId) -> TypeId {
        if let Type::Optional(_) = self.get(inner) {
            return inner;
        }

        self.alloc(Type::Optional(inner))
    }

    pub fn optional_inner(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Optional(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Returns a copy of a generic type whose own parameter table is replaced
    /// by `parameters`, leaving attribute types untouched; they resolve
    /// lazily through the parameter table. Non-generic types are returned
    /// unchanged.
    pub fn new_shallow_instance(
        &mut self,
        generic: TypeId,
        mut parameters: TypeParameterTable,
    ) -> TypeId {
        let canonical = self.canonical(generic);

        match self.get(generic).clone() {
            Type::Object(object) => {
                parameters.merge(&object.type_parameters);

                self.alloc(Type::Object(ObjectType {
                    type_parameters: parameters,
                    instance_of: Some(canonical),
                    ..object
                }))
            }
            Type::Trait(trait_type) => {
                parameters.merge(&trait_type.type_parameters);

                self.alloc(Type::Trait(TraitType {
                    type_parameters: parameters,
                    instance_of: Some(canonical),
                    ..trait_type
                }))
            }
            _ => generic,
        }
    }

    /// The generic a shallow instance was created from, or the type itself.
    pub fn canonical(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Object(object) => object.instance_of.unwrap_or(id),
            Type::Trait(trait_type) => trait_type.instance_of.unwrap_or(id),
            _ => id,
        }
    }

    pub fn type_parameters(&self, id: TypeId) -> Option<&TypeParameterTable> {
        match self.get(id) {
            Type::Object(object) => Some(&object.type_parameters),
            Type::Trait(trait_type) => Some(&trait_type.type_parameters),
            _ => None,
        }
    }

    /// True for a generic with parameters that still need instantiation.
    pub fn needs_instance(&self, id: TypeId) -> bool {
        self.type_parameters(id)
            .map(|parameters| !parameters.is_empty() && parameters.has_uninitialised())
            .unwrap_or(false)
    }

    // Lookups

    /// Looks up a method by walking the type's own attributes, its prototype
    /// chain, then its traits (for type parameters: the bound traits).
    pub fn lookup_method(&self, id: TypeId, name: &str) -> Option<MethodLookup> {
        match self.get(id) {
            Type::Object(object) => {
                if let Some(symbol) = object.attributes.get(name) {
                    if let Type::Block(_) = self.get(symbol.value_type) {
                        return Some(MethodLookup {
                            block: symbol.value_type,
                            defined_on: id,
                        });
                    }
                }

                if let Some(prototype) = object.prototype {
                    if let Some(found) = self.lookup_method(prototype, name) {
                        return Some(found);
                    }
                }

                object
                    .implemented_traits
                    .iter()
                    .find_map(|&implemented| self.lookup_method(implemented, name))
            }
            Type::Trait(trait_type) => {
                if let Some(symbol) = trait_type.attributes.get(name) {
                    if let Type::Block(_) = self.get(symbol.value_type) {
                        return Some(MethodLookup {
                            block: symbol.value_type,
                            defined_on: id,
                        });
                    }
                }

                trait_type
                    .required_traits
                    .iter()
                    .find_map(|&required| self.lookup_method(required, name))
            }
            Type::TypeParameter(parameter) => parameter
                .required_traits
                .iter()
                .find_map(|&required| self.lookup_method(required, name)),
            _ => None,
        }
    }

    /// Looks up any attribute (method or not) on a type, walking the
    /// prototype chain.
    pub fn lookup_attribute(&self, id: TypeId, name: &str) -> Option<TypeId> {
        match self.get(id) {
            Type::Object(object) => {
                if let Some(symbol) = object.attributes.get(name) {
                    return Some(symbol.value_type);
                }

                object
                    .prototype
                    .and_then(|prototype| self.lookup_attribute(prototype, name))
            }
            Type::Trait(trait_type) => trait_type
                .attributes
                .get(name)
                .map(|symbol| symbol.value_type),
            _ => None,
        }
    }

    /// True when `object` implements `implemented` directly or through the
    /// required traits of one of its implemented traits.
    pub fn implements_trait(&self, id: TypeId, wanted: TypeId) -> bool {
        let wanted = self.canonical(wanted);

        match self.get(id) {
            Type::Object(object) => {
                object
                    .implemented_traits
                    .iter()
                    .any(|&implemented| self.trait_covers(implemented, wanted))
                    || object
                        .prototype
                        .map(|prototype| self.implements_trait(prototype, wanted))
                        .unwrap_or(false)
            }
            Type::Trait(_) => self.trait_covers(id, wanted),
            Type::TypeParameter(parameter) => parameter
                .required_traits
                .iter()
                .any(|&required| self.trait_covers(required, wanted)),
            _ => false,
        }
    }

    fn trait_covers(&self, id: TypeId, wanted: TypeId) -> bool {
        if self.canonical(id) == wanted {
            return true;
        }

        match self.get(id) {
            Type::Trait(trait_type) => trait_type
                .required_traits
                .iter()
                .any(|&required| self.trait_covers(required, wanted)),
            _ => false,
        }
    }

    // Substitution

    /// Resolves type parameters through the given tables, first match wins.
    /// Optionals substitute their inner type.
    pub fn substitute(&mut self, id: TypeId, tables: &[&TypeParameterTable]) -> TypeId {
        match self.get(id).clone() {
            Type::TypeParameter(parameter) => tables
                .iter()
                .find_map(|table| table.instance(&parameter.name))
                .unwrap_or(id),
            Type::Optional(inner) => {
                let resolved = self.substitute(inner, tables);

                if resolved == inner {
                    id
                } else {
                    self.optional(resolved)
                }
            }
            _ => id,
        }
    }

    // Compatibility

    /// Whether a value of type `found` may be used where `expected` is
    /// required.
    pub fn compatible(&self, found: TypeId, expected: TypeId) -> bool {
        if found == expected {
            return true;
        }

        match (self.get(found), self.get(expected)) {
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Dynamic, _) | (_, Type::Dynamic) => true,
            (_, Type::Optional(inner)) => {
                let inner = *inner;

                if found == self.nil_type() {
                    return true;
                }

                if let Type::Optional(found_inner) = self.get(found) {
                    return self.compatible(*found_inner, inner);
                }

                self.compatible(found, inner)
            }
            (Type::Optional(_), _) => false,
            (_, Type::Trait(_)) => self.implements_trait(found, expected),
            (_, Type::TypeParameter(parameter)) => parameter
                .required_traits
                .iter()
                .all(|&required| self.implements_trait(found, required)),
            (Type::TypeParameter(parameter), _) => parameter
                .required_traits
                .iter()
                .any(|&required| self.trait_covers(required, self.canonical(expected))),
            (Type::Object(found_object), Type::Object(expected_object)) => {
                if self.canonical(found) != self.canonical(expected) {
                    return false;
                }

                // Same generic: parameter instances must agree where both
                // sides have them.
                found_object
                    .type_parameters
                    .iter()
                    .zip(expected_object.type_parameters.iter())
                    .all(|((_, ours), (_, theirs))| match (ours, theirs) {
                        (Some(ours), Some(theirs)) => self.compatible(ours, theirs),
                        _ => true,
                    })
            }
            (Type::Block(found_block), Type::Block(expected_block)) => {
                let ours = found_block.message_arguments();
                let theirs = expected_block.message_arguments();

                ours.len() == theirs.len()
                    && ours
                        .iter()
                        .zip(theirs)
                        .all(|(a, b)| self.compatible(b.value_type, a.value_type))
                    && self.compatible(found_block.return_type, expected_block.return_type)
                    && match (found_block.throw_type, expected_block.throw_type) {
                        (None, _) => true,
                        (Some(_), None) => false,
                        (Some(ours), Some(theirs)) => self.compatible(ours, theirs),
                    }
            }
            _ => false,
        }
    }

    // Naming

    /// A human readable name for diagnostics.
    pub fn type_name(&self, id: TypeId) -> String {
        if id.is_undefined() {
            return "<undefined>".to_string();
        }

        match self.get(id) {
            Type::Object(object) => {
                let base = object.name.clone().unwrap_or_else(|| "Object".to_string());
                let instances: Vec<String> = object
                    .type_parameters
                    .iter()
                    .filter_map(|(_, instance)| instance)
                    .map(|instance| self.type_name(instance))
                    .collect();

                if instances.is_empty() || instances.len() != object.type_parameters.len() {
                    base
                } else {
                    format!("{}!({})", base, instances.join(", "))
                }
            }
            Type::Trait(trait_type) => trait_type.name.clone(),
            Type::Block(block) => {
                let keyword = match block.kind {
                    BlockKind::Method => "def",
                    BlockKind::Closure => "do",
                    BlockKind::Lambda => "lambda",
                };
                let arguments: Vec<String> = block
                    .message_arguments()
                    .iter()
                    .map(|argument| self.type_name(argument.value_type))
                    .collect();

                format!(
                    "{} ({}) -> {}",
                    keyword,
                    arguments.join(", "),
                    self.type_name(block.return_type)
                )
            }
            Type::Optional(inner) => format!("?{}", self.type_name(*inner)),
            Type::TypeParameter(parameter) => parameter.name.clone(),
            Type::Dynamic => "Dynamic".to_string(),
            Type::Error => "<error>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeDatabase;
    use crate::types::{BuiltinKind, Type, TypeId, TypeParameterTable};
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_prototypes_are_installed_once_with_stable_ids() {
        let database = TypeDatabase::new();

        assert_eq!(database.integer_type(), TypeId(1));
        assert_eq!(database.float_type(), TypeId(2));
        assert_eq!(database.string_type(), TypeId(3));
        assert_eq!(database.array_type(), TypeId(4));
        assert_eq!(database.block_type(), TypeId(5));
        assert_eq!(database.boolean_type(), TypeId(6));
        assert_eq!(database.byte_array_type(), TypeId(7));
        assert_eq!(database.nil_type(), TypeId(8));
        assert_eq!(database.module_type(), TypeId(9));

        match database.get(database.integer_type()) {
            Type::Object(object) => {
                assert_eq!(object.builtin, Some(BuiltinKind::Integer));
                assert_eq!(object.prototype, Some(database.object_type()));
            }
            other => panic!("expected an object type, got {other:?}"),
        }
    }

    #[test]
    fn array_literals_can_type_without_a_standard_library() {
        let database = TypeDatabase::new();
        let lookup = database
            .lookup_method(database.array_type(), "new")
            .unwrap();

        match database.get(lookup.block) {
            Type::Block(block) => {
                assert!(block.static_method);
                assert_eq!(block.argument_range(), (0, None));
                assert_eq!(block.return_type, database.array_type());
            }
            other => panic!("expected a block type, got {other:?}"),
        }
    }

    #[test]
    fn shallow_instances_replace_only_the_parameter_table() {
        let mut database = TypeDatabase::new();
        let array = database.array_type();

        let mut parameters = TypeParameterTable::new();

        parameters.initialise("T", database.integer_type());

        let instance = database.new_shallow_instance(array, parameters);

        assert_ne!(instance, array);
        assert_eq!(database.canonical(instance), array);
        assert_eq!(
            database.type_parameters(instance).unwrap().instance("T"),
            Some(database.integer_type())
        );
        // The generic itself is untouched.
        assert_eq!(database.type_parameters(array).unwrap().instance("T"), None);
        assert_eq!(database.type_name(instance), "Array!(Integer)");
    }

    #[test]
    fn method_lookup_walks_the_prototype_chain() {
        let mut database = TypeDatabase::new();
        let object_proto = database.object_type();
        let block = database.alloc(Type::Block(crate::types::BlockType {
            kind: crate::types::BlockKind::Method,
            name: Some("to_string".to_string()),
            arguments: Vec::new(),
            throw_type: None,
            return_type: database.string_type(),
            type_parameters: TypeParameterTable::new(),
            captures: false,
            required: false,
            static_method: false,
        }));

        if let Type::Object(object) = database.get_mut(object_proto) {
            object.attributes.define("to_string", block, false);
        }

        let found = database
            .lookup_method(database.integer_type(), "to_string")
            .unwrap();

        assert_eq!(found.block, block);
        assert_eq!(found.defined_on, object_proto);
    }

    #[test]
    fn optional_compatibility() {
        let mut database = TypeDatabase::new();
        let integer = database.integer_type();
        let optional_integer = database.optional(integer);

        assert!(database.compatible(integer, optional_integer));
        assert!(database.compatible(database.nil_type(), optional_integer));
        assert!(database.compatible(optional_integer, optional_integer));
        assert!(!database.compatible(optional_integer, integer));
        assert!(!database.compatible(database.string_type(), optional_integer));
    }

    #[test]
    fn dynamic_is_compatible_both_ways() {
        let database = TypeDatabase::new();

        assert!(database.compatible(database.dynamic_type(), database.integer_type()));
        assert!(database.compatible(database.integer_type(), database.dynamic_type()));
    }

    #[test]
    fn trait_compatibility_uses_implemented_traits() {
        let mut database = TypeDatabase::new();
        let to_string = database.new_trait("ToString");
        let inspect = database.new_trait("Inspect");

        if let Type::Trait(trait_type) = database.get_mut(inspect) {
            trait_type.required_traits.push(to_string);
        }

        let person = database.new_object("Person", Some(database.object_type()));

        if let Type::Object(object) = database.get_mut(person) {
            object.implemented_traits.push(inspect);
        }

        assert!(database.compatible(person, inspect));
        // Implementing Inspect covers its required trait too.
        assert!(database.compatible(person, to_string));
        assert!(!database.compatible(database.integer_type(), to_string));
    }
}
