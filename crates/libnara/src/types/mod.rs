//! The type system: the `Type` union and its building blocks.
//!
//! Types live in the run's [`TypeDatabase`](database::TypeDatabase) arena and
//! are referred to by stable [`TypeId`]s; AST nodes and symbols store ids,
//! never types. The built-in prototypes occupy the first arena slots so a
//! builtin's `TypeId` equals its wire id, which is a stable contract with the
//! bytecode serializer.

pub mod database;
pub mod raw;

pub use database::TypeDatabase;

use indexmap::IndexMap;
use strum_macros::Display;

use crate::symbol::SymbolTable;

/// The reserved module-type constant bound in every module.
pub static THIS_MODULE: &str = "ThisModule";

/// The reserved constant referring to the enclosing object inside object
/// bodies and signatures.
pub static SELF_TYPE: &str = "Self";

/// The reserved constant whose sends are raw VM instructions.
pub static RAW_RECEIVER: &str = "_INKOC";

/// True for constants that user code may never redefine.
pub fn reserved_constant(name: &str) -> bool {
    name == THIS_MODULE || name == SELF_TYPE || name == RAW_RECEIVER
}

/// Stable identifier of a type in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for nodes the type pass has not annotated yet.
    pub const UNDEFINED: Self = TypeId(u32::MAX);

    pub fn is_undefined(self) -> bool {
        self == Self::UNDEFINED
    }
}

/// The built-in prototypes and their wire ids. These assignments are a
/// stable external contract with the bytecode serializer and must never be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum BuiltinKind {
    Object = 0,
    Integer = 1,
    Float = 2,
    String = 3,
    Array = 4,
    Block = 5,
    Boolean = 6,
    ByteArray = 7,
    Nil = 8,
    Module = 9,
    IpSocket = 10,
    UnixSocket = 11,
    Process = 12,
    ReadOnlyFile = 13,
    WriteOnlyFile = 14,
    ReadWriteFile = 15,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 16] = [
        BuiltinKind::Object,
        BuiltinKind::Integer,
        BuiltinKind::Float,
        BuiltinKind::String,
        BuiltinKind::Array,
        BuiltinKind::Block,
        BuiltinKind::Boolean,
        BuiltinKind::ByteArray,
        BuiltinKind::Nil,
        BuiltinKind::Module,
        BuiltinKind::IpSocket,
        BuiltinKind::UnixSocket,
        BuiltinKind::Process,
        BuiltinKind::ReadOnlyFile,
        BuiltinKind::WriteOnlyFile,
        BuiltinKind::ReadWriteFile,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// The constant name the prototype is bound to in module globals.
    pub fn constant_name(self) -> &'static str {
        match self {
            BuiltinKind::Object => "Object",
            BuiltinKind::Integer => "Integer",
            BuiltinKind::Float => "Float",
            BuiltinKind::String => "String",
            BuiltinKind::Array => "Array",
            BuiltinKind::Block => "Block",
            BuiltinKind::Boolean => "Boolean",
            BuiltinKind::ByteArray => "ByteArray",
            BuiltinKind::Nil => "Nil",
            BuiltinKind::Module => "Module",
            BuiltinKind::IpSocket => "IpSocket",
            BuiltinKind::UnixSocket => "UnixSocket",
            BuiltinKind::Process => "Process",
            BuiltinKind::ReadOnlyFile => "ReadOnlyFile",
            BuiltinKind::WriteOnlyFile => "WriteOnlyFile",
            BuiltinKind::ReadWriteFile => "ReadWriteFile",
        }
    }
}

/// An ordered table of generic type parameters. Each entry is either
/// uninitialised or bound to an instance type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeParameterTable {
    entries: IndexMap<String, Option<TypeId>>,
}

impl TypeParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an uninitialised parameter.
    pub fn define(&mut self, name: impl Into<String>) {
        self.entries.insert(name.into(), None);
    }

    /// Binds a parameter to an instance type.
    pub fn initialise(&mut self, name: &str, instance: TypeId) {
        self.entries.insert(name.to_string(), Some(instance));
    }

    pub fn instance(&self, name: &str) -> Option<TypeId> {
        self.entries.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, Option<TypeId>)> {
        self.entries.iter().map(|(name, value)| (name, *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when any parameter is still uninitialised.
    pub fn has_uninitialised(&self) -> bool {
        self.entries.values().any(|value| value.is_none())
    }

    /// Adopts entries from `other` that this table lacks or has not
    /// initialised, while preserving any instance already present.
    pub fn merge(&mut self, other: &TypeParameterTable) {
        for (name, value) in other.iter() {
            match self.entries.get(name) {
                Some(Some(_)) => {}
                _ => {
                    self.entries.insert(name.clone(), value);
                }
            }
        }
    }
}

/// Kind of a callable block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Method,
    Closure,
    Lambda,
}

/// One argument of a block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockArgument {
    pub name: String,
    pub value_type: TypeId,
    pub has_default: bool,
    pub rest: bool,
}

/// The type of a method, closure, or lambda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockType {
    pub kind: BlockKind,
    pub name: Option<String>,
    /// For methods the first argument is the explicit `self`.
    pub arguments: Vec<BlockArgument>,
    pub throw_type: Option<TypeId>,
    pub return_type: TypeId,
    pub type_parameters: TypeParameterTable,
    /// Closures capturing outer locals.
    pub captures: bool,
    /// A trait method without a body.
    pub required: bool,
    pub static_method: bool,
}

impl BlockType {
    /// The arguments a sender supplies, excluding the explicit `self`.
    pub fn message_arguments(&self) -> &[BlockArgument] {
        if self.kind == BlockKind::Method && !self.static_method {
            match self.arguments.split_first() {
                Some((first, rest)) if first.name == "self" => rest,
                _ => &self.arguments,
            }
        } else {
            &self.arguments
        }
    }

    /// The valid argument count range `(minimum, maximum)`; a `None` maximum
    /// means unbounded (a rest argument is present).
    pub fn argument_range(&self) -> (usize, Option<usize>) {
        let arguments = self.message_arguments();
        let minimum = arguments
            .iter()
            .filter(|argument| !argument.has_default && !argument.rest)
            .count();

        if arguments.iter().any(|argument| argument.rest) {
            (minimum, None)
        } else {
            (minimum, Some(arguments.len()))
        }
    }
}

/// An object type: a prototype-based structure with attributes, optional
/// generic parameters, and the traits implemented for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: Option<String>,
    pub prototype: Option<TypeId>,
    pub attributes: SymbolTable,
    pub type_parameters: TypeParameterTable,
    pub implemented_traits: Vec<TypeId>,
    /// Which builtin prototype this is, if any.
    pub builtin: Option<BuiltinKind>,
    /// For shallow instances of a generic, the generic this was instantiated
    /// from.
    pub instance_of: Option<TypeId>,
}

/// A trait type with its required traits and methods (required methods are
/// block types flagged `required`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitType {
    pub name: String,
    pub required_traits: Vec<TypeId>,
    pub type_parameters: TypeParameterTable,
    pub attributes: SymbolTable,
    pub instance_of: Option<TypeId>,
}

/// A generic type parameter with its trait bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterType {
    pub name: String,
    pub required_traits: Vec<TypeId>,
}

/// The type union.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Object(ObjectType),
    Trait(TraitType),
    Block(BlockType),
    Optional(TypeId),
    TypeParameter(TypeParameterType),
    Dynamic,
    Error,
}

#[cfg(test)]
mod tests {
    use super::{BuiltinKind, TypeId, TypeParameterTable};
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_wire_ids_are_stable() {
        assert_eq!(BuiltinKind::Object.id(), 0);
        assert_eq!(BuiltinKind::Integer.id(), 1);
        assert_eq!(BuiltinKind::Float.id(), 2);
        assert_eq!(BuiltinKind::String.id(), 3);
        assert_eq!(BuiltinKind::Array.id(), 4);
        assert_eq!(BuiltinKind::Block.id(), 5);
        assert_eq!(BuiltinKind::Boolean.id(), 6);
        assert_eq!(BuiltinKind::ByteArray.id(), 7);
        assert_eq!(BuiltinKind::Nil.id(), 8);
        assert_eq!(BuiltinKind::Module.id(), 9);
        assert_eq!(BuiltinKind::ReadWriteFile.id(), 15);
    }

    #[test]
    fn parameter_table_merge_preserves_instances() {
        let mut ours = TypeParameterTable::new();
        let mut theirs = TypeParameterTable::new();

        ours.define("T");
        ours.initialise("T", TypeId(1));
        ours.define("U");

        theirs.initialise("T", TypeId(9));
        theirs.initialise("U", TypeId(2));
        theirs.define("V");

        ours.merge(&theirs);

        assert_eq!(ours.instance("T"), Some(TypeId(1)));
        assert_eq!(ours.instance("U"), Some(TypeId(2)));
        assert!(ours.contains("V"));
        assert_eq!(ours.instance("V"), None);
    }
}
