//! The typed intermediate representation (TIR).
//!
//! The TIR is structurally close to the AST, but every name is resolved:
//! locals are `(depth, index)` pairs, globals are indices into the module's
//! globals table, methods receive their `self` explicitly, and capturing
//! closures have had their locals hoisted into the enclosing method's table.
//! The bytecode serializer consumes this representation; the front-end stops
//! here.

pub mod lower;
pub mod tail_calls;

use crate::types::BlockKind;

/// A lowered callable body: the module's top-level block, a method, a
/// closure, or a lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub name: Option<String>,
    /// Argument names, including the explicit `self` of methods.
    pub arguments: Vec<String>,
    /// Number of local slots in the block's symbol table, after hoisting.
    pub locals: usize,
    pub captures: bool,
    /// For a hoisted closure: the index of its first slot in the enclosing
    /// method's table.
    pub hoisted_offset: Option<usize>,
    pub body: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer { value: i64 },
    Float { value: f64 },
    String { value: String },
    Template { parts: Vec<Expr> },
    Nil,
    GetSelf,
    GetLocal { depth: i32, index: i32 },
    SetLocal { depth: i32, index: i32, value: Box<Expr> },
    DefineLocal { index: i32, value: Box<Expr> },
    GetGlobal { index: i32, name: String },
    GetAttribute { name: String },
    SetAttribute { name: String, value: Box<Expr> },
    DefineAttribute { name: String, value: Box<Expr> },
    DefineConstant { name: String, value: Box<Expr> },
    GetAttributeOf { receiver: Box<Expr>, name: String },
    SendMessage {
        receiver: Box<Expr>,
        name: String,
        arguments: Vec<Expr>,
    },
    RawInstruction { name: String, arguments: Vec<Expr> },
    Keyword { name: String, value: Box<Expr> },
    Block(Block),
    DefineMethod { name: String, block: Block },
    DefineObject { name: String, body: Vec<Expr> },
    DefineTrait { name: String, body: Vec<Expr> },
    ImplementTrait {
        trait_name: String,
        object_name: String,
        body: Vec<Expr>,
    },
    LoadModule { name: String },
    Return { value: Option<Box<Expr>> },
    Throw { value: Box<Expr> },
    Try {
        expression: Box<Expr>,
        /// Index of the error local in the handler's table.
        else_argument: Option<i32>,
        else_body: Vec<Expr>,
    },
    Cast { value: Box<Expr> },
    Dereference { value: Box<Expr> },
    Sequence { expressions: Vec<Expr> },
    /// A self-recursive tail send rewritten into a backward jump.
    TailJump { arguments: Vec<Expr> },
}
