//! The closed set of raw VM instructions.
//!
//! Sends whose receiver is the reserved `_INKOC` constant are raw
//! instructions: the escape hatch the standard library uses to implement the
//! behaviour of the built-in prototypes. Each instruction has a fixed
//! argument count range and result type; sends naming anything outside this
//! set produce a diagnostic.

use std::str::FromStr;

use strum_macros::{Display, EnumString};

use super::{TypeDatabase, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RawInstruction {
    Panic,
    Exit,
    ObjectEquals,
    GetPrototype,
    IntegerAdd,
    IntegerSub,
    IntegerMul,
    IntegerDiv,
    IntegerMod,
    IntegerPow,
    IntegerShiftLeft,
    IntegerShiftRight,
    IntegerBitwiseAnd,
    IntegerBitwiseOr,
    IntegerBitwiseXor,
    IntegerSmaller,
    IntegerGreater,
    IntegerEquals,
    IntegerToString,
    IntegerToFloat,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
    FloatSmaller,
    FloatGreater,
    FloatEquals,
    FloatToString,
    FloatToInteger,
    StringConcat,
    StringSize,
    StringEquals,
    StringToByteArray,
    ArrayAt,
    ArraySet,
    ArrayLength,
    ArrayRemove,
    ByteArrayAt,
    ByteArraySize,
    StdoutWrite,
    StderrWrite,
    ProcessSpawn,
    ProcessSendMessage,
    ProcessReceiveMessage,
}

impl RawInstruction {
    /// Resolves a message name to an instruction, if it names one.
    pub fn parse(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    /// The valid argument count range `(minimum, maximum)`.
    pub fn argument_range(self) -> (usize, Option<usize>) {
        use RawInstruction::*;

        match self {
            Exit | ProcessReceiveMessage => (0, Some(1)),
            Panic | GetPrototype | IntegerToString | IntegerToFloat | FloatToString
            | FloatToInteger | StringSize | StringToByteArray | ArrayLength | ByteArraySize
            | StdoutWrite | StderrWrite | ProcessSpawn => (1, Some(1)),
            ObjectEquals | IntegerAdd | IntegerSub | IntegerMul | IntegerDiv | IntegerMod
            | IntegerPow | IntegerShiftLeft | IntegerShiftRight | IntegerBitwiseAnd
            | IntegerBitwiseOr | IntegerBitwiseXor | IntegerSmaller | IntegerGreater
            | IntegerEquals | FloatAdd | FloatSub | FloatMul | FloatDiv | FloatSmaller
            | FloatGreater | FloatEquals | StringConcat | StringEquals | ArrayAt
            | ArrayRemove | ByteArrayAt | ProcessSendMessage => (2, Some(2)),
            ArraySet => (3, Some(3)),
        }
    }

    /// The type a send of this instruction produces.
    pub fn return_type(self, database: &TypeDatabase) -> TypeId {
        use RawInstruction::*;

        match self {
            IntegerAdd | IntegerSub | IntegerMul | IntegerDiv | IntegerMod | IntegerPow
            | IntegerShiftLeft | IntegerShiftRight | IntegerBitwiseAnd | IntegerBitwiseOr
            | IntegerBitwiseXor | FloatToInteger | StringSize | ArrayLength | ByteArraySize
            | ByteArrayAt | StdoutWrite | StderrWrite => database.integer_type(),
            FloatAdd | FloatSub | FloatMul | FloatDiv | IntegerToFloat => database.float_type(),
            IntegerSmaller | IntegerGreater | IntegerEquals | FloatSmaller | FloatGreater
            | FloatEquals | StringEquals | ObjectEquals => database.boolean_type(),
            IntegerToString | FloatToString | StringConcat => database.string_type(),
            StringToByteArray => database.byte_array_type(),
            GetPrototype | Panic | Exit | ArrayAt | ArraySet | ArrayRemove | ProcessSpawn
            | ProcessSendMessage | ProcessReceiveMessage => database.dynamic_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RawInstruction;
    use crate::types::TypeDatabase;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_resolve_through_the_closed_set() {
        assert_eq!(
            RawInstruction::parse("integer_add"),
            Some(RawInstruction::IntegerAdd)
        );
        assert_eq!(
            RawInstruction::parse("stdout_write"),
            Some(RawInstruction::StdoutWrite)
        );
        assert_eq!(RawInstruction::parse("make_coffee"), None);
    }

    #[test]
    fn instruction_signatures() {
        let database = TypeDatabase::new();

        assert_eq!(RawInstruction::IntegerAdd.argument_range(), (2, Some(2)));
        assert_eq!(
            RawInstruction::IntegerAdd.return_type(&database),
            database.integer_type()
        );
        assert_eq!(RawInstruction::Panic.argument_range(), (1, Some(1)));
        assert_eq!(RawInstruction::ArraySet.argument_range(), (3, Some(3)));
    }
}
