//! Opcode numbering shared by the compiler and the VM.

/// A single bytecode instruction tag.
///
/// The discriminant is the byte written to the stream. Operands follow the
/// opcode inline, see [`crate::bytecode::Instruction`] for their layout.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // --- Literals ---
    /// Push a number. Operand: 8-byte native-endian f64.
    PushNum = 0,
    /// Push a string. Operand: u8 length + bytes.
    PushStr = 1,
    /// Push a boolean. Operand: one byte, 0 or 1.
    PushBool = 2,
    PushUndefined = 3,
    PushNull = 4,

    // --- Variables ---
    /// Push the value bound to a name, searching the scope chain.
    PushVar = 5,
    /// Pop a value and bind it in the current scope.
    StoreVar = 6,

    Add = 7,

    // --- Control flow ---
    /// Push the return address and jump. Operand: 4-byte native-endian offset.
    Call = 8,
    Ret = 9,

    Print = 10,
    Exit = 11,

    // --- Objects ---
    NewObject = 12,
    /// Pop value, pop object, set the property, push the object back.
    SetProp = 13,
    /// Pop object, push the property value or undefined.
    GetProp = 14,

    // --- Scopes ---
    PushEnv = 15,
    PopEnv = 16,

    /// Pop and discard the top of the stack.
    Pop = 17,
}

impl Op {
    pub const ALL: [Op; 18] = [
        Op::PushNum,
        Op::PushStr,
        Op::PushBool,
        Op::PushUndefined,
        Op::PushNull,
        Op::PushVar,
        Op::StoreVar,
        Op::Add,
        Op::Call,
        Op::Ret,
        Op::Print,
        Op::Exit,
        Op::NewObject,
        Op::SetProp,
        Op::GetProp,
        Op::PushEnv,
        Op::PopEnv,
        Op::Pop,
    ];

    pub fn from_byte(byte: u8) -> Option<Op> {
        Self::ALL.get(byte as usize).copied()
    }

    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Mnemonic used by the disassembler and in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Op::PushNum => "PUSH_NUM",
            Op::PushStr => "PUSH_STR",
            Op::PushBool => "PUSH_BOOL",
            Op::PushUndefined => "PUSH_UNDEFINED",
            Op::PushNull => "PUSH_NULL",
            Op::PushVar => "PUSH_VAR",
            Op::StoreVar => "STORE_VAR",
            Op::Add => "ADD",
            Op::Call => "CALL",
            Op::Ret => "RET",
            Op::Print => "PRINT",
            Op::Exit => "EXIT",
            Op::NewObject => "NEW_OBJECT",
            Op::SetProp => "SET_PROP",
            Op::GetProp => "GET_PROP",
            Op::PushEnv => "PUSH_ENV",
            Op::PopEnv => "POP_ENV",
            Op::Pop => "POP",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
