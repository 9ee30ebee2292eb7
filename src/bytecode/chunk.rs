//! Growable bytecode buffer with typed emit helpers.

use super::opcode::Op;

/// Longest string or name a single operand can carry.
pub const MAX_OPERAND_LEN: usize = u8::MAX as usize;

/// Largest program whose every offset fits a `CALL` operand.
pub const MAX_PROGRAM_LEN: usize = u32::MAX as usize;

/// Returned when a string operand is longer than [`MAX_OPERAND_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandTooLong(pub usize);

/// A chunk of bytecode: opcodes with their operands inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    code: Vec<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    /// Emit a bare opcode and return its offset.
    pub fn emit(&mut self, op: Op) -> usize {
        let offset = self.code.len();
        self.code.push(op.byte());
        offset
    }

    pub fn emit_byte(&mut self, byte: u8) {
        self.code.push(byte);
    }

    pub fn emit_number(&mut self, value: f64) -> usize {
        let offset = self.emit(Op::PushNum);
        self.code.extend_from_slice(&value.to_ne_bytes());
        offset
    }

    pub fn emit_bool(&mut self, value: bool) -> usize {
        let offset = self.emit(Op::PushBool);
        self.code.push(u8::from(value));
        offset
    }

    /// Emit an opcode followed by a length-prefixed string operand
    /// (`PUSH_STR`, `PUSH_VAR`, `STORE_VAR`, `SET_PROP`, `GET_PROP`).
    pub fn emit_with_str(&mut self, op: Op, text: &str) -> Result<usize, OperandTooLong> {
        let bytes = text.as_bytes();
        let len = u8::try_from(bytes.len()).map_err(|_| OperandTooLong(bytes.len()))?;
        let offset = self.emit(op);
        self.code.push(len);
        self.code.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Emit `CALL` with an absolute target offset.
    pub fn emit_call(&mut self, target: u32) -> usize {
        let offset = self.emit(Op::Call);
        self.code.extend_from_slice(&target.to_ne_bytes());
        offset
    }

    /// Rewrite the target of the `CALL` emitted at `offset`.
    pub fn patch_call(&mut self, offset: usize, target: u32) {
        assert_eq!(
            self.code.get(offset).copied(),
            Some(Op::Call.byte()),
            "Tried to patch non-call instruction at offset {}",
            offset
        );
        self.code[offset + 1..offset + 5].copy_from_slice(&target.to_ne_bytes());
    }

    /// Current length, which is also the offset of the next instruction.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_operand_layout() {
        let mut chunk = Chunk::new();
        chunk.emit_with_str(Op::PushStr, "Alice").unwrap();
        assert_eq!(chunk.code(), &[1, 5, b'A', b'l', b'i', b'c', b'e']);
    }

    #[test]
    fn test_number_operand_is_native_endian() {
        let mut chunk = Chunk::new();
        chunk.emit_number(2.5);
        assert_eq!(chunk.len(), 9);
        assert_eq!(&chunk.code()[1..], &2.5f64.to_ne_bytes());
    }

    #[test]
    fn test_operand_limit() {
        let mut chunk = Chunk::new();
        assert!(chunk.emit_with_str(Op::PushStr, &"a".repeat(255)).is_ok());
        assert_eq!(
            chunk.emit_with_str(Op::PushStr, &"a".repeat(256)),
            Err(OperandTooLong(256))
        );
        // The rejected operand leaves nothing behind.
        assert_eq!(chunk.len(), 257);
    }

    #[test]
    fn test_patch_call() {
        let mut chunk = Chunk::new();
        let call = chunk.emit_call(0);
        chunk.emit(Op::Exit);
        let target = chunk.len() as u32;
        chunk.patch_call(call, target);
        assert_eq!(&chunk.code()[1..5], &6u32.to_ne_bytes());
    }
}
