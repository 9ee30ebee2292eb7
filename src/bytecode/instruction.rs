//! Decoding of a single instruction and its inline operands.

use super::opcode::Op;
use crate::error::RuntimeError;

/// A decoded instruction borrowing its operands from the bytecode buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction<'a> {
    PushNum(f64),
    /// Raw string bytes; the VM converts them lossily to text.
    PushStr(&'a [u8]),
    PushBool(bool),
    PushUndefined,
    PushNull,
    PushVar(&'a str),
    StoreVar(&'a str),
    Add,
    Call(u32),
    Ret,
    Print,
    Exit,
    NewObject,
    SetProp(&'a str),
    GetProp(&'a str),
    PushEnv,
    PopEnv,
    Pop,
}

impl Instruction<'_> {
    pub fn op(&self) -> Op {
        match self {
            Instruction::PushNum(_) => Op::PushNum,
            Instruction::PushStr(_) => Op::PushStr,
            Instruction::PushBool(_) => Op::PushBool,
            Instruction::PushUndefined => Op::PushUndefined,
            Instruction::PushNull => Op::PushNull,
            Instruction::PushVar(_) => Op::PushVar,
            Instruction::StoreVar(_) => Op::StoreVar,
            Instruction::Add => Op::Add,
            Instruction::Call(_) => Op::Call,
            Instruction::Ret => Op::Ret,
            Instruction::Print => Op::Print,
            Instruction::Exit => Op::Exit,
            Instruction::NewObject => Op::NewObject,
            Instruction::SetProp(_) => Op::SetProp,
            Instruction::GetProp(_) => Op::GetProp,
            Instruction::PushEnv => Op::PushEnv,
            Instruction::PopEnv => Op::PopEnv,
            Instruction::Pop => Op::Pop,
        }
    }
}

/// Decode the instruction at `offset`, returning it together with the
/// offset of the instruction that follows.
pub fn decode(code: &[u8], offset: usize) -> Result<(Instruction<'_>, usize), RuntimeError> {
    let byte = code
        .get(offset)
        .copied()
        .ok_or(RuntimeError::TruncatedOperand { op: "opcode", offset })?;
    let op = Op::from_byte(byte).ok_or(RuntimeError::UnknownOpcode {
        opcode: byte,
        offset,
    })?;

    let mut reader = OperandReader {
        code,
        pos: offset + 1,
        op,
        offset,
    };

    let instruction = match op {
        Op::PushNum => Instruction::PushNum(f64::from_ne_bytes(reader.fixed()?)),
        Op::PushStr => Instruction::PushStr(reader.bytes()?),
        Op::PushBool => Instruction::PushBool(reader.fixed::<1>()?[0] != 0),
        Op::PushUndefined => Instruction::PushUndefined,
        Op::PushNull => Instruction::PushNull,
        Op::PushVar => Instruction::PushVar(reader.name()?),
        Op::StoreVar => Instruction::StoreVar(reader.name()?),
        Op::Add => Instruction::Add,
        Op::Call => Instruction::Call(u32::from_ne_bytes(reader.fixed()?)),
        Op::Ret => Instruction::Ret,
        Op::Print => Instruction::Print,
        Op::Exit => Instruction::Exit,
        Op::NewObject => Instruction::NewObject,
        Op::SetProp => Instruction::SetProp(reader.name()?),
        Op::GetProp => Instruction::GetProp(reader.name()?),
        Op::PushEnv => Instruction::PushEnv,
        Op::PopEnv => Instruction::PopEnv,
        Op::Pop => Instruction::Pop,
    };

    Ok((instruction, reader.pos))
}

struct OperandReader<'a> {
    code: &'a [u8],
    pos: usize,
    op: Op,
    offset: usize,
}

impl<'a> OperandReader<'a> {
    fn truncated(&self) -> RuntimeError {
        RuntimeError::TruncatedOperand {
            op: self.op.name(),
            offset: self.offset,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], RuntimeError> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated())?;
        let slice = self.code.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(slice)
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], RuntimeError> {
        let slice = self.take(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    /// A u8 length prefix followed by that many bytes.
    fn bytes(&mut self) -> Result<&'a [u8], RuntimeError> {
        let [len] = self.fixed::<1>()?;
        self.take(len as usize)
    }

    fn name(&mut self) -> Result<&'a str, RuntimeError> {
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|_| RuntimeError::InvalidName {
            offset: self.offset,
        })
    }
}
