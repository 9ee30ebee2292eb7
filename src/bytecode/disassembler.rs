//! Bytecode disassembler for debug output.

use super::instruction::{decode, Instruction};
use crate::error::RuntimeError;

/// Disassemble a whole program, one instruction per line.
///
/// Stops at the first byte sequence that does not decode.
pub fn disassemble(code: &[u8]) -> Result<String, RuntimeError> {
    let mut out = String::new();
    let mut offset = 0;
    while offset < code.len() {
        let (instruction, next) = decode(code, offset)?;
        out.push_str(&format!("{:04} ", offset));
        disassemble_instruction(&instruction, &mut out);
        out.push('\n');
        offset = next;
    }
    Ok(out)
}

fn disassemble_instruction(instruction: &Instruction<'_>, out: &mut String) {
    let name = instruction.op().name();
    match instruction {
        Instruction::PushNum(n) => out.push_str(&format!("{:<14} {}", name, n)),
        Instruction::PushStr(bytes) => {
            out.push_str(&format!("{:<14} {:?}", name, String::from_utf8_lossy(bytes)))
        }
        Instruction::PushBool(b) => out.push_str(&format!("{:<14} {}", name, b)),
        Instruction::PushVar(n)
        | Instruction::StoreVar(n)
        | Instruction::SetProp(n)
        | Instruction::GetProp(n) => out.push_str(&format!("{:<14} {}", name, n)),
        Instruction::Call(target) => out.push_str(&format!("{:<14} -> {:04}", name, target)),
        _ => out.push_str(name),
    }
}
