//! Bytecode format shared by the compiler and the virtual machine.
//!
//! - `opcode`: the one-byte instruction tags
//! - `chunk`: the growable buffer the compiler emits into
//! - `instruction`: decoding of one instruction with its inline operands
//! - `disassembler`: debug listing of a whole buffer
//!
//! A program is a flat byte array with no header. Multi-byte operands are
//! stored in native byte order.

pub mod chunk;
pub mod disassembler;
pub mod instruction;
pub mod opcode;

pub use chunk::{Chunk, OperandTooLong, MAX_OPERAND_LEN, MAX_PROGRAM_LEN};
pub use disassembler::disassemble;
pub use instruction::{decode, Instruction};
pub use opcode::Op;
