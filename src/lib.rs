//! stackvm: a small dynamically-typed scripting language compiled to
//! bytecode and run on a stack machine.
//!
//! This is the library root that exports all modules.
//!
//! # Pipeline
//!
//! - **Lexer**: source text to tokens, produced on demand
//! - **Compiler**: single pass from tokens to bytecode, no syntax tree
//! - **VM**: fetch-decode-execute over the byte buffer

#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::new_without_default)]

pub mod bytecode;
pub mod compiler;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod span;
pub mod vm;

use tracing::debug;

pub use error::StackVmError;
pub use vm::{Execution, Value, Vm, VmConfig};

/// Compile source code to bytecode. All or nothing: any error means no
/// bytecode.
pub fn compile(source: &str) -> Result<Vec<u8>, StackVmError> {
    debug!(bytes = source.len(), "compiling");
    let chunk = compiler::Compiler::new(source).compile()?;
    Ok(chunk.into_bytes())
}

/// Execute bytecode on a fresh VM with default capacities.
pub fn execute(bytecode: &[u8]) -> Result<Execution, StackVmError> {
    execute_with_config(bytecode, VmConfig::default())
}

/// Execute bytecode on a fresh VM with the given capacities.
pub fn execute_with_config(bytecode: &[u8], config: VmConfig) -> Result<Execution, StackVmError> {
    let mut vm = Vm::with_config(config);
    Ok(vm.execute(bytecode)?)
}

/// Compile and execute a program.
pub fn run(source: &str) -> Result<Execution, StackVmError> {
    run_with_config(source, VmConfig::default())
}

/// Compile and execute a program with the given VM capacities.
pub fn run_with_config(source: &str, config: VmConfig) -> Result<Execution, StackVmError> {
    let bytecode = compile(source)?;
    execute_with_config(&bytecode, config)
}

/// Render bytecode as a listing, one instruction per line.
pub fn disassemble(bytecode: &[u8]) -> Result<String, StackVmError> {
    Ok(bytecode::disassemble(bytecode)?)
}
