//! The bytecode virtual machine: stack-based execution engine.

use tracing::{debug, trace};

use crate::bytecode::{decode, Instruction};
use crate::error::RuntimeError;

use super::config::VmConfig;
use super::env::Environments;
use super::heap::Heap;
use super::value::Value;

/// Result of running a program to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Printed lines, in order.
    pub output: Vec<String>,
    /// The value on top of the operand stack at halt, `Undefined` if empty.
    pub value: Value,
}

/// The bytecode VM.
pub struct Vm {
    config: VmConfig,
    heap: Heap,
    /// Operand stack.
    stack: Vec<Value>,
    /// Return addresses pushed by `CALL`.
    call_stack: Vec<usize>,
    envs: Environments,
    /// Output buffer for print statements.
    output: Vec<String>,
    ip: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            heap: Heap::new(),
            stack: Vec::with_capacity(config.stack_size),
            call_stack: Vec::with_capacity(config.call_depth),
            envs: Environments::new(config.max_bindings),
            output: Vec::new(),
            ip: 0,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Lines printed so far. After a failed run this holds everything
    /// printed before the fault.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Heap strings and objects still alive, including the returned value
    /// of the last run while the caller holds it.
    pub fn live_objects(&self) -> usize {
        self.heap.live()
    }

    /// Run a program from offset 0 until `EXIT`, the end of the buffer, or
    /// a fatal error.
    ///
    /// Stacks and environments are torn down afterwards either way, so every
    /// value not reachable from the result is released.
    pub fn execute(&mut self, code: &[u8]) -> Result<Execution, RuntimeError> {
        debug!(bytes = code.len(), "vm start");
        self.ip = 0;
        self.output.clear();

        let result = self.run(code);
        let value = result.map(|()| self.stack.pop().unwrap_or(Value::Undefined));
        self.teardown();

        match value {
            Ok(value) => {
                debug!(ip = self.ip, lines = self.output.len(), "vm halt");
                Ok(Execution {
                    output: std::mem::take(&mut self.output),
                    value,
                })
            }
            Err(e) => {
                debug!(error = %e, "vm fault");
                Err(e)
            }
        }
    }

    /// Run the dispatch loop.
    fn run(&mut self, code: &[u8]) -> Result<(), RuntimeError> {
        while self.ip < code.len() {
            let offset = self.ip;
            let (instruction, next) = decode(code, offset)?;
            trace!(offset, op = %instruction.op(), depth = self.stack.len(), "dispatch");
            self.ip = next;

            match instruction {
                Instruction::PushNum(n) => self.push(Value::Number(n), offset)?,
                Instruction::PushStr(bytes) => {
                    let value = self.heap.string(String::from_utf8_lossy(bytes));
                    self.push(value, offset)?;
                }
                Instruction::PushBool(b) => self.push(Value::Boolean(b), offset)?,
                Instruction::PushUndefined => self.push(Value::Undefined, offset)?,
                Instruction::PushNull => self.push(Value::Null, offset)?,

                Instruction::PushVar(name) => {
                    let value = self
                        .envs
                        .get(name)
                        .cloned()
                        .ok_or_else(|| RuntimeError::undefined_variable(name, offset))?;
                    self.push(value, offset)?;
                }
                Instruction::StoreVar(name) => {
                    let value = self.pop(offset)?;
                    if !self.envs.define(name, value) {
                        return Err(RuntimeError::TooManyBindings {
                            limit: self.config.max_bindings,
                            offset,
                        });
                    }
                }

                Instruction::Add => {
                    let b = self.pop(offset)?;
                    let a = self.pop(offset)?;
                    let sum = self.add(a, b, offset)?;
                    self.push(sum, offset)?;
                }

                Instruction::Call(target) => {
                    let target = target as usize;
                    if target >= code.len() {
                        return Err(RuntimeError::JumpOutOfRange {
                            target,
                            len: code.len(),
                            offset,
                        });
                    }
                    if self.call_stack.len() >= self.config.call_depth {
                        return Err(RuntimeError::CallStackOverflow {
                            depth: self.config.call_depth,
                            offset,
                        });
                    }
                    self.call_stack.push(next);
                    self.ip = target;
                }
                Instruction::Ret => {
                    self.ip = self
                        .call_stack
                        .pop()
                        .ok_or(RuntimeError::CallStackUnderflow { offset })?;
                }

                Instruction::Print => {
                    let value = self.pop(offset)?;
                    let line = value.to_string();
                    if self.config.echo {
                        println!("{}", line);
                    }
                    self.output.push(line);
                }
                Instruction::Exit => return Ok(()),

                Instruction::NewObject => {
                    let obj = self.heap.object();
                    self.push(obj, offset)?;
                }
                Instruction::SetProp(name) => {
                    let value = self.pop(offset)?;
                    let target = self.pop(offset)?;
                    let Value::Object(obj) = &target else {
                        return Err(RuntimeError::not_an_object(target.type_name(), name, offset));
                    };
                    if !obj.borrow_mut().set(name, value, self.config.max_properties) {
                        return Err(RuntimeError::TooManyProperties {
                            limit: self.config.max_properties,
                            offset,
                        });
                    }
                    self.push(target, offset)?;
                }
                Instruction::GetProp(name) => {
                    let target = self.pop(offset)?;
                    let Value::Object(obj) = &target else {
                        return Err(RuntimeError::not_an_object(target.type_name(), name, offset));
                    };
                    let value = obj.borrow().get(name).cloned().unwrap_or(Value::Undefined);
                    drop(target);
                    self.push(value, offset)?;
                }

                Instruction::PushEnv => {
                    let id = self.envs.push();
                    debug!(env = id, "enter scope");
                }
                Instruction::PopEnv => {
                    let id = self
                        .envs
                        .pop()
                        .ok_or(RuntimeError::ScopeUnderflow { offset })?;
                    debug!(env = id, "leave scope");
                }

                Instruction::Pop => {
                    self.pop(offset)?;
                }
            }
        }
        Ok(())
    }

    fn add(&self, a: Value, b: Value, offset: usize) -> Result<Value, RuntimeError> {
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                let mut text = a.concat_form();
                text.push_str(&b.concat_form());
                Ok(self.heap.string(text))
            }
            _ => Err(RuntimeError::UnsupportedOperands {
                left: a.type_name(),
                right: b.type_name(),
                offset,
            }),
        }
    }

    #[inline]
    fn push(&mut self, value: Value, offset: usize) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.stack_size {
            return Err(RuntimeError::StackOverflow {
                capacity: self.config.stack_size,
                offset,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    #[inline]
    fn pop(&mut self, offset: usize) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { offset })
    }

    /// Release every value held by the stacks and environments.
    fn teardown(&mut self) {
        self.stack.clear();
        self.call_stack.clear();
        self.envs = Environments::new(self.config.max_bindings);
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Chunk, Op};

    fn run(chunk: Chunk) -> Result<Execution, RuntimeError> {
        Vm::new().execute(chunk.code())
    }

    /// The greeting program: stores a name, calls a routine at offset 20
    /// that builds the greeting, prints it.
    fn greeting() -> Chunk {
        let mut chunk = Chunk::new();
        chunk.emit_with_str(Op::PushStr, "Alice").unwrap();
        chunk.emit_with_str(Op::StoreVar, "name").unwrap();
        chunk.emit_call(20);
        chunk.emit(Op::Print);
        chunk.emit(Op::Exit);
        assert_eq!(chunk.len(), 20);
        chunk.emit_with_str(Op::PushStr, "Hello ").unwrap();
        chunk.emit_with_str(Op::PushVar, "name").unwrap();
        chunk.emit(Op::Add);
        chunk.emit(Op::Ret);
        chunk
    }

    #[test]
    fn test_call_and_return() {
        let result = run(greeting()).unwrap();
        assert_eq!(result.output, vec!["Hello Alice"]);
        assert_eq!(result.value, Value::Undefined);
    }

    #[test]
    fn test_result_is_top_of_stack() {
        let mut chunk = Chunk::new();
        chunk.emit_number(1.0);
        chunk.emit_number(2.0);
        chunk.emit(Op::Add);
        let result = run(chunk).unwrap();
        assert_eq!(result.value, Value::Number(3.0));
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_exit_stops_execution() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::Exit);
        chunk.emit_with_str(Op::PushStr, "unreached").unwrap();
        chunk.emit(Op::Print);
        assert!(run(chunk).unwrap().output.is_empty());
    }

    #[test]
    fn test_empty_program() {
        let result = Vm::new().execute(&[]).unwrap();
        assert_eq!(result.value, Value::Undefined);
    }

    #[test]
    fn test_stack_overflow() {
        let mut chunk = Chunk::new();
        for _ in 0..3 {
            chunk.emit(Op::PushNull);
        }
        let config = VmConfig {
            stack_size: 2,
            ..VmConfig::default()
        };
        let err = Vm::with_config(config).execute(chunk.code()).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::StackOverflow {
                capacity: 2,
                offset: 2
            }
        );
    }

    #[test]
    fn test_default_stack_holds_64_values() {
        let mut chunk = Chunk::new();
        for _ in 0..64 {
            chunk.emit(Op::PushNull);
        }
        assert!(run(chunk.clone()).is_ok());
        chunk.emit(Op::PushNull);
        assert!(matches!(
            run(chunk),
            Err(RuntimeError::StackOverflow { capacity: 64, .. })
        ));
    }

    #[test]
    fn test_stack_underflow() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::Print);
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::StackUnderflow { offset: 0 }
        );
    }

    #[test]
    fn test_call_stack_overflow() {
        // A routine that calls itself forever.
        let mut chunk = Chunk::new();
        chunk.emit_call(0);
        let err = run(chunk).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::CallStackOverflow {
                depth: 16,
                offset: 0
            }
        );
    }

    #[test]
    fn test_return_without_call() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::Ret);
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::CallStackUnderflow { offset: 0 }
        );
    }

    #[test]
    fn test_call_out_of_range() {
        let mut chunk = Chunk::new();
        chunk.emit_call(100);
        assert!(matches!(
            run(chunk).unwrap_err(),
            RuntimeError::JumpOutOfRange {
                target: 100,
                len: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_opcode_keeps_earlier_output() {
        let mut chunk = Chunk::new();
        chunk.emit_number(7.0);
        chunk.emit(Op::Print);
        chunk.emit_byte(42);
        let mut vm = Vm::new();
        let err = vm.execute(chunk.code()).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UnknownOpcode {
                opcode: 42,
                offset: 10
            }
        );
        assert_eq!(vm.output(), &["7".to_string()]);
    }

    #[test]
    fn test_undefined_variable() {
        let mut chunk = Chunk::new();
        chunk.emit_with_str(Op::PushVar, "missing").unwrap();
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::undefined_variable("missing", 0)
        );
    }

    #[test]
    fn test_property_on_non_object() {
        let mut chunk = Chunk::new();
        chunk.emit_number(1.0);
        chunk.emit_with_str(Op::GetProp, "x").unwrap();
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::not_an_object("number", "x", 9)
        );

        let mut chunk = Chunk::new();
        chunk.emit(Op::PushNull);
        chunk.emit_number(1.0);
        chunk.emit_with_str(Op::SetProp, "x").unwrap();
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::not_an_object("null", "x", 10)
        );
    }

    #[test]
    fn test_set_prop_pushes_object_back() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::NewObject);
        chunk.emit_number(5.0);
        chunk.emit_with_str(Op::SetProp, "a").unwrap();
        chunk.emit_with_str(Op::GetProp, "a").unwrap();
        chunk.emit(Op::Print);
        chunk.emit(Op::NewObject);
        chunk.emit_with_str(Op::GetProp, "unset").unwrap();
        chunk.emit(Op::Print);
        assert_eq!(run(chunk).unwrap().output, vec!["5", "undefined"]);
    }

    #[test]
    fn test_binding_limit() {
        let mut chunk = Chunk::new();
        for name in ["a", "b", "c"] {
            chunk.emit(Op::PushNull);
            chunk.emit_with_str(Op::StoreVar, name).unwrap();
        }
        let config = VmConfig {
            max_bindings: 2,
            ..VmConfig::default()
        };
        let err = Vm::with_config(config).execute(chunk.code()).unwrap_err();
        assert_eq!(err, RuntimeError::TooManyBindings { limit: 2, offset: 9 });
    }

    #[test]
    fn test_property_limit() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::NewObject);
        for name in ["a", "b"] {
            chunk.emit(Op::PushNull);
            chunk.emit_with_str(Op::SetProp, name).unwrap();
        }
        let config = VmConfig {
            max_properties: 1,
            ..VmConfig::default()
        };
        let err = Vm::with_config(config).execute(chunk.code()).unwrap_err();
        assert!(matches!(err, RuntimeError::TooManyProperties { limit: 1, .. }));
    }

    #[test]
    fn test_pop_env_at_global() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::PushEnv);
        chunk.emit(Op::PopEnv);
        chunk.emit(Op::PopEnv);
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::ScopeUnderflow { offset: 2 }
        );
    }

    #[test]
    fn test_store_in_block_shadows() {
        let mut chunk = Chunk::new();
        chunk.emit_number(10.0);
        chunk.emit_with_str(Op::StoreVar, "x").unwrap();
        chunk.emit(Op::PushEnv);
        chunk.emit_number(20.0);
        chunk.emit_with_str(Op::StoreVar, "x").unwrap();
        chunk.emit_with_str(Op::PushVar, "x").unwrap();
        chunk.emit(Op::Print);
        chunk.emit(Op::PopEnv);
        chunk.emit_with_str(Op::PushVar, "x").unwrap();
        chunk.emit(Op::Print);
        assert_eq!(run(chunk).unwrap().output, vec!["20", "10"]);
    }

    #[test]
    fn test_unsupported_operands() {
        let mut chunk = Chunk::new();
        chunk.emit_bool(true);
        chunk.emit_number(1.0);
        chunk.emit(Op::Add);
        assert_eq!(
            run(chunk).unwrap_err(),
            RuntimeError::UnsupportedOperands {
                left: "boolean",
                right: "number",
                offset: 11
            }
        );
    }

    #[test]
    fn test_everything_released_after_run() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::NewObject);
        chunk.emit_with_str(Op::StoreVar, "o").unwrap();
        chunk.emit_with_str(Op::PushVar, "o").unwrap();
        chunk.emit_with_str(Op::PushStr, "v").unwrap();
        chunk.emit_with_str(Op::SetProp, "p").unwrap();
        chunk.emit(Op::PushEnv);
        chunk.emit_with_str(Op::PushStr, "inner").unwrap();
        chunk.emit_with_str(Op::StoreVar, "s").unwrap();
        chunk.emit(Op::Exit);

        let mut vm = Vm::new();
        let result = vm.execute(chunk.code()).unwrap();
        // The returned object and its string property.
        assert_eq!(vm.live_objects(), 2);
        drop(result);
        assert_eq!(vm.live_objects(), 0);
    }

    #[test]
    fn test_released_after_fault() {
        let mut chunk = Chunk::new();
        chunk.emit_with_str(Op::PushStr, "a").unwrap();
        chunk.emit_with_str(Op::StoreVar, "a").unwrap();
        chunk.emit(Op::NewObject);
        chunk.emit_with_str(Op::PushVar, "nope").unwrap();
        let mut vm = Vm::new();
        assert!(vm.execute(chunk.code()).is_err());
        assert_eq!(vm.live_objects(), 0);
    }

    #[test]
    fn test_self_reference_leaks() {
        let mut chunk = Chunk::new();
        chunk.emit(Op::NewObject);
        chunk.emit_with_str(Op::StoreVar, "o").unwrap();
        chunk.emit_with_str(Op::PushVar, "o").unwrap();
        chunk.emit_with_str(Op::PushVar, "o").unwrap();
        chunk.emit_with_str(Op::SetProp, "me").unwrap();
        chunk.emit(Op::Pop);
        let mut vm = Vm::new();
        let result = vm.execute(chunk.code()).unwrap();
        assert_eq!(result.value, Value::Undefined);
        assert_eq!(vm.live_objects(), 1);
    }
}
