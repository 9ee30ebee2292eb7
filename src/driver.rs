//! File handling around compile and execute: reading sources, choosing the
//! output path, writing bytecode, and dispatching the command line modes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StackVmError;
use crate::vm::{Execution, VmConfig};

/// What to do with one input file.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    /// Where to write bytecode; `None` means [`default_output_path`].
    pub output: Option<PathBuf>,
    /// Write bytecode to the sink instead of a file.
    pub stdout: bool,
    /// Execute after compiling. Wins over `stdout`.
    pub execute: bool,
    /// Write the disassembly to the sink.
    pub disassemble: bool,
    /// `input` is already bytecode: execute it.
    pub bytecode_input: bool,
    pub config: VmConfig,
}

impl Options {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            stdout: false,
            execute: false,
            disassemble: false,
            bytecode_input: false,
            config: VmConfig::default(),
        }
    }
}

/// What [`run`] ended up doing.
#[derive(Debug)]
pub enum Outcome {
    /// Bytecode written to this file.
    Written(PathBuf),
    /// Bytecode written to the sink.
    Streamed,
    /// Only the disassembly was produced.
    Disassembled,
    Executed(Execution),
}

/// The input path with its extension replaced by `.bin`, or `.bin`
/// appended when there is none.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("bin")
}

pub fn read_source(path: &Path) -> Result<String, StackVmError> {
    Ok(fs::read_to_string(path)?)
}

pub fn read_bytecode(path: &Path) -> Result<Vec<u8>, StackVmError> {
    Ok(fs::read(path)?)
}

/// Write bytecode verbatim, with no header.
pub fn write_bytecode(bytecode: &[u8], path: &Path) -> Result<(), StackVmError> {
    debug!(path = %path.display(), bytes = bytecode.len(), "writing bytecode");
    fs::write(path, bytecode)?;
    Ok(())
}

/// Compile `input` and write the result to `output`, or to the default
/// output path. Returns the path written. Nothing is written when
/// compilation fails.
pub fn compile_file(input: &Path, output: Option<&Path>) -> Result<PathBuf, StackVmError> {
    let source = read_source(input)?;
    let bytecode = crate::compile(&source)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    write_bytecode(&bytecode, &output)?;
    Ok(output)
}

/// Carry out one command line invocation. Disassembly and streamed
/// bytecode go to `sink`; printed program output goes wherever
/// `options.config.echo` sends it.
///
/// Execution takes precedence over streaming, and any mode that executes
/// or disassembles writes no file.
pub fn run(options: &Options, sink: &mut impl Write) -> Result<Outcome, StackVmError> {
    if options.bytecode_input {
        let bytecode = read_bytecode(&options.input)?;
        if options.disassemble {
            sink.write_all(crate::disassemble(&bytecode)?.as_bytes())?;
            sink.flush()?;
        }
        let execution = crate::execute_with_config(&bytecode, options.config)?;
        return Ok(Outcome::Executed(execution));
    }

    if !options.execute && !options.disassemble && !options.stdout {
        return compile_file(&options.input, options.output.as_deref()).map(Outcome::Written);
    }

    let bytecode = crate::compile(&read_source(&options.input)?)?;

    if options.disassemble {
        sink.write_all(crate::disassemble(&bytecode)?.as_bytes())?;
        sink.flush()?;
    }
    if options.execute {
        let execution = crate::execute_with_config(&bytecode, options.config)?;
        return Ok(Outcome::Executed(execution));
    }
    if options.disassemble {
        return Ok(Outcome::Disassembled);
    }

    sink.write_all(&bytecode)?;
    sink.flush()?;
    Ok(Outcome::Streamed)
}
