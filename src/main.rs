//! stackvm CLI: compile scripts to bytecode, run or inspect them.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use stackvm::driver::{self, Options, Outcome};
use stackvm::VmConfig;

#[derive(Parser)]
#[command(
    name = "stackvm",
    version,
    about = "Compile scripts to stack machine bytecode and run them"
)]
struct Cli {
    /// Source file (a bytecode file with --exec)
    input: PathBuf,

    /// Output file [default: INPUT with a .bin extension]
    output: Option<PathBuf>,

    /// Output file, same as the positional OUTPUT
    #[arg(short = 'o', value_name = "FILE", conflicts_with = "output")]
    out: Option<PathBuf>,

    /// Write bytecode to stdout instead of a file; ignored with -e, -d or -x
    #[arg(short = 'c')]
    stdout: bool,

    /// Execute after compiling; no file is written
    #[arg(short = 'e')]
    execute: bool,

    /// Print the disassembly; no file is written
    #[arg(short, long)]
    disassemble: bool,

    /// Treat INPUT as a bytecode file and execute it
    #[arg(short = 'x', long)]
    exec: bool,

    /// Operand stack depth
    #[arg(long, default_value_t = VmConfig::DEFAULT_STACK_SIZE)]
    stack_size: usize,

    /// Maximum nested CALL depth
    #[arg(long, default_value_t = VmConfig::DEFAULT_CALL_DEPTH)]
    call_depth: usize,

    /// Maximum variables per scope
    #[arg(long, default_value_t = VmConfig::DEFAULT_MAX_BINDINGS)]
    max_bindings: usize,

    /// Maximum properties per object
    #[arg(long, default_value_t = VmConfig::DEFAULT_MAX_PROPERTIES)]
    max_properties: usize,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            input: self.input.clone(),
            output: self.out.clone().or_else(|| self.output.clone()),
            stdout: self.stdout,
            execute: self.execute,
            disassemble: self.disassemble,
            bytecode_input: self.exec,
            config: VmConfig {
                stack_size: self.stack_size,
                call_depth: self.call_depth,
                max_bindings: self.max_bindings,
                max_properties: self.max_properties,
                // Printed lines reach stdout as they happen, so output before
                // a fault is still shown.
                echo: true,
            },
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.options();

    match driver::run(&options, &mut io::stdout()) {
        Ok(Outcome::Written(output)) => println!(
            "compiled {} -> {}",
            options.input.display(),
            output.display().to_string().green()
        ),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e.to_string().red());
            process::exit(1);
        }
    }
}
