//! A toolchain for the Jack language and the 16-bit Hack computer.
//!
//! This crate provides the functionality to:
//! - Compile Jack classes into stack-machine commands ([jack]).
//! - Read and write the textual stack-machine format ([vm]).
//! - Translate stack-machine commands into Hack assembly ([translator]).
//! - Assemble Hack assembly into binary words ([assembler], [symbolic]).
//! - Read and write `.hack` files ([bytecode]).
//! - Execute binary programs ([emulator]).
//!
//! Every stage can be given a [slog::Logger] through its `*_with_logger` entry point.
//! Without one, nothing is logged.
//!
//! # Example
//! ```
//! use hack::emulator::Ticks;
//!
//! fn main() {
//!     // Stores 42 into a static variable and spins.
//!     let source = r#"
//!         class Sys {
//!             static int answer;
//!
//!             function void init() {
//!                 let answer = 40 + 2;
//!                 while (true) {}
//!                 return;
//!             }
//!         }
//!     "#;
//!
//!     // Compile, translate with bootstrap code and assemble.
//!     let assembly = hack::build(vec![source], None)
//!         .expect("could not build the program");
//!
//!     // Execute the binary for a while. The only static variable lands at address 16.
//!     let memory = hack::execute(&assembly.program, Ticks::Limited(1000), None)
//!         .expect("an error occured while emulating the program");
//!
//!     assert_eq!(memory.get(16), 42);
//! }
//! ```
//!
//! # Executables
//!
//! ## `hackc`
//!
//! Compiles a `.jack` file, or a directory of them, down to `.vm`, `.asm` and `.hack` files.
//!
//! ## `hackrun`
//!
//! Runs a `.hack` or `.asm` program for a number of ticks and prints the memory cells it
//! touched.
pub mod parsing;
pub mod error;
pub mod suggest;
pub mod jack;
pub mod vm;
pub mod translator;
pub mod symbol_table;
pub mod source_map;
pub mod instruction;
pub mod symbolic;
pub mod assembler;
pub mod bytecode;
pub mod emulator;
pub mod event;

use std::fmt;
use std::iter::FromIterator;

use slog::{o, debug, Discard, Logger};

use crate::assembler::{AssembleError, Assembly};
use crate::emulator::{EmulationError, Emulator, SparseMemory, Ticks};
use crate::error::VerboseParseError;
use crate::jack::CompileError;
use crate::translator::{TranslateError, TranslateOptions, STACK_BASE};

/// Any error the toolchain can produce, tagged by stage.
#[derive(Debug, Clone)]
pub enum Error {
    Compile(CompileError),
    Vm(VerboseParseError<vm::ErrorKind>),
    Translate(TranslateError),
    Assemble(AssembleError),
    Binary(VerboseParseError<bytecode::ErrorKind>),
    Emulation(EmulationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "{}", err),
            Error::Vm(err) => write!(f, "stack-machine syntax error {}", err),
            Error::Translate(err) => write!(f, "translation error {}", err),
            Error::Assemble(err) => write!(f, "assembly error {}", err),
            Error::Binary(err) => write!(f, "binary syntax error {}", err),
            Error::Emulation(err) => write!(f, "emulation error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Error {
        Error::Compile(err)
    }
}

impl From<VerboseParseError<vm::ErrorKind>> for Error {
    fn from(err: VerboseParseError<vm::ErrorKind>) -> Error {
        Error::Vm(err)
    }
}

impl From<TranslateError> for Error {
    fn from(err: TranslateError) -> Error {
        Error::Translate(err)
    }
}

impl From<AssembleError> for Error {
    fn from(err: AssembleError) -> Error {
        Error::Assemble(err)
    }
}

impl From<VerboseParseError<bytecode::ErrorKind>> for Error {
    fn from(err: VerboseParseError<bytecode::ErrorKind>) -> Error {
        Error::Binary(err)
    }
}

impl From<EmulationError> for Error {
    fn from(err: EmulationError) -> Error {
        Error::Emulation(err)
    }
}

fn root_logger<L: Into<Option<Logger>>>(logger: L) -> Logger {
    logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
}

/// Compiles every class and concatenates the results into one program, each class
/// forming its own unit.
pub fn compile_program<'a, I, L>(sources: I, logger: L) -> Result<vm::Program, Error>
where
    I: IntoIterator<Item = &'a str>,
    L: Into<Option<Logger>>,
{
    let logger = root_logger(logger);
    let mut program = vm::Program::default();

    for source in sources {
        let class = jack::parse(source)?;
        let commands = jack::codegen::generate_with_logger(&class, logger.clone())
            .map_err(CompileError::from)?;

        debug!(logger, "compiled class"; "class" => &class.name, "commands" => commands.len());
        program.push_unit(&class.name, commands);
    }

    Ok(program)
}

/// Runs the whole pipeline from Jack sources to a binary program with bootstrap code.
pub fn build<'a, I, L>(sources: I, logger: L) -> Result<Assembly, Error>
where
    I: IntoIterator<Item = &'a str>,
    L: Into<Option<Logger>>,
{
    let logger = root_logger(logger);

    let program = compile_program(sources, logger.clone())?;
    let lines = translator::translate_with_logger(&program, &TranslateOptions::program(), logger.clone())?;
    let assembly = assembler::assemble_with_logger(&lines.join("\n"), logger)?;

    Ok(assembly)
}

/// Executes a binary program with the stack pointer set to its base and returns the
/// final memory.
pub fn execute<L>(program: &bytecode::Program, ticks: Ticks, logger: L) -> Result<SparseMemory, Error>
where
    L: Into<Option<Logger>>,
{
    let memory = SparseMemory::from_iter(vec![(0, STACK_BASE)]);
    let mut emulator = Emulator::with_logger(program, memory, logger);

    emulator.run(ticks)?;

    Ok(emulator.memory)
}
