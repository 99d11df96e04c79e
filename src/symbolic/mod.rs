//! Parsing and storing symbolic Hack assembly programs.

pub mod parser;
pub mod program;

pub use self::parser::{parse, parse_line, ErrorKind, ParseError};
pub use self::program::{InstructionEntry, Program, SymbolicInstruction, Value};
