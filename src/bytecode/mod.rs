//! Parsing and storing binary Hack programs.

mod parser;
mod program;

pub use self::parser::{ErrorKind, ParseError};
pub use self::program::Program;
