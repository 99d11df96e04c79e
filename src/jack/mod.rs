//! Compiler from Jack source code to stack-machine commands.
//!
//! Compilation goes through [tokenize](token::tokenize), the [parser](parser::JackParser)
//! and [code generation](codegen::generate). Each class compiles independently of the
//! others.

use std::fmt;

use slog::{o, trace, Discard, Logger};

use crate::parsing::LineLocation;
use crate::vm::Command;

pub mod ast;
pub mod codegen;
pub mod parser;
pub mod symbol_table;
pub mod token;
pub mod xml;

pub use codegen::{GenerateError, GenerateErrorKind};
pub use parser::ParseError;
pub use token::{tokenize, LexError, LexErrorKind, Token};

#[derive(Debug, Clone)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Generate(GenerateError),
}

impl CompileError {
    /// Line and column of the error in `source`, when the error points at a token.
    pub fn location(&self, source: &str) -> Option<LineLocation> {
        match self {
            CompileError::Lex(err) => Some(err.location(source)),
            CompileError::Parse(err) => err.location(source),
            CompileError::Generate(_) => None,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> CompileError {
        CompileError::Lex(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> CompileError {
        CompileError::Parse(err)
    }
}

impl From<GenerateError> for CompileError {
    fn from(err: GenerateError) -> CompileError {
        CompileError::Generate(err)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Lex(err) => write!(f, "lexical error: {}", err),
            CompileError::Parse(err) => write!(f, "syntax error: {}", err),
            CompileError::Generate(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CompileError {}

/// Tokenizes and parses a single class.
pub fn parse(source: &str) -> Result<ast::Class, CompileError> {
    let tokens = tokenize(source)?;
    let class = parser::JackParser::new(tokens).parse()?;
    Ok(class)
}

/// Compiles the class in `source` into stack-machine commands.
pub fn compile(source: &str) -> Result<Vec<Command>, CompileError> {
    compile_with_logger(source, None)
}

pub fn compile_with_logger<L>(source: &str, logger: L) -> Result<Vec<Command>, CompileError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()));

    let tokens = tokenize(source)?;
    trace!(logger, "tokenized source"; "stage" => "lexer", "tokens" => tokens.len());

    let class = parser::JackParser::new(tokens).parse()?;
    trace!(logger, "parsed class"; "stage" => "parser", "class" => &class.name);

    let commands = codegen::generate_with_logger(&class, logger)?;

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_located() {
        let source = "class A {\n  function void f() {\n    let x = ;\n  }\n}";

        let err = compile(source).unwrap_err();
        match err {
            CompileError::Parse(_) => (),
            ref other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(err.location(source), Some(LineLocation { line: 3, column: 13 }));
    }

    #[test]
    fn test_lex_error_is_reported() {
        let err = compile("class A { function void f() { let s = \"x; } }").unwrap_err();
        assert!(err.to_string().starts_with("lexical error"));
    }

    #[test]
    fn test_generate_error_names_the_subroutine() {
        let err = compile("class A { function void f() { let y = 1; return; } }").unwrap_err();
        assert_eq!(err.to_string(), "in A.f: undefined variable 'y'");
    }
}
