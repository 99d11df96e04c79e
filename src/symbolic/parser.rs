//! Line oriented parser for Hack assembly.
//!
//! Every line is stripped of its `//` comment and of all whitespace before it is parsed,
//! so `D = D + A` reads the same as `D=D+A`.

use std::fmt;
use std::result::Result as StdResult;

use nom::{
    IResult,
    bytes::complete::{tag, take_while1},
    branch::alt,
    character::complete::digit1,
    combinator::{all_consuming, map, opt, verify},
    sequence::{delimited, preceded, terminated, tuple},
};

use crate::error::VerboseParseError;
use crate::instruction::MAX_ADDRESS;

use super::program::{InstructionEntry, Program, SymbolicInstruction, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LiteralOutOfRange(String),
    /// A computation with neither a destination nor a jump.
    BareComputation(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LiteralOutOfRange(literal) =>
                write!(f, "literal {} is out of range 0..={}", literal, MAX_ADDRESS),
            ErrorKind::BareComputation(comp) =>
                write!(f, "computation '{}' needs a destination or a jump", comp),
        }
    }
}

pub type ParseError = crate::error::ParseError<ErrorKind>;
type Result<'a, T> = IResult<&'a str, T, ParseError>;

/// Characters allowed in symbols besides letters and digits.
const SYMBOL_PUNCTUATION: &str = "_.$:";

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_PUNCTUATION.contains(c)
}

fn symbol(input: &str) -> Result<&str> {
    verify(
        take_while1(is_symbol_char),
        |s: &str| !s.starts_with(|c: char| c.is_ascii_digit()),
    )(input)
}

fn literal(input: &str) -> Result<u16> {
    let (rest, digits) = digit1(input)?;

    match digits.parse::<u16>() {
        Ok(value) if value <= MAX_ADDRESS => Ok((rest, value)),
        _ => Err(nom::Err::Failure(ParseError::from_kind(
            input,
            ErrorKind::LiteralOutOfRange(digits.to_string()),
        ))),
    }
}

fn label(input: &str) -> Result<SymbolicInstruction> {
    map(
        delimited(tag("("), symbol, tag(")")),
        |name| SymbolicInstruction::Label(name.to_string()),
    )(input)
}

fn address(input: &str) -> Result<SymbolicInstruction> {
    map(
        preceded(
            tag("@"),
            alt((
                map(literal, Value::Literal),
                map(symbol, |s| Value::Symbol(s.to_string())),
            )),
        ),
        SymbolicInstruction::Address,
    )(input)
}

/// Characters that may appear in a computation.
const COMP_OPERATORS: &str = "+-!&|";

fn is_comp_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || COMP_OPERATORS.contains(c)
}

fn letters(input: &str) -> Result<&str> {
    take_while1(|c: char| c.is_ascii_alphabetic())(input)
}

fn compute(input: &str) -> Result<SymbolicInstruction> {
    let (rest, (dest, comp, jump)) = tuple((
        opt(terminated(letters, tag("="))),
        take_while1(is_comp_char),
        opt(preceded(tag(";"), letters)),
    ))(input)?;

    if dest.is_none() && jump.is_none() {
        return Err(nom::Err::Failure(ParseError::from_kind(
            input,
            ErrorKind::BareComputation(comp.to_string()),
        )));
    }

    let instruction = SymbolicInstruction::Compute {
        dest: dest.unwrap_or("").to_string(),
        comp: comp.to_string(),
        jump: jump.unwrap_or("").to_string(),
    };

    Ok((rest, instruction))
}

fn instruction(input: &str) -> Result<Option<SymbolicInstruction>> {
    all_consuming(opt(alt((label, address, compute))))(input)
}

/// Removes the comment and all whitespace from a line.
pub fn clean_line(line: &str) -> String {
    let code = match line.find("//") {
        Some(index) => &line[..index],
        None => line,
    };

    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Parses a single line. Blank lines and comment lines produce `None`.
pub fn parse_line(line: &str) -> StdResult<Option<SymbolicInstruction>, ParseError> {
    let cleaned = clean_line(line);

    instruction(&cleaned)
        .map(|(_, instruction)| instruction)
        .map_err(ParseError::from_nom)
}

/// Parses an assembly text, remembering the line of every instruction.
pub fn parse(source: &str) -> StdResult<Program, VerboseParseError<ErrorKind>> {
    let mut program = Program::default();

    for (index, text) in source.lines().enumerate() {
        let instruction = parse_line(text)
            .map_err(|err| err.verbose(index + 1, &clean_line(text)))?;

        if let Some(instruction) = instruction {
            program.instructions.push(InstructionEntry {
                line: index + 1,
                instruction,
            });
        }
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Option<SymbolicInstruction> {
        parse_line(text).expect("could not parse line")
    }

    fn compute(dest: &str, comp: &str, jump: &str) -> Option<SymbolicInstruction> {
        Some(SymbolicInstruction::Compute {
            dest: dest.into(),
            comp: comp.into(),
            jump: jump.into(),
        })
    }

    #[test]
    fn test_address() {
        assert_eq!(line("@21"), Some(SymbolicInstruction::Address(Value::Literal(21))));
        assert_eq!(line("  @LOOP // top"), Some(SymbolicInstruction::Address(Value::Symbol("LOOP".into()))));
        assert_eq!(line("@Main.main$ret.0"), Some(SymbolicInstruction::Address(Value::Symbol("Main.main$ret.0".into()))));
    }

    #[test]
    fn test_compute() {
        assert_eq!(line("D=D+A"), compute("D", "D+A", ""));
        assert_eq!(line("0;JMP"), compute("", "0", "JMP"));
        assert_eq!(line("AM = M - 1 ; JNE"), compute("AM", "M-1", "JNE"));
    }

    #[test]
    fn test_computation_needs_dest_or_jump() {
        let err = parse_line("D").unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::BareComputation("D".into())));

        let err = parse("@1\nM+1 // no effect\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind(), Some(&ErrorKind::BareComputation("M+1".into())));
    }

    #[test]
    fn test_label() {
        assert_eq!(line("(END)"), Some(SymbolicInstruction::Label("END".into())));
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(line(""), None);
        assert_eq!(line("   // nothing here"), None);
    }

    #[test]
    fn test_literal_out_of_range() {
        let err = parse_line("@32768").unwrap_err();
        assert_eq!(err.kind(), Some(&ErrorKind::LiteralOutOfRange("32768".into())));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_line("(END").is_err());
        assert!(parse_line("@").is_err());
        assert!(parse_line("@1x").is_err());
    }

    #[test]
    fn test_program_keeps_line_numbers() {
        let program = parse("// sum\n@2\n\n(X)\nD=A\n").unwrap();
        let lines = program.instructions.iter().map(|e| e.line).collect::<Vec<_>>();

        assert_eq!(lines, vec![2, 4, 5]);
        assert_eq!(program.real_instruction_count(), 2);
        assert_eq!(program.to_string(), "@2\n(X)\nD=A\n");
    }

    #[test]
    fn test_program_error_line() {
        let err = parse("@1\n@99999\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
