//! Line oriented parser for stack-machine text.

use std::fmt;
use std::result::Result as StdResult;

use nom::{
    IResult,
    bytes::complete::{tag, take_while, take_while1},
    branch::alt,
    character::complete::digit1,
    combinator::{all_consuming, map, opt, rest},
    sequence::{preceded, terminated, tuple},
};

use crate::error::VerboseParseError;
use crate::suggest;

use super::{ArithmeticOp, Command, Item, Program, Segment, COMMAND_NAMES};

/// Largest value accepted as a segment offset or a count.
pub const MAX_VALUE: u16 = 0x7FFF;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    UnknownCommand {
        found: String,
        suggestion: Option<String>,
    },
    UnknownSegment {
        found: String,
        suggestion: Option<String>,
    },
    ValueOutOfRange(String),
    Expected(&'static str),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::UnknownCommand { found, suggestion } =>
                write!(f, "unknown command '{}'{}", found, suggest::hint(suggestion)),
            ErrorKind::UnknownSegment { found, suggestion } =>
                write!(f, "unknown segment '{}'{}", found, suggest::hint(suggestion)),
            ErrorKind::ValueOutOfRange(literal) =>
                write!(f, "value {} is out of range 0..={}", literal, MAX_VALUE),
            ErrorKind::Expected(what) => write!(f, "expected {}", what),
        }
    }
}

pub type ParseError = crate::error::ParseError<ErrorKind>;
type Result<'a, T> = IResult<&'a str, T, ParseError>;

const SPACE_CHARACTERS: &str = " \t\r";

fn sp(input: &str) -> Result<&str> {
    take_while(|c: char| SPACE_CHARACTERS.contains(c))(input)
}

fn comment(input: &str) -> Result<&str> {
    preceded(tag("//"), rest)(input)
}

fn word(input: &str) -> Result<&str> {
    preceded(sp, take_while1(|c: char| !c.is_whitespace() && c != '/'))(input)
}

fn failure<T>(input: &str, kind: ErrorKind) -> Result<T> {
    Err(nom::Err::Failure(ParseError::from_kind(input, kind)))
}

/// Turns a recoverable error of `parser` into a failure naming the missing operand.
fn operand<'a, O, F>(what: &'static str, parser: F) -> impl Fn(&'a str) -> Result<'a, O>
where
    F: Fn(&'a str) -> Result<'a, O>,
{
    move |input| match parser(input) {
        Err(nom::Err::Error(_)) => failure(input, ErrorKind::Expected(what)),
        other => other,
    }
}

fn number(input: &str) -> Result<u16> {
    let (rest, digits) = preceded(sp, digit1)(input)?;

    match digits.parse::<u16>() {
        Ok(value) if value <= MAX_VALUE => Ok((rest, value)),
        _ => failure(input, ErrorKind::ValueOutOfRange(digits.to_string())),
    }
}

fn segment(input: &str) -> Result<Segment> {
    let (rest, name) = operand("a segment", word)(input)?;

    match name.parse() {
        Ok(segment) => Ok((rest, segment)),
        Err(()) => failure(input, ErrorKind::UnknownSegment {
            found: name.to_string(),
            suggestion: suggest::closest(name, Segment::ALL.iter().map(Segment::as_str))
                .map(str::to_string),
        }),
    }
}

fn name(input: &str) -> Result<String> {
    map(operand("a name", word), str::to_string)(input)
}

fn command(input: &str) -> Result<Command> {
    let (rest, keyword) = word(input)?;

    let offset = operand("a number", number);

    match keyword {
        "push" => map(tuple((segment, offset)), |(s, o)| Command::Push(s, o))(rest),
        "pop" => map(tuple((segment, offset)), |(s, o)| Command::Pop(s, o))(rest),
        "label" => map(name, Command::Label)(rest),
        "goto" => map(name, Command::Goto)(rest),
        "if-goto" => map(name, Command::IfGoto)(rest),
        "function" => map(
            tuple((name, offset)),
            |(name, locals)| Command::Function { name, locals },
        )(rest),
        "call" => map(
            tuple((name, offset)),
            |(name, args)| Command::Call { name, args },
        )(rest),
        "return" => Ok((rest, Command::Return)),
        other => match other.parse::<ArithmeticOp>() {
            Ok(op) => Ok((rest, Command::Arithmetic(op))),
            Err(()) => failure(input, ErrorKind::UnknownCommand {
                found: other.to_string(),
                suggestion: suggest::closest(other, COMMAND_NAMES.iter().copied())
                    .map(str::to_string),
            }),
        },
    }
}

fn unit(input: &str) -> Result<String> {
    preceded(preceded(sp, tag("$$")), name)(input)
}

fn line(input: &str) -> Result<Option<Item>> {
    all_consuming(terminated(
        opt(alt((
            map(unit, Item::Unit),
            map(command, Item::Command),
        ))),
        tuple((sp, opt(comment))),
    ))(input)
}

/// Parses a single line. Blank lines and comment lines produce `None`.
pub fn parse_line(input: &str) -> StdResult<Option<Item>, ParseError> {
    line(input)
        .map(|(_, item)| item)
        .map_err(ParseError::from_nom)
}

/// Parses a whole stack-machine text. Every item keeps its line number.
pub fn parse_program(input: &str) -> StdResult<Program, VerboseParseError<ErrorKind>> {
    let mut program = Program::default();

    for (index, text) in input.lines().enumerate() {
        let item = parse_line(text)
            .map_err(|err| err.verbose(index + 1, text))?;

        if let Some(item) = item {
            program.items.push((index + 1, item));
        }
    }

    Ok(program)
}
