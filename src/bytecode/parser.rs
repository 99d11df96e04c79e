use std::fmt;
use std::result::Result as StdResult;

use nom::{
    IResult,
    bytes::complete::{take_while, take_while1},
    combinator::{all_consuming, opt},
    sequence::delimited,
};

use crate::error::VerboseParseError;

use super::program::Program;

/// Number of characters in a binary instruction line.
pub const WORD_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    WrongWidth(usize),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::WrongWidth(width) =>
                write!(f, "expected {} binary digits, found {}", WORD_WIDTH, width),
        }
    }
}

pub type ParseError = crate::error::ParseError<ErrorKind>;
type Result<'a, T> = IResult<&'a str, T, ParseError>;

fn sp(input: &str) -> Result<&str> {
    take_while(char::is_whitespace)(input)
}

fn word(input: &str) -> Result<u16> {
    let (rest, digits) = take_while1(|c: char| c == '0' || c == '1')(input)?;

    if digits.len() != WORD_WIDTH {
        return Err(nom::Err::Failure(ParseError::from_kind(input, ErrorKind::WrongWidth(digits.len()))));
    }

    let value = digits.chars()
        .fold(0u16, |acc, c| acc << 1 | (c == '1') as u16);

    Ok((rest, value))
}

fn line(input: &str) -> Result<Option<u16>> {
    all_consuming(delimited(sp, opt(word), sp))(input)
}

/// Parses one word per line. Blank lines are skipped.
pub(crate) fn parse_binary(input: &str) -> StdResult<Program, VerboseParseError<ErrorKind>> {
    let mut words = Vec::new();

    for (index, text) in input.lines().enumerate() {
        let (_, word) = line(text)
            .map_err(|err| ParseError::from_nom(err).verbose(index + 1, text))?;

        words.extend(word);
    }

    Ok(Program { words })
}
