//! Error type for the line oriented text formats (stack-machine code, assembly and binary).

use std::fmt::{Display, self};
use nom::error::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
enum InnerError<Kind> {
    Incomplete,
    Context(&'static str),
    Other(Kind),
    Nom(ErrorKind),
}

impl<Kind: Display> fmt::Display for InnerError<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InnerError::Context(ctx) => write!(f, "invalid {}", ctx),
            InnerError::Nom(_err) => write!(f, "unexpected input"),
            InnerError::Other(op) => fmt::Display::fmt(op, f),
            InnerError::Incomplete => write!(f, "expected more input"),
        }
    }
}

/// Error type that contains the reason of the error and the unconsumed input of the line.
///
/// For error location information see [ParseError::verbose].
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError<Kind> {
    stack: Vec<(String, InnerError<Kind>)>,
}

impl<Kind> ParseError<Kind> {
    pub(crate) fn from_kind(input: &str, kind: Kind) -> ParseError<Kind> {
        ParseError {
            stack: vec![(input.to_string(), InnerError::Other(kind))],
        }
    }

    pub(crate) fn incomplete() -> ParseError<Kind> {
        ParseError {
            stack: vec![(String::new(), InnerError::Incomplete)],
        }
    }

    /// Converts a `nom` result error into a [ParseError].
    pub(crate) fn from_nom(err: nom::Err<ParseError<Kind>>) -> ParseError<Kind> {
        match err {
            nom::Err::Error(err) | nom::Err::Failure(err) => err,
            nom::Err::Incomplete(_) => ParseError::incomplete(),
        }
    }

    /// The most specific reason recorded for this error, if it is not a generic one.
    pub fn kind(&self) -> Option<&Kind> {
        self.stack.iter().find_map(|(_, inner)| match inner {
            InnerError::Other(kind) => Some(kind),
            _ => None,
        })
    }
}

/// Error type containing location information in addition to the reason of the error.
///
/// Created from a [ParseError] with [ParseError::verbose].
#[derive(Clone, Debug, PartialEq)]
pub struct VerboseParseError<Kind> {
    /// The line number of the error location.
    pub line: usize,
    /// The column number of the error location.
    pub column: usize,
    kind: InnerError<Kind>,
    rest: String,
}

impl<Kind> VerboseParseError<Kind> {
    /// The specific reason of the error, when one was recorded.
    pub fn kind(&self) -> Option<&Kind> {
        match self.kind {
            InnerError::Other(ref kind) => Some(kind),
            _ => None,
        }
    }
}

impl<Kind: Display> fmt::Display for VerboseParseError<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at line {} col {}: {}, at '{}'", self.line, self.column, self.kind, self.rest)
    }
}

impl<Kind: Display + fmt::Debug> std::error::Error for VerboseParseError<Kind> {}

impl<Kind> ParseError<Kind> {
    /// Calculates the error location information from the [ParseError] and the line it was
    /// produced from.
    ///
    /// # Parameters
    /// - `line`: The line number of `input` in the whole text, starting from 1.
    /// - `input`: The parsed line or an exact copy of it.
    pub fn verbose(self, line: usize, input: &str) -> VerboseParseError<Kind> {
        let index = self.stack.iter()
            .position(|(_, kind)| match kind {
                InnerError::Other(_) => true,
                _ => false,
            })
            .unwrap_or(0);

        let (rest, kind) = self.stack.into_iter()
            .nth(index)
            .unwrap_or_else(|| (input.to_string(), InnerError::Incomplete));

        let start = input.len().saturating_sub(rest.len());
        let column = input[..start].chars().count() + 1;

        let rest = input[start..].chars()
            .take(20)
            .collect();

        VerboseParseError {
            line,
            column,
            kind,
            rest,
        }
    }
}

impl<Kind: Display> fmt::Display for ParseError<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.stack.first() {
            Some((input, kind)) => {
                let snippet = input.lines()
                    .next()
                    .unwrap_or("")
                    .chars()
                    .take(20)
                    .collect::<String>();

                write!(f, "{} at '{}'", kind, snippet)
            },
            None => write!(f, "unexpected input"),
        }
    }
}

impl<Kind> nom::error::ParseError<&str> for ParseError<Kind> {
    fn from_error_kind(input: &str, kind: ErrorKind) -> Self {
        ParseError {
            stack: vec![(input.to_string(), InnerError::Nom(kind))],
        }
    }

    fn append(input: &str, kind: ErrorKind, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Nom(kind)));
        other
    }

    fn add_context(input: &str, ctx: &'static str, mut other: Self) -> Self {
        other.stack.push((input.to_string(), InnerError::Context(ctx)));
        other
    }
}
