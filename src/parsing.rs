//! Token stream plumbing shared by the recursive descent parsers.

use std::fmt;
use std::ops::Range;
use itertools::Itertools;

/// Byte range of a token in the source text.
pub type Span = Range<usize>;

/// Human readable position in a source text. Both fields start from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {} col {}", self.line, self.column)
    }
}

/// Converts a byte offset into line and column numbers.
pub fn line_location(source: &str, offset: usize) -> LineLocation {
    let mut line = 1;
    let mut column = 1;

    for ch in source[..offset.min(source.len())].chars() {
        if ch == '\n' {
            line += 1;
            column = 0;
        }

        column += 1;
    }

    LineLocation { line, column }
}

#[derive(Clone, Debug)]
pub struct Error<Context> {
    pub kind: ErrorKind,
    pub context: Vec<Context>,
}

impl<C> Error<C> {
    pub fn new<T>(span: Span, found: String, ctx: T) -> Error<C> where T: Into<C> {
        Error {
            kind: ErrorKind::UnexpectedToken { span, found },
            context: vec![ctx.into()],
        }
    }

    pub fn eos<T>(ctx: T) -> Error<C> where T: Into<C> {
        Error {
            kind: ErrorKind::EndOfStream,
            context: vec![ctx.into()],
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self.kind {
            ErrorKind::EndOfStream => None,
            ErrorKind::UnexpectedToken { ref span, .. } => Some(span),
        }
    }

    /// Position of the offending token in `source`, or `None` for errors at the end of input.
    pub fn location(&self, source: &str) -> Option<LineLocation> {
        self.span().map(|span| line_location(source, span.start))
    }
}

pub trait ErrorExt<R,C> {
    fn context<T>(self, ctx: T) -> Self where T: Into<C>;
}

impl<R,C> ErrorExt<R,C> for Result<R, Error<C>> {
    fn context<T>(mut self, ctx: T) -> Self where T: Into<C> {
        if let Err(ref mut err) = self {
            err.context.push(ctx.into());
        }

        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    EndOfStream,
    UnexpectedToken {
        span: Span,
        found: String,
    },
}

impl<C> fmt::Display for Error<C>
where
    C: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ctx = self.context.iter()
            .rev()
            .join(": ");

        match self.kind {
            ErrorKind::EndOfStream =>
                write!(f, "{}: unexpected end of stream", ctx),
            ErrorKind::UnexpectedToken { ref span, ref found } =>
                write!(f, "error at position {}-{}: {}: unexpected token '{}'", span.start, span.end, ctx, found),
        }
    }
}

impl<C> std::error::Error for Error<C> where C: fmt::Display + fmt::Debug {}

/// A fully buffered sequence of spanned tokens with a read cursor.
///
/// The cursor only ever moves forward.
#[derive(Clone, Debug)]
pub struct TokenStream<T> {
    tokens: Vec<(T, Span)>,
    position: usize,
}

impl<T> From<Vec<(T, Span)>> for TokenStream<T> {
    fn from(tokens: Vec<(T, Span)>) -> TokenStream<T> {
        TokenStream {
            tokens,
            position: 0,
        }
    }
}

impl<T> TokenStream<T> {
    pub fn offset(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&(T, Span)> {
        self.tokens.get(self.position)
    }

    pub fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

pub trait Parser<T> where T: fmt::Display {
    fn stream(&self) -> &TokenStream<T>;
    fn stream_mut(&mut self) -> &mut TokenStream<T>;

    /// The current token, if any.
    fn current(&self) -> Option<&T> {
        self.stream().peek().map(|(token, _)| token)
    }

    /// Consumes the current token when `select` accepts it. The stream is left untouched
    /// on failure.
    fn expect<R, X, F>(&mut self, expected: &'static str, select: F) -> Result<R, Error<X>>
    where
        F: FnOnce(&T) -> Option<R>,
        X: From<&'static str>,
        Self: Sized,
    {
        let stream = self.stream_mut();

        let result = match stream.peek() {
            Some((token, span)) => match select(token) {
                Some(value) => Ok(value),
                None => Err(Error::new(span.clone(), token.to_string(), expected)),
            },
            None => Err(Error::eos(expected)),
        };

        if result.is_ok() {
            stream.advance();
        }

        result
    }

    fn assert_token<X>(&mut self, token: T, expected: &'static str) -> Result<(), Error<X>>
    where
        T: PartialEq,
        X: From<&'static str>,
        Self: Sized,
    {
        self.expect(expected, |t| if *t == token { Some(()) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Letters(TokenStream<char>);

    impl Parser<char> for Letters {
        fn stream(&self) -> &TokenStream<char> { &self.0 }
        fn stream_mut(&mut self) -> &mut TokenStream<char> { &mut self.0 }
    }

    fn letters(s: &str) -> Letters {
        Letters(s.char_indices().map(|(i, c)| (c, i..i + 1)).collect::<Vec<_>>().into())
    }

    #[test]
    fn failed_expectation_does_not_consume() {
        let mut parser = letters("ab");

        let err = parser.assert_token::<&'static str>('b', "expected 'b'").unwrap_err();
        assert_eq!(err.span(), Some(&(0..1)));
        assert_eq!(parser.stream().offset(), 0);

        parser.assert_token::<&'static str>('a', "expected 'a'").unwrap();
        parser.assert_token::<&'static str>('b', "expected 'b'").unwrap();
        assert!(parser.stream().is_finished());

        let err = parser.assert_token::<&'static str>('c', "expected 'c'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::EndOfStream);
    }

    #[test]
    fn context_is_printed_outermost_first() {
        let result: Result<(), Error<&'static str>> = Err(Error::new(3..4, "x".into(), "expected ';'"));
        let err = result.context("let statement").context("class Main").unwrap_err();

        assert_eq!(
            err.to_string(),
            "error at position 3-4: class Main: let statement: expected ';': unexpected token 'x'",
        );
    }

    #[test]
    fn line_location_counts_from_one() {
        let source = "ab\ncd\nef";
        assert_eq!(line_location(source, 0), LineLocation { line: 1, column: 1 });
        assert_eq!(line_location(source, 4), LineLocation { line: 2, column: 2 });
        assert_eq!(line_location(source, 6), LineLocation { line: 3, column: 1 });
    }
}
