//! Tokens and a tokenizer for Jack source code.

use logos::{Lexer, Logos};

use std::fmt;
use std::str::FromStr;

use crate::parsing::{line_location, LineLocation, Span};

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Method,
    Function,
    Constructor,
    Int,
    Boolean,
    Char,
    Void,
    Var,
    Static,
    Field,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
    True,
    False,
    Null,
    This,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Method => "method",
            Keyword::Function => "function",
            Keyword::Constructor => "constructor",
            Keyword::Int => "int",
            Keyword::Boolean => "boolean",
            Keyword::Char => "char",
            Keyword::Void => "void",
            Keyword::Var => "var",
            Keyword::Static => "static",
            Keyword::Field => "field",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
        }
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(input: &str) -> Result<Keyword, ()> {
        let keyword = match input {
            "class" => Keyword::Class,
            "method" => Keyword::Method,
            "function" => Keyword::Function,
            "constructor" => Keyword::Constructor,
            "int" => Keyword::Int,
            "boolean" => Keyword::Boolean,
            "char" => Keyword::Char,
            "void" => Keyword::Void,
            "var" => Keyword::Var,
            "static" => Keyword::Static,
            "field" => Keyword::Field,
            "let" => Keyword::Let,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "return" => Keyword::Return,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "this" => Keyword::This,
            _ => return Err(()),
        };

        Ok(keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    IntegerConstant,
    StringConstant,
}

impl TokenKind {
    /// Name of the tag used for this kind of token in the parse tree.
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerConstant => "integerConstant",
            TokenKind::StringConstant => "stringConstant",
        }
    }
}

/// Enumeration of all tokens of the Jack language.
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Errorneous token that could not be interpreted as any of the other variants.
    #[error]
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Error,

    /// One of the reserved words.
    #[regex("class|method|function|constructor|int|boolean|char|void|var|static|field|let|do|if|else|while|return|true|false|null|this", |lex| lex.slice().parse::<Keyword>().ok())]
    Keyword(Keyword),

    /// One of the characters `{}()[].,;+-*/&|<>=~`.
    #[regex(r"[{}()\[\].,;+\-*/&|<>=~]", |lex| lex.slice().chars().next())]
    Symbol(char),

    /// A decimal number in the range `0..=32767`.
    #[regex("[0-9]+", integer_callback)]
    IntegerConstant(u16),

    /// Text between double quotes, without the quotes.
    #[regex(r#""[^"\n]*""#, string_callback)]
    StringConstant(&'a str),

    /// A name which begins with a letter or an underscore.
    #[regex("[A-Za-z_][A-Za-z0-9_]*", Lexer::slice)]
    Identifier(&'a str),
}

fn integer_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Option<u16> {
    lex.slice()
        .parse::<u16>()
        .ok()
        .filter(|value| *value <= 0x7FFF)
}

fn string_callback<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

impl<'a> Token<'a> {
    /// Classifies the token.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Symbol(_) => TokenKind::Symbol,
            Token::IntegerConstant(_) => TokenKind::IntegerConstant,
            Token::StringConstant(_) => TokenKind::StringConstant,
            Token::Identifier(_) | Token::Error => TokenKind::Identifier,
        }
    }
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Error => write!(f, "<error>"),
            Token::Keyword(keyword) => write!(f, "{}", keyword),
            Token::Symbol(symbol) => write!(f, "{}", symbol),
            Token::IntegerConstant(value) => write!(f, "{}", value),
            Token::StringConstant(text) => write!(f, "{}", text),
            Token::Identifier(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    /// A string literal is missing its closing quote before the end of the line.
    UnterminatedString,
    /// An integer literal does not fit in 15 bits.
    IntegerOutOfRange(String),
    /// A character that does not start any token.
    UnexpectedCharacter(char),
    /// A string constant holds a character whose code does not fit in 15 bits.
    CharacterOutOfRange(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn location(&self, source: &str) -> LineLocation {
        line_location(source, self.span.start)
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "error at position {}-{}: ", self.span.start, self.span.end)?;

        match self.kind {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string constant"),
            LexErrorKind::IntegerOutOfRange(ref literal) =>
                write!(f, "integer constant {} is out of range 0..=32767", literal),
            LexErrorKind::UnexpectedCharacter(ch) => write!(f, "unexpected character '{}'", ch),
            LexErrorKind::CharacterOutOfRange(ch) =>
                write!(f, "character '{}' (U+{:04X}) is out of range 0..=32767", ch, ch as u32),
        }
    }
}

impl std::error::Error for LexError {}

/// Largest character code a string constant may hold.
const MAX_CHARACTER: u32 = 0x7FFF;

/// Splits `source` into spanned tokens. Whitespace and comments are dropped.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        let span = lexer.span();

        if token == Token::Error {
            let slice = lexer.slice();

            let kind = match slice.chars().next() {
                Some('"') => LexErrorKind::UnterminatedString,
                Some(ch) if ch.is_ascii_digit() => LexErrorKind::IntegerOutOfRange(slice.to_string()),
                Some(ch) => LexErrorKind::UnexpectedCharacter(ch),
                None => LexErrorKind::UnexpectedCharacter('\0'),
            };

            return Err(LexError { kind, span });
        }

        if let Token::StringConstant(text) = &token {
            // Skip the opening quote.
            let start = span.start + 1;

            if let Some((offset, ch)) = text.char_indices().find(|(_, ch)| *ch as u32 > MAX_CHARACTER) {
                return Err(LexError {
                    kind: LexErrorKind::CharacterOutOfRange(ch),
                    span: start + offset..start + offset + ch.len_utf8(),
                });
            }
        }

        tokens.push((token, span));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("could not tokenize")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_tokenize_statement() {
        assert_eq!(tokens("let x[i]=x+1;"), vec![
            Token::Keyword(Keyword::Let),
            Token::Identifier("x"),
            Token::Symbol('['),
            Token::Identifier("i"),
            Token::Symbol(']'),
            Token::Symbol('='),
            Token::Identifier("x"),
            Token::Symbol('+'),
            Token::IntegerConstant(1),
            Token::Symbol(';'),
        ]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(tokens("do dox classy"), vec![
            Token::Keyword(Keyword::Do),
            Token::Identifier("dox"),
            Token::Identifier("classy"),
        ]);
    }

    #[test]
    fn test_string_keeps_spaces_and_symbols() {
        assert_eq!(tokens(r#"do Output.printString("a  b.c");"#)[5], Token::StringConstant("a  b.c"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "// line\nclass /* block\n * more */ Main {}";
        assert_eq!(tokens(source), vec![
            Token::Keyword(Keyword::Class),
            Token::Identifier("Main"),
            Token::Symbol('{'),
            Token::Symbol('}'),
        ]);
    }

    #[test]
    fn test_kinds() {
        let kinds = tokens(r#"class x 12 "s" ~"#)
            .iter()
            .map(Token::kind)
            .collect::<Vec<_>>();

        assert_eq!(kinds, vec![
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::IntegerConstant,
            TokenKind::StringConstant,
            TokenKind::Symbol,
        ]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("let s = \"abc;\n").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = tokenize("let x = 32768;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerOutOfRange("32768".into()));
        assert_eq!(tokens("32767"), vec![Token::IntegerConstant(32767)]);
    }

    #[test]
    fn test_string_character_out_of_range() {
        let source = "let s = \"ok\u{10041}\";";
        let err = tokenize(source).unwrap_err();

        assert_eq!(err.kind, LexErrorKind::CharacterOutOfRange('\u{10041}'));
        assert_eq!(err.location(source), LineLocation { line: 1, column: 12 });
        assert_eq!(tokens("\"\u{7FFF}\""), vec![Token::StringConstant("\u{7FFF}")]);
        assert!(tokenize("\"\u{8000}\"").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("let x = #;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('#'));
        assert_eq!(err.location("let x = #;"), LineLocation { line: 1, column: 9 });
    }
}
