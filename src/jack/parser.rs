//! Recursive descent parser producing the [abstract syntax tree](super::ast).
//!
//! Every production looks at the current token only and never backtracks. A token that does
//! not fit the production being parsed aborts the parse with an error that names the
//! expected input and the chain of productions that were being parsed.

use crate::parsing::{Error, ErrorExt, Parser, Span, TokenStream};

use super::ast::*;
use super::token::{Keyword, Token};

pub type ParseError = Error<String>;

type Result<T> = std::result::Result<T, ParseError>;

pub struct JackParser<'a> {
    stream: TokenStream<Token<'a>>,
}

impl<'a> Parser<Token<'a>> for JackParser<'a> {
    fn stream(&self) -> &TokenStream<Token<'a>> {
        &self.stream
    }

    fn stream_mut(&mut self) -> &mut TokenStream<Token<'a>> {
        &mut self.stream
    }
}

impl<'a> JackParser<'a> {
    pub fn new(tokens: Vec<(Token<'a>, Span)>) -> JackParser<'a> {
        JackParser {
            stream: tokens.into(),
        }
    }

    /// Parses a whole compilation unit, which consists of exactly one class.
    pub fn parse(mut self) -> Result<Class> {
        let class = self.class()?;

        if let Some((token, span)) = self.stream.peek() {
            return Err(Error::new(span.clone(), token.to_string(), "expected end of input after the class"));
        }

        Ok(class)
    }

    fn peek_token(&self) -> Option<Token<'a>> {
        self.current().cloned()
    }

    fn is_symbol(&self, symbol: char) -> bool {
        self.current() == Some(&Token::Symbol(symbol))
    }

    fn keyword(&mut self, keyword: Keyword, expected: &'static str) -> Result<()> {
        self.assert_token(Token::Keyword(keyword), expected)
    }

    fn symbol(&mut self, symbol: char, expected: &'static str) -> Result<()> {
        self.assert_token(Token::Symbol(symbol), expected)
    }

    fn identifier(&mut self, expected: &'static str) -> Result<String> {
        self.expect(expected, |token| match token {
            Token::Identifier(name) => Some(name.to_string()),
            _ => None,
        })
    }

    fn class(&mut self) -> Result<Class> {
        self.keyword(Keyword::Class, "expected 'class'")?;
        let name = self.identifier("expected a class name")?;

        self.class_body(name.clone())
            .context(format!("class {}", name))
    }

    fn class_body(&mut self, name: String) -> Result<Class> {
        self.symbol('{', "expected '{'")?;

        let mut variables = Vec::new();

        loop {
            match self.peek_token() {
                Some(Token::Keyword(Keyword::Static)) | Some(Token::Keyword(Keyword::Field)) =>
                    variables.push(self.class_var_dec()?),
                _ => break,
            }
        }

        let mut subroutines = Vec::new();

        loop {
            match self.peek_token() {
                Some(Token::Keyword(Keyword::Constructor))
                    | Some(Token::Keyword(Keyword::Function))
                    | Some(Token::Keyword(Keyword::Method)) =>
                    subroutines.push(self.subroutine_dec()?),
                _ => break,
            }
        }

        self.symbol('}', "expected '}' or a subroutine declaration")?;

        Ok(Class {
            name,
            variables,
            subroutines,
        })
    }

    fn class_var_dec(&mut self) -> Result<ClassVarDec> {
        let kind = self.expect("expected 'static' or 'field'", |token| match token {
            Token::Keyword(Keyword::Static) => Some(ClassVarKind::Static),
            Token::Keyword(Keyword::Field) => Some(ClassVarKind::Field),
            _ => None,
        })?;

        let ty = self.ty()?;
        let names = self.name_list()
            .context("class variable declaration")?;

        Ok(ClassVarDec { kind, ty, names })
    }

    fn ty(&mut self) -> Result<Type> {
        self.expect("expected a type", |token| match token {
            Token::Keyword(Keyword::Int) => Some(Type::Int),
            Token::Keyword(Keyword::Char) => Some(Type::Char),
            Token::Keyword(Keyword::Boolean) => Some(Type::Boolean),
            Token::Identifier(name) => Some(Type::Class(name.to_string())),
            _ => None,
        })
    }

    /// `name (',' name)* ';'`
    fn name_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.identifier("expected a variable name")?];

        while self.is_symbol(',') {
            self.symbol(',', "expected ','")?;
            names.push(self.identifier("expected a variable name")?);
        }

        self.symbol(';', "expected ',' or ';'")?;

        Ok(names)
    }

    fn subroutine_dec(&mut self) -> Result<SubroutineDec> {
        let kind = self.expect("expected 'constructor', 'function' or 'method'", |token| match token {
            Token::Keyword(Keyword::Constructor) => Some(SubroutineKind::Constructor),
            Token::Keyword(Keyword::Function) => Some(SubroutineKind::Function),
            Token::Keyword(Keyword::Method) => Some(SubroutineKind::Method),
            _ => None,
        })?;

        let return_type = match self.peek_token() {
            Some(Token::Keyword(Keyword::Void)) => {
                self.keyword(Keyword::Void, "expected 'void'")?;
                None
            },
            _ => Some(self.ty()?),
        };

        let name = self.identifier("expected a subroutine name")?;

        let (parameters, body) = self.subroutine_signature_and_body()
            .context(format!("subroutine {}", name))?;

        Ok(SubroutineDec {
            kind,
            return_type,
            name,
            parameters,
            body,
        })
    }

    fn subroutine_signature_and_body(&mut self) -> Result<(Vec<Parameter>, SubroutineBody)> {
        self.symbol('(', "expected '('")?;
        let parameters = self.parameter_list()
            .context("parameter list")?;
        self.symbol(')', "expected ')'")?;

        let body = self.subroutine_body()?;

        Ok((parameters, body))
    }

    fn parameter_list(&mut self) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();

        if self.is_symbol(')') {
            return Ok(parameters);
        }

        loop {
            let ty = self.ty()?;
            let name = self.identifier("expected a parameter name")?;
            parameters.push(Parameter { ty, name });

            if !self.is_symbol(',') {
                break;
            }

            self.symbol(',', "expected ','")?;
        }

        Ok(parameters)
    }

    fn subroutine_body(&mut self) -> Result<SubroutineBody> {
        self.symbol('{', "expected '{'")?;

        let mut variables = Vec::new();

        while self.current() == Some(&Token::Keyword(Keyword::Var)) {
            self.keyword(Keyword::Var, "expected 'var'")?;
            let ty = self.ty()?;
            let names = self.name_list()
                .context("variable declaration")?;
            variables.push(VarDec { ty, names });
        }

        let statements = self.statements()?;

        self.symbol('}', "expected '}' or a statement")?;

        Ok(SubroutineBody {
            variables,
            statements,
        })
    }

    fn statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        loop {
            let statement = match self.peek_token() {
                Some(Token::Keyword(Keyword::Let)) => self.let_statement()
                    .context("let statement")?,
                Some(Token::Keyword(Keyword::If)) => self.if_statement()
                    .context("if statement")?,
                Some(Token::Keyword(Keyword::While)) => self.while_statement()
                    .context("while statement")?,
                Some(Token::Keyword(Keyword::Do)) => self.do_statement()
                    .context("do statement")?,
                Some(Token::Keyword(Keyword::Return)) => self.return_statement()
                    .context("return statement")?,
                _ => break,
            };

            statements.push(statement);
        }

        Ok(statements)
    }

    /// `'{' statements '}'`
    fn block(&mut self) -> Result<Vec<Statement>> {
        self.symbol('{', "expected '{'")?;
        let statements = self.statements()?;
        self.symbol('}', "expected '}' or a statement")?;

        Ok(statements)
    }

    fn let_statement(&mut self) -> Result<Statement> {
        self.keyword(Keyword::Let, "expected 'let'")?;
        let name = self.identifier("expected a variable name")?;

        let index = if self.is_symbol('[') {
            self.symbol('[', "expected '['")?;
            let index = self.expression()?;
            self.symbol(']', "expected ']'")?;
            Some(index)
        } else {
            None
        };

        self.symbol('=', "expected '='")?;
        let value = self.expression()?;
        self.symbol(';', "expected ';'")?;

        Ok(Statement::Let { name, index, value })
    }

    fn if_statement(&mut self) -> Result<Statement> {
        self.keyword(Keyword::If, "expected 'if'")?;
        let condition = self.condition()?;
        let then_branch = self.block()?;

        let else_branch = if self.current() == Some(&Token::Keyword(Keyword::Else)) {
            self.keyword(Keyword::Else, "expected 'else'")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Statement> {
        self.keyword(Keyword::While, "expected 'while'")?;
        let condition = self.condition()?;
        let body = self.block()?;

        Ok(Statement::While { condition, body })
    }

    /// `'(' expression ')'`
    fn condition(&mut self) -> Result<Expression> {
        self.symbol('(', "expected '('")?;
        let condition = self.expression()?;
        self.symbol(')', "expected ')'")?;

        Ok(condition)
    }

    fn do_statement(&mut self) -> Result<Statement> {
        self.keyword(Keyword::Do, "expected 'do'")?;
        let name = self.identifier("expected a subroutine name")?;
        let call = self.subroutine_call(name)?;
        self.symbol(';', "expected ';'")?;

        Ok(Statement::Do(call))
    }

    fn return_statement(&mut self) -> Result<Statement> {
        self.keyword(Keyword::Return, "expected 'return'")?;

        let value = if self.is_symbol(';') {
            None
        } else {
            Some(self.expression()?)
        };

        self.symbol(';', "expected ';'")?;

        Ok(Statement::Return(value))
    }

    /// Parses the part of a call following its first identifier.
    fn subroutine_call(&mut self, first: String) -> Result<SubroutineCall> {
        let (receiver, name) = if self.is_symbol('.') {
            self.symbol('.', "expected '.'")?;
            let name = self.identifier("expected a subroutine name")?;
            (Some(first), name)
        } else {
            (None, first)
        };

        self.symbol('(', "expected '(' or '.'")?;
        let arguments = self.expression_list()
            .context("argument list")?;
        self.symbol(')', "expected ')'")?;

        Ok(SubroutineCall {
            receiver,
            name,
            arguments,
        })
    }

    fn expression(&mut self) -> Result<Expression> {
        let term = self.term()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek_token() {
                Some(Token::Symbol(symbol)) => match BinaryOp::from_symbol(symbol) {
                    Some(op) => op,
                    None => break,
                },
                _ => break,
            };

            self.stream.advance();
            rest.push((op, self.term()?));
        }

        Ok(Expression { term, rest })
    }

    fn term(&mut self) -> Result<Term> {
        let term = match self.peek_token() {
            Some(Token::IntegerConstant(value)) => {
                self.stream.advance();
                Term::IntegerConstant(value)
            },
            Some(Token::StringConstant(text)) => {
                self.stream.advance();
                Term::StringConstant(text.to_string())
            },
            Some(Token::Keyword(keyword)) => {
                let constant = match keyword {
                    Keyword::True => KeywordConstant::True,
                    Keyword::False => KeywordConstant::False,
                    Keyword::Null => KeywordConstant::Null,
                    Keyword::This => KeywordConstant::This,
                    _ => return self.expect("expected an expression", |_| None),
                };

                self.stream.advance();
                Term::KeywordConstant(constant)
            },
            Some(Token::Symbol('(')) => {
                self.stream.advance();
                let inner = self.expression()?;
                self.symbol(')', "expected ')'")?;
                Term::Parenthesized(Box::new(inner))
            },
            Some(Token::Symbol(symbol)) => match UnaryOp::from_symbol(symbol) {
                Some(op) => {
                    self.stream.advance();
                    Term::Unary(op, Box::new(self.term()?))
                },
                None => return self.expect("expected an expression", |_| None),
            },
            Some(Token::Identifier(name)) => {
                self.stream.advance();
                let name = name.to_string();

                match self.peek_token() {
                    Some(Token::Symbol('[')) => {
                        self.stream.advance();
                        let index = self.expression()?;
                        self.symbol(']', "expected ']'")?;
                        Term::ArrayIndex(name, Box::new(index))
                    },
                    Some(Token::Symbol('(')) | Some(Token::Symbol('.')) =>
                        Term::Call(self.subroutine_call(name)?),
                    _ => Term::Variable(name),
                }
            },
            _ => return self.expect("expected an expression", |_| None),
        };

        Ok(term)
    }

    fn expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = Vec::new();

        if self.is_symbol(')') {
            return Ok(expressions);
        }

        loop {
            expressions.push(self.expression()?);

            if !self.is_symbol(',') {
                break;
            }

            self.symbol(',', "expected ','")?;
        }

        Ok(expressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jack::token::tokenize;
    use crate::parsing::ErrorKind;

    fn parse(source: &str) -> Result<Class> {
        JackParser::new(tokenize(source).expect("could not tokenize")).parse()
    }

    fn parse_expression(source: &str) -> Expression {
        let mut parser = JackParser::new(tokenize(source).expect("could not tokenize"));
        let expression = parser.expression().expect("could not parse expression");
        assert!(parser.stream.is_finished(), "trailing tokens in {:?}", source);
        expression
    }

    #[test]
    fn test_parse_class_skeleton() {
        let class = parse(r#"
            class Point {
                field int x, y;
                static Point origin;

                constructor Point new(int ax, int ay) {
                    let x = ax;
                    let y = ay;
                    return this;
                }

                method void dispose() {
                    do Memory.deAlloc(this);
                    return;
                }
            }
        "#).expect("could not parse class");

        assert_eq!(class.name, "Point");
        assert_eq!(class.variables, vec![
            ClassVarDec {
                kind: ClassVarKind::Field,
                ty: Type::Int,
                names: vec!["x".into(), "y".into()],
            },
            ClassVarDec {
                kind: ClassVarKind::Static,
                ty: Type::Class("Point".into()),
                names: vec!["origin".into()],
            },
        ]);

        let new = &class.subroutines[0];
        assert_eq!(new.kind, SubroutineKind::Constructor);
        assert_eq!(new.return_type, Some(Type::Class("Point".into())));
        assert_eq!(new.parameters.len(), 2);
        assert_eq!(new.body.statements.len(), 3);

        let dispose = &class.subroutines[1];
        assert_eq!(dispose.kind, SubroutineKind::Method);
        assert_eq!(dispose.return_type, None);
        assert_eq!(dispose.body.statements, vec![
            Statement::Do(SubroutineCall {
                receiver: Some("Memory".into()),
                name: "deAlloc".into(),
                arguments: vec![Term::KeywordConstant(KeywordConstant::This).into()],
            }),
            Statement::Return(None),
        ]);
    }

    #[test]
    fn test_expression_is_flat_and_left_to_right() {
        let expression = parse_expression("1 + 2 * 3");

        assert_eq!(expression, Expression {
            term: Term::IntegerConstant(1),
            rest: vec![
                (BinaryOp::Add, Term::IntegerConstant(2)),
                (BinaryOp::Multiply, Term::IntegerConstant(3)),
            ],
        });
    }

    #[test]
    fn test_term_disambiguation() {
        assert_eq!(parse_expression("a").term, Term::Variable("a".into()));
        assert_eq!(
            parse_expression("a[1]").term,
            Term::ArrayIndex("a".into(), Box::new(Term::IntegerConstant(1).into())),
        );
        assert_eq!(
            parse_expression("f()").term,
            Term::Call(SubroutineCall { receiver: None, name: "f".into(), arguments: vec![] }),
        );
        assert_eq!(
            parse_expression("o.m(1, x)").term,
            Term::Call(SubroutineCall {
                receiver: Some("o".into()),
                name: "m".into(),
                arguments: vec![
                    Term::IntegerConstant(1).into(),
                    Term::Variable("x".into()).into(),
                ],
            }),
        );
        assert_eq!(
            parse_expression("-~x").term,
            Term::Unary(UnaryOp::Negate, Box::new(
                Term::Unary(UnaryOp::Not, Box::new(Term::Variable("x".into())))
            )),
        );
        assert_eq!(
            parse_expression("\"hi\"").term,
            Term::StringConstant("hi".into()),
        );
    }

    #[test]
    fn test_if_else() {
        let class = parse("class A { function void f() { if (x) { return; } else { let y = 1; } } }")
            .expect("could not parse");

        match &class.subroutines[0].body.statements[0] {
            Statement::If { then_branch, else_branch, .. } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
            },
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_missing_semicolon() {
        let source = "class A { function void f() { let x = 1 return; } }";
        let err = parse(source).unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnexpectedToken { span: 40..46, found: "return".into() });
        assert_eq!(err.context, vec![
            "expected ';'".to_string(),
            "let statement".to_string(),
            "subroutine f".to_string(),
            "class A".to_string(),
        ]);
    }

    #[test]
    fn test_missing_closing_brace_is_an_error() {
        let err = parse("class A { function void f() { return; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::EndOfStream);
    }

    #[test]
    fn test_trailing_tokens() {
        assert!(parse("class A { } class B { }").is_err());
    }

    #[test]
    fn test_keyword_is_not_a_term() {
        let err = parse("class A { function void f() { let x = while; } }").unwrap_err();
        assert_eq!(err.context[0], "expected an expression");
    }
}
