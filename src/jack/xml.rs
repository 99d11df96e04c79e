//! Renders a parsed class as the tagged parse tree of the classic syntax analyzer.

use super::ast::*;
use super::token::{Keyword, TokenKind};

/// Escapes the characters that have a meaning in markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            ch => out.push(ch),
        }
    }

    out
}

struct XmlWriter {
    lines: Vec<String>,
    depth: usize,
}

impl XmlWriter {
    fn open(&mut self, tag: &str) {
        self.lines.push(format!("{:indent$}<{}>", "", tag, indent = self.depth * 2));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.lines.push(format!("{:indent$}</{}>", "", tag, indent = self.depth * 2));
    }

    fn leaf(&mut self, kind: TokenKind, text: &str) {
        let tag = kind.tag();
        self.lines.push(format!(
            "{:indent$}<{}> {} </{}>",
            "", tag, escape(text), tag,
            indent = self.depth * 2,
        ));
    }

    fn keyword(&mut self, keyword: Keyword) {
        self.leaf(TokenKind::Keyword, keyword.as_str());
    }

    fn symbol(&mut self, symbol: char) {
        let mut buf = [0; 4];
        self.leaf(TokenKind::Symbol, symbol.encode_utf8(&mut buf));
    }

    fn identifier(&mut self, name: &str) {
        self.leaf(TokenKind::Identifier, name);
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Int => self.keyword(Keyword::Int),
            Type::Char => self.keyword(Keyword::Char),
            Type::Boolean => self.keyword(Keyword::Boolean),
            Type::Class(name) => self.identifier(name),
        }
    }

    fn names(&mut self, names: &[String]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.identifier(name);
        }
        self.symbol(';');
    }

    fn class(&mut self, class: &Class) {
        self.open("class");
        self.keyword(Keyword::Class);
        self.identifier(&class.name);
        self.symbol('{');

        for dec in &class.variables {
            self.open("classVarDec");
            self.keyword(match dec.kind {
                ClassVarKind::Static => Keyword::Static,
                ClassVarKind::Field => Keyword::Field,
            });
            self.ty(&dec.ty);
            self.names(&dec.names);
            self.close("classVarDec");
        }

        for subroutine in &class.subroutines {
            self.subroutine(subroutine);
        }

        self.symbol('}');
        self.close("class");
    }

    fn subroutine(&mut self, subroutine: &SubroutineDec) {
        self.open("subroutineDec");
        self.keyword(match subroutine.kind {
            SubroutineKind::Constructor => Keyword::Constructor,
            SubroutineKind::Function => Keyword::Function,
            SubroutineKind::Method => Keyword::Method,
        });

        match subroutine.return_type {
            Some(ref ty) => self.ty(ty),
            None => self.keyword(Keyword::Void),
        }

        self.identifier(&subroutine.name);
        self.symbol('(');

        self.open("parameterList");
        for (i, parameter) in subroutine.parameters.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.ty(&parameter.ty);
            self.identifier(&parameter.name);
        }
        self.close("parameterList");

        self.symbol(')');

        self.open("subroutineBody");
        self.symbol('{');
        for dec in &subroutine.body.variables {
            self.open("varDec");
            self.keyword(Keyword::Var);
            self.ty(&dec.ty);
            self.names(&dec.names);
            self.close("varDec");
        }
        self.statements(&subroutine.body.statements);
        self.symbol('}');
        self.close("subroutineBody");

        self.close("subroutineDec");
    }

    fn statements(&mut self, statements: &[Statement]) {
        self.open("statements");
        for statement in statements {
            self.statement(statement);
        }
        self.close("statements");
    }

    fn block(&mut self, statements: &[Statement]) {
        self.symbol('{');
        self.statements(statements);
        self.symbol('}');
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Let { name, index, value } => {
                self.open("letStatement");
                self.keyword(Keyword::Let);
                self.identifier(name);
                if let Some(index) = index {
                    self.symbol('[');
                    self.expression(index);
                    self.symbol(']');
                }
                self.symbol('=');
                self.expression(value);
                self.symbol(';');
                self.close("letStatement");
            },
            Statement::If { condition, then_branch, else_branch } => {
                self.open("ifStatement");
                self.keyword(Keyword::If);
                self.symbol('(');
                self.expression(condition);
                self.symbol(')');
                self.block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.keyword(Keyword::Else);
                    self.block(else_branch);
                }
                self.close("ifStatement");
            },
            Statement::While { condition, body } => {
                self.open("whileStatement");
                self.keyword(Keyword::While);
                self.symbol('(');
                self.expression(condition);
                self.symbol(')');
                self.block(body);
                self.close("whileStatement");
            },
            Statement::Do(call) => {
                self.open("doStatement");
                self.keyword(Keyword::Do);
                self.call(call);
                self.symbol(';');
                self.close("doStatement");
            },
            Statement::Return(value) => {
                self.open("returnStatement");
                self.keyword(Keyword::Return);
                if let Some(value) = value {
                    self.expression(value);
                }
                self.symbol(';');
                self.close("returnStatement");
            },
        }
    }

    fn call(&mut self, call: &SubroutineCall) {
        if let Some(ref receiver) = call.receiver {
            self.identifier(receiver);
            self.symbol('.');
        }
        self.identifier(&call.name);
        self.symbol('(');

        self.open("expressionList");
        for (i, argument) in call.arguments.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.expression(argument);
        }
        self.close("expressionList");

        self.symbol(')');
    }

    fn expression(&mut self, expression: &Expression) {
        self.open("expression");
        self.term(&expression.term);
        for (op, term) in &expression.rest {
            self.symbol(op.symbol());
            self.term(term);
        }
        self.close("expression");
    }

    fn term(&mut self, term: &Term) {
        self.open("term");

        match term {
            Term::IntegerConstant(value) =>
                self.leaf(TokenKind::IntegerConstant, &value.to_string()),
            Term::StringConstant(text) =>
                self.leaf(TokenKind::StringConstant, text),
            Term::KeywordConstant(constant) => self.keyword(match constant {
                KeywordConstant::True => Keyword::True,
                KeywordConstant::False => Keyword::False,
                KeywordConstant::Null => Keyword::Null,
                KeywordConstant::This => Keyword::This,
            }),
            Term::Variable(name) => self.identifier(name),
            Term::ArrayIndex(name, index) => {
                self.identifier(name);
                self.symbol('[');
                self.expression(index);
                self.symbol(']');
            },
            Term::Call(call) => self.call(call),
            Term::Parenthesized(inner) => {
                self.symbol('(');
                self.expression(inner);
                self.symbol(')');
            },
            Term::Unary(op, operand) => {
                self.symbol(op.symbol());
                self.term(operand);
            },
        }

        self.close("term");
    }
}

/// Renders `class` as parse tree lines, indented two spaces per nesting level.
pub fn to_xml_lines(class: &Class) -> Vec<String> {
    let mut writer = XmlWriter {
        lines: Vec::new(),
        depth: 0,
    };

    writer.class(class);
    writer.lines
}
