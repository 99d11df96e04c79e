//! Code generation from the abstract syntax tree to stack-machine commands.

use std::collections::HashMap;
use std::fmt;

use slog::{o, debug, trace, Discard, Logger};

use crate::suggest;
use crate::vm::{ArithmeticOp, Command, Segment, VmWriter};

use super::ast::*;
use super::symbol_table::{Scopes, SymbolKind, UndefinedSymbol};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateErrorKind {
    Undefined(UndefinedSymbol),
    /// A name was declared twice in the same scope.
    Duplicate {
        name: String,
        what: String,
    },
    /// A subroutine of the class being compiled was called with the wrong number of
    /// arguments.
    ArgumentCount {
        subroutine: String,
        expected: usize,
        found: usize,
    },
    /// A subroutine of the class being compiled was called but never declared.
    UndefinedSubroutine {
        subroutine: String,
        suggestion: Option<String>,
    },
}

impl From<UndefinedSymbol> for GenerateErrorKind {
    fn from(err: UndefinedSymbol) -> GenerateErrorKind {
        GenerateErrorKind::Undefined(err)
    }
}

impl fmt::Display for GenerateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenerateErrorKind::Undefined(err) => write!(f, "{}", err),
            GenerateErrorKind::Duplicate { name, what } =>
                write!(f, "{} '{}' is already declared in this scope", what, name),
            GenerateErrorKind::ArgumentCount { subroutine, expected, found } =>
                write!(f, "{} takes {} arguments but {} were given", subroutine, expected, found),
            GenerateErrorKind::UndefinedSubroutine { subroutine, suggestion } =>
                write!(f, "undefined subroutine '{}'{}", subroutine, suggest::hint(suggestion)),
        }
    }
}

/// An error together with the class or subroutine it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateError {
    pub location: String,
    pub kind: GenerateErrorKind,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "in {}: {}", self.location, self.kind)
    }
}

impl std::error::Error for GenerateError {}

type Result<T> = std::result::Result<T, GenerateErrorKind>;

/// Hands out labels that are unique within one class.
#[derive(Debug)]
pub struct LabelAllocator {
    prefix: String,
    next: usize,
}

impl LabelAllocator {
    pub fn new(class: &str) -> LabelAllocator {
        LabelAllocator {
            prefix: class.to_string(),
            next: 0,
        }
    }

    pub fn next(&mut self) -> String {
        let label = format!("{}.L{}", self.prefix, self.next);
        self.next += 1;
        label
    }
}

#[derive(Debug, Clone, Copy)]
struct Signature {
    kind: SubroutineKind,
    parameters: usize,
}

struct ClassGenerator<'c> {
    class: &'c Class,
    scopes: Scopes,
    signatures: HashMap<&'c str, Signature>,
    writer: VmWriter,
    logger: Logger,
}

/// Translates `class` into stack-machine commands.
pub fn generate(class: &Class) -> std::result::Result<Vec<Command>, GenerateError> {
    generate_with_logger(class, None)
}

pub fn generate_with_logger<L>(class: &Class, logger: L) -> std::result::Result<Vec<Command>, GenerateError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "codegen", "class" => class.name.clone()));

    let mut generator = ClassGenerator {
        class,
        scopes: Scopes::default(),
        signatures: HashMap::new(),
        writer: VmWriter::new(),
        logger,
    };

    let in_class = |kind| GenerateError {
        location: class.name.clone(),
        kind,
    };

    generator.declare_class().map_err(in_class)?;

    let mut labels = LabelAllocator::new(&class.name);

    for subroutine in &class.subroutines {
        generator.subroutine(subroutine, &mut labels)
            .map_err(|kind| GenerateError {
                location: format!("{}.{}", class.name, subroutine.name),
                kind,
            })?;
    }

    Ok(generator.writer.finish())
}

impl<'c> ClassGenerator<'c> {
    fn declare_class(&mut self) -> Result<()> {
        let class = self.class;

        for dec in &class.variables {
            let kind = match dec.kind {
                ClassVarKind::Static => SymbolKind::Static,
                ClassVarKind::Field => SymbolKind::Field,
            };

            for name in &dec.names {
                if self.scopes.class.define(name, dec.ty.clone(), kind).is_some() {
                    return Err(GenerateErrorKind::Duplicate {
                        name: name.clone(),
                        what: kind.to_string(),
                    });
                }
            }
        }

        for subroutine in &class.subroutines {
            let signature = Signature {
                kind: subroutine.kind,
                parameters: subroutine.parameters.len(),
            };

            if self.signatures.insert(&subroutine.name, signature).is_some() {
                return Err(GenerateErrorKind::Duplicate {
                    name: subroutine.name.clone(),
                    what: "subroutine".into(),
                });
            }
        }

        debug!(self.logger, "declared class";
            "fields" => self.scopes.class.var_count(SymbolKind::Field),
            "statics" => self.scopes.class.var_count(SymbolKind::Static),
            "subroutines" => self.signatures.len());

        Ok(())
    }

    fn define(&mut self, name: &str, ty: Type, kind: SymbolKind) -> Result<()> {
        match self.scopes.subroutine.define(name, ty, kind) {
            Some(_) => Err(GenerateErrorKind::Duplicate {
                name: name.to_string(),
                what: kind.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn subroutine(&mut self, subroutine: &SubroutineDec, labels: &mut LabelAllocator) -> Result<()> {
        self.scopes.subroutine.reset();

        if subroutine.kind == SubroutineKind::Method {
            self.define("this", Type::Class(self.class.name.clone()), SymbolKind::Argument)?;
        }

        for parameter in &subroutine.parameters {
            self.define(&parameter.name, parameter.ty.clone(), SymbolKind::Argument)?;
        }

        for dec in &subroutine.body.variables {
            for name in &dec.names {
                self.define(name, dec.ty.clone(), SymbolKind::Local)?;
            }
        }

        let name = format!("{}.{}", self.class.name, subroutine.name);
        let locals = self.scopes.subroutine.var_count(SymbolKind::Local);

        trace!(self.logger, "generate subroutine"; "name" => &name, "locals" => locals);

        self.writer.function(&name, locals);

        match subroutine.kind {
            SubroutineKind::Constructor => {
                let fields = self.scopes.class.var_count(SymbolKind::Field);
                self.writer.push(Segment::Constant, fields);
                self.writer.call("Memory.alloc", 1);
                self.writer.pop(Segment::Pointer, 0);
            },
            SubroutineKind::Method => {
                self.writer.push(Segment::Argument, 0);
                self.writer.pop(Segment::Pointer, 0);
            },
            SubroutineKind::Function => (),
        }

        self.statements(&subroutine.body.statements, labels)
    }

    fn statements(&mut self, statements: &[Statement], labels: &mut LabelAllocator) -> Result<()> {
        for statement in statements {
            self.statement(statement, labels)?;
        }

        Ok(())
    }

    fn statement(&mut self, statement: &Statement, labels: &mut LabelAllocator) -> Result<()> {
        match statement {
            Statement::Let { name, index: None, value } => {
                self.expression(value)?;
                let symbol = self.scopes.lookup(name)?;
                self.writer.pop(symbol.kind.segment(), symbol.index);
            },
            Statement::Let { name, index: Some(index), value } => {
                self.variable(name)?;
                self.expression(index)?;
                self.writer.arithmetic(ArithmeticOp::Add);
                self.expression(value)?;
                self.writer.pop(Segment::Temp, 0);
                self.writer.pop(Segment::Pointer, 1);
                self.writer.push(Segment::Temp, 0);
                self.writer.pop(Segment::That, 0);
            },
            Statement::If { condition, then_branch, else_branch } => {
                let else_label = labels.next();
                let end_label = labels.next();

                self.expression(condition)?;
                self.writer.arithmetic(ArithmeticOp::Not);
                self.writer.if_goto(&else_label);
                self.statements(then_branch, labels)?;
                self.writer.goto(&end_label);
                self.writer.label(&else_label);

                if let Some(else_branch) = else_branch {
                    self.statements(else_branch, labels)?;
                }

                self.writer.label(&end_label);
            },
            Statement::While { condition, body } => {
                let top_label = labels.next();
                let end_label = labels.next();

                self.writer.label(&top_label);
                self.expression(condition)?;
                self.writer.arithmetic(ArithmeticOp::Not);
                self.writer.if_goto(&end_label);
                self.statements(body, labels)?;
                self.writer.goto(&top_label);
                self.writer.label(&end_label);
            },
            Statement::Do(call) => {
                self.call(call)?;
                self.writer.pop(Segment::Temp, 0);
            },
            Statement::Return(value) => {
                match value {
                    Some(value) => self.expression(value)?,
                    None => self.writer.push(Segment::Constant, 0),
                }

                self.writer.ret();
            },
        }

        Ok(())
    }

    fn variable(&mut self, name: &str) -> Result<()> {
        let symbol = self.scopes.lookup(name)?;
        self.writer.push(symbol.kind.segment(), symbol.index);
        Ok(())
    }

    fn expression(&mut self, expression: &Expression) -> Result<()> {
        self.term(&expression.term)?;

        for (op, term) in &expression.rest {
            self.term(term)?;

            match op {
                BinaryOp::Add => self.writer.arithmetic(ArithmeticOp::Add),
                BinaryOp::Subtract => self.writer.arithmetic(ArithmeticOp::Sub),
                BinaryOp::Multiply => self.writer.call("Math.multiply", 2),
                BinaryOp::Divide => self.writer.call("Math.divide", 2),
                BinaryOp::And => self.writer.arithmetic(ArithmeticOp::And),
                BinaryOp::Or => self.writer.arithmetic(ArithmeticOp::Or),
                BinaryOp::Less => self.writer.arithmetic(ArithmeticOp::Lt),
                BinaryOp::Greater => self.writer.arithmetic(ArithmeticOp::Gt),
                BinaryOp::Equal => self.writer.arithmetic(ArithmeticOp::Eq),
            }
        }

        Ok(())
    }

    fn term(&mut self, term: &Term) -> Result<()> {
        match term {
            Term::IntegerConstant(value) => self.writer.push(Segment::Constant, *value),
            Term::StringConstant(text) => self.writer.string(text),
            Term::KeywordConstant(KeywordConstant::True) => {
                self.writer.push(Segment::Constant, 1);
                self.writer.arithmetic(ArithmeticOp::Neg);
            },
            Term::KeywordConstant(KeywordConstant::False)
                | Term::KeywordConstant(KeywordConstant::Null) =>
                self.writer.push(Segment::Constant, 0),
            Term::KeywordConstant(KeywordConstant::This) =>
                self.writer.push(Segment::Pointer, 0),
            Term::Variable(name) => self.variable(name)?,
            Term::ArrayIndex(name, index) => {
                self.variable(name)?;
                self.expression(index)?;
                self.writer.arithmetic(ArithmeticOp::Add);
                self.writer.pop(Segment::Pointer, 1);
                self.writer.push(Segment::That, 0);
            },
            Term::Call(call) => self.call(call)?,
            Term::Parenthesized(inner) => self.expression(inner)?,
            Term::Unary(op, operand) => {
                self.term(operand)?;
                self.writer.arithmetic(match op {
                    UnaryOp::Negate => ArithmeticOp::Neg,
                    UnaryOp::Not => ArithmeticOp::Not,
                });
            },
        }

        Ok(())
    }

    /// Checks a call to a subroutine of the class being compiled.
    fn check_call(&self, name: &str, found: usize) -> Result<Signature> {
        match self.signatures.get(name) {
            Some(signature) if signature.parameters != found => Err(GenerateErrorKind::ArgumentCount {
                subroutine: format!("{}.{}", self.class.name, name),
                expected: signature.parameters,
                found,
            }),
            Some(signature) => Ok(*signature),
            None => Err(GenerateErrorKind::UndefinedSubroutine {
                subroutine: format!("{}.{}", self.class.name, name),
                suggestion: suggest::closest(name, self.signatures.keys().copied())
                    .map(str::to_string),
            }),
        }
    }

    fn call(&mut self, call: &SubroutineCall) -> Result<()> {
        let arguments = call.arguments.len();

        let (class, receiver_pushed) = match call.receiver {
            Some(ref receiver) => match self.scopes.resolve(receiver) {
                Some(symbol) => {
                    let class = symbol.ty.to_string();
                    let (segment, index) = (symbol.kind.segment(), symbol.index);

                    if class == self.class.name {
                        self.check_call(&call.name, arguments)?;
                    }

                    self.writer.push(segment, index);
                    (class, true)
                },
                None => {
                    if *receiver == self.class.name {
                        self.check_call(&call.name, arguments)?;
                    }

                    (receiver.clone(), false)
                },
            },
            None => {
                let signature = self.check_call(&call.name, arguments)?;

                let is_method = signature.kind == SubroutineKind::Method;
                if is_method {
                    self.writer.push(Segment::Pointer, 0);
                }

                (self.class.name.clone(), is_method)
            },
        };

        for argument in &call.arguments {
            self.expression(argument)?;
        }

        let args = arguments + receiver_pushed as usize;
        self.writer.call(&format!("{}.{}", class, call.name), args as u16);

        Ok(())
    }
}
