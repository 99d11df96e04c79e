//! Abstract syntax tree of a Jack class.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub variables: Vec<ClassVarDec>,
    pub subroutines: Vec<SubroutineDec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassVarKind {
    Static,
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassVarDec {
    pub kind: ClassVarKind,
    pub ty: Type,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    Class(String),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Boolean => write!(f, "boolean"),
            Type::Class(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Return type of a subroutine. `None` stands for `void`.
pub type ReturnType = Option<Type>;

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineDec {
    pub kind: SubroutineKind,
    pub return_type: ReturnType,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: SubroutineBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineBody {
    pub variables: Vec<VarDec>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDec {
    pub ty: Type,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        name: String,
        index: Option<Expression>,
        value: Expression,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Do(SubroutineCall),
    Return(Option<Expression>),
}

/// A flat, left associative chain `term (op term)*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub term: Term,
    pub rest: Vec<(BinaryOp, Term)>,
}

impl From<Term> for Expression {
    fn from(term: Term) -> Expression {
        Expression {
            term,
            rest: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    IntegerConstant(u16),
    StringConstant(String),
    KeywordConstant(KeywordConstant),
    Variable(String),
    ArrayIndex(String, Box<Expression>),
    Call(SubroutineCall),
    Parenthesized(Box<Expression>),
    Unary(UnaryOp, Box<Term>),
}

/// `name(args)` when `receiver` is `None`, otherwise `receiver.name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubroutineCall {
    pub receiver: Option<String>,
    pub name: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    And,
    Or,
    Less,
    Greater,
    Equal,
}

impl BinaryOp {
    pub fn from_symbol(symbol: char) -> Option<BinaryOp> {
        let op = match symbol {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Subtract,
            '*' => BinaryOp::Multiply,
            '/' => BinaryOp::Divide,
            '&' => BinaryOp::And,
            '|' => BinaryOp::Or,
            '<' => BinaryOp::Less,
            '>' => BinaryOp::Greater,
            '=' => BinaryOp::Equal,
            _ => return None,
        };

        Some(op)
    }

    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
            BinaryOp::And => '&',
            BinaryOp::Or => '|',
            BinaryOp::Less => '<',
            BinaryOp::Greater => '>',
            BinaryOp::Equal => '=',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: char) -> Option<UnaryOp> {
        match symbol {
            '-' => Some(UnaryOp::Negate),
            '~' => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            UnaryOp::Negate => '-',
            UnaryOp::Not => '~',
        }
    }
}
