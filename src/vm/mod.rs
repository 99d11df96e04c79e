//! Stack-machine commands, the intermediate language between the compiler and the
//! translator.
//!
//! A [Program] is a sequence of commands interleaved with `$$ <unit>` markers which name
//! the source unit the following commands came from. The unit name qualifies the
//! `static` segment of those commands.

use std::fmt;
use std::str::FromStr;

pub mod parser;
pub mod writer;

pub use parser::{parse_line, parse_program, ErrorKind, ParseError};
pub use writer::VmWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Constant,
        Segment::Local,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Pointer,
        Segment::Temp,
        Segment::Static,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
        }
    }
}

impl FromStr for Segment {
    type Err = ();

    fn from_str(input: &str) -> Result<Segment, ()> {
        Segment::ALL.iter()
            .copied()
            .find(|segment| segment.as_str() == input)
            .ok_or(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 9] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Neg,
        ArithmeticOp::Eq,
        ArithmeticOp::Gt,
        ArithmeticOp::Lt,
        ArithmeticOp::And,
        ArithmeticOp::Or,
        ArithmeticOp::Not,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = ();

    fn from_str(input: &str) -> Result<ArithmeticOp, ()> {
        ArithmeticOp::ALL.iter()
            .copied()
            .find(|op| op.as_str() == input)
            .ok_or(())
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

/// Every command keyword of the textual format.
pub const COMMAND_NAMES: [&str; 17] = [
    "push", "pop", "label", "goto", "if-goto", "function", "call", "return",
    "add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not",
];

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Push(segment, offset) => write!(f, "push {} {}", segment, offset),
            Command::Pop(segment, offset) => write!(f, "pop {} {}", segment, offset),
            Command::Arithmetic(op) => write!(f, "{}", op),
            Command::Label(label) => write!(f, "label {}", label),
            Command::Goto(label) => write!(f, "goto {}", label),
            Command::IfGoto(label) => write!(f, "if-goto {}", label),
            Command::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Command::Call { name, args } => write!(f, "call {} {}", name, args),
            Command::Return => write!(f, "return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// `$$ <unit>`: the following commands belong to the named source unit.
    Unit(String),
    Command(Command),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Item::Unit(name) => write!(f, "$$ {}", name),
            Item::Command(command) => write!(f, "{}", command),
        }
    }
}

/// A stack-machine program. Each item is paired with the line it was read from, or with
/// its position when the program was built in memory. Lines start from 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<(usize, Item)>,
}

impl Program {
    /// Appends the commands of a single unit, preceded by its `$$` marker.
    pub fn push_unit<I>(&mut self, unit: &str, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        self.push(Item::Unit(unit.to_string()));

        for command in commands {
            self.push(Item::Command(command));
        }
    }

    pub fn push(&mut self, item: Item) {
        let line = self.items.len() + 1;
        self.items.push((line, item));
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.items.iter().filter_map(|(_, item)| match item {
            Item::Command(command) => Some(command),
            Item::Unit(_) => None,
        })
    }

    /// Renders the program as text, one item per line.
    pub fn to_lines(&self) -> Vec<String> {
        self.items.iter()
            .map(|(_, item)| item.to_string())
            .collect()
    }
}

impl From<Vec<Command>> for Program {
    fn from(commands: Vec<Command>) -> Program {
        let mut program = Program::default();

        for command in commands {
            program.push(Item::Command(command));
        }

        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        assert_eq!(Command::Push(Segment::Constant, 7).to_string(), "push constant 7");
        assert_eq!(Command::Arithmetic(ArithmeticOp::Not).to_string(), "not");
        assert_eq!(Command::IfGoto("LOOP".into()).to_string(), "if-goto LOOP");
        assert_eq!(
            Command::Function { name: "Main.main".into(), locals: 2 }.to_string(),
            "function Main.main 2",
        );
    }

    #[test]
    fn test_names_round_trip() {
        for segment in Segment::ALL.iter() {
            assert_eq!(segment.as_str().parse(), Ok(*segment));
        }

        for op in ArithmeticOp::ALL.iter() {
            assert_eq!(op.as_str().parse(), Ok(*op));
            assert!(COMMAND_NAMES.contains(&op.as_str()));
        }

        assert_eq!("stack".parse::<Segment>(), Err(()));
    }

    #[test]
    fn test_push_unit() {
        let mut program = Program::default();
        program.push_unit("Main", vec![Command::Return]);

        assert_eq!(program.to_lines(), vec!["$$ Main", "return"]);
        assert_eq!(program.commands().count(), 1);
        assert_eq!(program.items[1].0, 2);
    }
}
