use std::fmt;

/// Operand of an address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Literal(u16),
    Symbol(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Literal(value) => write!(f, "{}", value),
            Value::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

/// A line of assembly as written. The fields of a compute instruction are kept as text
/// and only validated when the program is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicInstruction {
    /// `(name)`: binds `name` to the address of the next real instruction.
    Label(String),
    /// `@value`
    Address(Value),
    /// `dest=comp;jump` where `dest` and `jump` may be empty.
    Compute {
        dest: String,
        comp: String,
        jump: String,
    },
}

impl SymbolicInstruction {
    /// Labels occupy no space in the encoded program.
    pub fn is_real(&self) -> bool {
        match self {
            SymbolicInstruction::Label(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for SymbolicInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolicInstruction::Label(label) => write!(f, "({})", label),
            SymbolicInstruction::Address(value) => write!(f, "@{}", value),
            SymbolicInstruction::Compute { dest, comp, jump } => {
                if !dest.is_empty() {
                    write!(f, "{}=", dest)?;
                }

                write!(f, "{}", comp)?;

                if !jump.is_empty() {
                    write!(f, ";{}", jump)?;
                }

                Ok(())
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionEntry {
    /// Line of the instruction in the source text, starting from 1.
    pub line: usize,
    pub instruction: SymbolicInstruction,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<InstructionEntry>,
}

impl Program {
    /// Number of instructions which end up in the encoded program.
    pub fn real_instruction_count(&self) -> usize {
        self.instructions.iter()
            .filter(|entry| entry.instruction.is_real())
            .count()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.instructions {
            writeln!(f, "{}", entry.instruction)?;
        }

        Ok(())
    }
}
