//! Assembly of symbolic Hack programs into binary words.
//!
//! The assembler makes two passes over the program before encoding it. The first binds
//! every label to the address of the instruction following it. The second hands out data
//! addresses, starting from [VARIABLE_BASE](crate::symbol_table::VARIABLE_BASE), to
//! symbols that are used but never bound.

use std::fmt;

use slog::{o, debug, trace, Discard, Logger};

use crate::bytecode::Program;
use crate::error::VerboseParseError;
use crate::instruction::{Comp, Dest, Instruction, Jump, MAX_ADDRESS};
use crate::source_map::SourceMap;
use crate::suggest;
use crate::symbol_table::{SymbolInfo, SymbolTable};
use crate::symbolic::{self, SymbolicInstruction, Value};

/// Field of a compute instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Dest,
    Comp,
    Jump,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Dest => write!(f, "destination"),
            Field::Comp => write!(f, "computation"),
            Field::Jump => write!(f, "jump"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssembleError {
    Syntax(VerboseParseError<symbolic::ErrorKind>),
    DuplicateLabel {
        label: String,
        line: usize,
        /// Line of the first definition. `None` for predefined symbols.
        previous: Option<usize>,
    },
    Encoding {
        line: usize,
        field: Field,
        found: String,
        suggestion: Option<String>,
    },
    /// A symbol was neither bound as a label nor allocated as a variable.
    UndefinedSymbol {
        symbol: String,
        line: usize,
    },
    /// The program has more instructions than address instructions can reach.
    ProgramTooLarge(usize),
}

impl From<VerboseParseError<symbolic::ErrorKind>> for AssembleError {
    fn from(err: VerboseParseError<symbolic::ErrorKind>) -> AssembleError {
        AssembleError::Syntax(err)
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssembleError::Syntax(err) => write!(f, "syntax error {}", err),
            AssembleError::DuplicateLabel { label, line, previous: Some(previous) } =>
                write!(f, "at line {}: label '{}' is already defined at line {}", line, label, previous),
            AssembleError::DuplicateLabel { label, line, previous: None } =>
                write!(f, "at line {}: label '{}' redefines a predefined symbol", line, label),
            AssembleError::Encoding { line, field, found, suggestion } =>
                write!(f, "at line {}: unknown {} '{}'{}", line, field, found, suggest::hint(suggestion)),
            AssembleError::UndefinedSymbol { symbol, line } =>
                write!(f, "at line {}: symbol '{}' has no address", line, symbol),
            AssembleError::ProgramTooLarge(count) =>
                write!(f, "program has {} instructions, at most {} are addressable", count, MAX_ADDRESS as usize + 1),
        }
    }
}

impl std::error::Error for AssembleError {}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub program: Program,
    pub symbols: SymbolTable,
    /// Maps each instruction address to its line in the assembly text.
    pub source_map: SourceMap<usize>,
}

/// Assembles the text of a symbolic program.
pub fn assemble(source: &str) -> Result<Assembly, AssembleError> {
    assemble_with_logger(source, None)
}

pub fn assemble_with_logger<L>(source: &str, logger: L) -> Result<Assembly, AssembleError>
where
    L: Into<Option<Logger>>,
{
    let program = symbolic::parse(source)?;
    assemble_program(&program, logger)
}

/// Assembles an already parsed symbolic program.
pub fn assemble_program<L>(program: &symbolic::Program, logger: L) -> Result<Assembly, AssembleError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "assembly"));

    let count = program.real_instruction_count();
    if count > MAX_ADDRESS as usize + 1 {
        return Err(AssembleError::ProgramTooLarge(count));
    }

    let mut symbols = SymbolTable::new();

    bind_labels(program, &mut symbols, &logger)?;
    allocate_variables(program, &mut symbols, &logger);

    let mut words = Vec::with_capacity(count);
    let mut source_map = SourceMap::default();

    for entry in &program.instructions {
        let instruction = match entry.instruction {
            SymbolicInstruction::Label(_) => continue,
            SymbolicInstruction::Address(Value::Literal(value)) => Instruction::Address(value),
            SymbolicInstruction::Address(Value::Symbol(ref symbol)) =>
                Instruction::Address(resolve(&symbols, symbol, entry.line)?),
            SymbolicInstruction::Compute { ref dest, ref comp, ref jump } =>
                encode_compute(dest, comp, jump, entry.line)?,
        };

        source_map.insert(words.len() as u16, entry.line);
        words.push(u16::from(instruction));
    }

    debug!(logger, "assembled program"; "instructions" => words.len());

    Ok(Assembly {
        program: Program::from(words),
        symbols,
        source_map,
    })
}

/// First pass: binds each label to the number of real instructions preceding it.
fn bind_labels(program: &symbolic::Program, symbols: &mut SymbolTable, logger: &Logger) -> Result<(), AssembleError> {
    let mut address: u16 = 0;

    for entry in &program.instructions {
        match entry.instruction {
            SymbolicInstruction::Label(ref label) => {
                symbols.define_label(label, address, entry.line)
                    .map_err(|existing: SymbolInfo| AssembleError::DuplicateLabel {
                        label: label.clone(),
                        line: entry.line,
                        previous: existing.defined,
                    })?;

                trace!(logger, "bind label"; "label" => label, "address" => address);
            },
            _ => address = address.wrapping_add(1),
        }
    }

    Ok(())
}

/// Second pass: allocates an address to every symbol that is still unknown.
fn allocate_variables(program: &symbolic::Program, symbols: &mut SymbolTable, logger: &Logger) {
    for entry in &program.instructions {
        if let SymbolicInstruction::Address(Value::Symbol(ref symbol)) = entry.instruction {
            if !symbols.contains(symbol) {
                let address = symbols.get_or_allocate(symbol, entry.line);
                trace!(logger, "allocate variable"; "symbol" => symbol, "address" => address);
            }
        }
    }
}

fn resolve(symbols: &SymbolTable, symbol: &str, line: usize) -> Result<u16, AssembleError> {
    symbols.address(symbol)
        .ok_or_else(|| AssembleError::UndefinedSymbol {
            symbol: symbol.to_string(),
            line,
        })
}

fn encoding_error<'a, I>(line: usize, field: Field, found: &str, candidates: I) -> AssembleError
where
    I: IntoIterator<Item = &'a str>,
{
    AssembleError::Encoding {
        line,
        field,
        found: found.to_string(),
        suggestion: suggest::closest(found, candidates).map(str::to_string),
    }
}

fn encode_compute(dest: &str, comp: &str, jump: &str, line: usize) -> Result<Instruction, AssembleError> {
    let dest = if dest.is_empty() {
        Dest::NULL
    } else {
        dest.parse::<Dest>()
            .map_err(|()| encoding_error(line, Field::Dest, dest, Dest::mnemonics()))?
    };

    let comp_value = comp.parse::<Comp>()
        .map_err(|()| encoding_error(line, Field::Comp, comp, Comp::mnemonics()))?;

    let jump = if jump.is_empty() {
        Jump::Null
    } else {
        jump.parse::<Jump>()
            .map_err(|()| encoding_error(line, Field::Jump, jump, Jump::mnemonics()))?
    };

    Ok(Instruction::Compute {
        comp: comp_value,
        dest,
        jump,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(source: &str) -> Vec<String> {
        assemble(source)
            .expect("could not assemble")
            .program
            .to_lines()
    }

    #[test]
    fn test_add() {
        assert_eq!(lines("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n"), vec![
            "0000000000000010",
            "1110110000010000",
            "0000000000000011",
            "1110000010010000",
            "0000000000000000",
            "1110001100001000",
        ]);
    }

    #[test]
    fn test_labels_bind_to_next_instruction() {
        let source = "(START)\n@END\n0;JMP\n// comment\n\n(END)\n@START\n(TRAILING)";
        let assembly = assemble(source).unwrap();

        assert_eq!(assembly.symbols.address("START"), Some(0));
        assert_eq!(assembly.symbols.address("END"), Some(2));
        assert_eq!(assembly.symbols.address("TRAILING"), Some(3));
        assert_eq!(assembly.program.words[0], 2);
    }

    #[test]
    fn test_variables_start_from_sixteen() {
        let assembly = assemble("@i\nM=1\n@sum\nM=0\n@i\nD=M\n@LOOP\n(LOOP)").unwrap();

        assert_eq!(assembly.program.words[0], 16);
        assert_eq!(assembly.program.words[2], 17);
        assert_eq!(assembly.program.words[4], 16);
        assert_eq!(assembly.program.words[6], 7);
    }

    #[test]
    fn test_dest_letter_order() {
        assert_eq!(lines("MD=D+1"), lines("DM=D+1"));
        assert_eq!(lines("AMD=0"), lines("ADM=0"));
    }

    #[test]
    fn test_jumps() {
        assert_eq!(lines("D;JGT"), vec!["1110001100000001"]);
        assert_eq!(lines("0;JMP"), vec!["1110101010000111"]);
    }

    #[test]
    fn test_source_map() {
        let assembly = assemble("// header\n@1\n(X)\n\nD=A\n").unwrap();

        assert_eq!(assembly.source_map.get(0), Some(&2));
        assert_eq!(assembly.source_map.get(1), Some(&5));
        assert_eq!(assembly.source_map.get(2), None);
    }

    #[test]
    fn test_duplicate_label() {
        let err = assemble("(A)\n@1\n(A)\n").unwrap_err();

        assert_eq!(err, AssembleError::DuplicateLabel {
            label: "A".into(),
            line: 3,
            previous: Some(1),
        });
    }

    #[test]
    fn test_unknown_computation_suggests() {
        let err = assemble("@1\nD=D-AA\n").unwrap_err();

        assert_eq!(err, AssembleError::Encoding {
            line: 2,
            field: Field::Comp,
            found: "D-AA".into(),
            suggestion: Some("D-A".into()),
        });
    }

    #[test]
    fn test_unknown_jump() {
        match assemble("0;JMPP").unwrap_err() {
            AssembleError::Encoding { field: Field::Jump, suggestion, .. } =>
                assert_eq!(suggestion, Some("JMP".into())),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_symbol_is_an_error() {
        let symbols = SymbolTable::new();

        assert_eq!(resolve(&symbols, "KBD", 1), Ok(24576));
        assert_eq!(resolve(&symbols, "missing", 4), Err(AssembleError::UndefinedSymbol {
            symbol: "missing".into(),
            line: 4,
        }));
    }

    #[test]
    fn test_bare_computation_is_rejected() {
        match assemble("@1\nD\n").unwrap_err() {
            AssembleError::Syntax(err) => {
                assert_eq!(err.line, 2);
                assert_eq!(err.kind(), Some(&symbolic::ErrorKind::BareComputation("D".into())));
            },
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        match assemble("@1\n@99999\n").unwrap_err() {
            AssembleError::Syntax(err) => assert_eq!(err.line, 2),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
