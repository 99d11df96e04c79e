use std::convert::TryFrom;
use std::fmt;

use crate::error::VerboseParseError;
use crate::instruction::{DecodeError, Instruction};

use super::parser::{parse_binary, ErrorKind};

/// A binary Hack program: one 16-bit word per instruction, starting from address 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub words: Vec<u16>,
}

impl Program {
    /// Parses the textual binary format, one line of `0`s and `1`s per word.
    pub fn parse(text: &str) -> Result<Program, VerboseParseError<ErrorKind>> {
        parse_binary(text)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Renders every word as a line of 16 binary digits.
    pub fn to_lines(&self) -> Vec<String> {
        self.words.iter()
            .map(|word| format!("{:016b}", word))
            .collect()
    }

    /// Decodes the words back into instructions.
    pub fn instructions(&self) -> Result<Vec<Instruction>, DecodeError> {
        self.words.iter()
            .map(|word| Instruction::try_from(*word))
            .collect()
    }
}

impl From<Vec<u16>> for Program {
    fn from(words: Vec<u16>) -> Program {
        Program { words }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}
