//! Types for representing Hack instructions and their parts.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Computations of the arithmetic logic unit.
///
/// The operand written as `A` reads the A register and the operand written as `M` reads
/// the memory word A points to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

/// Mnemonic and 7-bit encoding (the a-bit followed by c1..c6) of every computation.
static COMP_TABLE: [(Comp, &str, u8); 28] = [
    (Comp::Zero,      "0",   0b0101010),
    (Comp::One,       "1",   0b0111111),
    (Comp::MinusOne,  "-1",  0b0111010),
    (Comp::D,         "D",   0b0001100),
    (Comp::A,         "A",   0b0110000),
    (Comp::M,         "M",   0b1110000),
    (Comp::NotD,      "!D",  0b0001101),
    (Comp::NotA,      "!A",  0b0110001),
    (Comp::NotM,      "!M",  0b1110001),
    (Comp::NegD,      "-D",  0b0001111),
    (Comp::NegA,      "-A",  0b0110011),
    (Comp::NegM,      "-M",  0b1110011),
    (Comp::DPlusOne,  "D+1", 0b0011111),
    (Comp::APlusOne,  "A+1", 0b0110111),
    (Comp::MPlusOne,  "M+1", 0b1110111),
    (Comp::DMinusOne, "D-1", 0b0001110),
    (Comp::AMinusOne, "A-1", 0b0110010),
    (Comp::MMinusOne, "M-1", 0b1110010),
    (Comp::DPlusA,    "D+A", 0b0000010),
    (Comp::DPlusM,    "D+M", 0b1000010),
    (Comp::DMinusA,   "D-A", 0b0010011),
    (Comp::DMinusM,   "D-M", 0b1010011),
    (Comp::AMinusD,   "A-D", 0b0000111),
    (Comp::MMinusD,   "M-D", 0b1000111),
    (Comp::DAndA,     "D&A", 0b0000000),
    (Comp::DAndM,     "D&M", 0b1000000),
    (Comp::DOrA,      "D|A", 0b0010101),
    (Comp::DOrM,      "D|M", 0b1010101),
];

impl Comp {
    fn entry(&self) -> &'static (Comp, &'static str, u8) {
        COMP_TABLE.iter()
            .find(|(comp, _, _)| comp == self)
            .unwrap_or(&COMP_TABLE[0])
    }

    pub fn mnemonic(&self) -> &'static str {
        self.entry().1
    }

    pub fn mnemonics() -> impl Iterator<Item = &'static str> {
        COMP_TABLE.iter().map(|(_, mnemonic, _)| *mnemonic)
    }

    /// The a-bit followed by the six computation bits.
    pub fn bits(&self) -> u8 {
        self.entry().2
    }

    pub fn from_bits(bits: u8) -> Option<Comp> {
        COMP_TABLE.iter()
            .find(|(_, _, b)| *b == bits)
            .map(|(comp, _, _)| *comp)
    }

    /// Whether the computation reads memory instead of the A register.
    pub fn reads_memory(&self) -> bool {
        self.bits() & 0b1000000 != 0
    }

    /// Evaluates the computation with 16-bit wrapping arithmetic.
    pub fn evaluate(&self, d: u16, a: u16, m: u16) -> u16 {
        match self {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::MinusOne => 0xFFFF,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m,
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m.wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m.wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m,
            Comp::DOrA => d | a,
            Comp::DOrM => d | m,
        }
    }
}

impl FromStr for Comp {
    type Err = ();

    fn from_str(input: &str) -> Result<Comp, ()> {
        COMP_TABLE.iter()
            .find(|(_, mnemonic, _)| *mnemonic == input)
            .map(|(comp, _, _)| *comp)
            .ok_or(())
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Destinations written by a compute instruction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dest {
    pub a: bool,
    pub d: bool,
    pub m: bool,
}

/// Accepted destination mnemonics, with their letters sorted.
static DEST_TABLE: [(&str, u8); 7] = [
    ("M", 0b001),
    ("D", 0b010),
    ("DM", 0b011),
    ("A", 0b100),
    ("AM", 0b101),
    ("AD", 0b110),
    ("ADM", 0b111),
];

impl Dest {
    pub const NULL: Dest = Dest { a: false, d: false, m: false };

    pub fn bits(&self) -> u8 {
        (self.a as u8) << 2 | (self.d as u8) << 1 | self.m as u8
    }

    pub fn from_bits(bits: u8) -> Dest {
        Dest {
            a: bits & 0b100 != 0,
            d: bits & 0b010 != 0,
            m: bits & 0b001 != 0,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Dest::NULL
    }

    pub fn mnemonics() -> impl Iterator<Item = &'static str> {
        DEST_TABLE.iter().map(|(mnemonic, _)| *mnemonic)
    }
}

impl FromStr for Dest {
    type Err = ();

    /// Letters may come in any order, so `MD` and `DM` are the same destination.
    fn from_str(input: &str) -> Result<Dest, ()> {
        let mut letters = input.chars().collect::<Vec<_>>();
        letters.sort();
        let sorted = letters.into_iter().collect::<String>();

        DEST_TABLE.iter()
            .find(|(mnemonic, _)| *mnemonic == sorted)
            .map(|(_, bits)| Dest::from_bits(*bits))
            .ok_or(())
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.a {
            write!(f, "A")?;
        }
        if self.m {
            write!(f, "M")?;
        }
        if self.d {
            write!(f, "D")?;
        }
        Ok(())
    }
}

/// Jump condition of a compute instruction, tested against the computed value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Jump {
    Null,
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

static JUMPS: [Jump; 8] = [
    Jump::Null,
    Jump::JGT,
    Jump::JEQ,
    Jump::JGE,
    Jump::JLT,
    Jump::JNE,
    Jump::JLE,
    Jump::JMP,
];

impl Jump {
    pub fn bits(&self) -> u8 {
        JUMPS.iter()
            .position(|jump| jump == self)
            .unwrap_or(0) as u8
    }

    pub fn from_bits(bits: u8) -> Jump {
        JUMPS[(bits & 0b111) as usize]
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Jump::Null => "",
            Jump::JGT => "JGT",
            Jump::JEQ => "JEQ",
            Jump::JGE => "JGE",
            Jump::JLT => "JLT",
            Jump::JNE => "JNE",
            Jump::JLE => "JLE",
            Jump::JMP => "JMP",
        }
    }

    pub fn mnemonics() -> impl Iterator<Item = &'static str> {
        JUMPS[1..].iter().map(Jump::mnemonic)
    }

    /// Whether the jump is taken for a computed `value`, interpreted as signed.
    pub fn is_taken(&self, value: u16) -> bool {
        let value = value as i16;
        let bits = self.bits();

        (value < 0 && bits & 0b100 != 0)
            || (value == 0 && bits & 0b010 != 0)
            || (value > 0 && bits & 0b001 != 0)
    }
}

impl FromStr for Jump {
    type Err = ();

    fn from_str(input: &str) -> Result<Jump, ()> {
        JUMPS[1..].iter()
            .copied()
            .find(|jump| jump.mnemonic() == input)
            .ok_or(())
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Largest value an address instruction can load.
pub const MAX_ADDRESS: u16 = 0x7FFF;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `@value`: loads a 15-bit value into A.
    Address(u16),
    /// `dest=comp;jump`
    Compute {
        comp: Comp,
        dest: Dest,
        jump: Jump,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Address(value) => write!(f, "@{}", value),
            Instruction::Compute { comp, dest, jump } => {
                if !dest.is_null() {
                    write!(f, "{}=", dest)?;
                }

                write!(f, "{}", comp)?;

                if *jump != Jump::Null {
                    write!(f, ";{}", jump)?;
                }

                Ok(())
            },
        }
    }
}

impl From<Instruction> for u16 {
    fn from(instruction: Instruction) -> u16 {
        match instruction {
            Instruction::Address(value) => value & MAX_ADDRESS,
            Instruction::Compute { comp, dest, jump } =>
                0b111 << 13
                    | (comp.bits() as u16) << 6
                    | (dest.bits() as u16) << 3
                    | jump.bits() as u16,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Bits 14 and 13 of a compute instruction must be set.
    ReservedBits(u16),
    /// The computation bits do not name any computation.
    UnknownComputation(u16),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::ReservedBits(word) =>
                write!(f, "word {:016b} has a cleared reserved bit", word),
            DecodeError::UnknownComputation(word) =>
                write!(f, "word {:016b} has an unknown computation", word),
        }
    }
}

impl std::error::Error for DecodeError {}

impl TryFrom<u16> for Instruction {
    type Error = DecodeError;

    fn try_from(word: u16) -> Result<Instruction, DecodeError> {
        if word & 0x8000 == 0 {
            return Ok(Instruction::Address(word));
        }

        if word & 0x6000 != 0x6000 {
            return Err(DecodeError::ReservedBits(word));
        }

        let comp = Comp::from_bits(((word >> 6) & 0x7F) as u8)
            .ok_or(DecodeError::UnknownComputation(word))?;

        Ok(Instruction::Compute {
            comp,
            dest: Dest::from_bits(((word >> 3) & 0b111) as u8),
            jump: Jump::from_bits((word & 0b111) as u8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_compute() {
        let ins = Instruction::Compute {
            comp: Comp::DPlusA,
            dest: "D".parse().unwrap(),
            jump: Jump::Null,
        };

        assert_eq!(u16::from(ins), 0b1110000010010000);
        assert_eq!(ins.to_string(), "D=D+A");
    }

    #[test]
    fn test_decode_matches_encode() {
        for (comp, _, _) in COMP_TABLE.iter() {
            let ins = Instruction::Compute {
                comp: *comp,
                dest: Dest::from_bits(0b101),
                jump: Jump::JLE,
            };

            assert_eq!(Instruction::try_from(u16::from(ins)), Ok(ins));
        }

        assert_eq!(Instruction::try_from(5u16), Ok(Instruction::Address(5)));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            Instruction::try_from(0b1000_0000_0000_0000u16),
            Err(DecodeError::ReservedBits(0x8000)),
        );
        assert_eq!(
            Instruction::try_from(0b1111_1111_1100_0000u16),
            Err(DecodeError::UnknownComputation(0xFFC0)),
        );
    }

    #[test]
    fn test_dest_letters_in_any_order() {
        let dm: Dest = "DM".parse().unwrap();
        assert_eq!("MD".parse::<Dest>(), Ok(dm));
        assert_eq!(dm.bits(), 0b011);
        assert_eq!("DMA".parse::<Dest>().map(|d| d.bits()), Ok(0b111));
        assert_eq!("MM".parse::<Dest>(), Err(()));
        assert_eq!(dm.to_string(), "MD");
    }

    #[test]
    fn test_jump_conditions() {
        assert!(Jump::JGT.is_taken(1));
        assert!(!Jump::JGT.is_taken(0xFFFF));
        assert!(Jump::JLE.is_taken(0));
        assert!(Jump::JNE.is_taken(0x8000));
        assert!(!Jump::Null.is_taken(0));
        assert!(Jump::JMP.is_taken(0));
        assert_eq!("JNE".parse(), Ok(Jump::JNE));
        assert_eq!("".parse::<Jump>(), Err(()));
    }

    #[test]
    fn test_comp_evaluate_wraps() {
        assert_eq!(Comp::DPlusA.evaluate(0x7FFF, 1, 0), 0x8000);
        assert_eq!(Comp::NegM.evaluate(0, 0, 1), 0xFFFF);
        assert_eq!(Comp::MMinusD.evaluate(1, 0, 0), 0xFFFF);
        assert!(Comp::DOrM.reads_memory());
        assert!(!Comp::DOrA.reads_memory());
    }
}
