//! Translation of stack-machine commands into symbolic Hack assembly.
//!
//! The stack lives in RAM starting from [STACK_BASE] with `SP` pointing at the first free
//! word. `LCL`, `ARG`, `THIS` and `THAT` hold the bases of the corresponding segments,
//! `temp` occupies the fixed addresses from [TEMP_BASE] and `static` variables are left to
//! the assembler as symbols named `<unit>.<offset>`.
//!
//! A call frame consists of the return address and the saved `LCL`, `ARG`, `THIS` and
//! `THAT` of the caller, pushed in that order right after the arguments.

use std::fmt;

use slog::{o, debug, trace, Discard, Logger};

use crate::instruction::MAX_ADDRESS;
use crate::vm::{ArithmeticOp, Command, Item, Program, Segment};

/// Initial value of the stack pointer.
pub const STACK_BASE: u16 = 256;

/// Address of `temp 0`.
pub const TEMP_BASE: u16 = 5;

const TEMP_SIZE: u16 = 8;

/// Entry point called by the bootstrap code.
pub const ENTRY_POINT: &str = "Sys.init";

/// Size of the saved state pushed by a call, return address included.
const FRAME_SIZE: u16 = 5;

/// Registers saved by the caller, in push order.
const SAVED_REGISTERS: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateErrorKind {
    PopConstant,
    OffsetOutOfRange {
        segment: Segment,
        offset: u16,
        max: u16,
    },
    /// A `static` access before any `$$` marker and without a default unit.
    StaticWithoutUnit,
}

impl fmt::Display for TranslateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslateErrorKind::PopConstant => write!(f, "cannot pop into the constant segment"),
            TranslateErrorKind::OffsetOutOfRange { segment, offset, max } =>
                write!(f, "offset {} is out of range for segment {} (0..={})", offset, segment, max),
            TranslateErrorKind::StaticWithoutUnit =>
                write!(f, "static segment used outside of a unit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateError {
    pub line: usize,
    pub command: Command,
    pub kind: TranslateErrorKind,
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "at line {} ('{}'): {}", self.line, self.command, self.kind)
    }
}

impl std::error::Error for TranslateError {}

#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Prepend code which sets up the stack and calls `Sys.init`.
    pub bootstrap: bool,

    /// Unit used for statics until the first `$$` marker.
    pub unit: Option<String>,
}

impl TranslateOptions {
    /// Options for a whole program made of several units.
    pub fn program() -> TranslateOptions {
        TranslateOptions {
            bootstrap: true,
            unit: None,
        }
    }

    /// Options for a single unit without bootstrap code.
    pub fn unit(name: &str) -> TranslateOptions {
        TranslateOptions {
            bootstrap: false,
            unit: Some(name.to_string()),
        }
    }
}

pub fn translate(program: &Program, options: &TranslateOptions) -> Result<Vec<String>, TranslateError> {
    translate_with_logger(program, options, None)
}

/// Translates `program` into assembly lines.
pub fn translate_with_logger<L>(program: &Program, options: &TranslateOptions, logger: L) -> Result<Vec<String>, TranslateError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "translator"));

    let mut translator = Translator {
        lines: Vec::new(),
        unit: options.unit.clone(),
        function: None,
        comparisons: 0,
        calls: 0,
    };

    if options.bootstrap {
        translator.bootstrap();
        debug!(logger, "emit bootstrap"; "entry" => ENTRY_POINT);
    }

    for (line, item) in &program.items {
        match item {
            Item::Unit(name) => {
                debug!(logger, "begin unit"; "unit" => name, "line" => line);
                translator.unit = Some(name.clone());
                translator.function = None;
            },
            Item::Command(command) => {
                trace!(logger, "translate command"; "line" => line, "command" => %command);

                translator.command(command)
                    .map_err(|kind| TranslateError {
                        line: *line,
                        command: command.clone(),
                        kind,
                    })?;
            },
        }
    }

    debug!(logger, "translated program";
        "lines" => translator.lines.len(),
        "comparisons" => translator.comparisons,
        "calls" => translator.calls);

    Ok(translator.lines)
}

struct Translator {
    lines: Vec<String>,
    unit: Option<String>,
    /// Function whose body is being translated. Qualifies labels.
    function: Option<String>,
    comparisons: usize,
    calls: usize,
}

impl Translator {
    fn emit(&mut self, lines: &[&str]) {
        self.lines.extend(lines.iter().map(|line| line.to_string()));
    }

    fn line(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Pushes D onto the stack.
    fn push_d(&mut self) {
        self.emit(&["@SP", "A=M", "M=D", "@SP", "M=M+1"]);
    }

    /// Pops the topmost stack value into D.
    fn pop_d(&mut self) {
        self.emit(&["@SP", "M=M-1", "A=M", "D=M"]);
    }

    fn bootstrap(&mut self) {
        self.line(format!("@{}", STACK_BASE));
        self.emit(&["D=A", "@SP", "M=D"]);
        self.call(ENTRY_POINT, 0);
    }

    fn command(&mut self, command: &Command) -> Result<(), TranslateErrorKind> {
        match command {
            Command::Push(segment, offset) => self.push(*segment, *offset)?,
            Command::Pop(segment, offset) => self.pop(*segment, *offset)?,
            Command::Arithmetic(op) => self.arithmetic(*op),
            Command::Label(label) => {
                let label = self.qualify(label);
                self.line(format!("({})", label));
            },
            Command::Goto(label) => {
                let label = self.qualify(label);
                self.line(format!("@{}", label));
                self.emit(&["0;JMP"]);
            },
            Command::IfGoto(label) => {
                let label = self.qualify(label);
                self.pop_d();
                self.line(format!("@{}", label));
                self.emit(&["D;JNE"]);
            },
            Command::Function { name, locals } => self.function(name, *locals),
            Command::Call { name, args } => self.call(name, *args),
            Command::Return => self.ret(),
        }

        Ok(())
    }

    fn qualify(&self, label: &str) -> String {
        match self.function {
            Some(ref function) => format!("{}${}", function, label),
            None => label.to_string(),
        }
    }

    /// Register holding the base address of a register-relative segment.
    fn base_register(segment: Segment) -> Option<&'static str> {
        match segment {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }

    /// Symbol or address of a segment with a fixed location.
    fn fixed_address(&self, segment: Segment, offset: u16) -> Result<String, TranslateErrorKind> {
        let out_of_range = |max| TranslateErrorKind::OffsetOutOfRange { segment, offset, max };

        match segment {
            Segment::Temp if offset < TEMP_SIZE => Ok(format!("R{}", TEMP_BASE + offset)),
            Segment::Temp => Err(out_of_range(TEMP_SIZE - 1)),
            Segment::Pointer if offset == 0 => Ok("THIS".to_string()),
            Segment::Pointer if offset == 1 => Ok("THAT".to_string()),
            Segment::Pointer => Err(out_of_range(1)),
            Segment::Static => match self.unit {
                Some(ref unit) => Ok(format!("{}.{}", unit, offset)),
                None => Err(TranslateErrorKind::StaticWithoutUnit),
            },
            _ => Err(out_of_range(0)),
        }
    }

    fn push(&mut self, segment: Segment, offset: u16) -> Result<(), TranslateErrorKind> {
        if segment == Segment::Constant {
            if offset > MAX_ADDRESS {
                return Err(TranslateErrorKind::OffsetOutOfRange { segment, offset, max: MAX_ADDRESS });
            }

            self.line(format!("@{}", offset));
            self.emit(&["D=A"]);
        } else if let Some(register) = Translator::base_register(segment) {
            self.line(format!("@{}", offset));
            self.emit(&["D=A"]);
            self.line(format!("@{}", register));
            self.emit(&["A=D+M", "D=M"]);
        } else {
            let address = self.fixed_address(segment, offset)?;
            self.line(format!("@{}", address));
            self.emit(&["D=M"]);
        }

        self.push_d();
        Ok(())
    }

    fn pop(&mut self, segment: Segment, offset: u16) -> Result<(), TranslateErrorKind> {
        if segment == Segment::Constant {
            return Err(TranslateErrorKind::PopConstant);
        }

        if let Some(register) = Translator::base_register(segment) {
            self.line(format!("@{}", offset));
            self.emit(&["D=A"]);
            self.line(format!("@{}", register));
            self.emit(&["D=D+M", "@R13", "M=D"]);
            self.pop_d();
            self.emit(&["@R13", "A=M", "M=D"]);
        } else {
            let address = self.fixed_address(segment, offset)?;
            self.pop_d();
            self.line(format!("@{}", address));
            self.emit(&["M=D"]);
        }

        Ok(())
    }

    fn arithmetic(&mut self, op: ArithmeticOp) {
        match op {
            ArithmeticOp::Neg => self.emit(&["@SP", "A=M-1", "M=-M"]),
            ArithmeticOp::Not => self.emit(&["@SP", "A=M-1", "M=!M"]),
            ArithmeticOp::Add => self.binary("M=D+M"),
            ArithmeticOp::Sub => self.binary("M=M-D"),
            ArithmeticOp::And => self.binary("M=D&M"),
            ArithmeticOp::Or => self.binary("M=D|M"),
            ArithmeticOp::Eq => self.comparison("JEQ"),
            ArithmeticOp::Gt => self.comparison("JGT"),
            ArithmeticOp::Lt => self.comparison("JLT"),
        }
    }

    /// Pops y into D and leaves A pointing at x, the new top of the stack.
    fn pop_operands(&mut self) {
        self.pop_d();
        self.emit(&["A=A-1"]);
    }

    fn binary(&mut self, compute: &str) {
        self.pop_operands();
        self.emit(&[compute]);
    }

    /// Replaces x and y with -1 when `x - y` satisfies `jump`, 0 otherwise.
    fn comparison(&mut self, jump: &str) {
        let id = self.comparisons;
        self.comparisons += 1;

        self.pop_operands();
        self.emit(&["D=M-D"]);
        self.line(format!("@CMP_TRUE{}", id));
        self.line(format!("D;{}", jump));
        self.emit(&["D=0"]);
        self.line(format!("@CMP_END{}", id));
        self.emit(&["0;JMP"]);
        self.line(format!("(CMP_TRUE{})", id));
        self.emit(&["D=-1"]);
        self.line(format!("(CMP_END{})", id));
        self.emit(&["@SP", "A=M-1", "M=D"]);
    }

    fn function(&mut self, name: &str, locals: u16) {
        self.function = Some(name.to_string());
        self.line(format!("({})", name));

        for _ in 0..locals {
            self.emit(&["@SP", "A=M", "M=0", "@SP", "M=M+1"]);
        }
    }

    fn call(&mut self, name: &str, args: u16) {
        // Callees always get at least one argument slot for their return value.
        let args = if args == 0 && name != ENTRY_POINT {
            self.emit(&["@SP", "A=M", "M=0", "@SP", "M=M+1"]);
            1
        } else {
            args
        };

        let return_label = format!("{}$ret.{}", name, self.calls);
        self.calls += 1;

        self.line(format!("@{}", return_label));
        self.emit(&["D=A"]);
        self.push_d();

        for register in SAVED_REGISTERS.iter() {
            self.line(format!("@{}", register));
            self.emit(&["D=M"]);
            self.push_d();
        }

        self.emit(&["@SP", "D=M"]);
        self.line(format!("@{}", args + FRAME_SIZE));
        self.emit(&["D=D-A", "@ARG", "M=D", "@SP", "D=M", "@LCL", "M=D"]);
        self.line(format!("@{}", name));
        self.emit(&["0;JMP"]);
        self.line(format!("({})", return_label));
    }

    fn ret(&mut self) {
        // R13 = frame, R14 = return address.
        self.emit(&["@LCL", "D=M", "@R13", "M=D"]);
        self.line(format!("@{}", FRAME_SIZE));
        self.emit(&["A=D-A", "D=M", "@R14", "M=D"]);

        self.pop_d();
        self.emit(&["@ARG", "A=M", "M=D", "@ARG", "D=M+1", "@SP", "M=D"]);

        for register in SAVED_REGISTERS.iter().rev() {
            self.emit(&["@R13", "M=M-1", "A=M", "D=M"]);
            self.line(format!("@{}", register));
            self.emit(&["M=D"]);
        }

        self.emit(&["@R14", "A=M", "0;JMP"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::parse_program;

    fn translate_text(text: &str) -> Result<Vec<String>, TranslateError> {
        let program = parse_program(text).expect("could not parse commands");
        translate(&program, &TranslateOptions::unit("Test"))
    }

    #[test]
    fn test_push_constant() {
        assert_eq!(translate_text("push constant 7").unwrap(), vec![
            "@7", "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1",
        ]);
    }

    #[test]
    fn test_pop_moves_the_stack_pointer_first() {
        assert_eq!(translate_text("pop temp 0").unwrap(), vec![
            "@SP", "M=M-1", "A=M", "D=M", "@R5", "M=D",
        ]);
    }

    #[test]
    fn test_fixed_segments() {
        let lines = translate_text("push temp 7\npop pointer 1\npush static 3").unwrap();

        assert!(lines.contains(&"@R12".to_string()));
        assert!(lines.contains(&"@THAT".to_string()));
        assert!(lines.contains(&"@Test.3".to_string()));
    }

    #[test]
    fn test_units_qualify_statics() {
        let lines = translate_text("$$ A\npush static 0\n$$ B\npop static 0").unwrap();

        assert!(lines.contains(&"@A.0".to_string()));
        assert!(lines.contains(&"@B.0".to_string()));
    }

    #[test]
    fn test_static_without_unit() {
        let program = parse_program("push static 0").unwrap();
        let err = translate(&program, &TranslateOptions::default()).unwrap_err();

        assert_eq!(err.kind, TranslateErrorKind::StaticWithoutUnit);
    }

    #[test]
    fn test_pop_constant() {
        let err = translate_text("push constant 1\npop constant 0").unwrap_err();

        assert_eq!(err.line, 2);
        assert_eq!(err.kind, TranslateErrorKind::PopConstant);
    }

    #[test]
    fn test_offsets_out_of_range() {
        let err = translate_text("push temp 8").unwrap_err();
        assert_eq!(err.kind, TranslateErrorKind::OffsetOutOfRange {
            segment: Segment::Temp,
            offset: 8,
            max: 7,
        });

        let err = translate_text("pop pointer 2").unwrap_err();
        assert_eq!(err.to_string(), "at line 1 ('pop pointer 2'): offset 2 is out of range for segment pointer (0..=1)");
    }

    #[test]
    fn test_comparison_labels_are_unique() {
        let lines = translate_text("eq\nlt\ngt\neq").unwrap();
        let labels = lines.iter()
            .filter(|line| line.starts_with("(CMP_TRUE"))
            .collect::<Vec<_>>();

        assert_eq!(labels, vec!["(CMP_TRUE0)", "(CMP_TRUE1)", "(CMP_TRUE2)", "(CMP_TRUE3)"]);
    }

    #[test]
    fn test_labels_are_scoped_to_functions() {
        let lines = translate_text("label TOP\nfunction Main.loop 0\nlabel TOP\ngoto TOP").unwrap();

        assert_eq!(lines[0], "(TOP)");
        assert!(lines.contains(&"(Main.loop$TOP)".to_string()));
        assert!(lines.contains(&"@Main.loop$TOP".to_string()));
    }

    #[test]
    fn test_call_without_arguments_reserves_a_slot() {
        let lines = translate_text("call Math.random 0").unwrap();

        assert_eq!(&lines[..5], &["@SP", "A=M", "M=0", "@SP", "M=M+1"]);
        assert!(lines.contains(&"@6".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("(Math.random$ret.0)"));
    }

    #[test]
    fn test_bootstrap() {
        let program = Program::default();
        let lines = translate(&program, &TranslateOptions::program()).unwrap();

        assert_eq!(&lines[..4], &["@256", "D=A", "@SP", "M=D"]);
        assert_eq!(lines[4], "@Sys.init$ret.0");
        assert!(lines.contains(&"@Sys.init".to_string()));
        assert!(lines.contains(&"@5".to_string()));
    }
}
