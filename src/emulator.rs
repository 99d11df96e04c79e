//! [Emulator] for executing [binary programs](crate::bytecode::Program).

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::iter::FromIterator;

use slog::{o, trace, Discard, Logger};

use crate::bytecode::Program;
use crate::event::{Event, EventListener, Listeners};
use crate::instruction::{DecodeError, Instruction};

/// Registers of the Hack CPU visible to programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    D,
}

/// Contains the execution environment of the Hack CPU.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// The Program Counter stores the address of the next instruction to be executed.
    pub pc: u16,

    /// Address register, also used as the memory pointer `M`.
    pub a: u16,

    /// Data register.
    pub d: u16,
}

/// Number of instructions [Emulator::run] may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticks {
    /// Exactly this many steps. Steps taken past the end of the program do nothing.
    Limited(u64),
    /// Until the program counter leaves the program.
    Unbounded,
}

/// Trait for implementing the data memory of a Hack CPU.
pub trait Memory {
    /// Reads the word at `address`. Words never written read as 0.
    fn read(&mut self, address: u16) -> u16;

    /// Overwrites the word at `address`.
    fn write(&mut self, address: u16, value: u16);
}

/// Contiguous memory from address 0. Addresses past the end read as 0 and grow the vector on write.
impl Memory for Vec<u16> {
    fn read(&mut self, address: u16) -> u16 {
        self.get(address as usize).copied().unwrap_or(0)
    }

    fn write(&mut self, address: u16, value: u16) {
        let index = address as usize;

        if index >= self.len() {
            self.resize(index + 1, 0);
        }

        self[index] = value;
    }
}

/// Memory that only stores the words a program has touched. Reading an address
/// materializes it with the value 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseMemory {
    cells: BTreeMap<u16, u16>,
}

impl SparseMemory {
    pub fn new() -> SparseMemory {
        SparseMemory::default()
    }

    /// Value at `address` without materializing it.
    pub fn get(&self, address: u16) -> u16 {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    /// Materialized cells in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.cells.iter().map(|(address, value)| (*address, *value))
    }

    /// Materialized cells with their values interpreted as signed words.
    pub fn dump(&self) -> Vec<(u16, i16)> {
        self.iter()
            .map(|(address, value)| (address, value as i16))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(u16, u16)> for SparseMemory {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item = (u16, u16)>
    {
        SparseMemory {
            cells: BTreeMap::from_iter(iter),
        }
    }
}

impl Memory for SparseMemory {
    fn read(&mut self, address: u16) -> u16 {
        *self.cells.entry(address).or_insert(0)
    }

    fn write(&mut self, address: u16, value: u16) {
        self.cells.insert(address, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationError {
    /// The word at `pc` is not a valid instruction.
    Decode {
        pc: u16,
        error: DecodeError,
    },
}

impl fmt::Display for EmulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmulationError::Decode { pc, error } =>
                write!(f, "cannot decode instruction at {}: {}", pc, error),
        }
    }
}

impl std::error::Error for EmulationError {}

/// The emulator contains the program, the data memory and the CPU registers.
pub struct Emulator<Mem> {
    /// The data memory of the emulated machine. Implements [Memory].
    pub memory: Mem,

    /// The execution context, which includes the registers of the CPU.
    pub context: Context,

    /// Instruction memory. Decoded one word at a time when executed.
    program: Vec<u16>,

    /// Number of steps taken so far, idle steps included.
    ticks: u64,

    listeners: Listeners,
    logger: Logger,
}

impl<Mem> Emulator<Mem> where Mem: Memory {
    /// Create a new emulator.
    ///
    /// # Parameters
    /// - `program`: The binary program, loaded at instruction address 0.
    /// - `memory`: A [Memory] object holding the initial data.
    pub fn new(program: &Program, memory: Mem) -> Emulator<Mem> {
        Emulator::with_logger(program, memory, None)
    }

    pub fn with_logger<L>(program: &Program, memory: Mem, logger: L) -> Emulator<Mem>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "emulator"));

        Emulator {
            memory,
            context: Context::default(),
            program: program.words.clone(),
            ticks: 0,
            listeners: Listeners::default(),
            logger,
        }
    }

    /// Registers a listener which receives every register and memory change and every
    /// taken jump.
    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.add(listener);
    }

    /// Number of steps taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether the program counter points past the last instruction.
    pub fn is_finished(&self) -> bool {
        self.context.pc as usize >= self.program.len()
    }

    /// Decodes the instruction the program counter points at.
    pub fn current_instruction(&self) -> Option<Result<Instruction, EmulationError>> {
        let pc = self.context.pc;

        self.program.get(pc as usize).map(|word| {
            Instruction::try_from(*word)
                .map_err(|error| EmulationError::Decode { pc, error })
        })
    }

    fn set_register(&mut self, register: Register, data: u16) {
        match register {
            Register::A => self.context.a = data,
            Register::D => self.context.d = data,
        }

        self.listeners.notify(|| Event::RegisterChange { register, data });
    }

    fn set_memory(&mut self, address: u16, data: u16) {
        self.memory.write(address, data);

        self.listeners.notify(|| Event::MemoryChange { address, data });
    }

    /// Executes a single instruction.
    ///
    /// Destinations are written in the order A, D, M. The memory write and a taken jump
    /// both go to the address in A after the A write.
    pub fn emulate_instruction(&mut self, instruction: &Instruction) {
        match *instruction {
            Instruction::Address(value) => {
                self.set_register(Register::A, value);
                self.context.pc = self.context.pc.wrapping_add(1);
            },
            Instruction::Compute { comp, dest, jump } => {
                let a = self.context.a;
                let m = if comp.reads_memory() { self.memory.read(a) } else { 0 };
                let value = comp.evaluate(self.context.d, a, m);

                if dest.a {
                    self.set_register(Register::A, value);
                }

                if dest.d {
                    self.set_register(Register::D, value);
                }

                if dest.m {
                    let address = self.context.a;
                    self.set_memory(address, value);
                }

                let from = self.context.pc;

                if jump.is_taken(value) {
                    let to = self.context.a;
                    self.context.pc = to;
                    self.listeners.notify(|| Event::Jump { from, to });
                } else {
                    self.context.pc = from.wrapping_add(1);
                }
            },
        }
    }

    /// Fetches and executes the next instruction.
    ///
    /// # Returns
    /// `false` if the program counter is past the end of the program, in which case
    /// nothing is executed.
    ///
    /// # Errors
    /// Returns an error if the word at the program counter does not decode.
    pub fn step(&mut self) -> Result<bool, EmulationError> {
        self.ticks += 1;

        let instruction = match self.current_instruction() {
            Some(instruction) => instruction?,
            None => return Ok(false),
        };

        trace!(self.logger, "execute"; "pc" => self.context.pc, "instruction" => %instruction);
        self.emulate_instruction(&instruction);

        Ok(true)
    }

    /// Executes the program for the given number of ticks.
    pub fn run(&mut self, ticks: Ticks) -> Result<(), EmulationError> {
        match ticks {
            Ticks::Limited(count) => {
                for _ in 0..count {
                    self.step()?;
                }
            },
            Ticks::Unbounded => {
                while self.step()? {}
            },
        }

        trace!(self.logger, "stopped"; "pc" => self.context.pc, "ticks" => self.ticks);

        Ok(())
    }
}
